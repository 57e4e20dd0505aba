use crate::value::{ColumnType, Value};
use serde::Serialize;
use thiserror::Error;

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ColumnSchema {
    pub name: String,
    pub column_type: ColumnType,
}

impl ColumnSchema {
    pub fn new(name: impl Into<String>, column_type: ColumnType) -> Self {
        Self {
            name: name.into(),
            column_type,
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TableError {
    #[error("row has {actual} values but the table has {expected} columns")]
    RowWidth { expected: usize, actual: usize },
    #[error("duplicate column name: {0}")]
    DuplicateColumn(String),
}

#[derive(Clone, Debug, PartialEq)]
pub struct Column {
    schema: ColumnSchema,
    values: Vec<Value>,
}

impl Column {
    pub fn name(&self) -> &str {
        &self.schema.name
    }

    pub fn column_type(&self) -> ColumnType {
        self.schema.column_type
    }

    pub fn schema(&self) -> &ColumnSchema {
        &self.schema
    }

    pub fn values(&self) -> &[Value] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn get(&self, row: usize) -> Option<&Value> {
        self.values.get(row)
    }

    /// Numeric view of the column: `None` for blanks and non-numeric cells.
    pub fn numbers(&self) -> impl Iterator<Item = Option<f64>> + '_ {
        self.values.iter().map(Value::as_number)
    }

    pub fn null_count(&self) -> usize {
        self.values.iter().filter(|v| v.is_blank()).count()
    }
}

/// A column-oriented table of records.
///
/// Rows are an unordered multiset from the reporting point of view; the row index only exists to
/// line up cells of different columns.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Table {
    columns: Vec<Column>,
    rows: usize,
}

impl Table {
    pub fn new(schema: Vec<ColumnSchema>) -> Result<Self, TableError> {
        let mut columns: Vec<Column> = Vec::with_capacity(schema.len());
        for column in schema {
            if columns.iter().any(|c| c.name() == column.name) {
                return Err(TableError::DuplicateColumn(column.name));
            }
            columns.push(Column {
                schema: column,
                values: Vec::new(),
            });
        }
        Ok(Self { columns, rows: 0 })
    }

    /// Convenience constructor for text-only tables (mostly used by tests and fixtures).
    pub fn with_text_columns(names: &[&str]) -> Result<Self, TableError> {
        Self::new(
            names
                .iter()
                .map(|name| ColumnSchema::new(*name, ColumnType::Text))
                .collect(),
        )
    }

    pub fn push_row(&mut self, row: Vec<Value>) -> Result<(), TableError> {
        if row.len() != self.columns.len() {
            return Err(TableError::RowWidth {
                expected: self.columns.len(),
                actual: row.len(),
            });
        }
        for (column, value) in self.columns.iter_mut().zip(row) {
            column.values.push(value);
        }
        self.rows += 1;
        Ok(())
    }

    pub fn row_count(&self) -> usize {
        self.rows
    }

    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn schema(&self) -> impl Iterator<Item = &ColumnSchema> {
        self.columns.iter().map(Column::schema)
    }

    pub fn column_idx(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c.name() == name)
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.column_idx(name).map(|idx| &self.columns[idx])
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.column_idx(name).is_some()
    }

    /// Returns the subset of `names` that are not columns of this table, in input order.
    pub fn missing_columns<'a>(&self, names: &[&'a str]) -> Vec<&'a str> {
        names
            .iter()
            .copied()
            .filter(|name| !self.has_column(name))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn push_row_rejects_wrong_width() {
        let mut table = Table::with_text_columns(&["gender", "age"]).unwrap();
        assert_eq!(
            table.push_row(vec!["F".into()]),
            Err(TableError::RowWidth {
                expected: 2,
                actual: 1
            })
        );
        assert_eq!(table.row_count(), 0);
    }

    #[test]
    fn duplicate_column_names_are_rejected() {
        assert_eq!(
            Table::with_text_columns(&["age", "age"]),
            Err(TableError::DuplicateColumn("age".to_string()))
        );
    }

    #[test]
    fn missing_columns_preserves_request_order() {
        let table = Table::with_text_columns(&["gender", "age"]).unwrap();
        assert_eq!(
            table.missing_columns(&["ethnicity", "age", "medical_condition"]),
            vec!["ethnicity", "medical_condition"]
        );
    }
}
