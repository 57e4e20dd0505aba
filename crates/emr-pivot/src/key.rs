use crate::bucket::BucketScheme;
use crate::error::{PivotError, PivotResult};
use crate::Key;
use emr_model::{ColumnType, Table, Value};
use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

/// A derived categorical view of one table column.
///
/// Holds one optional key per record (`None` for blanks and unassigned values) and the ordered
/// domain of keys used as pivot axes. A bucketed key column's domain is the scheme's label order,
/// including labels no record falls into; a categorical key column's domain is its sorted distinct
/// keys.
#[derive(Clone, Debug, PartialEq)]
pub struct KeyColumn {
    name: String,
    keys: Vec<Option<Key>>,
    domain: Vec<Key>,
    unassigned: usize,
}

impl KeyColumn {
    /// Build a key column from raw keys; the domain is the sorted set of distinct keys.
    pub fn from_keys(name: impl Into<String>, keys: Vec<Option<Key>>) -> Self {
        let domain: BTreeSet<Key> = keys.iter().flatten().cloned().collect();
        Self {
            name: name.into(),
            keys,
            domain: domain.into_iter().collect(),
            unassigned: 0,
        }
    }

    /// Categorical view of `column`: text cells are used as-is, numbers are rendered in their
    /// shortest form, blanks have no key.
    pub fn categorical(table: &Table, column: &str) -> PivotResult<Self> {
        let col = table
            .column(column)
            .ok_or_else(|| PivotError::UnknownColumn {
                column: column.to_string(),
            })?;

        // Share one allocation per distinct numeric rendering.
        let mut rendered: HashMap<u64, Key> = HashMap::new();
        let keys = col
            .values()
            .iter()
            .map(|value| match value {
                Value::Blank => None,
                Value::Text(s) => Some(s.clone()),
                Value::Number(n) => Some(
                    rendered
                        .entry(n.to_bits())
                        .or_insert_with(|| Arc::from(n.to_string()))
                        .clone(),
                ),
            })
            .collect();

        Ok(Self::from_keys(column, keys))
    }

    /// Bucketed view of a numeric `column`. Values outside the scheme have no key and are counted
    /// in [`KeyColumn::unassigned`].
    pub fn bucketed(table: &Table, column: &str, scheme: &BucketScheme) -> PivotResult<Self> {
        let col = table
            .column(column)
            .ok_or_else(|| PivotError::UnknownColumn {
                column: column.to_string(),
            })?;
        if col.column_type() != ColumnType::Number {
            return Err(PivotError::NotNumeric {
                column: column.to_string(),
            });
        }

        let labels: Vec<Key> = scheme.labels().iter().map(|l| Arc::from(l.as_str())).collect();
        let mut unassigned = 0usize;
        let keys = col
            .numbers()
            .map(|value| {
                let value = value?;
                match scheme.bucket_index(value) {
                    Ok(idx) => Some(labels[idx].clone()),
                    Err(_) => {
                        unassigned += 1;
                        None
                    }
                }
            })
            .collect();

        if unassigned > 0 {
            let (lo, hi) = scheme.range();
            log::warn!(
                "{unassigned} value(s) of column {column} fall outside [{lo}, {hi}) and are unassigned"
            );
        }

        Ok(Self {
            name: column.to_string(),
            keys,
            domain: labels,
            unassigned,
        })
    }

    /// Replace the domain (e.g. to order categories by prevalence).
    ///
    /// Keys that are not part of the new domain stay on their records but are dropped by
    /// [`crate::materialize`].
    pub fn with_domain(mut self, domain: Vec<Key>) -> Self {
        self.domain = domain;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    pub fn keys(&self) -> &[Option<Key>] {
        &self.keys
    }

    pub fn get(&self, row: usize) -> Option<&Key> {
        self.keys.get(row).and_then(Option::as_ref)
    }

    pub fn domain(&self) -> &[Key] {
        &self.domain
    }

    /// Number of records whose value was present but outside every bucket.
    pub fn unassigned(&self) -> usize {
        self.unassigned
    }
}
