use crate::table::Table;
use crate::value::{ColumnType, Value};
use serde::Serialize;
use std::collections::HashSet;

/// Shape and per-column profile of a dataset.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct DatasetSummary {
    pub rows: usize,
    pub columns: usize,
    pub column_summaries: Vec<ColumnSummary>,
    pub numeric: Vec<NumericDescribe>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ColumnSummary {
    pub name: String,
    pub column_type: ColumnType,
    pub non_null: usize,
    pub missing: usize,
    pub distinct: usize,
}

/// Descriptive statistics of one numeric column, ignoring blanks.
///
/// `std` is the sample standard deviation (n - 1 denominator) and is `None` for fewer than two
/// values. Quartiles use linear interpolation between closest ranks.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct NumericDescribe {
    pub column: String,
    pub count: usize,
    pub mean: f64,
    pub std: Option<f64>,
    pub min: f64,
    pub q25: f64,
    pub median: f64,
    pub q75: f64,
    pub max: f64,
}

pub fn summarize(table: &Table) -> DatasetSummary {
    let mut column_summaries = Vec::with_capacity(table.column_count());
    let mut numeric = Vec::new();

    for column in table.columns() {
        let missing = column.null_count();
        column_summaries.push(ColumnSummary {
            name: column.name().to_string(),
            column_type: column.column_type(),
            non_null: column.len() - missing,
            missing,
            distinct: distinct_count(column.values()),
        });

        if column.column_type() == ColumnType::Number {
            let values: Vec<f64> = column.numbers().flatten().collect();
            if let Some(describe) = describe(column.name(), values) {
                numeric.push(describe);
            }
        }
    }

    DatasetSummary {
        rows: table.row_count(),
        columns: table.column_count(),
        column_summaries,
        numeric,
    }
}

fn distinct_count(values: &[Value]) -> usize {
    let mut numbers: HashSet<u64> = HashSet::new();
    let mut texts: HashSet<&str> = HashSet::new();
    for value in values {
        match value {
            Value::Blank => {}
            // Normalize -0.0 so it is not counted separately from 0.0.
            Value::Number(n) => {
                numbers.insert(if *n == 0.0 { 0.0f64.to_bits() } else { n.to_bits() });
            }
            Value::Text(s) => {
                texts.insert(s.as_ref());
            }
        }
    }
    numbers.len() + texts.len()
}

fn describe(column: &str, mut values: Vec<f64>) -> Option<NumericDescribe> {
    if values.is_empty() {
        return None;
    }
    values.sort_by(f64::total_cmp);

    let count = values.len();
    let mean = values.iter().sum::<f64>() / count as f64;
    let std = (count > 1).then(|| {
        let ss: f64 = values.iter().map(|v| (v - mean) * (v - mean)).sum();
        (ss / (count - 1) as f64).sqrt()
    });

    Some(NumericDescribe {
        column: column.to_string(),
        count,
        mean,
        std,
        min: values[0],
        q25: quantile_sorted(&values, 0.25)?,
        median: quantile_sorted(&values, 0.5)?,
        q75: quantile_sorted(&values, 0.75)?,
        max: values[count - 1],
    })
}

/// Quantile `q` (in `[0, 1]`) of an ascending slice using linear interpolation between the two
/// closest ranks. Returns `None` for an empty slice.
pub fn quantile_sorted(sorted: &[f64], q: f64) -> Option<f64> {
    let last = sorted.len().checked_sub(1)?;
    let pos = q.clamp(0.0, 1.0) * last as f64;
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    let frac = pos - lo as f64;
    Some(sorted[lo] + (sorted[hi] - sorted[lo]) * frac)
}
