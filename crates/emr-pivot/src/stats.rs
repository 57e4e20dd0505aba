use crate::error::{PivotError, PivotResult};
use crate::key::KeyColumn;
use crate::Key;
use emr_model::{quantile_sorted, ColumnType, Table};
use serde::Serialize;
use std::collections::HashMap;

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct HistogramBin {
    pub start: f64,
    pub end: f64,
    pub count: usize,
}

/// Box-plot statistics of one group.
///
/// Whiskers extend to the most extreme values within 1.5 x IQR of the quartiles; values beyond
/// them are listed as outliers.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct FiveNumberSummary {
    pub group: String,
    pub count: usize,
    pub whisker_low: f64,
    pub q1: f64,
    pub median: f64,
    pub q3: f64,
    pub whisker_high: f64,
    pub outliers: Vec<f64>,
}

/// Numeric view of `column`, one entry per record.
pub fn numeric_column(table: &Table, column: &str) -> PivotResult<Vec<Option<f64>>> {
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
    Ok(col.numbers().collect())
}

/// Equal-width histogram between the smallest and largest finite value.
///
/// Every bin is half-open except the last, which also includes the maximum. A constant input
/// yields a single bin of width 1 centred on the value; empty input (or `bins == 0`) yields no
/// bins.
pub fn histogram(values: &[f64], bins: usize) -> Vec<HistogramBin> {
    let finite: Vec<f64> = values.iter().copied().filter(|v| v.is_finite()).collect();
    if finite.is_empty() || bins == 0 {
        return Vec::new();
    }

    let min = finite.iter().copied().fold(f64::INFINITY, f64::min);
    let max = finite.iter().copied().fold(f64::NEG_INFINITY, f64::max);

    if min == max {
        return vec![HistogramBin {
            start: min - 0.5,
            end: min + 0.5,
            count: finite.len(),
        }];
    }

    let width = (max - min) / bins as f64;
    let mut counts = vec![0usize; bins];
    for v in &finite {
        let idx = (((v - min) / width) as usize).min(bins - 1);
        counts[idx] += 1;
    }

    counts
        .into_iter()
        .enumerate()
        .map(|(i, count)| HistogramBin {
            start: min + width * i as f64,
            end: if i + 1 == bins {
                max
            } else {
                min + width * (i + 1) as f64
            },
            count,
        })
        .collect()
}

/// Box-plot statistics of `values` per key of `group`, in the order of the group's domain.
///
/// Records without a group key or without a value are ignored; groups with no values are omitted.
pub fn grouped_five_number(
    group: &KeyColumn,
    values: &[Option<f64>],
) -> PivotResult<Vec<FiveNumberSummary>> {
    if group.len() != values.len() {
        return Err(PivotError::LengthMismatch {
            left: group.len(),
            right: values.len(),
        });
    }

    let mut by_group: HashMap<&Key, Vec<f64>> = HashMap::new();
    for (key, value) in group.keys().iter().zip(values) {
        if let (Some(key), Some(value)) = (key, value) {
            if value.is_finite() {
                by_group.entry(key).or_default().push(*value);
            }
        }
    }

    let mut out = Vec::with_capacity(by_group.len());
    for key in group.domain() {
        let Some(mut values) = by_group.remove(key) else {
            continue;
        };
        values.sort_by(f64::total_cmp);
        if let Some(summary) = five_number(key, &values) {
            out.push(summary);
        }
    }
    Ok(out)
}

fn five_number(group: &str, sorted: &[f64]) -> Option<FiveNumberSummary> {
    let q1 = quantile_sorted(sorted, 0.25)?;
    let median = quantile_sorted(sorted, 0.5)?;
    let q3 = quantile_sorted(sorted, 0.75)?;
    let iqr = q3 - q1;
    let low_fence = q1 - 1.5 * iqr;
    let high_fence = q3 + 1.5 * iqr;

    let inside = sorted
        .iter()
        .copied()
        .filter(|v| *v >= low_fence && *v <= high_fence);
    let whisker_low = inside.clone().next().unwrap_or(q1);
    let whisker_high = inside.last().unwrap_or(q3);

    Some(FiveNumberSummary {
        group: group.to_string(),
        count: sorted.len(),
        whisker_low,
        q1,
        median,
        q3,
        whisker_high,
        outliers: sorted
            .iter()
            .copied()
            .filter(|v| *v < low_fence || *v > high_fence)
            .collect(),
    })
}
