use crate::aggregate::Aggregate;
use crate::error::{PivotError, PivotResult};
use crate::Key;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

/// What to do when a group's total is zero (or the group has no total at all).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DegeneratePolicy {
    /// Fail with [`PivotError::DegenerateGroup`].
    #[default]
    Fail,
    /// Report `0.0` percent for every entry of the group.
    Zero,
}

impl FromStr for DegeneratePolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "fail" => Ok(DegeneratePolicy::Fail),
            "zero" => Ok(DegeneratePolicy::Zero),
            other => Err(format!("unknown degenerate policy {other:?} (expected fail or zero)")),
        }
    }
}

impl fmt::Display for DegeneratePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DegeneratePolicy::Fail => f.write_str("fail"),
            DegeneratePolicy::Zero => f.write_str("zero"),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct NormalizedAggregate {
    pub group: Key,
    pub category: Key,
    pub count: usize,
    /// `100 * count / total(group)`.
    pub percent: f64,
}

/// Express each aggregate as a percentage of its group's total.
pub fn normalize(
    aggregates: &[Aggregate],
    totals_by_group: &HashMap<Key, usize>,
    policy: DegeneratePolicy,
) -> PivotResult<Vec<NormalizedAggregate>> {
    aggregates
        .iter()
        .map(|agg| {
            let total = totals_by_group.get(&agg.group).copied().unwrap_or(0);
            let percent = if total == 0 {
                match policy {
                    DegeneratePolicy::Fail => {
                        return Err(PivotError::DegenerateGroup {
                            group: agg.group.to_string(),
                        })
                    }
                    DegeneratePolicy::Zero => 0.0,
                }
            } else {
                100.0 * agg.count as f64 / total as f64
            };
            Ok(NormalizedAggregate {
                group: agg.group.clone(),
                category: agg.category.clone(),
                count: agg.count,
                percent,
            })
        })
        .collect()
}
