use crate::error::{PivotError, PivotResult};
use crate::key::KeyColumn;
use crate::Key;
use std::collections::HashMap;

/// Number of records sharing one `(group, category)` combination.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Aggregate {
    pub group: Key,
    pub category: Key,
    pub count: usize,
}

impl Aggregate {
    pub fn new(group: impl Into<Key>, category: impl Into<Key>, count: usize) -> Self {
        Self {
            group: group.into(),
            category: category.into(),
            count,
        }
    }
}

/// Count records per `(group, category)` pair.
///
/// Every combination present in the data appears exactly once; combinations that never occur are
/// omitted. Records without a group key or without a category key are not counted. The output is
/// in first-seen order, which callers must not rely on.
pub fn aggregate(group: &KeyColumn, category: &KeyColumn) -> PivotResult<Vec<Aggregate>> {
    if group.len() != category.len() {
        return Err(PivotError::LengthMismatch {
            left: group.len(),
            right: category.len(),
        });
    }

    let mut index: HashMap<(Key, Key), usize> = HashMap::new();
    let mut out: Vec<Aggregate> = Vec::new();
    let mut skipped = 0usize;

    for (g, c) in group.keys().iter().zip(category.keys()) {
        let (Some(g), Some(c)) = (g, c) else {
            skipped += 1;
            continue;
        };
        match index.get(&(g.clone(), c.clone())) {
            Some(&idx) => out[idx].count += 1,
            None => {
                index.insert((g.clone(), c.clone()), out.len());
                out.push(Aggregate {
                    group: g.clone(),
                    category: c.clone(),
                    count: 1,
                });
            }
        }
    }

    if skipped > 0 {
        log::debug!(
            "aggregate({}, {}): {skipped} record(s) without both keys were not counted",
            group.name(),
            category.name()
        );
    }
    Ok(out)
}

/// Number of records per group key, over every record that has a group key.
pub fn group_totals(group: &KeyColumn) -> HashMap<Key, usize> {
    let mut totals: HashMap<Key, usize> = HashMap::new();
    for key in group.keys().iter().flatten() {
        *totals.entry(key.clone()).or_default() += 1;
    }
    totals
}

/// Per-group totals derived from aggregates, i.e. only over records that also have a category.
pub fn totals_from_aggregates(aggregates: &[Aggregate]) -> HashMap<Key, usize> {
    let mut totals: HashMap<Key, usize> = HashMap::new();
    for agg in aggregates {
        *totals.entry(agg.group.clone()).or_default() += agg.count;
    }
    totals
}

/// Frequency of each key, most frequent first; ties are ordered by key.
pub fn value_counts(column: &KeyColumn) -> Vec<(Key, usize)> {
    let mut counts: Vec<(Key, usize)> = group_totals(column).into_iter().collect();
    counts.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    counts
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn keys(name: &str, values: &[Option<&str>]) -> KeyColumn {
        KeyColumn::from_keys(name, values.iter().map(|v| v.map(Arc::from)).collect())
    }

    #[test]
    fn records_missing_a_key_are_not_counted() {
        let group = keys("ethnicity", &[Some("A"), None, Some("A")]);
        let category = keys("condition", &[Some("X"), Some("X"), None]);
        assert_eq!(
            aggregate(&group, &category).unwrap(),
            vec![Aggregate::new("A", "X", 1)]
        );
    }

    #[test]
    fn mismatched_lengths_are_rejected() {
        let group = keys("ethnicity", &[Some("A")]);
        let category = keys("condition", &[]);
        assert_eq!(
            aggregate(&group, &category),
            Err(PivotError::LengthMismatch { left: 1, right: 0 })
        );
    }

    #[test]
    fn value_counts_orders_by_count_then_key() {
        let column = keys("gender", &[Some("M"), Some("F"), Some("X"), Some("F"), None, Some("M")]);
        let counts = value_counts(&column);
        let counts: Vec<(&str, usize)> = counts.iter().map(|(k, c)| (k.as_ref(), *c)).collect();
        assert_eq!(counts, vec![("F", 2), ("M", 2), ("X", 1)]);
    }

    #[test]
    fn totals_differ_only_for_records_without_a_category() {
        let group = keys("ethnicity", &[Some("A"), Some("A"), Some("B")]);
        let category = keys("condition", &[Some("X"), None, Some("Y")]);
        let aggs = aggregate(&group, &category).unwrap();

        let all = group_totals(&group);
        let counted = totals_from_aggregates(&aggs);
        assert_eq!(all.get("A"), Some(&2));
        assert_eq!(counted.get("A"), Some(&1));
        assert_eq!(all.get("B"), counted.get("B"));
    }
}
