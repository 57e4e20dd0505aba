//! Grouped aggregation and normalization for EMR cross-tabulations.
//!
//! The pipeline behind every pivot-style report is:
//!
//! 1. Derive a [`KeyColumn`] per dimension, either straight from a categorical column or through
//!    a [`BucketScheme`] for numeric columns such as age.
//! 2. [`aggregate`] two key columns into sparse `(group, category, count)` triples.
//! 3. Optionally [`normalize`] the counts into percentages of each group's total.
//! 4. [`materialize`] the sparse triples into a dense [`PivotGrid`] over explicit row/column
//!    domains, filling unseen combinations.
//!
//! Key columns are immutable values owned by the caller, so two reports that bucket the same
//! column with different schemes never observe each other's derived keys.

#![forbid(unsafe_code)]

mod aggregate;
mod bucket;
mod error;
mod key;
mod materialize;
mod normalize;
mod stats;

use std::sync::Arc;

/// A categorical key: a category value, or a bucket label.
pub type Key = Arc<str>;

pub use crate::aggregate::{aggregate, group_totals, totals_from_aggregates, value_counts, Aggregate};
pub use crate::bucket::BucketScheme;
pub use crate::error::{PivotError, PivotResult};
pub use crate::key::KeyColumn;
pub use crate::materialize::{materialize, PivotCell, PivotGrid};
pub use crate::normalize::{normalize, DegeneratePolicy, NormalizedAggregate};
pub use crate::stats::{
    grouped_five_number, histogram, numeric_column, FiveNumberSummary, HistogramBin,
};
