//! In-memory dataset model for EMR exploratory reporting.
//!
//! This crate focuses on:
//! - A small column-oriented [`Table`] of [`Value`]s with an inferred [`ColumnType`] per column.
//! - Streaming CSV import with type inference from a leading sample of rows.
//! - A dataset overview ([`DatasetSummary`]): shape, per-column null/distinct counts and a
//!   numeric describe (count, mean, std, quartiles).

#![forbid(unsafe_code)]

mod import;
mod summary;
mod table;
mod value;

pub use crate::import::{
    import_csv, import_csv_path, CsvImportError, CsvOptions, CsvTextEncoding, DEFAULT_NULL_VALUES,
};
pub use crate::summary::{quantile_sorted, summarize, ColumnSummary, DatasetSummary, NumericDescribe};
pub use crate::table::{Column, ColumnSchema, Table, TableError};
pub use crate::value::{ColumnType, Value};
