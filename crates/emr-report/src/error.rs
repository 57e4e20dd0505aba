use std::path::PathBuf;

use emr_pivot::PivotError;
use thiserror::Error;

use crate::config::ConfigError;
use crate::render::RenderError;

#[derive(Debug, Error)]
pub enum ReportError {
    #[error("report {report} requires column {column:?}, which is not in the dataset")]
    MissingColumn { report: String, column: String },
    #[error("column {column} has no usable values")]
    NoData { column: String },
    #[error(transparent)]
    Pivot(#[from] PivotError),
    #[error(transparent)]
    Render(#[from] RenderError),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("failed to write {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error(transparent)]
    Csv(#[from] csv::Error),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}
