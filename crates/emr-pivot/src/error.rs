use thiserror::Error;

#[derive(Clone, Debug, Error, PartialEq)]
pub enum PivotError {
    #[error("invalid bucket scheme: {0}")]
    InvalidScheme(String),
    #[error("value {value} is outside every bucket of the scheme")]
    OutOfRange { value: f64 },
    #[error("group {group:?} has a total of zero records; cannot normalize")]
    DegenerateGroup { group: String },
    #[error("key columns have different lengths ({left} vs {right})")]
    LengthMismatch { left: usize, right: usize },
    #[error("unknown column: {column}")]
    UnknownColumn { column: String },
    #[error("column {column} is not numeric")]
    NotNumeric { column: String },
}

pub type PivotResult<T> = Result<T, PivotError>;
