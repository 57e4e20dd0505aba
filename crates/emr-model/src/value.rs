use serde::Serialize;
use std::fmt;
use std::sync::Arc;

/// Storage type of a column, inferred at import time.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnType {
    #[default]
    Text,
    Number,
}

impl fmt::Display for ColumnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ColumnType::Text => f.write_str("text"),
            ColumnType::Number => f.write_str("number"),
        }
    }
}

/// A single cell of a [`crate::Table`].
#[derive(Clone, Debug, Default, PartialEq)]
pub enum Value {
    #[default]
    Blank,
    Number(f64),
    Text(Arc<str>),
}

impl Value {
    pub fn is_blank(&self) -> bool {
        matches!(self, Value::Blank)
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Blank => Ok(()),
            // `f64`'s `Display` already prints the shortest round-tripping form (`25`, `29.5`).
            Value::Number(n) => write!(f, "{n}"),
            Value::Text(s) => f.write_str(s),
        }
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::Number(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::Text(Arc::from(value))
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::Text(Arc::from(value))
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or(Value::Blank)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numbers_display_in_shortest_form() {
        assert_eq!(Value::Number(25.0).to_string(), "25");
        assert_eq!(Value::Number(29.5).to_string(), "29.5");
        assert_eq!(Value::Blank.to_string(), "");
    }

    #[test]
    fn options_convert_to_blank() {
        assert_eq!(Value::from(None::<f64>), Value::Blank);
        assert_eq!(Value::from(Some("Asthma")), Value::from("Asthma"));
    }
}
