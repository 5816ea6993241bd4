//! Store-neutral field values.
//!
//! `FieldValue` is the only value type that crosses the store seams. Each
//! adapter crate converts it to and from its driver's native value type
//! (`bson::Bson`, `mysql_async::Value`).

use chrono::{DateTime, Utc};
use std::fmt;

/// A single field of a canonical record.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    /// SQL NULL / BSON null
    Null,

    /// Boolean value
    Bool(bool),

    /// 64-bit signed integer (all IDs and references)
    Int64(i64),

    /// UTF-8 string
    Text(String),

    /// UTC timestamp, millisecond precision
    Timestamp(DateTime<Utc>),
}

impl FieldValue {
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            FieldValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            FieldValue::Int64(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            FieldValue::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_timestamp(&self) -> Option<DateTime<Utc>> {
        match self {
            FieldValue::Timestamp(ts) => Some(*ts),
            _ => None,
        }
    }

    /// Short name of the variant, used in decode errors.
    pub fn type_name(&self) -> &'static str {
        match self {
            FieldValue::Null => "null",
            FieldValue::Bool(_) => "bool",
            FieldValue::Int64(_) => "int64",
            FieldValue::Text(_) => "text",
            FieldValue::Timestamp(_) => "timestamp",
        }
    }
}

impl From<bool> for FieldValue {
    fn from(value: bool) -> Self {
        FieldValue::Bool(value)
    }
}

impl From<i64> for FieldValue {
    fn from(value: i64) -> Self {
        FieldValue::Int64(value)
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        FieldValue::Text(value.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        FieldValue::Text(value)
    }
}

impl From<DateTime<Utc>> for FieldValue {
    fn from(value: DateTime<Utc>) -> Self {
        FieldValue::Timestamp(value)
    }
}

impl From<Option<i64>> for FieldValue {
    fn from(value: Option<i64>) -> Self {
        value.map(FieldValue::Int64).unwrap_or(FieldValue::Null)
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Null => write!(f, "NULL"),
            FieldValue::Bool(b) => write!(f, "{b}"),
            FieldValue::Int64(i) => write!(f, "{i}"),
            FieldValue::Text(s) => write!(f, "'{s}'"),
            FieldValue::Timestamp(ts) => write!(f, "{}", ts.to_rfc3339()),
        }
    }
}
