//! Conversion between `FieldValue` and MySQL values.

use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Timelike, Utc};
use mysql_async::Value;
use seed_core::{ColumnType, FieldValue};
use thiserror::Error;

/// Error during MySQL value conversion.
#[derive(Debug, Error)]
pub enum ConversionError {
    #[error("Type mismatch: expected {expected}, got {actual:?}")]
    TypeMismatch { expected: String, actual: Value },
    #[error("Invalid UTF-8 in string: {0}")]
    InvalidUtf8(#[from] std::string::FromUtf8Error),
    #[error("Invalid date/time value")]
    InvalidDateTime,
    #[error("NULL in non-nullable column")]
    UnexpectedNull,
}

/// Wrapper for MySQL parameter values built from canonical fields.
#[derive(Debug, Clone)]
pub struct MySQLValue(pub Value);

impl MySQLValue {
    pub fn into_inner(self) -> Value {
        self.0
    }
}

impl From<&FieldValue> for MySQLValue {
    fn from(value: &FieldValue) -> Self {
        match value {
            FieldValue::Null => MySQLValue(Value::NULL),
            // TINYINT(1)
            FieldValue::Bool(b) => MySQLValue(Value::Int(i64::from(*b))),
            FieldValue::Int64(i) => MySQLValue(Value::Int(*i)),
            FieldValue::Text(s) => MySQLValue(Value::Bytes(s.as_bytes().to_vec())),
            // DATETIME columns hold UTC wall-clock time
            FieldValue::Timestamp(ts) => MySQLValue(Value::Date(
                ts.year() as u16,
                ts.month() as u8,
                ts.day() as u8,
                ts.hour() as u8,
                ts.minute() as u8,
                ts.second() as u8,
                ts.timestamp_subsec_micros(),
            )),
        }
    }
}

pub fn to_params(values: &[FieldValue]) -> Vec<Value> {
    values
        .iter()
        .map(|v| MySQLValue::from(v).into_inner())
        .collect()
}

/// Convert a MySQL value read from a column of the given type.
pub fn value_to_field(
    value: &Value,
    column_type: ColumnType,
    nullable: bool,
) -> Result<FieldValue, ConversionError> {
    if matches!(value, Value::NULL) {
        return if nullable {
            Ok(FieldValue::Null)
        } else {
            Err(ConversionError::UnexpectedNull)
        };
    }
    match column_type {
        ColumnType::BigInt => extract_int(value).map(FieldValue::Int64),
        ColumnType::Bool => extract_int(value).map(|i| FieldValue::Bool(i != 0)),
        ColumnType::VarChar(_) => extract_string(value).map(FieldValue::Text),
        ColumnType::Timestamp => extract_datetime(value).map(FieldValue::Timestamp),
    }
}

/// Extract integer from MySQL Value.
pub fn extract_int(value: &Value) -> Result<i64, ConversionError> {
    match value {
        Value::Int(i) => Ok(*i),
        Value::UInt(u) => i64::try_from(*u).map_err(|_| ConversionError::TypeMismatch {
            expected: "i64".to_string(),
            actual: value.clone(),
        }),
        Value::Bytes(b) => {
            let s = String::from_utf8(b.clone())?;
            s.parse().map_err(|_| ConversionError::TypeMismatch {
                expected: "integer".to_string(),
                actual: value.clone(),
            })
        }
        _ => Err(ConversionError::TypeMismatch {
            expected: "integer".to_string(),
            actual: value.clone(),
        }),
    }
}

fn extract_string(value: &Value) -> Result<String, ConversionError> {
    match value {
        Value::Bytes(b) => Ok(String::from_utf8(b.clone())?),
        _ => Err(ConversionError::TypeMismatch {
            expected: "string".to_string(),
            actual: value.clone(),
        }),
    }
}

fn extract_datetime(value: &Value) -> Result<DateTime<Utc>, ConversionError> {
    match value {
        Value::Date(year, month, day, hour, min, sec, micro) => {
            let naive = NaiveDateTime::new(
                NaiveDate::from_ymd_opt(*year as i32, *month as u32, *day as u32)
                    .ok_or(ConversionError::InvalidDateTime)?,
                NaiveTime::from_hms_micro_opt(*hour as u32, *min as u32, *sec as u32, *micro)
                    .ok_or(ConversionError::InvalidDateTime)?,
            );
            Ok(Utc.from_utc_datetime(&naive))
        }
        Value::Bytes(b) => {
            let s = String::from_utf8(b.clone())?;
            NaiveDateTime::parse_from_str(&s, "%Y-%m-%d %H:%M:%S%.f")
                .map(|naive| Utc.from_utc_datetime(&naive))
                .map_err(|_| ConversionError::InvalidDateTime)
        }
        _ => Err(ConversionError::TypeMismatch {
            expected: "datetime".to_string(),
            actual: value.clone(),
        }),
    }
}
