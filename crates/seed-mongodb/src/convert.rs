//! Conversion between `FieldValue` and BSON.

use bson::{Bson, DateTime as BsonDateTime, Document};
use seed_core::{DocumentRecord, FieldValue, Result, SeedError};

/// Wrapper for BSON values produced from canonical fields.
#[derive(Debug, Clone)]
pub struct BsonValue(pub Bson);

impl BsonValue {
    pub fn into_inner(self) -> Bson {
        self.0
    }
}

impl From<&FieldValue> for BsonValue {
    fn from(value: &FieldValue) -> Self {
        match value {
            FieldValue::Null => BsonValue(Bson::Null),
            FieldValue::Bool(b) => BsonValue(Bson::Boolean(*b)),
            FieldValue::Int64(i) => BsonValue(Bson::Int64(*i)),
            FieldValue::Text(s) => BsonValue(Bson::String(s.clone())),
            FieldValue::Timestamp(ts) => BsonValue(Bson::DateTime(BsonDateTime::from_chrono(*ts))),
        }
    }
}

/// Convert a BSON value read back from MongoDB.
///
/// Int32 is widened because documents written by other tools (or by the
/// shell) may store small integers that way.
pub fn bson_to_field(collection: &str, name: &str, value: &Bson) -> Result<FieldValue> {
    match value {
        Bson::Null => Ok(FieldValue::Null),
        Bson::Boolean(b) => Ok(FieldValue::Bool(*b)),
        Bson::Int32(i) => Ok(FieldValue::Int64(i64::from(*i))),
        Bson::Int64(i) => Ok(FieldValue::Int64(*i)),
        Bson::String(s) => Ok(FieldValue::Text(s.clone())),
        Bson::DateTime(dt) => Ok(FieldValue::Timestamp(dt.to_chrono())),
        other => Err(SeedError::decode(
            collection,
            format!("field '{name}' has unsupported BSON type {:?}", other.element_type()),
        )),
    }
}

pub fn to_bson_document(record: &DocumentRecord) -> Document {
    let mut doc = Document::new();
    doc.insert("_id", Bson::Int64(record.id));
    for (name, value) in &record.fields {
        doc.insert(name.as_str(), BsonValue::from(value).into_inner());
    }
    doc
}

pub fn from_bson_document(collection: &str, doc: &Document) -> Result<DocumentRecord> {
    let id = match doc.get("_id") {
        Some(Bson::Int64(i)) => *i,
        Some(Bson::Int32(i)) => i64::from(*i),
        Some(other) => {
            return Err(SeedError::decode(
                collection,
                format!("_id has unsupported BSON type {:?}", other.element_type()),
            ))
        }
        None => return Err(SeedError::decode(collection, "document without _id")),
    };

    let fields = doc
        .iter()
        .filter(|(name, _)| name.as_str() != "_id")
        .map(|(name, value)| Ok((name.clone(), bson_to_field(collection, name, value)?)))
        .collect::<Result<Vec<_>>>()?;

    Ok(DocumentRecord { id, fields })
}

/// Read an integer counter value, accepting either width.
pub fn counter_value(doc: &Document, field: &str) -> Option<i64> {
    match doc.get(field) {
        Some(Bson::Int64(i)) => Some(*i),
        Some(Bson::Int32(i)) => Some(i64::from(*i)),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bson::doc;
    use chrono::{TimeZone, Utc};

    fn sample() -> DocumentRecord {
        DocumentRecord {
            id: 5,
            fields: vec![
                ("chat_name".to_string(), FieldValue::Text("lobby".into())),
                ("is_group".to_string(), FieldValue::Bool(true)),
                ("created_by".to_string(), FieldValue::Int64(2)),
                (
                    "last_modified".to_string(),
                    FieldValue::Timestamp(Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap()),
                ),
                ("modified_by".to_string(), FieldValue::Null),
            ],
        }
    }

    #[test]
    fn test_to_bson_document() {
        let doc = to_bson_document(&sample());

        assert_eq!(doc.get_i64("_id").unwrap(), 5);
        assert_eq!(doc.get_str("chat_name").unwrap(), "lobby");
        assert!(doc.get_bool("is_group").unwrap());
        assert_eq!(doc.get_i64("created_by").unwrap(), 2);
        assert!(doc.get_datetime("last_modified").is_ok());
        assert_eq!(doc.get("modified_by"), Some(&Bson::Null));
    }

    #[test]
    fn test_from_bson_document_preserves_field_order() {
        let record = sample();
        let decoded = from_bson_document("chats", &to_bson_document(&record)).unwrap();
        assert_eq!(decoded, record);
    }

    #[test]
    fn test_int32_values_are_widened() {
        let doc = doc! { "_id": 3_i32, "chat_id": 9_i32 };
        let decoded = from_bson_document("chat_members", &doc).unwrap();
        assert_eq!(decoded.id, 3);
        assert_eq!(decoded.get("chat_id"), Some(&FieldValue::Int64(9)));
    }

    #[test]
    fn test_unsupported_type_is_a_decode_error() {
        let doc = doc! { "_id": 1_i64, "role": 1.5 };
        let err = from_bson_document("chat_members", &doc).unwrap_err();
        assert!(matches!(err, SeedError::Decode { .. }));
    }

    #[test]
    fn test_missing_id_is_a_decode_error() {
        assert!(from_bson_document("chats", &doc! { "chat_name": "x" }).is_err());
    }

    #[test]
    fn test_counter_value() {
        assert_eq!(counter_value(&doc! { "sequence_value": 4_i32 }, "sequence_value"), Some(4));
        assert_eq!(counter_value(&doc! { "sequence_value": 4_i64 }, "sequence_value"), Some(4));
        assert_eq!(counter_value(&doc! {}, "sequence_value"), None);
    }
}
