//! Pure projections between canonical records and store representations.
//!
//! Both write paths start from the same `CanonicalRecord`, so the two stores
//! can only diverge if one of the writes fails.

use crate::error::Result;
use crate::record::CanonicalRecord;
use crate::schema::EntityKind;
use crate::store::{DocumentRecord, RelationalRow, Statement};

/// Project a record into its document-store form (`_id` plus fields).
pub fn to_document(record: &CanonicalRecord) -> DocumentRecord {
    DocumentRecord {
        id: record.id(),
        fields: record
            .fields()
            .into_iter()
            .map(|(name, value)| (name.to_string(), value))
            .collect(),
    }
}

/// Project a record into a relational INSERT with the kind's ID column first.
pub fn to_insert_statement(record: &CanonicalRecord) -> Statement {
    let kind = record.kind();
    let fields = record.fields();

    let mut columns = Vec::with_capacity(fields.len() + 1);
    let mut values = Vec::with_capacity(fields.len() + 1);
    columns.push(kind.id_column());
    values.push(record.id().into());
    for (name, value) in fields {
        columns.push(name);
        values.push(value);
    }

    Statement::Insert {
        table: kind,
        columns,
        values,
    }
}

pub fn from_document(kind: EntityKind, document: &DocumentRecord) -> Result<CanonicalRecord> {
    CanonicalRecord::from_fields(kind, document.id, &document.field_map())
}

pub fn from_row(kind: EntityKind, row: &RelationalRow) -> Result<CanonicalRecord> {
    CanonicalRecord::from_fields(kind, row.id, &row.field_map())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::{now_millis, Chat, UserProfile};
    use crate::value::FieldValue;

    fn user() -> CanonicalRecord {
        CanonicalRecord::UserProfile(UserProfile {
            id: 12,
            user_name: "alice".to_string(),
            password: "s3cret".to_string(),
            email: "alice@example.com".to_string(),
            is_deleted: false,
            last_modified: now_millis(),
            modified_by: None,
        })
    }

    #[test]
    fn test_to_document_keeps_id_out_of_fields() {
        let doc = to_document(&user());
        assert_eq!(doc.id, 12);
        assert!(doc.get("user_id").is_none());
        assert_eq!(doc.get("user_name"), Some(&FieldValue::Text("alice".into())));
        assert_eq!(doc.get("modified_by"), Some(&FieldValue::Null));
    }

    #[test]
    fn test_to_insert_statement_puts_id_column_first() {
        let chat = CanonicalRecord::Chat(Chat {
            id: 2,
            chat_name: "general".to_string(),
            is_group: true,
            created_by: 12,
            is_deleted: false,
            last_modified: now_millis(),
            modified_by: 12,
        });

        let Statement::Insert {
            table,
            columns,
            values,
        } = to_insert_statement(&chat)
        else {
            panic!("expected an insert statement");
        };

        assert_eq!(table, EntityKind::Chats);
        assert_eq!(
            columns,
            vec![
                "chat_id",
                "chat_name",
                "is_group",
                "created_by",
                "is_deleted",
                "last_modified",
                "modified_by"
            ]
        );
        assert_eq!(values[0], FieldValue::Int64(2));
        assert_eq!(values[3], FieldValue::Int64(12));
    }

    #[test]
    fn test_both_projections_decode_to_the_same_record() {
        let record = user();
        let doc = to_document(&record);

        let Statement::Insert {
            columns, values, ..
        } = to_insert_statement(&record)
        else {
            panic!("expected an insert statement");
        };
        let row = RelationalRow {
            id: values[0].as_i64().unwrap(),
            values: columns[1..]
                .iter()
                .map(|c| c.to_string())
                .zip(values[1..].iter().cloned())
                .collect(),
        };

        let from_doc = from_document(EntityKind::UserProfiles, &doc).unwrap();
        let from_sql = from_row(EntityKind::UserProfiles, &row).unwrap();
        assert_eq!(from_doc, record);
        assert_eq!(from_sql, record);
    }
}
