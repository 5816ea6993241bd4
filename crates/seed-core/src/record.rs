//! Canonical in-memory records.
//!
//! A `CanonicalRecord` is built once per dual write and then projected into
//! both store representations (see [`crate::projection`]).

use crate::error::{Result, SeedError};
use crate::schema::EntityKind;
use crate::value::FieldValue;
use chrono::{DateTime, SubsecRound, Utc};
use std::collections::BTreeMap;

/// Role assigned to chat members unless another is requested.
pub const DEFAULT_MEMBER_ROLE: &str = "member";

/// Current UTC time truncated to milliseconds.
///
/// BSON datetimes carry milliseconds, so anything finer would not survive a
/// round trip through the document store.
pub fn now_millis() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(3)
}

#[derive(Debug, Clone, PartialEq)]
pub struct UserProfile {
    pub id: i64,
    pub user_name: String,
    pub password: String,
    pub email: String,
    pub is_deleted: bool,
    pub last_modified: DateTime<Utc>,
    pub modified_by: Option<i64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Chat {
    pub id: i64,
    pub chat_name: String,
    pub is_group: bool,
    pub created_by: i64,
    pub is_deleted: bool,
    pub last_modified: DateTime<Utc>,
    pub modified_by: i64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ChatMember {
    pub id: i64,
    pub chat_id: i64,
    pub user_id: i64,
    pub role: String,
    pub last_modified: DateTime<Utc>,
    pub modified_by: Option<i64>,
}

/// One logical record of any seeded kind.
#[derive(Debug, Clone, PartialEq)]
pub enum CanonicalRecord {
    UserProfile(UserProfile),
    Chat(Chat),
    ChatMember(ChatMember),
}

impl CanonicalRecord {
    pub fn kind(&self) -> EntityKind {
        match self {
            CanonicalRecord::UserProfile(_) => EntityKind::UserProfiles,
            CanonicalRecord::Chat(_) => EntityKind::Chats,
            CanonicalRecord::ChatMember(_) => EntityKind::ChatMembers,
        }
    }

    pub fn id(&self) -> i64 {
        match self {
            CanonicalRecord::UserProfile(u) => u.id,
            CanonicalRecord::Chat(c) => c.id,
            CanonicalRecord::ChatMember(m) => m.id,
        }
    }

    /// Non-ID fields in the column order of [`EntityKind::columns`].
    pub fn fields(&self) -> Vec<(&'static str, FieldValue)> {
        match self {
            CanonicalRecord::UserProfile(u) => vec![
                ("user_name", u.user_name.clone().into()),
                ("password", u.password.clone().into()),
                ("email", u.email.clone().into()),
                ("is_deleted", u.is_deleted.into()),
                ("last_modified", u.last_modified.into()),
                ("modified_by", u.modified_by.into()),
            ],
            CanonicalRecord::Chat(c) => vec![
                ("chat_name", c.chat_name.clone().into()),
                ("is_group", c.is_group.into()),
                ("created_by", c.created_by.into()),
                ("is_deleted", c.is_deleted.into()),
                ("last_modified", c.last_modified.into()),
                ("modified_by", c.modified_by.into()),
            ],
            CanonicalRecord::ChatMember(m) => vec![
                ("chat_id", m.chat_id.into()),
                ("user_id", m.user_id.into()),
                ("role", m.role.clone().into()),
                ("last_modified", m.last_modified.into()),
                ("modified_by", m.modified_by.into()),
            ],
        }
    }

    /// Rebuild a record from its ID and a name-keyed field map.
    pub fn from_fields(
        kind: EntityKind,
        id: i64,
        fields: &BTreeMap<String, FieldValue>,
    ) -> Result<Self> {
        let reader = FieldReader { kind, fields };
        let record = match kind {
            EntityKind::UserProfiles => CanonicalRecord::UserProfile(UserProfile {
                id,
                user_name: reader.text("user_name")?,
                password: reader.text("password")?,
                email: reader.text("email")?,
                is_deleted: reader.bool("is_deleted")?,
                last_modified: reader.timestamp("last_modified")?,
                modified_by: reader.optional_i64("modified_by")?,
            }),
            EntityKind::Chats => CanonicalRecord::Chat(Chat {
                id,
                chat_name: reader.text("chat_name")?,
                is_group: reader.bool("is_group")?,
                created_by: reader.i64("created_by")?,
                is_deleted: reader.bool("is_deleted")?,
                last_modified: reader.timestamp("last_modified")?,
                modified_by: reader.i64("modified_by")?,
            }),
            EntityKind::ChatMembers => CanonicalRecord::ChatMember(ChatMember {
                id,
                chat_id: reader.i64("chat_id")?,
                user_id: reader.i64("user_id")?,
                role: reader.text("role")?,
                last_modified: reader.timestamp("last_modified")?,
                modified_by: reader.optional_i64("modified_by")?,
            }),
        };
        Ok(record)
    }
}

struct FieldReader<'a> {
    kind: EntityKind,
    fields: &'a BTreeMap<String, FieldValue>,
}

impl FieldReader<'_> {
    fn get(&self, name: &str) -> Result<&FieldValue> {
        self.fields
            .get(name)
            .ok_or_else(|| SeedError::decode(self.kind.name(), format!("missing field '{name}'")))
    }

    fn mismatch(&self, name: &str, expected: &str, found: &FieldValue) -> SeedError {
        SeedError::decode(
            self.kind.name(),
            format!(
                "field '{name}' expected {expected}, found {}",
                found.type_name()
            ),
        )
    }

    fn text(&self, name: &str) -> Result<String> {
        let value = self.get(name)?;
        value
            .as_str()
            .map(str::to_string)
            .ok_or_else(|| self.mismatch(name, "text", value))
    }

    fn bool(&self, name: &str) -> Result<bool> {
        let value = self.get(name)?;
        value
            .as_bool()
            .ok_or_else(|| self.mismatch(name, "bool", value))
    }

    fn i64(&self, name: &str) -> Result<i64> {
        let value = self.get(name)?;
        value
            .as_i64()
            .ok_or_else(|| self.mismatch(name, "int64", value))
    }

    fn optional_i64(&self, name: &str) -> Result<Option<i64>> {
        match self.fields.get(name) {
            None | Some(FieldValue::Null) => Ok(None),
            Some(value) => value
                .as_i64()
                .map(Some)
                .ok_or_else(|| self.mismatch(name, "int64 or null", value)),
        }
    }

    fn timestamp(&self, name: &str) -> Result<DateTime<Utc>> {
        let value = self.get(name)?;
        value
            .as_timestamp()
            .ok_or_else(|| self.mismatch(name, "timestamp", value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_member() -> CanonicalRecord {
        CanonicalRecord::ChatMember(ChatMember {
            id: 3,
            chat_id: 1,
            user_id: 9,
            role: DEFAULT_MEMBER_ROLE.to_string(),
            last_modified: now_millis(),
            modified_by: None,
        })
    }

    #[test]
    fn test_fields_follow_column_order() {
        let record = sample_member();
        let names: Vec<&str> = record.fields().into_iter().map(|(n, _)| n).collect();
        let columns: Vec<&str> = record.kind().columns().iter().map(|c| c.name).collect();
        assert_eq!(names, columns);
    }

    #[test]
    fn test_from_fields_rebuilds_record() {
        let record = sample_member();
        let fields: BTreeMap<String, FieldValue> = record
            .fields()
            .into_iter()
            .map(|(n, v)| (n.to_string(), v))
            .collect();

        let rebuilt = CanonicalRecord::from_fields(record.kind(), record.id(), &fields).unwrap();
        assert_eq!(rebuilt, record);
    }

    #[test]
    fn test_from_fields_reports_wrong_type() {
        let mut fields: BTreeMap<String, FieldValue> = sample_member()
            .fields()
            .into_iter()
            .map(|(n, v)| (n.to_string(), v))
            .collect();
        fields.insert("chat_id".to_string(), FieldValue::Text("one".into()));

        let err = CanonicalRecord::from_fields(EntityKind::ChatMembers, 3, &fields).unwrap_err();
        assert!(matches!(err, SeedError::Decode { .. }));
        assert!(err.to_string().contains("chat_id"));
    }

    #[test]
    fn test_now_millis_has_no_sub_millisecond_part() {
        let ts = now_millis();
        assert_eq!(ts.timestamp_subsec_nanos() % 1_000_000, 0);
    }
}
