//! Store capabilities consumed by the seeding core.
//!
//! The core never talks to a driver directly. `seed-mongodb` and `seed-mysql`
//! implement these traits for the live databases, and [`crate::testing`]
//! implements them in memory.

use crate::error::Result;
use crate::schema::EntityKind;
use crate::value::FieldValue;
use async_trait::async_trait;
use std::collections::BTreeMap;

/// Counter collection in the document store.
pub const COUNTERS_COLLECTION: &str = "counters";

/// A document keyed by `_id`, as written to or read from the document store.
#[derive(Debug, Clone, PartialEq)]
pub struct DocumentRecord {
    pub id: i64,
    pub fields: Vec<(String, FieldValue)>,
}

impl DocumentRecord {
    pub fn get(&self, name: &str) -> Option<&FieldValue> {
        self.fields.iter().find(|(n, _)| n == name).map(|(_, v)| v)
    }

    pub fn field_map(&self) -> BTreeMap<String, FieldValue> {
        self.fields.iter().cloned().collect()
    }
}

/// Equality filter for `delete_many`. An empty filter matches every document.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DocumentFilter {
    pub equals: Vec<(String, FieldValue)>,
}

impl DocumentFilter {
    pub fn all() -> Self {
        Self::default()
    }

    pub fn field(mut self, name: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        self.equals.push((name.into(), value.into()));
        self
    }

    pub fn matches(&self, document: &DocumentRecord) -> bool {
        self.equals.iter().all(|(name, expected)| {
            if name == "_id" {
                return expected.as_i64() == Some(document.id);
            }
            document.get(name) == Some(expected)
        })
    }
}

/// A write statement for the relational store.
///
/// Statements are structured so that in-memory stores can apply them without
/// parsing SQL; [`Statement::sql`] renders the parameterized form for MySQL.
#[derive(Debug, Clone, PartialEq)]
pub enum Statement {
    /// `INSERT INTO table (columns...) VALUES (?, ...)`
    Insert {
        table: EntityKind,
        columns: Vec<&'static str>,
        values: Vec<FieldValue>,
    },
    /// `DELETE FROM table`
    DeleteAll { table: EntityKind },
}

impl Statement {
    pub fn table(&self) -> EntityKind {
        match self {
            Statement::Insert { table, .. } | Statement::DeleteAll { table } => *table,
        }
    }

    pub fn sql(&self) -> String {
        match self {
            Statement::Insert { table, columns, .. } => {
                let placeholders: Vec<&str> = columns.iter().map(|_| "?").collect();
                format!(
                    "INSERT INTO `{}` ({}) VALUES ({})",
                    table.name(),
                    columns
                        .iter()
                        .map(|c| format!("`{c}`"))
                        .collect::<Vec<_>>()
                        .join(", "),
                    placeholders.join(", ")
                )
            }
            Statement::DeleteAll { table } => format!("DELETE FROM `{}`", table.name()),
        }
    }

    pub fn params(&self) -> &[FieldValue] {
        match self {
            Statement::Insert { values, .. } => values,
            Statement::DeleteAll { .. } => &[],
        }
    }
}

/// `SELECT COUNT(*) FROM table WHERE column = ?`
#[derive(Debug, Clone, PartialEq)]
pub struct CountQuery {
    pub table: EntityKind,
    pub column: &'static str,
    pub value: FieldValue,
}

impl CountQuery {
    pub fn new(table: EntityKind, column: &'static str, value: impl Into<FieldValue>) -> Self {
        Self {
            table,
            column,
            value: value.into(),
        }
    }

    pub fn sql(&self) -> String {
        format!(
            "SELECT COUNT(*) FROM `{}` WHERE `{}` = ?",
            self.table.name(),
            self.column
        )
    }
}

/// A row read back from the relational store, ID column split out.
#[derive(Debug, Clone, PartialEq)]
pub struct RelationalRow {
    pub id: i64,
    pub values: Vec<(String, FieldValue)>,
}

impl RelationalRow {
    pub fn field_map(&self) -> BTreeMap<String, FieldValue> {
        self.values.iter().cloned().collect()
    }
}

/// Document store capability (MongoDB in production).
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Insert one document into a collection.
    async fn insert(&self, collection: &str, document: DocumentRecord) -> Result<()>;

    /// Delete every document matching `filter`, returning how many were removed.
    async fn delete_many(&self, collection: &str, filter: &DocumentFilter) -> Result<u64>;

    /// Atomically increment the named counter and return its new value.
    ///
    /// A missing counter is created at zero before the increment, so the first
    /// call returns 1.
    async fn find_and_increment_counter(&self, name: &str) -> Result<i64>;

    /// Set the named counter, creating it if absent.
    async fn upsert_counter(&self, name: &str, value: i64) -> Result<()>;

    /// Read every document of a collection.
    async fn find_all(&self, collection: &str) -> Result<Vec<DocumentRecord>>;
}

/// Relational store capability (MySQL in production).
#[async_trait]
pub trait RelationalStore: Send + Sync {
    /// Execute a parameterized write, returning the affected row count.
    async fn execute(&self, statement: &Statement) -> Result<u64>;

    async fn fetch_count(&self, query: &CountQuery) -> Result<u64>;

    /// Commit pending writes.
    async fn commit(&self) -> Result<()>;

    /// Read every row of a table, ordered by ID.
    async fn fetch_rows(&self, table: EntityKind) -> Result<Vec<RelationalRow>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_sql_uses_positional_placeholders() {
        let stmt = Statement::Insert {
            table: EntityKind::ChatMembers,
            columns: vec!["chat_member_id", "chat_id", "user_id"],
            values: vec![1.into(), 2.into(), 3.into()],
        };
        assert_eq!(
            stmt.sql(),
            "INSERT INTO `chat_members` (`chat_member_id`, `chat_id`, `user_id`) VALUES (?, ?, ?)"
        );
        assert_eq!(stmt.params().len(), 3);
    }

    #[test]
    fn test_delete_all_sql() {
        let stmt = Statement::DeleteAll {
            table: EntityKind::Chats,
        };
        assert_eq!(stmt.sql(), "DELETE FROM `chats`");
        assert!(stmt.params().is_empty());
    }

    #[test]
    fn test_count_query_sql() {
        let query = CountQuery::new(EntityKind::UserProfiles, "email", "a@b.c");
        assert_eq!(
            query.sql(),
            "SELECT COUNT(*) FROM `user_profiles` WHERE `email` = ?"
        );
    }

    #[test]
    fn test_document_filter_matching() {
        let doc = DocumentRecord {
            id: 4,
            fields: vec![("role".to_string(), "member".into())],
        };
        assert!(DocumentFilter::all().matches(&doc));
        assert!(DocumentFilter::all().field("role", "member").matches(&doc));
        assert!(DocumentFilter::all().field("_id", 4i64).matches(&doc));
        assert!(!DocumentFilter::all().field("role", "owner").matches(&doc));
    }
}
