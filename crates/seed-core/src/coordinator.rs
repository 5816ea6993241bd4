//! Dual-write coordination.
//!
//! Each `add_*`/`create_*` call allocates an ID, builds one canonical record
//! and writes it to the document store, then to the relational store, then
//! commits the relational write. A relational failure after the document
//! insert is not compensated: the error propagates and the run aborts.

use crate::allocator::SequenceAllocator;
use crate::error::Result;
use crate::guard::UniquenessGuard;
use crate::projection::{to_document, to_insert_statement};
use crate::record::{now_millis, CanonicalRecord, Chat, ChatMember, UserProfile};
use crate::schema::EntityKind;
use crate::store::{DocumentStore, RelationalStore};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::debug;

/// Time spent waiting on each store during dual writes.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct StoreTimings {
    /// Counter increments (served by the document store).
    pub allocation: Duration,
    /// Document inserts.
    pub document: Duration,
    /// Uniqueness queries, inserts and commits on the relational store.
    pub relational: Duration,
}

impl StoreTimings {
    pub fn total(&self) -> Duration {
        self.allocation + self.document + self.relational
    }

    pub fn accumulate(&mut self, other: &StoreTimings) {
        self.allocation += other.allocation;
        self.document += other.document;
        self.relational += other.relational;
    }
}

/// Writes every record to both stores under one allocated ID.
pub struct DualWriter {
    documents: Arc<dyn DocumentStore>,
    relational: Arc<dyn RelationalStore>,
    allocator: SequenceAllocator,
    guard: UniquenessGuard,
    timings: StoreTimings,
}

impl DualWriter {
    pub fn new(documents: Arc<dyn DocumentStore>, relational: Arc<dyn RelationalStore>) -> Self {
        let allocator = SequenceAllocator::new(documents.clone());
        let guard = UniquenessGuard::new(relational.clone());
        Self {
            documents,
            relational,
            allocator,
            guard,
            timings: StoreTimings::default(),
        }
    }

    pub fn documents(&self) -> &Arc<dyn DocumentStore> {
        &self.documents
    }

    pub fn relational(&self) -> &Arc<dyn RelationalStore> {
        &self.relational
    }

    pub fn allocator(&self) -> &SequenceAllocator {
        &self.allocator
    }

    pub fn timings(&self) -> StoreTimings {
        self.timings
    }

    /// Return the accumulated timings and start a fresh measurement.
    pub fn take_timings(&mut self) -> StoreTimings {
        std::mem::take(&mut self.timings)
    }

    /// Add a user profile, disambiguating `user_name` and `email` if taken.
    pub async fn add_user_profile(
        &mut self,
        user_name: &str,
        password: &str,
        email: &str,
        modified_by: Option<i64>,
    ) -> Result<i64> {
        let id = self.allocate(EntityKind::UserProfiles).await?;

        let start = Instant::now();
        let user_name = self.guard.ensure_unique_username(user_name, id).await?;
        let email = self.guard.ensure_unique_email(email, id).await?;
        self.timings.relational += start.elapsed();

        let record = CanonicalRecord::UserProfile(UserProfile {
            id,
            user_name,
            password: password.to_string(),
            email,
            is_deleted: false,
            last_modified: now_millis(),
            modified_by,
        });
        self.write(&record).await?;
        Ok(id)
    }

    /// Create a chat owned by `created_by`, which must be an existing user.
    pub async fn create_chat(
        &mut self,
        chat_name: &str,
        is_group: bool,
        created_by: i64,
    ) -> Result<i64> {
        let id = self.allocate(EntityKind::Chats).await?;
        let record = CanonicalRecord::Chat(Chat {
            id,
            chat_name: chat_name.to_string(),
            is_group,
            created_by,
            is_deleted: false,
            last_modified: now_millis(),
            modified_by: created_by,
        });
        self.write(&record).await?;
        Ok(id)
    }

    pub async fn add_chat_member(
        &mut self,
        chat_id: i64,
        user_id: i64,
        role: &str,
        modified_by: Option<i64>,
    ) -> Result<i64> {
        let id = self.allocate(EntityKind::ChatMembers).await?;
        let record = CanonicalRecord::ChatMember(ChatMember {
            id,
            chat_id,
            user_id,
            role: role.to_string(),
            last_modified: now_millis(),
            modified_by,
        });
        self.write(&record).await?;
        Ok(id)
    }

    async fn allocate(&mut self, kind: EntityKind) -> Result<i64> {
        let start = Instant::now();
        let id = self.allocator.next_id(kind).await?;
        self.timings.allocation += start.elapsed();
        Ok(id)
    }

    async fn write(&mut self, record: &CanonicalRecord) -> Result<()> {
        let kind = record.kind();

        let start = Instant::now();
        self.documents
            .insert(kind.name(), to_document(record))
            .await?;
        self.timings.document += start.elapsed();

        let start = Instant::now();
        self.relational.execute(&to_insert_statement(record)).await?;
        self.relational.commit().await?;
        self.timings.relational += start.elapsed();

        debug!("Wrote {} {} to both stores", kind, record.id());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SeedError;
    use crate::record::DEFAULT_MEMBER_ROLE;
    use crate::testing::{MemoryDocumentStore, MemoryRelationalStore};
    use crate::value::FieldValue;

    fn writer() -> (
        DualWriter,
        Arc<MemoryDocumentStore>,
        Arc<MemoryRelationalStore>,
    ) {
        let documents = Arc::new(MemoryDocumentStore::new());
        let relational = Arc::new(MemoryRelationalStore::new());
        let writer = DualWriter::new(documents.clone(), relational.clone());
        (writer, documents, relational)
    }

    #[tokio::test]
    async fn test_user_profile_lands_in_both_stores_under_same_id() {
        let (mut writer, documents, relational) = writer();

        let id = writer
            .add_user_profile("alice", "pw", "alice@example.com", None)
            .await
            .unwrap();
        assert_eq!(id, 1);

        let docs = documents.documents("user_profiles");
        assert_eq!(docs.len(), 1);
        assert_eq!(docs[0].id, 1);
        assert_eq!(docs[0].get("is_deleted"), Some(&FieldValue::Bool(false)));

        let rows = relational.rows(EntityKind::UserProfiles);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].id, 1);
        assert_eq!(rows[0].field_map(), docs[0].field_map());
        assert_eq!(relational.commit_count(), 1);
    }

    #[tokio::test]
    async fn test_duplicate_username_is_suffixed_with_new_id() {
        let (mut writer, documents, _) = writer();

        writer
            .add_user_profile("alice", "pw", "one@example.com", None)
            .await
            .unwrap();
        let second = writer
            .add_user_profile("alice", "pw", "two@example.com", None)
            .await
            .unwrap();

        let docs = documents.documents("user_profiles");
        assert_eq!(
            docs[1].get("user_name"),
            Some(&FieldValue::Text(format!("alice_{second}")))
        );
        assert_eq!(
            docs[1].get("email"),
            Some(&FieldValue::Text("two@example.com".into()))
        );
    }

    #[tokio::test]
    async fn test_chat_and_member_mirror_references() {
        let (mut writer, documents, relational) = writer();

        let user = writer
            .add_user_profile("bob", "pw", "bob@example.com", None)
            .await
            .unwrap();
        let chat = writer.create_chat("lobby", true, user).await.unwrap();
        let member = writer
            .add_chat_member(chat, user, DEFAULT_MEMBER_ROLE, None)
            .await
            .unwrap();

        let chat_doc = &documents.documents("chats")[0];
        assert_eq!(chat_doc.get("created_by"), Some(&FieldValue::Int64(user)));
        assert_eq!(chat_doc.get("modified_by"), Some(&FieldValue::Int64(user)));

        let member_row = &relational.rows(EntityKind::ChatMembers)[0];
        assert_eq!(member_row.id, member);
        assert_eq!(
            member_row.field_map().get("role"),
            Some(&FieldValue::Text("member".into()))
        );
    }

    #[tokio::test]
    async fn test_relational_failure_leaves_document_write_in_place() {
        let (mut writer, documents, relational) = writer();

        // No user 99 exists, so the relational foreign key rejects the chat.
        let err = writer.create_chat("orphan", false, 99).await.unwrap_err();
        assert!(matches!(err, SeedError::ConstraintViolation { .. }));

        assert_eq!(documents.documents("chats").len(), 1);
        assert!(relational.rows(EntityKind::Chats).is_empty());
    }

    #[tokio::test]
    async fn test_malformed_email_aborts_before_any_write() {
        let (mut writer, documents, relational) = writer();

        let err = writer
            .add_user_profile("carol", "pw", "carol.example.com", None)
            .await
            .unwrap_err();
        assert!(matches!(err, SeedError::Validation(_)));
        assert!(documents.documents("user_profiles").is_empty());
        assert!(relational.rows(EntityKind::UserProfiles).is_empty());
    }

    #[tokio::test]
    async fn test_take_timings_resets_measurement() {
        let (mut writer, _, _) = writer();
        writer
            .add_user_profile("dave", "pw", "dave@example.com", None)
            .await
            .unwrap();

        let taken = writer.take_timings();
        assert!(taken.total() >= taken.document);
        assert_eq!(writer.timings(), StoreTimings::default());
    }
}
