//! Cross-store consistency verification.
//!
//! Reads every seeded kind back from both stores, decodes each record to its
//! canonical form and checks the two sides against each other.

use crate::error::Result;
use crate::projection::{from_document, from_row};
use crate::record::CanonicalRecord;
use crate::schema::EntityKind;
use crate::store::{DocumentStore, RelationalStore};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use tracing::{info, warn};

/// Findings of a [`verify`] run. Empty lists mean the stores agree.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConsistencyReport {
    /// Record counts per kind as (document store, relational store).
    pub counts: BTreeMap<EntityKind, (usize, usize)>,
    /// IDs present in the document store only.
    pub missing_in_relational: Vec<(EntityKind, i64)>,
    /// IDs present in the relational store only.
    pub missing_in_document: Vec<(EntityKind, i64)>,
    /// IDs present in both stores whose fields differ.
    pub mismatched: Vec<(EntityKind, i64)>,
    pub duplicate_user_names: Vec<String>,
    pub duplicate_emails: Vec<String>,
    /// (kind, id, field, referenced id) for references to missing records.
    pub dangling_references: Vec<(EntityKind, i64, &'static str, i64)>,
}

impl ConsistencyReport {
    pub fn is_consistent(&self) -> bool {
        self.missing_in_relational.is_empty()
            && self.missing_in_document.is_empty()
            && self.mismatched.is_empty()
            && self.duplicate_user_names.is_empty()
            && self.duplicate_emails.is_empty()
            && self.dangling_references.is_empty()
    }

    pub fn count(&self, kind: EntityKind) -> (usize, usize) {
        self.counts.get(&kind).copied().unwrap_or((0, 0))
    }
}

/// Compare both stores record by record.
pub async fn verify(
    documents: &dyn DocumentStore,
    relational: &dyn RelationalStore,
) -> Result<ConsistencyReport> {
    let mut report = ConsistencyReport::default();
    let mut ids: HashMap<EntityKind, BTreeSet<i64>> = HashMap::new();
    let mut records: Vec<CanonicalRecord> = Vec::new();

    for kind in EntityKind::ALL {
        let doc_records: BTreeMap<i64, CanonicalRecord> = documents
            .find_all(kind.name())
            .await?
            .iter()
            .map(|d| from_document(kind, d).map(|r| (r.id(), r)))
            .collect::<Result<_>>()?;
        let row_records: BTreeMap<i64, CanonicalRecord> = relational
            .fetch_rows(kind)
            .await?
            .iter()
            .map(|r| from_row(kind, r).map(|r| (r.id(), r)))
            .collect::<Result<_>>()?;

        report
            .counts
            .insert(kind, (doc_records.len(), row_records.len()));

        for (id, doc) in &doc_records {
            match row_records.get(id) {
                None => report.missing_in_relational.push((kind, *id)),
                Some(row) if row != doc => report.mismatched.push((kind, *id)),
                Some(_) => {}
            }
        }
        for id in row_records.keys() {
            if !doc_records.contains_key(id) {
                report.missing_in_document.push((kind, *id));
            }
        }

        // References are checked against IDs present in both stores.
        let shared: BTreeSet<i64> = doc_records
            .keys()
            .filter(|id| row_records.contains_key(id))
            .copied()
            .collect();
        ids.insert(kind, shared);
        records.extend(doc_records.into_values());
    }

    let mut user_names: HashMap<&str, usize> = HashMap::new();
    let mut emails: HashMap<&str, usize> = HashMap::new();
    let exists = |kind: EntityKind, id: i64| ids.get(&kind).is_some_and(|set| set.contains(&id));

    for record in &records {
        match record {
            CanonicalRecord::UserProfile(u) => {
                *user_names.entry(u.user_name.as_str()).or_default() += 1;
                *emails.entry(u.email.as_str()).or_default() += 1;
            }
            CanonicalRecord::Chat(c) => {
                if !exists(EntityKind::UserProfiles, c.created_by) {
                    report.dangling_references.push((
                        EntityKind::Chats,
                        c.id,
                        "created_by",
                        c.created_by,
                    ));
                }
            }
            CanonicalRecord::ChatMember(m) => {
                if !exists(EntityKind::Chats, m.chat_id) {
                    report.dangling_references.push((
                        EntityKind::ChatMembers,
                        m.id,
                        "chat_id",
                        m.chat_id,
                    ));
                }
                if !exists(EntityKind::UserProfiles, m.user_id) {
                    report.dangling_references.push((
                        EntityKind::ChatMembers,
                        m.id,
                        "user_id",
                        m.user_id,
                    ));
                }
            }
        }
    }

    report.duplicate_user_names = duplicates(user_names);
    report.duplicate_emails = duplicates(emails);

    if report.is_consistent() {
        info!("Stores are consistent: {:?}", report.counts);
    } else {
        warn!(
            "Stores diverge: {} missing in relational, {} missing in document, {} mismatched, {} dangling references",
            report.missing_in_relational.len(),
            report.missing_in_document.len(),
            report.mismatched.len(),
            report.dangling_references.len()
        );
    }

    Ok(report)
}

fn duplicates(counts: HashMap<&str, usize>) -> Vec<String> {
    let mut dups: Vec<String> = counts
        .into_iter()
        .filter(|(_, n)| *n > 1)
        .map(|(value, _)| value.to_string())
        .collect();
    dups.sort();
    dups
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::projection::{to_document, to_insert_statement};
    use crate::record::{now_millis, Chat, UserProfile};
    use crate::testing::{MemoryDocumentStore, MemoryRelationalStore};

    fn user(id: i64, name: &str, email: &str) -> CanonicalRecord {
        CanonicalRecord::UserProfile(UserProfile {
            id,
            user_name: name.to_string(),
            password: "pw".to_string(),
            email: email.to_string(),
            is_deleted: false,
            last_modified: now_millis(),
            modified_by: None,
        })
    }

    #[tokio::test]
    async fn test_empty_stores_are_consistent() {
        let report = verify(&MemoryDocumentStore::new(), &MemoryRelationalStore::new())
            .await
            .unwrap();
        assert!(report.is_consistent());
        assert_eq!(report.count(EntityKind::Chats), (0, 0));
    }

    #[tokio::test]
    async fn test_document_only_records_are_reported() {
        let documents = MemoryDocumentStore::new();
        // Same user name twice, bypassing the relational unique key.
        for record in [user(1, "a", "a@x.org"), user(2, "a", "b@x.org")] {
            documents
                .insert("user_profiles", to_document(&record))
                .await
                .unwrap();
        }

        let report = verify(&documents, &MemoryRelationalStore::new())
            .await
            .unwrap();
        assert!(!report.is_consistent());
        assert_eq!(
            report.missing_in_relational,
            vec![
                (EntityKind::UserProfiles, 1),
                (EntityKind::UserProfiles, 2)
            ]
        );
        assert_eq!(report.duplicate_user_names, vec!["a".to_string()]);
        assert!(report.duplicate_emails.is_empty());
    }

    #[tokio::test]
    async fn test_field_difference_is_reported_as_mismatch() {
        let documents = MemoryDocumentStore::new();
        let relational = MemoryRelationalStore::new();

        let in_documents = user(1, "alice", "alice@x.org");
        let mut in_rows = in_documents.clone();
        if let CanonicalRecord::UserProfile(u) = &mut in_rows {
            u.password = "changed".to_string();
        }
        documents
            .insert("user_profiles", to_document(&in_documents))
            .await
            .unwrap();
        relational
            .execute(&to_insert_statement(&in_rows))
            .await
            .unwrap();
        relational.commit().await.unwrap();

        let report = verify(&documents, &relational).await.unwrap();
        assert_eq!(report.mismatched, vec![(EntityKind::UserProfiles, 1)]);
        assert!(report.missing_in_relational.is_empty());
        assert!(report.missing_in_document.is_empty());
        assert!(!report.is_consistent());
    }

    #[tokio::test]
    async fn test_creator_missing_from_relational_store_is_dangling() {
        let documents = MemoryDocumentStore::new();
        let chat = CanonicalRecord::Chat(Chat {
            id: 1,
            chat_name: "general".to_string(),
            is_group: true,
            created_by: 1,
            is_deleted: false,
            last_modified: now_millis(),
            modified_by: 1,
        });
        documents
            .insert("user_profiles", to_document(&user(1, "bob", "bob@x.org")))
            .await
            .unwrap();
        documents
            .insert("chats", to_document(&chat))
            .await
            .unwrap();

        let report = verify(&documents, &MemoryRelationalStore::new())
            .await
            .unwrap();
        assert_eq!(
            report.dangling_references,
            vec![(EntityKind::Chats, 1, "created_by", 1)]
        );
    }

    #[tokio::test]
    async fn test_shared_email_is_reported() {
        let documents = MemoryDocumentStore::new();
        for record in [user(1, "a", "same@x.org"), user(2, "b", "same@x.org")] {
            documents
                .insert("user_profiles", to_document(&record))
                .await
                .unwrap();
        }

        let report = verify(&documents, &MemoryRelationalStore::new())
            .await
            .unwrap();
        assert_eq!(report.duplicate_emails, vec!["same@x.org".to_string()]);
        assert!(report.duplicate_user_names.is_empty());
    }
}
