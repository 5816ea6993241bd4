//! Sequence allocation shared by both stores.

use crate::error::Result;
use crate::schema::EntityKind;
use crate::store::DocumentStore;
use std::sync::Arc;
use tracing::debug;

/// Issues per-kind surrogate keys from counters kept in the document store.
///
/// Every ID is produced by the store's atomic increment, never by a
/// read-then-write in this process, so allocators on several tasks or
/// processes sharing one store still hand out distinct IDs.
#[derive(Clone)]
pub struct SequenceAllocator {
    store: Arc<dyn DocumentStore>,
    kinds: Vec<EntityKind>,
}

impl SequenceAllocator {
    /// Allocator over the counters of every seeded kind.
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self {
            store,
            kinds: EntityKind::ALL.to_vec(),
        }
    }

    /// Allocate the next ID for `kind`. The first ID after a reset is 1.
    pub async fn next_id(&self, kind: EntityKind) -> Result<i64> {
        let id = self.store.find_and_increment_counter(kind.name()).await?;
        debug!("Allocated {} id {}", kind, id);
        Ok(id)
    }

    /// Set every known counter back to zero.
    pub async fn reset_all(&self) -> Result<()> {
        for kind in &self.kinds {
            self.store.upsert_counter(kind.name(), 0).await?;
        }
        debug!("Reset {} sequence counters", self.kinds.len());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::MemoryDocumentStore;
    use std::collections::HashSet;

    #[tokio::test]
    async fn test_next_id_starts_at_one_per_kind() {
        let allocator = SequenceAllocator::new(Arc::new(MemoryDocumentStore::new()));

        assert_eq!(allocator.next_id(EntityKind::UserProfiles).await.unwrap(), 1);
        assert_eq!(allocator.next_id(EntityKind::UserProfiles).await.unwrap(), 2);
        assert_eq!(allocator.next_id(EntityKind::Chats).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_reset_all_restarts_every_counter() {
        let store = Arc::new(MemoryDocumentStore::new());
        let allocator = SequenceAllocator::new(store.clone());

        for kind in EntityKind::ALL {
            allocator.next_id(kind).await.unwrap();
            allocator.next_id(kind).await.unwrap();
        }
        allocator.reset_all().await.unwrap();

        for kind in EntityKind::ALL {
            assert_eq!(store.counter(kind.name()), Some(0));
            assert_eq!(allocator.next_id(kind).await.unwrap(), 1);
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_allocations_never_repeat() {
        let allocator = SequenceAllocator::new(Arc::new(MemoryDocumentStore::new()));

        let mut handles = Vec::new();
        for _ in 0..8 {
            let allocator = allocator.clone();
            handles.push(tokio::spawn(async move {
                let mut ids = Vec::new();
                for _ in 0..50 {
                    ids.push(allocator.next_id(EntityKind::ChatMembers).await.unwrap());
                }
                ids
            }));
        }

        let mut seen = HashSet::new();
        for handle in handles {
            for id in handle.await.unwrap() {
                assert!(seen.insert(id), "id {id} allocated twice");
            }
        }
        assert_eq!(seen.len(), 400);
        assert_eq!(seen.iter().max(), Some(&400));
    }
}
