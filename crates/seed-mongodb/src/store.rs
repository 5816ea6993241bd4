//! MongoDB implementation of the document-store capability.

use crate::convert::{counter_value, from_bson_document, to_bson_document, BsonValue};
use crate::error::classify;
use async_trait::async_trait;
use bson::{doc, Document};
use mongodb::options::ReturnDocument;
use mongodb::{Client, Collection, Database};
use seed_core::store::COUNTERS_COLLECTION;
use seed_core::{DocumentFilter, DocumentRecord, DocumentStore, Result, SeedError};
use tracing::{debug, info};

/// Field holding a counter's current value.
pub const SEQUENCE_FIELD: &str = "sequence_value";

/// Document store backed by one MongoDB database.
pub struct MongoDocumentStore {
    database: Database,
}

impl MongoDocumentStore {
    /// Connect and check that the database answers.
    ///
    /// # Arguments
    ///
    /// * `connection_string` - MongoDB connection string (e.g., "mongodb://localhost:27017")
    /// * `database_name` - Name of the database to seed
    pub async fn connect(connection_string: &str, database_name: &str) -> Result<Self> {
        let client = Client::with_uri_str(connection_string)
            .await
            .map_err(|e| classify(database_name, e))?;
        let database = client.database(database_name);

        // Test connection
        database
            .list_collection_names()
            .await
            .map_err(|e| classify(database_name, e))?;

        info!("Connected to MongoDB database '{}'", database_name);
        Ok(Self { database })
    }

    pub fn database(&self) -> &Database {
        &self.database
    }

    fn collection(&self, name: &str) -> Collection<Document> {
        self.database.collection(name)
    }

    fn counters(&self) -> Collection<Document> {
        self.collection(COUNTERS_COLLECTION)
    }
}

fn filter_document(filter: &DocumentFilter) -> Document {
    let mut doc = Document::new();
    for (name, value) in &filter.equals {
        doc.insert(name.as_str(), BsonValue::from(value).into_inner());
    }
    doc
}

#[async_trait]
impl DocumentStore for MongoDocumentStore {
    async fn insert(&self, collection: &str, document: DocumentRecord) -> Result<()> {
        self.collection(collection)
            .insert_one(to_bson_document(&document))
            .await
            .map_err(|e| classify(collection, e))?;
        Ok(())
    }

    async fn delete_many(&self, collection: &str, filter: &DocumentFilter) -> Result<u64> {
        let result = self
            .collection(collection)
            .delete_many(filter_document(filter))
            .await
            .map_err(|e| classify(collection, e))?;
        Ok(result.deleted_count)
    }

    async fn find_and_increment_counter(&self, name: &str) -> Result<i64> {
        let counter = self
            .counters()
            .find_one_and_update(doc! { "_id": name }, doc! { "$inc": { SEQUENCE_FIELD: 1_i64 } })
            .upsert(true)
            .return_document(ReturnDocument::After)
            .await
            .map_err(|e| classify(COUNTERS_COLLECTION, e))?
            .ok_or_else(|| {
                SeedError::StorageUnavailable(format!("counter '{name}' missing after upsert"))
            })?;

        counter_value(&counter, SEQUENCE_FIELD).ok_or_else(|| {
            SeedError::decode(
                COUNTERS_COLLECTION,
                format!("counter '{name}' has no integer {SEQUENCE_FIELD}"),
            )
        })
    }

    async fn upsert_counter(&self, name: &str, value: i64) -> Result<()> {
        self.counters()
            .update_one(doc! { "_id": name }, doc! { "$set": { SEQUENCE_FIELD: value } })
            .upsert(true)
            .await
            .map_err(|e| classify(COUNTERS_COLLECTION, e))?;
        debug!("Counter '{}' set to {}", name, value);
        Ok(())
    }

    async fn find_all(&self, collection: &str) -> Result<Vec<DocumentRecord>> {
        let mut cursor = self
            .collection(collection)
            .find(doc! {})
            .sort(doc! { "_id": 1 })
            .await
            .map_err(|e| classify(collection, e))?;

        let mut records = Vec::new();
        while cursor.advance().await.map_err(|e| classify(collection, e))? {
            let doc = cursor
                .deserialize_current()
                .map_err(|e| classify(collection, e))?;
            records.push(from_bson_document(collection, &doc)?);
        }
        Ok(records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use seed_core::FieldValue;

    #[test]
    fn test_empty_filter_matches_everything() {
        assert!(filter_document(&DocumentFilter::all()).is_empty());
    }

    #[test]
    fn test_filter_document_uses_bson_values() {
        let filter = DocumentFilter::all()
            .field("role", "member")
            .field("chat_id", FieldValue::Int64(3));
        let doc = filter_document(&filter);
        assert_eq!(doc.get_str("role").unwrap(), "member");
        assert_eq!(doc.get_i64("chat_id").unwrap(), 3);
    }
}
