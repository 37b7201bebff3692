use std::collections::{BTreeMap, HashMap};

use mongodb::bson::{Bson, Document};
use rocket::tokio::sync::Mutex;

use super::{DocumentStore, InsertOutcome, StoreError, KEY_FIELD};

type Collection = BTreeMap<String, Document>;

/// A process-local document store, used when no database is configured and in tests.
///
/// A single lock covers all collections, so every operation is atomic.
#[derive(Debug, Default)]
pub struct MemoryStore {
    collections: Mutex<HashMap<String, Collection>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn with_key(key: &str, mut record: Document) -> Document {
    record.insert(KEY_FIELD, key);
    record
}

#[rocket::async_trait]
impl DocumentStore for MemoryStore {
    async fn get(&self, collection: &str, key: &str) -> Result<Option<Document>, StoreError> {
        let collections = self.collections.lock().await;
        Ok(collections
            .get(collection)
            .and_then(|records| records.get(key))
            .cloned())
    }

    async fn set(&self, collection: &str, key: &str, record: Document) -> Result<(), StoreError> {
        let mut collections = self.collections.lock().await;
        collections
            .entry(collection.to_string())
            .or_default()
            .insert(key.to_string(), with_key(key, record));
        Ok(())
    }

    async fn query_by_field(
        &self,
        collection: &str,
        field: &str,
        value: &str,
    ) -> Result<Vec<Document>, StoreError> {
        let collections = self.collections.lock().await;
        let matches = collections
            .get(collection)
            .map(|records| {
                records
                    .values()
                    .filter(|record| matches!(record.get(field), Some(Bson::String(s)) if s == value))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default();
        Ok(matches)
    }

    async fn conditional_insert(
        &self,
        collection: &str,
        key: &str,
        record: Document,
    ) -> Result<InsertOutcome, StoreError> {
        let mut collections = self.collections.lock().await;
        let records = collections.entry(collection.to_string()).or_default();
        if records.contains_key(key) {
            return Ok(InsertOutcome::Conflict);
        }
        records.insert(key.to_string(), with_key(key, record));
        Ok(InsertOutcome::Inserted)
    }

    async fn list(&self, collection: &str) -> Result<Vec<Document>, StoreError> {
        let collections = self.collections.lock().await;
        Ok(collections
            .get(collection)
            .map(|records| records.values().cloned().collect())
            .unwrap_or_default())
    }
}
