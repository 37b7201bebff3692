//! The document-store collaborator.
//!
//! Records are BSON documents addressed by `(collection, key)`. The key is kept in
//! the document's `_id` field, so uniqueness of keys is what makes
//! [`DocumentStore::conditional_insert`] atomic.

use std::sync::Arc;

use mongodb::bson::{self, Document};
use serde::{de::DeserializeOwned, Serialize};
use thiserror::Error;

mod memory;

pub use memory::MemoryStore;

/// Name of the field holding each record's key.
pub const KEY_FIELD: &str = "_id";

/// Accepted votes, keyed by pseudonym.
pub const VOTES: &str = "votes";
/// Registered voter profiles, keyed by pseudonym.
pub const VOTERS: &str = "voters";
/// Declared election results.
pub const ELECTION_RESULTS: &str = "election_results";

/// Shared handle on whichever store the server was configured with.
pub type Store = Arc<dyn DocumentStore>;

/// Result of a conditional insert.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertOutcome {
    Inserted,
    /// A record with the same key already existed; nothing was written.
    Conflict,
}

#[rocket::async_trait]
pub trait DocumentStore: Send + Sync {
    /// Fetch the record stored under `key`.
    async fn get(&self, collection: &str, key: &str) -> Result<Option<Document>, StoreError>;

    /// Store `record` under `key`, replacing anything already there.
    async fn set(&self, collection: &str, key: &str, record: Document) -> Result<(), StoreError>;

    /// All records whose string field `field` equals `value`.
    async fn query_by_field(
        &self,
        collection: &str,
        field: &str,
        value: &str,
    ) -> Result<Vec<Document>, StoreError>;

    /// Atomically store `record` under `key` only if no record with that key exists.
    async fn conditional_insert(
        &self,
        collection: &str,
        key: &str,
        record: Document,
    ) -> Result<InsertOutcome, StoreError>;

    /// Every record in `collection`.
    async fn list(&self, collection: &str) -> Result<Vec<Document>, StoreError>;
}

/// Serialize a typed record into a document keyed by `key`.
pub fn to_record<T: Serialize>(key: &str, value: &T) -> Result<Document, StoreError> {
    let mut record = bson::to_document(value)?;
    record.insert(KEY_FIELD, key);
    Ok(record)
}

/// Deserialize a typed record, ignoring the key field.
pub fn from_record<T: DeserializeOwned>(mut record: Document) -> Result<T, StoreError> {
    record.remove(KEY_FIELD);
    Ok(bson::from_document(record)?)
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error(transparent)]
    Db(#[from] mongodb::error::Error),
    #[error("failed to encode record: {0}")]
    Encode(#[from] bson::ser::Error),
    #[error("failed to decode record: {0}")]
    Decode(#[from] bson::de::Error),
}

#[cfg(test)]
mod tests {
    use mongodb::bson::doc;
    use serde::Deserialize;

    use super::*;

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    struct Example {
        some_field: String,
        count: i64,
    }

    #[test]
    fn record_round_trip_keeps_key_separate() {
        let example = Example {
            some_field: "value".to_string(),
            count: 3,
        };
        let record = to_record("key-1", &example).unwrap();
        assert_eq!("key-1", record.get_str(KEY_FIELD).unwrap());
        assert_eq!("value", record.get_str("someField").unwrap());
        assert_eq!(example, from_record::<Example>(record).unwrap());
    }

    #[test]
    fn decode_failure_is_reported() {
        let record = doc! { KEY_FIELD: "k", "someField": 5 };
        assert!(matches!(from_record::<Example>(record), Err(StoreError::Decode(_))));
    }
}
