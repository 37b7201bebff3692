use mongodb::{
    bson::{doc, Document},
    options::ReplaceOptions,
    Collection, Database,
};
use rocket::futures::TryStreamExt;

use crate::model::store::{DocumentStore, InsertOutcome, StoreError, KEY_FIELD};

use super::errors::is_duplicate_key_error;

/// A [`DocumentStore`] backed by a MongoDB database.
///
/// Conditional inserts rely on the server's `_id` uniqueness, so they stay atomic
/// across any number of server processes sharing the database.
#[derive(Debug, Clone)]
pub struct MongoStore {
    db: Database,
}

impl MongoStore {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    fn collection(&self, name: &str) -> Collection<Document> {
        self.db.collection(name)
    }
}

fn with_key(key: &str, mut record: Document) -> Document {
    record.insert(KEY_FIELD, key);
    record
}

#[rocket::async_trait]
impl DocumentStore for MongoStore {
    async fn get(&self, collection: &str, key: &str) -> Result<Option<Document>, StoreError> {
        Ok(self
            .collection(collection)
            .find_one(doc! { KEY_FIELD: key }, None)
            .await?)
    }

    async fn set(&self, collection: &str, key: &str, record: Document) -> Result<(), StoreError> {
        let upsert = ReplaceOptions::builder().upsert(true).build();
        self.collection(collection)
            .replace_one(doc! { KEY_FIELD: key }, with_key(key, record), upsert)
            .await?;
        Ok(())
    }

    async fn query_by_field(
        &self,
        collection: &str,
        field: &str,
        value: &str,
    ) -> Result<Vec<Document>, StoreError> {
        let cursor = self
            .collection(collection)
            .find(doc! { field: value }, None)
            .await?;
        Ok(cursor.try_collect::<Vec<_>>().await?)
    }

    async fn conditional_insert(
        &self,
        collection: &str,
        key: &str,
        record: Document,
    ) -> Result<InsertOutcome, StoreError> {
        match self
            .collection(collection)
            .insert_one(with_key(key, record), None)
            .await
        {
            Ok(_) => Ok(InsertOutcome::Inserted),
            Err(err) if is_duplicate_key_error(&err) => Ok(InsertOutcome::Conflict),
            Err(err) => Err(err.into()),
        }
    }

    async fn list(&self, collection: &str) -> Result<Vec<Document>, StoreError> {
        let cursor = self.collection(collection).find(None, None).await?;
        Ok(cursor.try_collect::<Vec<_>>().await?)
    }
}
