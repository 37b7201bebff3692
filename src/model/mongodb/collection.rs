use log::debug;
use mongodb::{
    bson::{doc, Document},
    error::Error as DbError,
    options::IndexOptions,
    Database, IndexModel,
};

use crate::model::store::VOTES;

/// Ensure that all the required indexes exist on the given database.
///
/// Record keys live in `_id`, which is always unique; the extra index keeps
/// pseudonym lookups on votes unique and fast.
///
/// This operation is idempotent.
pub async fn ensure_indexes_exist(db: &Database) -> Result<(), DbError> {
    debug!("Ensuring collection indexes exist");

    let unique = IndexOptions::builder().unique(true).build();

    let vote_index = IndexModel::builder()
        .keys(doc! {"pseudonym": 1})
        .options(unique)
        .build();
    db.collection::<Document>(VOTES)
        .create_index(vote_index, None)
        .await?;

    Ok(())
}
