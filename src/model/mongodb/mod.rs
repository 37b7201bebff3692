mod collection;
mod errors;
mod store;

pub use collection::ensure_indexes_exist;
pub use errors::{is_duplicate_key_error, DUPLICATE_KEY};
pub use store::MongoStore;
