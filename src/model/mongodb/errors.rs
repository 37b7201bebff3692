//! The mongodb crate doesn't expose server error codes as constants, so the
//! ones we rely on live here.

use mongodb::error::{Error as DbError, ErrorKind, WriteFailure};

/// E11000: a unique index (including `_id`) rejected the write.
pub const DUPLICATE_KEY: i32 = 11000;

/// Return true if the given error is a duplicate key write error.
pub fn is_duplicate_key_error(err: &DbError) -> bool {
    match *err.kind {
        ErrorKind::Write(WriteFailure::WriteError(ref e)) => e.code == DUPLICATE_KEY,
        _ => false,
    }
}
