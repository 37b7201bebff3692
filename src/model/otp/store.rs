use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use super::OtpRecord;

/// Expiring key-value storage for live OTP records.
///
/// Implementations must make [`OtpStore::update`] atomic per identifier: no other
/// `insert` or `update` for the same identifier may interleave with it.
pub trait OtpStore: Send + Sync {
    /// Store `record`, replacing any previous record for `identifier`.
    fn insert(&self, identifier: &str, record: OtpRecord);

    /// Run `f` on the slot for `identifier` while holding it exclusively.
    /// Leaving the slot as `None` deletes the record.
    fn update(&self, identifier: &str, f: &mut dyn FnMut(&mut Option<OtpRecord>));

    /// Delete every record for which `expired` holds, returning how many were removed.
    fn purge(&self, expired: &dyn Fn(&OtpRecord) -> bool) -> usize;
}

/// Process-local OTP storage. Records do not survive a restart.
#[derive(Debug, Default)]
pub struct MemoryOtpStore {
    records: Mutex<HashMap<String, OtpRecord>>,
}

impl MemoryOtpStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live records.
    pub fn len(&self) -> usize {
        self.records().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    // A panic while holding the lock cannot leave a record half-written, so
    // recovering from poisoning is safe.
    fn records(&self) -> MutexGuard<'_, HashMap<String, OtpRecord>> {
        self.records.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl OtpStore for MemoryOtpStore {
    fn insert(&self, identifier: &str, record: OtpRecord) {
        self.records().insert(identifier.to_string(), record);
    }

    fn update(&self, identifier: &str, f: &mut dyn FnMut(&mut Option<OtpRecord>)) {
        let mut records = self.records();
        let mut slot = records.remove(identifier);
        f(&mut slot);
        if let Some(record) = slot {
            records.insert(identifier.to_string(), record);
        }
    }

    fn purge(&self, expired: &dyn Fn(&OtpRecord) -> bool) -> usize {
        let mut records = self.records();
        let before = records.len();
        records.retain(|_, record| !expired(record));
        before - records.len()
    }
}
