//! One-time passwords proving control of a phone number or email address.
//!
//! Each identifier has at most one live record. A record is consumed by a
//! successful verification, dropped once it is found to be older than the TTL,
//! and left in place after a wrong guess so the voter can retry until it expires.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use log::debug;
use thiserror::Error;

use crate::clock::Clock;

pub mod code;
pub mod store;

pub use code::Code;
pub use store::{MemoryOtpStore, OtpStore};

/// A live OTP.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OtpRecord {
    pub code: Code,
    pub issued_at: DateTime<Utc>,
}

/// Issues and checks OTPs against an injected store and clock.
pub struct OtpManager {
    store: Box<dyn OtpStore>,
    clock: Arc<dyn Clock>,
    ttl: Duration,
}

impl OtpManager {
    pub fn new(store: impl OtpStore + 'static, clock: Arc<dyn Clock>, ttl: Duration) -> Self {
        Self {
            store: Box::new(store),
            clock,
            ttl,
        }
    }

    /// How long an issued code stays valid.
    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Issue a fresh code for `identifier`, replacing any outstanding one.
    pub fn issue(&self, identifier: &str) -> Code {
        let code = Code::random();
        self.store.insert(
            identifier,
            OtpRecord {
                code,
                issued_at: self.clock.now(),
            },
        );
        debug!("Issued OTP valid for {}s", self.ttl.num_seconds());
        code
    }

    /// Check `code` against the live record for `identifier`, consuming it on success.
    pub fn verify(&self, identifier: &str, code: &Code) -> Result<(), OtpError> {
        let outcome = self.inspect(identifier, code, true);
        match outcome {
            Ok(()) => debug!("OTP verified"),
            Err(err) => debug!("OTP verification failed: {err}"),
        }
        outcome
    }

    /// Check `code` like [`OtpManager::verify`] but leave a matching record live.
    ///
    /// An expired record is still dropped.
    pub fn check(&self, identifier: &str, code: &Code) -> Result<(), OtpError> {
        self.inspect(identifier, code, false)
    }

    fn inspect(&self, identifier: &str, code: &Code, consume: bool) -> Result<(), OtpError> {
        let now = self.clock.now();
        let ttl = self.ttl;
        let mut outcome = Err(OtpError::NotFound);

        self.store
            .update(identifier, &mut |slot: &mut Option<OtpRecord>| {
                let result = match slot.as_ref() {
                    None => Err(OtpError::NotFound),
                    Some(record) if now - record.issued_at > ttl => Err(OtpError::Expired),
                    Some(record) if record.code != *code => Err(OtpError::Invalid),
                    Some(_) => Ok(()),
                };
                // Expiry always drops the record; a wrong guess never does.
                let drop = match result {
                    Ok(()) => consume,
                    Err(OtpError::Expired) => true,
                    Err(_) => false,
                };
                if drop {
                    *slot = None;
                }
                outcome = result;
            });

        outcome
    }

    /// Drop every record older than the TTL.
    pub fn purge_expired(&self) -> usize {
        let now = self.clock.now();
        let ttl = self.ttl;
        self.store.purge(&|record| now - record.issued_at > ttl)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum OtpError {
    #[error("No OTP request found for this identifier")]
    NotFound,
    #[error("OTP has expired")]
    Expired,
    #[error("Invalid OTP")]
    Invalid,
}
