use std::sync::Arc;

use chrono::{DateTime, Utc};
use log::info;
use serde::{Deserialize, Serialize};

use crate::{
    clock::Clock,
    crypto::{hash_password, verify_password, Pseudonym, SymmetricCipher},
    error::{Error, Result},
    model::{
        api::auth::RegisterRequest,
        store::{from_record, to_record, InsertOutcome, Store, VOTERS},
    },
};

pub const MIN_PASSWORD_LENGTH: usize = 8;

const BAD_CREDENTIALS: &str = "No voter found with the provided identity and password";

/// A registered voter as stored. Every personal field is encrypted.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VoterProfile {
    pub pseudonym: Pseudonym,
    pub encrypted_name: String,
    pub encrypted_age: String,
    pub encrypted_gender: String,
    pub encrypted_phone: String,
    pub encrypted_email: String,
    pub password_hash: String,
    pub registered_at: DateTime<Utc>,
}

/// Where a voter's OTPs go.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Contact {
    pub phone: String,
    pub email: String,
}

/// Voter profiles, keyed by pseudonym.
pub struct VoterRegistry {
    store: Store,
    cipher: Arc<SymmetricCipher>,
    clock: Arc<dyn Clock>,
}

impl VoterRegistry {
    pub fn new(store: Store, cipher: Arc<SymmetricCipher>, clock: Arc<dyn Clock>) -> Self {
        Self {
            store,
            cipher,
            clock,
        }
    }

    /// Store a new profile under `pseudonym`, returning where to send its OTPs.
    pub async fn register(
        &self,
        pseudonym: &Pseudonym,
        request: &RegisterRequest,
    ) -> Result<Contact> {
        if request.name.trim().is_empty() {
            return Err(Error::Validation("Name must not be empty".to_string()));
        }
        if request.password.len() < MIN_PASSWORD_LENGTH {
            return Err(Error::Validation(format!(
                "Password must be at least {MIN_PASSWORD_LENGTH} characters"
            )));
        }

        let contact = Contact {
            phone: request.phone.to_string(),
            email: request.email.to_string(),
        };
        let profile = VoterProfile {
            pseudonym: pseudonym.clone(),
            encrypted_name: self.cipher.encrypt(&request.name),
            encrypted_age: self.cipher.encrypt(&request.age.to_string()),
            encrypted_gender: self.cipher.encrypt(&request.gender),
            encrypted_phone: self.cipher.encrypt(&contact.phone),
            encrypted_email: self.cipher.encrypt(&contact.email),
            password_hash: hash_password(&request.password)?,
            registered_at: self.clock.now(),
        };

        let record = to_record(pseudonym.as_str(), &profile)?;
        match self
            .store
            .conditional_insert(VOTERS, pseudonym.as_str(), record)
            .await?
        {
            InsertOutcome::Inserted => {
                info!("Registered new voter");
                Ok(contact)
            }
            InsertOutcome::Conflict => {
                Err(Error::Validation("Voter already registered".to_string()))
            }
        }
    }

    /// Check a returning voter's password.
    ///
    /// An unknown voter and a wrong password are indistinguishable to the caller.
    pub async fn authenticate(&self, pseudonym: &Pseudonym, password: &str) -> Result<Contact> {
        let profile = self
            .profile(pseudonym)
            .await?
            .ok_or_else(|| Error::Unauthorized(BAD_CREDENTIALS.to_string()))?;
        if !verify_password(&profile.password_hash, password)? {
            return Err(Error::Unauthorized(BAD_CREDENTIALS.to_string()));
        }
        self.contact_of(&profile)
    }

    /// Where to send the OTPs of a registered voter.
    pub async fn contact(&self, pseudonym: &Pseudonym) -> Result<Contact> {
        let profile = self.profile(pseudonym).await?.ok_or_else(|| {
            Error::NotFound("No voter registered with this identity".to_string())
        })?;
        self.contact_of(&profile)
    }

    pub async fn profile(&self, pseudonym: &Pseudonym) -> Result<Option<VoterProfile>> {
        match self.store.get(VOTERS, pseudonym.as_str()).await? {
            Some(record) => Ok(Some(from_record(record)?)),
            None => Ok(None),
        }
    }

    fn contact_of(&self, profile: &VoterProfile) -> Result<Contact> {
        Ok(Contact {
            phone: self.cipher.decrypt(&profile.encrypted_phone)?,
            email: self.cipher.decrypt(&profile.encrypted_email)?,
        })
    }
}
