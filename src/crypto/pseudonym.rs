use std::fmt::Display;
use std::str::FromStr;

use data_encoding::HEXLOWER;
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use thiserror::Error;

pub type HmacSha256 = Hmac<Sha256>;

/// Length of a pseudonym in hex characters.
pub const PSEUDONYM_LENGTH: usize = 64;

/// A stable, one-way identifier standing in for a raw voter credential.
///
/// Anyone holding the raw identifier (and the secret, if keyed) can recompute
/// and match it: this is pseudonymity, not unlinkability.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Pseudonym(String);

impl Pseudonym {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for Pseudonym {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for Pseudonym {
    type Err = PseudonymParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.len() != PSEUDONYM_LENGTH {
            return Err(PseudonymParseError::InvalidLength(s.len()));
        }
        if let Some(c) = s.chars().find(|c| !matches!(c, '0'..='9' | 'a'..='f')) {
            return Err(PseudonymParseError::InvalidChar(c));
        }
        Ok(Self(s.to_string()))
    }
}

impl TryFrom<String> for Pseudonym {
    type Error = PseudonymParseError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<Pseudonym> for String {
    fn from(pseudonym: Pseudonym) -> Self {
        pseudonym.0
    }
}

#[derive(Debug, Error)]
pub enum PseudonymParseError {
    #[error("pseudonym must contain exactly 64 characters, found {0}")]
    InvalidLength(usize),
    #[error("pseudonym must be lowercase hex, found '{0}'")]
    InvalidChar(char),
}

/// Derives pseudonyms from raw voter identifiers.
#[derive(Clone)]
pub enum VoterAnonymizer {
    /// Plain SHA-256 of the identifier.
    Unkeyed,
    /// HMAC-SHA256 keyed with a server secret.
    Keyed(Vec<u8>),
}

impl VoterAnonymizer {
    /// Keyed if a secret is configured, otherwise a plain hash.
    pub fn new(secret: Option<&[u8]>) -> Self {
        match secret {
            Some(secret) => Self::Keyed(secret.to_vec()),
            None => Self::Unkeyed,
        }
    }

    pub fn anonymize(&self, raw_identifier: &str) -> Pseudonym {
        let digest = match self {
            Self::Unkeyed => Sha256::digest(raw_identifier.as_bytes()).to_vec(),
            Self::Keyed(secret) => {
                let mut hmac =
                    HmacSha256::new_from_slice(secret).expect("HMAC can take key of any size");
                hmac.update(raw_identifier.as_bytes());
                hmac.finalize().into_bytes().to_vec()
            }
        };
        Pseudonym(HEXLOWER.encode(&digest))
    }
}

impl std::fmt::Debug for VoterAnonymizer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Unkeyed => f.write_str("Unkeyed"),
            Self::Keyed(_) => f.write_str("Keyed(..)"),
        }
    }
}
