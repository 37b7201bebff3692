//! Pure, stateless cryptographic primitives.
//!
//! Everything here is safe to call from any number of threads at once.

pub mod cipher;
pub mod password;
pub mod pseudonym;
pub mod signature;

pub use cipher::{CryptoError, SymmetricCipher};
pub use password::{hash_password, verify_password};
pub use pseudonym::{Pseudonym, VoterAnonymizer};
pub use signature::{KeyPair, SignatureError};
