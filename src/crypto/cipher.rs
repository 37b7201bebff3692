use std::fmt::{Debug, Formatter};

use aes::Aes256;
use cbc::cipher::{block_padding::Pkcs7, BlockDecryptMut, BlockEncryptMut, KeyIvInit};
use data_encoding::{DecodeError, BASE64};
use rand::RngCore;
use sha2::Sha256;
use thiserror::Error;

type Aes256CbcEnc = cbc::Encryptor<Aes256>;
type Aes256CbcDec = cbc::Decryptor<Aes256>;

/// Length of the derived AES-256 key in bytes.
pub const KEY_LENGTH: usize = 32;
/// AES block size, which is also the IV length.
pub const BLOCK_SIZE: usize = 16;

/// Encrypts and decrypts individual field values at rest.
///
/// Output is `base64(IV ‖ AES-256-CBC(PKCS#7(plaintext)))` with a fresh IV per call.
/// CBC gives confidentiality only: a modified ciphertext either fails the padding
/// check or decrypts to a different value, but there is no authentication tag.
#[derive(Clone)]
pub struct SymmetricCipher {
    key: [u8; KEY_LENGTH],
}

impl SymmetricCipher {
    /// Derive the key from `secret` and `salt` with PBKDF2-HMAC-SHA256.
    pub fn new(secret: &[u8], salt: &[u8], rounds: u32) -> Self {
        let mut key = [0; KEY_LENGTH];
        pbkdf2::pbkdf2_hmac::<Sha256>(secret, salt, rounds, &mut key);
        Self { key }
    }

    pub fn encrypt(&self, plaintext: &str) -> String {
        let mut iv = [0; BLOCK_SIZE];
        rand::thread_rng().fill_bytes(&mut iv);

        let ciphertext = Aes256CbcEnc::new(&self.key.into(), &iv.into())
            .encrypt_padded_vec_mut::<Pkcs7>(plaintext.as_bytes());

        let mut output = Vec::with_capacity(BLOCK_SIZE + ciphertext.len());
        output.extend_from_slice(&iv);
        output.extend_from_slice(&ciphertext);
        BASE64.encode(&output)
    }

    pub fn decrypt(&self, ciphertext: &str) -> Result<String, CryptoError> {
        let bytes = BASE64.decode(ciphertext.as_bytes())?;
        // At least the IV plus one block of (padded) data.
        if bytes.len() < 2 * BLOCK_SIZE || bytes.len() % BLOCK_SIZE != 0 {
            return Err(CryptoError::Length(bytes.len()));
        }
        let (iv, body) = bytes.split_at(BLOCK_SIZE);

        let plaintext = Aes256CbcDec::new_from_slices(&self.key, iv)
            .map_err(|_| CryptoError::Length(bytes.len()))?
            .decrypt_padded_vec_mut::<Pkcs7>(body)
            .map_err(|_| CryptoError::Padding)?;

        String::from_utf8(plaintext).map_err(|_| CryptoError::Encoding)
    }
}

impl Debug for SymmetricCipher {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        // Never print key material.
        f.debug_struct("SymmetricCipher").finish_non_exhaustive()
    }
}

/// Reasons a ciphertext could not be decrypted.
#[derive(Debug, Error)]
pub enum CryptoError {
    #[error("ciphertext is not valid base64: {0}")]
    Base64(#[from] DecodeError),
    #[error("ciphertext has invalid length {0}")]
    Length(usize),
    #[error("padding check failed")]
    Padding,
    #[error("decrypted value is not valid UTF-8")]
    Encoding,
}
