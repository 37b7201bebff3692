//! ECDSA signatures over vote payloads.
//!
//! Keys travel as PEM text (PKCS#8 or SEC1 private keys, SPKI public keys) and
//! signatures as base64 of the fixed 64-byte `r ‖ s` encoding. Data is hashed with
//! SHA-256 before signing.

use data_encoding::{DecodeError, BASE64};
use p256::{
    ecdsa::{
        signature::{Signer, Verifier},
        Signature, SigningKey, VerifyingKey,
    },
    pkcs8::{DecodePrivateKey, DecodePublicKey, EncodePrivateKey, EncodePublicKey, LineEnding},
    PublicKey, SecretKey,
};
use thiserror::Error;

/// A PEM-encoded P-256 key pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyPair {
    pub private_key_pem: String,
    pub public_key_pem: String,
}

/// Generate a fresh key pair from the OS random number generator.
pub fn generate_keypair() -> Result<KeyPair, SignatureError> {
    let secret = SecretKey::random(&mut rand::rngs::OsRng);
    let private_key_pem = secret
        .to_pkcs8_pem(LineEnding::LF)
        .map_err(|err| SignatureError::Encoding(err.to_string()))?
        .to_string();
    let public_key_pem = secret
        .public_key()
        .to_public_key_pem(LineEnding::LF)
        .map_err(|err| SignatureError::Encoding(err.to_string()))?;
    Ok(KeyPair {
        private_key_pem,
        public_key_pem,
    })
}

/// Sign `data` with the PEM-encoded private key, returning a base64 signature.
pub fn sign(data: &[u8], private_key_pem: &str) -> Result<String, SignatureError> {
    let secret = parse_private_key(private_key_pem)?;
    let signature: Signature = SigningKey::from(&secret).sign(data);
    Ok(BASE64.encode(&signature.to_bytes()))
}

/// Check `signature` over `data` against the PEM-encoded public key.
///
/// Returns `Ok(false)` when the signature is well-formed but does not verify, and
/// an error only when the key or signature cannot be parsed at all.
pub fn verify(data: &[u8], signature: &str, public_key_pem: &str) -> Result<bool, SignatureError> {
    let public_key = PublicKey::from_public_key_pem(public_key_pem.trim())
        .map_err(|_| SignatureError::PublicKey)?;
    let bytes = BASE64.decode(signature.as_bytes())?;
    let signature = Signature::from_slice(&bytes).map_err(|_| SignatureError::Signature)?;

    Ok(VerifyingKey::from(&public_key)
        .verify(data, &signature)
        .is_ok())
}

fn parse_private_key(pem: &str) -> Result<SecretKey, SignatureError> {
    let pem = pem.trim();
    SecretKey::from_pkcs8_pem(pem)
        .or_else(|_| SecretKey::from_sec1_pem(pem))
        .map_err(|_| SignatureError::PrivateKey)
}

/// Structurally malformed signing inputs.
#[derive(Debug, Error)]
pub enum SignatureError {
    #[error("private key is not a valid P-256 PEM key")]
    PrivateKey,
    #[error("public key is not a valid P-256 PEM key")]
    PublicKey,
    #[error("signature is not valid base64: {0}")]
    Base64(#[from] DecodeError),
    #[error("signature is not a valid 64-byte ECDSA signature")]
    Signature,
    #[error("failed to encode key: {0}")]
    Encoding(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAYLOAD: &[u8] = b"{\"candidateId\":\"A\",\"pseudonym\":\"abc\"}";

    #[test]
    fn sign_and_verify() {
        let keys = generate_keypair().unwrap();
        let signature = sign(PAYLOAD, &keys.private_key_pem).unwrap();
        assert!(verify(PAYLOAD, &signature, &keys.public_key_pem).unwrap());
    }

    #[test]
    fn signature_encoding() {
        let keys = generate_keypair().unwrap();
        let signature = sign(PAYLOAD, &keys.private_key_pem).unwrap();
        assert_eq!(64, BASE64.decode(signature.as_bytes()).unwrap().len());
    }

    #[test]
    fn mismatched_key_is_false() {
        let signer = generate_keypair().unwrap();
        let other = generate_keypair().unwrap();
        let signature = sign(PAYLOAD, &signer.private_key_pem).unwrap();
        assert!(!verify(PAYLOAD, &signature, &other.public_key_pem).unwrap());
    }

    #[test]
    fn tampered_data_is_false() {
        let keys = generate_keypair().unwrap();
        let signature = sign(PAYLOAD, &keys.private_key_pem).unwrap();
        assert!(!verify(b"{\"candidateId\":\"B\"}", &signature, &keys.public_key_pem).unwrap());
    }

    #[test]
    fn sec1_private_keys_are_accepted() {
        let secret = SecretKey::random(&mut rand::rngs::OsRng);
        let sec1 = secret.to_sec1_pem(LineEnding::LF).unwrap();
        let public = secret.public_key().to_public_key_pem(LineEnding::LF).unwrap();
        let signature = sign(PAYLOAD, &sec1).unwrap();
        assert!(verify(PAYLOAD, &signature, &public).unwrap());
    }

    #[test]
    fn unparsable_public_key_is_an_error() {
        let keys = generate_keypair().unwrap();
        let signature = sign(PAYLOAD, &keys.private_key_pem).unwrap();
        let result = verify(PAYLOAD, &signature, "-----BEGIN PUBLIC KEY-----\nAAAA\n-----END PUBLIC KEY-----");
        assert!(matches!(result, Err(SignatureError::PublicKey)));
    }

    #[test]
    fn unparsable_private_key_is_an_error() {
        assert!(matches!(sign(PAYLOAD, "not a key"), Err(SignatureError::PrivateKey)));
    }

    #[test]
    fn malformed_signature_is_an_error() {
        let keys = generate_keypair().unwrap();
        assert!(matches!(
            verify(PAYLOAD, "%%%", &keys.public_key_pem),
            Err(SignatureError::Base64(_))
        ));
        assert!(matches!(
            verify(PAYLOAD, &BASE64.encode(&[1; 12]), &keys.public_key_pem),
            Err(SignatureError::Signature)
        ));
        // Zero scalars are out of range.
        assert!(matches!(
            verify(PAYLOAD, &BASE64.encode(&[0; 64]), &keys.public_key_pem),
            Err(SignatureError::Signature)
        ));
    }
}
