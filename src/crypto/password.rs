use argon2::Config as Argon2Config;
use rand::Rng;

/// Hash a password with argon2 and a fresh random salt, returning the encoded hash.
pub fn hash_password(password: &str) -> Result<String, argon2::Error> {
    // 16 bytes is recommended for password hashing:
    //  https://en.wikipedia.org/wiki/Argon2
    let mut salt = [0_u8; 16];
    rand::thread_rng().fill(&mut salt);
    argon2::hash_encoded(password.as_bytes(), &salt, &Argon2Config::default())
}

/// Check a password against an encoded argon2 hash.
///
/// A malformed hash is an error rather than a mismatch.
pub fn verify_password(encoded_hash: &str, password: &str) -> Result<bool, argon2::Error> {
    argon2::verify_encoded(encoded_hash, password.as_bytes())
}
