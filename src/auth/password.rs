//! Credential hashing with PBKDF2-HMAC-SHA256.
//!
//! Encoded form: `pbkdf2-sha256$<rounds>$<salt b64>$<hash b64>`.

use base64::engine::general_purpose::STANDARD_NO_PAD;
use base64::Engine;
use pbkdf2::pbkdf2_hmac;
use rand::RngCore;
use sha2::Sha256;
use subtle::ConstantTimeEq;

use crate::types::{Error, Result};

const SCHEME: &str = "pbkdf2-sha256";
const SALT_LEN: usize = 16;
const HASH_LEN: usize = 32;

pub fn hash_password(password: &str, rounds: u32) -> Result<String> {
    if rounds == 0 {
        return Err(Error::validation("password rounds must be positive"));
    }
    let mut salt = [0u8; SALT_LEN];
    rand::thread_rng().fill_bytes(&mut salt);

    let mut hash = [0u8; HASH_LEN];
    pbkdf2_hmac::<Sha256>(password.as_bytes(), &salt, rounds, &mut hash);

    Ok(format!(
        "{}${}${}${}",
        SCHEME,
        rounds,
        STANDARD_NO_PAD.encode(salt),
        STANDARD_NO_PAD.encode(hash)
    ))
}

/// Check a password against an encoded hash. A malformed hash never matches.
pub fn verify_password(password: &str, encoded: &str) -> bool {
    let mut parts = encoded.split('$');
    let (Some(SCHEME), Some(rounds), Some(salt), Some(expected), None) = (
        parts.next(),
        parts.next(),
        parts.next(),
        parts.next(),
        parts.next(),
    ) else {
        return false;
    };

    let Ok(rounds) = rounds.parse::<u32>() else {
        return false;
    };
    let (Ok(salt), Ok(expected)) = (
        STANDARD_NO_PAD.decode(salt),
        STANDARD_NO_PAD.decode(expected),
    ) else {
        return false;
    };
    if rounds == 0 || expected.is_empty() {
        return false;
    }

    let mut actual = vec![0u8; expected.len()];
    pbkdf2_hmac::<Sha256>(password.as_bytes(), &salt, rounds, &mut actual);
    actual.as_slice().ct_eq(expected.as_slice()).into()
}
