//! Password hashing: PBKDF2-HMAC-SHA256 with a random salt.
//!
//! Stored format: `pbkdf2-sha256$<iterations>$<salt hex>$<hash hex>`.

use pbkdf2::pbkdf2_hmac;
use rand::RngCore;
use sha2::Sha256;

use crate::Result;

const SCHEME: &str = "pbkdf2-sha256";
const SALT_LEN: usize = 16;

/// Hash a password for storage.
pub fn hash_password(password: &str, iterations: u32) -> Result<String> {
    let mut salt = [0u8; SALT_LEN];
    rand::thread_rng().fill_bytes(&mut salt);

    let derived = derive(password.as_bytes(), &salt, iterations);
    Ok(format!(
        "{}${}${}${}",
        SCHEME,
        iterations,
        hex::encode(salt),
        hex::encode(derived)
    ))
}

/// Check a password against a stored hash. Malformed hashes never match.
pub fn verify_password(password: &str, stored: &str) -> Result<bool> {
    let parts: Vec<&str> = stored.split('$').collect();
    let [scheme, iterations, salt, expected] = parts.as_slice() else {
        return Ok(false);
    };
    if *scheme != SCHEME {
        return Ok(false);
    }
    let (Ok(iterations), Ok(salt), Ok(expected)) = (
        iterations.parse::<u32>(),
        hex::decode(salt),
        hex::decode(expected),
    ) else {
        return Ok(false);
    };

    let derived = derive(password.as_bytes(), &salt, iterations);
    Ok(constant_time_eq(&derived, &expected))
}

fn derive(password: &[u8], salt: &[u8], iterations: u32) -> [u8; 32] {
    let mut output = [0u8; 32];
    pbkdf2_hmac::<Sha256>(password, salt, iterations.max(1), &mut output);
    output
}

fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}
