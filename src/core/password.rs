//! Password hashing.
//!
//! Hashes are PBKDF2-HMAC-SHA256, stored as `pbkdf2_sha256$<iterations>$<salt>$<hex key>`,
//! so the iteration count can be raised later without invalidating existing accounts.

use pbkdf2::pbkdf2_hmac;
use sha2::Sha256;
use std::fmt::Write;
use uuid::Uuid;

const ALGORITHM: &str = "pbkdf2_sha256";
#[cfg(not(test))]
const ITERATIONS: u32 = 600_000;
// Keeps the many account-creating tests fast.
#[cfg(test)]
const ITERATIONS: u32 = 1_000;
const KEY_LENGTH: usize = 32;

/// Hashes `raw` with a fresh random salt.
#[must_use]
pub fn hash_password(raw: &str) -> String {
    let salt = Uuid::new_v4().simple().to_string();
    hash_with(raw, &salt, ITERATIONS)
}

/// Checks `raw` against a hash produced by [`hash_password`].
///
/// Malformed hashes never verify.
#[must_use]
pub fn verify_password(raw: &str, encoded: &str) -> bool {
    let mut parts = encoded.splitn(4, '$');
    let (Some(algorithm), Some(iterations), Some(salt), Some(_)) =
        (parts.next(), parts.next(), parts.next(), parts.next())
    else {
        return false;
    };
    if algorithm != ALGORITHM || salt.is_empty() {
        return false;
    }
    let Ok(iterations) = iterations.parse::<u32>() else {
        return false;
    };
    if iterations == 0 {
        return false;
    }
    constant_time_eq(hash_with(raw, salt, iterations).as_bytes(), encoded.as_bytes())
}

fn hash_with(raw: &str, salt: &str, iterations: u32) -> String {
    let mut key = [0_u8; KEY_LENGTH];
    pbkdf2_hmac::<Sha256>(raw.as_bytes(), salt.as_bytes(), iterations, &mut key);

    let mut encoded = format!("{ALGORITHM}${iterations}${salt}$");
    for byte in key {
        let _ = write!(encoded, "{byte:02x}");
    }
    encoded
}

fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b).fold(0_u8, |acc, (x, y)| acc | (x ^ y)) == 0
}
