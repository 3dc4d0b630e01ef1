//! Legacy ZIA API-key obfuscation.
//!
//! The legacy `/authenticatedSession` login expects the API key scrambled with
//! the request timestamp instead of sent in clear.

use serde::Serialize;

use crate::error::AuthError;

/// Shortest seed the digit lookups can index (`9 + 2`).
pub const MIN_SEED_LEN: usize = 12;

/// Timestamp and key pair sent to the legacy login endpoint.
///
/// Serializes as `{"timestamp": ..., "apiKey": ...}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ObfuscatedKey {
    /// Milliseconds since the epoch used to derive `key`.
    pub timestamp: i64,
    /// Obfuscated key.
    #[serde(rename = "apiKey")]
    pub key: String,
}

/// Obfuscate `seed` with `timestamp_ms`.
///
/// Let `n` be the last six digits of the timestamp and `r = n >> 1`, zero-padded
/// to six digits. The key is `seed[d]` for every digit `d` of `n`, followed by
/// `seed[d + 2]` for every digit `d` of `r`.
pub fn obfuscate_api_key(seed: &str, timestamp_ms: i64) -> Result<ObfuscatedKey, AuthError> {
    if !seed.is_ascii() || seed.len() < MIN_SEED_LEN {
        return Err(AuthError::InvalidSeed { min: MIN_SEED_LEN });
    }
    let seed = seed.as_bytes();

    let digits = timestamp_ms.unsigned_abs().to_string();
    let n = &digits[digits.len().saturating_sub(6)..];
    let n_value: u64 = n.parse().unwrap_or_default();
    let r = format!("{:06}", n_value >> 1);

    let mut key = String::with_capacity(n.len() + r.len());
    for d in n.bytes() {
        key.push(char::from(seed[usize::from(d - b'0')]));
    }
    for d in r.bytes() {
        key.push(char::from(seed[usize::from(d - b'0') + 2]));
    }

    Ok(ObfuscatedKey {
        timestamp: timestamp_ms,
        key,
    })
}

/// Obfuscate `seed` with the current time.
pub fn obfuscate_api_key_now(seed: &str) -> Result<ObfuscatedKey, AuthError> {
    obfuscate_api_key(seed, chrono::Utc::now().timestamp_millis())
}
