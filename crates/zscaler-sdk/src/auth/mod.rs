//! Bearer-token freshness and legacy key obfuscation.

mod obfuscate;
mod token;

pub use obfuscate::{MIN_SEED_LEN, ObfuscatedKey, obfuscate_api_key, obfuscate_api_key_now};
pub use token::{decode_claims, expiry, is_expired, is_expired_at};
