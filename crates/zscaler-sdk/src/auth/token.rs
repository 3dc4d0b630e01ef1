//! Bearer-token freshness check.
//!
//! Reads the `exp` claim from the token payload without verifying the
//! signature. The result only decides whether to re-authenticate, so every
//! failure answers "expired" instead of erroring.

use base64::Engine;
use base64::alphabet::URL_SAFE;
use base64::engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig};
use serde_json::{Map, Value};

use crate::config::api;
use crate::error::AuthError;

/// base64url engine accepting payloads with or without `=` padding.
const URL_SAFE_LENIENT: GeneralPurpose = GeneralPurpose::new(
    &URL_SAFE,
    GeneralPurposeConfig::new().with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

/// Decode the claims of a `header.payload.signature` token.
pub fn decode_claims(token: &str) -> Result<Map<String, Value>, AuthError> {
    let token = token.trim();
    if token.is_empty() {
        return Err(AuthError::EmptyToken);
    }

    let segments: Vec<&str> = token.split('.').collect();
    let [_, payload, _] = segments.as_slice() else {
        return Err(AuthError::MalformedToken(segments.len()));
    };

    let bytes = URL_SAFE_LENIENT.decode(payload)?;
    match serde_json::from_slice::<Value>(&bytes)? {
        Value::Object(claims) => Ok(claims),
        _ => Err(AuthError::NotAnObject),
    }
}

/// Expiry (epoch seconds) of `token`, `None` when it carries no `exp` claim.
pub fn expiry(token: &str) -> Result<Option<f64>, AuthError> {
    let claims = decode_claims(token)?;
    match claims.get("exp") {
        None | Some(Value::Null) => Ok(None),
        Some(exp) => exp.as_f64().map(Some).ok_or_else(|| AuthError::InvalidExpiry(exp.clone())),
    }
}

/// Returns true if `token` must be replaced before use, evaluated now.
#[must_use]
pub fn is_expired(token: Option<&str>) -> bool {
    is_expired_at(token, chrono::Utc::now().timestamp())
}

/// Returns true if `token` must be replaced before use at `now` (epoch seconds).
///
/// Tokens are considered expired [`api::TOKEN_EXPIRY_MARGIN`] before their
/// `exp` claim. A token without `exp` is not expired by this check.
#[must_use]
pub fn is_expired_at(token: Option<&str>, now: i64) -> bool {
    let Some(token) = token else {
        return true;
    };

    match expiry(token) {
        Ok(Some(exp)) => (now as f64) + api::TOKEN_EXPIRY_MARGIN.as_secs_f64() >= exp,
        Ok(None) => false,
        Err(e) => {
            tracing::warn!(error = %e, "Treating unreadable bearer token as expired");
            true
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use base64::engine::general_purpose::URL_SAFE_NO_PAD;
    use serde_json::json;

    fn token_with(claims: &Value) -> String {
        let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"RS256","typ":"JWT"}"#);
        let payload = URL_SAFE_NO_PAD.encode(claims.to_string());
        format!("{header}.{payload}.c2lnbmF0dXJl")
    }

    #[test]
    fn test_margin_applies() {
        let now = 1_700_000_000;
        assert!(!is_expired_at(Some(&token_with(&json!({"exp": now + 11}))), now));
        assert!(is_expired_at(Some(&token_with(&json!({"exp": now + 10}))), now));
        assert!(is_expired_at(Some(&token_with(&json!({"exp": now + 5}))), now));
    }

    #[test]
    fn test_padded_payload_accepted() {
        let claims = json!({"exp": 4_102_444_800_i64, "sub": "a"});
        let padded = base64::engine::general_purpose::URL_SAFE.encode(claims.to_string());
        let token = format!("e30.{padded}.sig");
        assert_eq!(expiry(&token).unwrap(), Some(4_102_444_800.0));
    }

    #[test]
    fn test_decode_errors() {
        assert!(matches!(decode_claims(""), Err(AuthError::EmptyToken)));
        assert!(matches!(decode_claims("a.b"), Err(AuthError::MalformedToken(2))));
        assert!(matches!(decode_claims("a.b.c.d"), Err(AuthError::MalformedToken(4))));
        assert!(matches!(decode_claims("a.!!!.c"), Err(AuthError::Base64(_))));

        let not_json = format!("a.{}.c", URL_SAFE_NO_PAD.encode("not json"));
        assert!(matches!(decode_claims(&not_json), Err(AuthError::Json(_))));

        let array = format!("a.{}.c", URL_SAFE_NO_PAD.encode("[1]"));
        assert!(matches!(decode_claims(&array), Err(AuthError::NotAnObject)));
    }

    #[test]
    fn test_non_numeric_exp_is_expired() {
        let token = token_with(&json!({"exp": "tomorrow"}));
        assert!(matches!(expiry(&token), Err(AuthError::InvalidExpiry(_))));
        assert!(is_expired_at(Some(&token), 0));
    }
}
