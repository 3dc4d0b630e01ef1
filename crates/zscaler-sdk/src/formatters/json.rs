//! JSON response normalization.

use serde_json::{Map, Value};

use crate::naming::{NamingConverter, default_converter};
use crate::response::HttpResponse;

/// Outcome of formatting a response.
#[derive(Debug, Clone)]
pub enum Formatted<R> {
    /// JSON object root, keys snake-cased.
    Record(Map<String, Value>),
    /// JSON array root, keys snake-cased.
    List(Vec<Value>),
    /// The response as received: error status, non-JSON or unparseable body,
    /// or structured output not requested.
    Raw(R),
}

impl<R> Formatted<R> {
    /// Returns true if the response was passed through untouched.
    #[must_use]
    pub const fn is_raw(&self) -> bool {
        matches!(self, Self::Raw(_))
    }

    /// Structured value, if any.
    #[must_use]
    pub fn into_value(self) -> Option<Value> {
        match self {
            Self::Record(map) => Some(Value::Object(map)),
            Self::List(items) => Some(Value::Array(items)),
            Self::Raw(_) => None,
        }
    }

    /// Raw response, if the body was not converted.
    #[must_use]
    pub fn into_raw(self) -> Option<R> {
        match self {
            Self::Raw(response) => Some(response),
            _ => None,
        }
    }
}

/// Normalize `response` using the default naming table.
///
/// See [`format_response_with`].
#[must_use]
pub fn format_response<R: HttpResponse>(response: R, want_structured: bool) -> Formatted<R> {
    format_response_with(response, want_structured, default_converter())
}

/// Normalize `response` into a snake-cased record or list.
///
/// Error statuses (above 299), non-JSON content types, empty or malformed bodies
/// and scalar roots come back as [`Formatted::Raw`] so passthrough, CSV and
/// binary callers are unaffected. Never fails.
#[must_use]
pub fn format_response_with<R: HttpResponse>(
    response: R,
    want_structured: bool,
    converter: &NamingConverter,
) -> Formatted<R> {
    if response.is_error() || !want_structured {
        return Formatted::Raw(response);
    }
    if !response.is_json() || response.text().trim().is_empty() {
        return Formatted::Raw(response);
    }

    let parsed = match response.json() {
        Ok(value) => value,
        Err(e) => {
            tracing::debug!(error = %e, "JSON body did not parse, passing through");
            return Formatted::Raw(response);
        }
    };

    match converter.to_snake_deep(parsed) {
        Value::Object(map) => Formatted::Record(map),
        Value::Array(items) => Formatted::List(items),
        _ => Formatted::Raw(response),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::response::ApiResponse;
    use serde_json::json;

    #[test]
    fn test_record_is_snake_cased() {
        let response = ApiResponse::json_body(200, &json!({"ruleOrder": 1, "routableIP": true}));
        match format_response(response, true) {
            Formatted::Record(map) => {
                assert_eq!(map["rule_order"], 1);
                assert_eq!(map["routable_ip"], true);
            }
            other => panic!("expected record, got {other:?}"),
        }
    }

    #[test]
    fn test_error_status_passes_through() {
        let response = ApiResponse::json_body(404, &json!({"errorCode": "NOT_FOUND"}));
        let formatted = format_response(response, true);
        let raw = formatted.into_raw().expect("raw");
        assert_eq!(raw.status_code(), 404);
        assert!(raw.text().contains("errorCode"));
    }

    #[test]
    fn test_unstructured_request_passes_through() {
        let response = ApiResponse::json_body(200, &json!({"aB": 1}));
        assert!(format_response(response, false).is_raw());
    }

    #[test]
    fn test_scalar_root_passes_through() {
        let response = ApiResponse::json_body(200, &json!(42));
        assert!(format_response(response, true).is_raw());
    }
}
