//! HTTP response abstraction consumed by the formatter, retry executor and paginator.

use reqwest::header::{CONTENT_TYPE, HeaderMap, HeaderValue};
use serde_json::Value;

use crate::error::ClientResult;

/// The parts of an HTTP response this layer looks at.
pub trait HttpResponse {
    /// Numeric status code.
    fn status_code(&self) -> u16;

    /// Response headers.
    fn headers(&self) -> &HeaderMap;

    /// Body as text.
    fn text(&self) -> &str;

    /// Parse the body as JSON.
    fn json(&self) -> serde_json::Result<Value> {
        serde_json::from_str(self.text())
    }

    /// Returns true if the content type announces JSON.
    fn is_json(&self) -> bool {
        self.headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .is_some_and(|ct| ct.to_ascii_lowercase().contains("json"))
    }

    /// Returns true for statuses above 299.
    fn is_error(&self) -> bool {
        self.status_code() > 299
    }
}

/// Fully-read HTTP response.
#[derive(Debug, Clone)]
pub struct ApiResponse {
    status: u16,
    headers: HeaderMap,
    body: String,
}

impl ApiResponse {
    /// Create a response from its parts.
    #[must_use]
    pub fn new(status: u16, headers: HeaderMap, body: impl Into<String>) -> Self {
        Self {
            status,
            headers,
            body: body.into(),
        }
    }

    /// Response with a JSON body and `application/json` content type.
    #[must_use]
    pub fn json_body(status: u16, body: &Value) -> Self {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        Self::new(status, headers, body.to_string())
    }

    /// Response with a plain-text body.
    #[must_use]
    pub fn text_body(status: u16, body: impl Into<String>) -> Self {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("text/plain"));
        Self::new(status, headers, body)
    }

    /// Read a blocking `reqwest` response to completion.
    pub fn from_blocking(response: reqwest::blocking::Response) -> ClientResult<Self> {
        let status = response.status().as_u16();
        let headers = response.headers().clone();
        let body = response.text()?;
        Ok(Self { status, headers, body })
    }

    /// Consume the response, returning the body.
    #[must_use]
    pub fn into_body(self) -> String {
        self.body
    }
}

impl HttpResponse for ApiResponse {
    fn status_code(&self) -> u16 {
        self.status
    }

    fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    fn text(&self) -> &str {
        &self.body
    }
}
