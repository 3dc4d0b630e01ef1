//! Blocking Zscaler API client.
//!
//! Composes the shared layer for every request:
//! - camelCase conversion of outbound bodies and query parameters
//! - bearer-token authentication
//! - retry with exponential backoff (smaller ceiling for non-GET)
//! - snake_case formatting of JSON responses
//! - lazy pagination over list endpoints

mod pagination;
mod retry;
mod sleeper;

use std::sync::Arc;

use reqwest::Method;
use reqwest::header::{ACCEPT, AUTHORIZATION, HeaderMap, HeaderValue};
use serde_json::{Map, Value};
use url::Url;

pub use pagination::{PageCursor, Paginator};
pub use retry::{RetryExecutor, RetryPolicy};
pub use sleeper::{NoopSleeper, Sleeper, ThreadSleeper};

use crate::config::{Config, PaginationConfig, RetryConfig};
use crate::error::ClientResult;
use crate::formatters::{Formatted, format_response_with};
use crate::naming::NamingConverter;
use crate::response::{ApiResponse, HttpResponse};

/// Zscaler API client.
#[derive(Clone)]
pub struct ZscalerClient {
    /// Blocking HTTP client.
    http: reqwest::blocking::Client,

    /// Base URL, always ending in `/`.
    base_url: Url,

    /// Bearer token (optional).
    access_token: Option<String>,

    /// Retry knobs.
    retry: RetryConfig,

    /// Default pagination knobs.
    pagination: PaginationConfig,

    /// Key converter for bodies, queries and responses.
    converter: NamingConverter,

    /// Pause implementation for backoff and page delays.
    sleeper: Arc<dyn Sleeper>,
}

impl ZscalerClient {
    /// Create a new client with the given configuration.
    ///
    /// # Errors
    ///
    /// Returns error if the base URL is invalid or HTTP client initialization fails.
    pub fn new(config: Config) -> anyhow::Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        let http = reqwest::blocking::Client::builder()
            .default_headers(headers)
            .timeout(config.request_timeout)
            .connect_timeout(config.connect_timeout)
            .gzip(true)
            .build()?;

        let mut base = config.base_url.trim_end_matches('/').to_string();
        base.push('/');
        let base_url = Url::parse(&base)?;

        Ok(Self {
            http,
            base_url,
            access_token: config.access_token,
            retry: config.retry,
            pagination: config.pagination,
            converter: NamingConverter::default(),
            sleeper: Arc::new(ThreadSleeper),
        })
    }

    /// Replace the sleeper used for backoff and page delays.
    #[must_use]
    pub fn with_sleeper(mut self, sleeper: Arc<dyn Sleeper>) -> Self {
        self.sleeper = sleeper;
        self
    }

    /// Replace the naming converter (e.g. to add vendor exceptions).
    #[must_use]
    pub fn with_converter(mut self, converter: NamingConverter) -> Self {
        self.converter = converter;
        self
    }

    /// Install a fresh bearer token.
    pub fn set_access_token(&mut self, token: impl Into<String>) {
        self.access_token = Some(token.into());
    }

    /// Check if a bearer token is configured.
    #[must_use]
    pub fn has_access_token(&self) -> bool {
        self.access_token.is_some()
    }

    /// Returns true if the session manager should re-authenticate.
    #[must_use]
    pub fn token_expired(&self) -> bool {
        crate::auth::is_expired(self.access_token.as_deref())
    }

    /// Send one request under the retry policy for `method`.
    ///
    /// `body` keys are camel-cased before sending. The response is returned
    /// as-is; see [`Self::get`] and friends for formatted results.
    pub fn request(
        &self,
        method: Method,
        path: &str,
        query: &[(String, String)],
        body: Option<&Value>,
    ) -> ClientResult<ApiResponse> {
        let url = self.url(path)?;
        let body = body.map(|b| self.converter.to_camel_deep(b.clone()));

        let executor = RetryExecutor::new(RetryPolicy::for_method(&method, &self.retry))
            .with_sleeper(Arc::clone(&self.sleeper))
            .with_span(tracing::debug_span!("zscaler_request", method = %method, path));

        executor.execute(|| self.send_once(&method, &url, query, body.as_ref()))
    }

    /// GET `path` and format the response.
    pub fn get(
        &self,
        path: &str,
        query: &[(String, String)],
    ) -> ClientResult<Formatted<ApiResponse>> {
        let response = self.request(Method::GET, path, query, None)?;
        Ok(self.format(response))
    }

    /// POST `body` to `path` and format the response.
    pub fn post(&self, path: &str, body: &Value) -> ClientResult<Formatted<ApiResponse>> {
        let response = self.request(Method::POST, path, &[], Some(body))?;
        Ok(self.format(response))
    }

    /// PUT `body` to `path` and format the response.
    pub fn put(&self, path: &str, body: &Value) -> ClientResult<Formatted<ApiResponse>> {
        let response = self.request(Method::PUT, path, &[], Some(body))?;
        Ok(self.format(response))
    }

    /// DELETE `path` and format the response.
    pub fn delete(&self, path: &str) -> ClientResult<Formatted<ApiResponse>> {
        let response = self.request(Method::DELETE, path, &[], None)?;
        Ok(self.format(response))
    }

    /// Iterate the items of the list endpoint at `path`.
    ///
    /// `payload` becomes the query string of every page request (keys
    /// camel-cased); `config` defaults to the client's pagination settings.
    pub fn paginate<'a>(
        &'a self,
        path: &'a str,
        payload: Map<String, Value>,
        config: Option<PaginationConfig>,
    ) -> Paginator<impl FnMut(u32, Map<String, Value>) -> ClientResult<ApiResponse> + 'a> {
        let fetch = move |_page: u32, payload: Map<String, Value>| {
            let query = self.query_pairs(payload);
            self.request(Method::GET, path, &query, None)
        };

        Paginator::new(fetch, payload, config.unwrap_or(self.pagination))
            .with_sleeper(Arc::clone(&self.sleeper))
            .with_converter(self.converter.clone())
            .with_span(tracing::debug_span!("zscaler_paginate", path))
    }

    fn format(&self, response: ApiResponse) -> Formatted<ApiResponse> {
        format_response_with(response, true, &self.converter)
    }

    fn url(&self, path: &str) -> ClientResult<Url> {
        Ok(self.base_url.join(path.trim_start_matches('/'))?)
    }

    fn query_pairs(&self, payload: Map<String, Value>) -> Vec<(String, String)> {
        self.converter
            .camelize_map(payload)
            .into_iter()
            .filter(|(_, v)| !v.is_null())
            .map(|(k, v)| match v {
                Value::String(s) => (k, s),
                other => (k, other.to_string()),
            })
            .collect()
    }

    fn send_once(
        &self,
        method: &Method,
        url: &Url,
        query: &[(String, String)],
        body: Option<&Value>,
    ) -> ClientResult<ApiResponse> {
        let mut builder = self.http.request(method.clone(), url.clone());
        if !query.is_empty() {
            builder = builder.query(query);
        }
        if let Some(token) = &self.access_token {
            builder = builder.bearer_auth(token);
        }
        if let Some(body) = body {
            builder = builder.json(body);
        }

        let request = builder.build()?;
        dump_request(&request);

        let response = ApiResponse::from_blocking(self.http.execute(request)?)?;
        tracing::debug!(
            status = response.status_code(),
            bytes = response.text().len(),
            "Received response"
        );
        Ok(response)
    }
}

/// Log a request at debug level with the `Authorization` header redacted.
fn dump_request(request: &reqwest::blocking::Request) {
    if !tracing::enabled!(tracing::Level::DEBUG) {
        return;
    }
    let headers: Vec<String> = request
        .headers()
        .iter()
        .map(|(name, value)| {
            if *name == AUTHORIZATION {
                format!("{name}: <redacted>")
            } else {
                format!("{name}: {}", value.to_str().unwrap_or("<binary>"))
            }
        })
        .collect();
    tracing::debug!(method = %request.method(), url = %request.url(), ?headers, "Sending request");
}

impl std::fmt::Debug for ZscalerClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ZscalerClient")
            .field("base_url", &self.base_url.as_str())
            .field("has_access_token", &self.has_access_token())
            .finish()
    }
}
