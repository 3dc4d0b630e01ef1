//! Configuration for the Zscaler request/response layer.

use std::time::Duration;

use anyhow::Context;

/// API configuration constants.
pub mod api {
    use std::time::Duration;

    /// Default OneAPI gateway base URL.
    pub const BASE_URL: &str = "https://api.zsapi.net";

    /// Request timeout.
    pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

    /// Connection timeout.
    pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

    /// Retry ceiling for GET requests.
    pub const DEFAULT_MAX_RETRIES: u32 = 5;

    /// Retry ceiling for every other method, to avoid duplicate side effects.
    pub const NON_GET_MAX_RETRIES: u32 = 3;

    /// Base backoff before the first retry.
    pub const DEFAULT_BACKOFF: Duration = Duration::from_millis(500);

    /// Status codes that warrant an automatic retry.
    pub const RETRYABLE_STATUS_CODES: &[u16] = &[429, 502, 503, 504];

    /// Pause after every page fetch (per-endpoint rate limit).
    pub const PAGE_DELAY: Duration = Duration::from_secs(1);

    /// Tokens are treated as expired this long before their `exp` claim.
    pub const TOKEN_EXPIRY_MARGIN: Duration = Duration::from_secs(10);

    /// Container key wrapping list responses (ZPA style).
    pub const LIST_CONTAINER_KEY: &str = "list";

    /// Paging metadata fields; an object page holding only these has no items.
    pub const PAGE_METADATA_KEYS: &[&str] = &["totalPages", "totalCount"];

    /// Query parameter carrying the 1-based page number.
    pub const PAGE_PARAM: &str = "page";

    /// Query parameter carrying the page size.
    pub const PAGE_SIZE_PARAM: &str = "pageSize";
}

/// Retry knobs shared by every request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryConfig {
    /// Maximum retries after the initial attempt (GET requests).
    pub max_retries: u32,

    /// Base backoff, doubled on every attempt.
    pub backoff: Duration,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: api::DEFAULT_MAX_RETRIES,
            backoff: api::DEFAULT_BACKOFF,
        }
    }
}

/// Pagination knobs for list endpoints.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PaginationConfig {
    /// Page size sent with every page request, if set.
    pub page_size: Option<u32>,

    /// Stop after this many items (0 = unbounded).
    pub max_items: usize,

    /// Stop after this many pages (0 = unbounded).
    pub max_pages: u32,

    /// Pause after every page fetch.
    pub page_delay: Duration,
}

impl PaginationConfig {
    /// Configuration with both caps set.
    #[must_use]
    pub fn capped(max_items: usize, max_pages: u32) -> Self {
        Self {
            max_items,
            max_pages,
            ..Self::default()
        }
    }
}

impl Default for PaginationConfig {
    fn default() -> Self {
        Self {
            page_size: None,
            max_items: 0,
            max_pages: 0,
            page_delay: api::PAGE_DELAY,
        }
    }
}

/// Client configuration.
#[derive(Clone)]
pub struct Config {
    /// Base URL every request path is joined onto.
    pub base_url: String,

    /// Bearer token obtained by the surrounding session manager (optional).
    pub access_token: Option<String>,

    /// Request timeout.
    pub request_timeout: Duration,

    /// Connection timeout.
    pub connect_timeout: Duration,

    /// Retry knobs.
    pub retry: RetryConfig,

    /// Pagination knobs.
    pub pagination: PaginationConfig,
}

impl Config {
    /// Create a new configuration against `base_url`.
    #[must_use]
    pub fn new(base_url: impl Into<String>, access_token: Option<String>) -> Self {
        Self {
            base_url: base_url.into(),
            access_token,
            request_timeout: api::REQUEST_TIMEOUT,
            connect_timeout: api::CONNECT_TIMEOUT,
            retry: RetryConfig::default(),
            pagination: PaginationConfig::default(),
        }
    }

    /// Create a test configuration for mock servers: short timeouts, no delays.
    #[must_use]
    pub fn for_testing(base_url: &str) -> Self {
        Self {
            base_url: base_url.to_string(),
            access_token: None,
            request_timeout: Duration::from_secs(5),
            connect_timeout: Duration::from_secs(2),
            retry: RetryConfig {
                max_retries: api::DEFAULT_MAX_RETRIES,
                backoff: Duration::ZERO,
            },
            pagination: PaginationConfig {
                page_delay: Duration::ZERO,
                ..PaginationConfig::default()
            },
        }
    }

    /// Create configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns error if a numeric variable does not parse.
    pub fn from_env() -> anyhow::Result<Self> {
        let base_url =
            std::env::var("ZSCALER_BASE_URL").unwrap_or_else(|_| api::BASE_URL.to_string());
        let access_token = std::env::var("ZSCALER_ACCESS_TOKEN").ok();
        let mut config = Self::new(base_url, access_token);

        if let Some(retries) = parse_env::<u32>("ZSCALER_MAX_RETRIES")? {
            config.retry.max_retries = retries;
        }
        if let Some(seconds) = parse_env::<f64>("ZSCALER_BACKOFF_SECONDS")? {
            config.retry.backoff = Duration::try_from_secs_f64(seconds)
                .context("ZSCALER_BACKOFF_SECONDS must be a non-negative number")?;
        }
        config.pagination.page_size = parse_env("ZSCALER_PAGE_SIZE")?;
        if let Some(max_items) = parse_env("ZSCALER_MAX_ITEMS")? {
            config.pagination.max_items = max_items;
        }
        if let Some(max_pages) = parse_env("ZSCALER_MAX_PAGES")? {
            config.pagination.max_pages = max_pages;
        }

        Ok(config)
    }

    /// Check if a bearer token is configured.
    #[must_use]
    pub const fn has_access_token(&self) -> bool {
        self.access_token.is_some()
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new(api::BASE_URL, None)
    }
}

impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("base_url", &self.base_url)
            .field("has_access_token", &self.has_access_token())
            .field("request_timeout", &self.request_timeout)
            .field("connect_timeout", &self.connect_timeout)
            .field("retry", &self.retry)
            .field("pagination", &self.pagination)
            .finish()
    }
}

fn parse_env<T>(name: &str) -> anyhow::Result<Option<T>>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match std::env::var(name) {
        Ok(raw) => raw.trim().parse().map(Some).with_context(|| format!("invalid {name}: {raw:?}")),
        Err(_) => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_default() {
        let config = Config::default();
        assert!(!config.has_access_token());
        assert_eq!(config.base_url, api::BASE_URL);
        assert_eq!(config.retry.max_retries, 5);
        assert_eq!(config.retry.backoff, Duration::from_millis(500));
        assert_eq!(config.pagination.page_delay, Duration::from_secs(1));
    }

    #[test]
    fn test_config_for_testing_has_no_delays() {
        let config = Config::for_testing("http://127.0.0.1:9999");
        assert_eq!(config.retry.backoff, Duration::ZERO);
        assert_eq!(config.pagination.page_delay, Duration::ZERO);
    }

    #[test]
    fn test_debug_hides_token() {
        let config = Config::new(api::BASE_URL, Some("secret-token".to_string()));
        let debug = format!("{config:?}");
        assert!(!debug.contains("secret-token"));
        assert!(debug.contains("has_access_token: true"));
    }

    #[test]
    fn test_pagination_capped() {
        let pagination = PaginationConfig::capped(4, 2);
        assert_eq!(pagination.max_items, 4);
        assert_eq!(pagination.max_pages, 2);
        assert_eq!(pagination.page_delay, api::PAGE_DELAY);
    }

    #[test]
    fn test_retryable_codes() {
        assert_eq!(api::RETRYABLE_STATUS_CODES, &[429, 502, 503, 504]);
    }
}
