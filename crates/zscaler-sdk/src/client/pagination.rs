//! Lazy page walk over list endpoints.
//!
//! ZPA wraps items in `{"list": [...], "totalPages": "N"}` while ZIA returns bare
//! arrays; both shapes are accepted. An object without `list` that carries only
//! paging metadata (ZPA answers `{"totalPages": "0"}` for an empty collection)
//! is an empty page. Any other object is a single-record endpoint: it is yielded
//! as the only item and no further page is requested.

use std::collections::VecDeque;
use std::sync::Arc;

use serde_json::{Map, Value};
use tracing::Span;

use super::sleeper::{Sleeper, ThreadSleeper};
use crate::config::{PaginationConfig, api};
use crate::error::{ClientError, ClientResult};
use crate::formatters::{Formatted, format_response_with};
use crate::naming::NamingConverter;
use crate::response::HttpResponse;

/// Progress of one iteration.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PageCursor {
    /// Pages fetched so far.
    pub pages_fetched: u32,
    /// Items handed to the caller so far.
    pub items_yielded: usize,
    /// Item cap (0 = unbounded).
    pub max_items: usize,
    /// Page cap (0 = unbounded).
    pub max_pages: u32,
}

impl PageCursor {
    fn items_exhausted(&self) -> bool {
        self.max_items > 0 && self.items_yielded >= self.max_items
    }

    fn pages_exhausted(&self) -> bool {
        self.max_pages > 0 && self.pages_fetched >= self.max_pages
    }

    /// Page number the next fetch will request.
    #[must_use]
    pub const fn next_page(&self) -> u32 {
        self.pages_fetched + 1
    }
}

/// Items carried by one fetched page.
enum Page {
    Items(Vec<Value>),
    /// A bare record; the endpoint is not paged.
    Single(Value),
}

/// Forward-only iterator over the items of a paged endpoint.
///
/// `fetch(page, payload)` performs one page request; the payload already carries
/// the page number. Fetch failures, error statuses and non-JSON pages are
/// yielded once as `Err`, after which the iterator is finished. Nothing is
/// retried here.
pub struct Paginator<F> {
    fetch: F,
    payload: Map<String, Value>,
    page_size: Option<u32>,
    page_delay: std::time::Duration,
    cursor: PageCursor,
    buffer: VecDeque<Value>,
    finished: bool,
    converter: NamingConverter,
    sleeper: Arc<dyn Sleeper>,
    span: Span,
}

impl<F> Paginator<F> {
    /// Create a paginator; nothing is fetched until the first `next()`.
    #[must_use]
    pub fn new(fetch: F, payload: Map<String, Value>, config: PaginationConfig) -> Self {
        Self {
            fetch,
            payload,
            page_size: config.page_size,
            page_delay: config.page_delay,
            cursor: PageCursor {
                max_items: config.max_items,
                max_pages: config.max_pages,
                ..PageCursor::default()
            },
            buffer: VecDeque::new(),
            finished: false,
            converter: NamingConverter::default(),
            sleeper: Arc::new(ThreadSleeper),
            span: Span::none(),
        }
    }

    /// Replace the sleeper used for the inter-page delay.
    #[must_use]
    pub fn with_sleeper(mut self, sleeper: Arc<dyn Sleeper>) -> Self {
        self.sleeper = sleeper;
        self
    }

    /// Replace the naming converter applied to items.
    #[must_use]
    pub fn with_converter(mut self, converter: NamingConverter) -> Self {
        self.converter = converter;
        self
    }

    /// Emit page events inside `span`.
    #[must_use]
    pub fn with_span(mut self, span: Span) -> Self {
        self.span = span;
        self
    }

    /// Current progress.
    #[must_use]
    pub const fn cursor(&self) -> &PageCursor {
        &self.cursor
    }

    fn page_payload(&self, page: u32) -> Map<String, Value> {
        let mut payload = self.payload.clone();
        payload.insert(api::PAGE_PARAM.to_string(), Value::from(page));
        if let Some(size) = self.page_size {
            payload.insert(api::PAGE_SIZE_PARAM.to_string(), Value::from(size));
        }
        payload
    }

    fn extract_items<R: HttpResponse>(&self, response: R) -> ClientResult<Page> {
        if response.is_error() {
            return Err(ClientError::status(response.status_code(), response.text()));
        }
        match format_response_with(response, true, &self.converter) {
            Formatted::List(items) => Ok(Page::Items(items)),
            Formatted::Record(mut map) => match map.remove(api::LIST_CONTAINER_KEY) {
                Some(Value::Array(items)) => Ok(Page::Items(items)),
                Some(other) => Err(ClientError::unexpected_body(format!(
                    "`{}` is not an array: {other}",
                    api::LIST_CONTAINER_KEY
                ))),
                None if self.is_page_metadata(&map) => Ok(Page::Items(Vec::new())),
                None => Ok(Page::Single(Value::Object(map))),
            },
            Formatted::Raw(response) => Err(ClientError::unexpected_body(response.text())),
        }
    }

    fn is_page_metadata(&self, map: &Map<String, Value>) -> bool {
        map.keys().all(|key| {
            api::PAGE_METADATA_KEYS
                .iter()
                .any(|meta| self.converter.to_snake(meta) == *key)
        })
    }
}

impl<F, R> Iterator for Paginator<F>
where
    F: FnMut(u32, Map<String, Value>) -> ClientResult<R>,
    R: HttpResponse,
{
    type Item = ClientResult<Value>;

    fn next(&mut self) -> Option<Self::Item> {
        let span = self.span.clone();
        let _entered = span.enter();
        loop {
            if self.finished || self.cursor.items_exhausted() {
                self.finished = true;
                return None;
            }

            if let Some(item) = self.buffer.pop_front() {
                self.cursor.items_yielded += 1;
                return Some(Ok(item));
            }

            if self.cursor.pages_exhausted() {
                tracing::debug!(pages = self.cursor.pages_fetched, "Page cap reached");
                self.finished = true;
                return None;
            }

            let page = self.cursor.next_page();
            let payload = self.page_payload(page);
            let result = (self.fetch)(page, payload)
                .and_then(|response| self.extract_items(response));
            self.cursor.pages_fetched = page;

            let items = match result {
                Ok(Page::Items(items)) => items,
                Ok(Page::Single(record)) => {
                    tracing::debug!(page, "Object page without list, yielding it as one item");
                    self.sleeper.sleep(self.page_delay);
                    self.finished = true;
                    self.cursor.items_yielded += 1;
                    return Some(Ok(record));
                }
                Err(e) => {
                    tracing::warn!(page, error = %e, "Page fetch failed");
                    self.finished = true;
                    return Some(Err(e));
                }
            };

            tracing::debug!(page, count = items.len(), "Fetched page");
            self.sleeper.sleep(self.page_delay);

            if items.is_empty() {
                self.finished = true;
                return None;
            }
            self.buffer.extend(items);
        }
    }
}

impl<F, R> std::iter::FusedIterator for Paginator<F>
where
    F: FnMut(u32, Map<String, Value>) -> ClientResult<R>,
    R: HttpResponse,
{
}

impl<F> std::fmt::Debug for Paginator<F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Paginator")
            .field("cursor", &self.cursor)
            .field("buffered", &self.buffer.len())
            .field("finished", &self.finished)
            .finish()
    }
}
