//! Lazy, restartable page sequences.
//!
//! [`paginate`] drives any "fetch one page" operation from page 1 upwards
//! and stops at the first page holding fewer items than were asked for.
//! Nothing is requested until the stream is polled, and dropping the
//! stream stops the traversal. Each call builds a fresh cursor.
//!
//! ```rust,ignore
//! use futures_util::TryStreamExt;
//!
//! let mut pages = sdk.legal_hold().get_all_matters(MatterFilter::default());
//! while let Some(page) = pages.try_next().await? {
//!     for matter in page.items() {
//!         println!("{}", matter["name"]);
//!     }
//! }
//! ```

use std::future::Future;
use std::num::NonZeroU32;
use std::pin::Pin;

use futures_core::Stream;
use serde_json::Value;
use tracing::debug;

use crate::error::Error;
use crate::response::ApiResponse;

/// A boxed stream of pages, as returned by every `get_all_*` operation.
pub type Pages<'a> = Pin<Box<dyn Stream<Item = Result<Page, Error>> + Send + 'a>>;

/// How an endpoint numbers its pages on the wire.
///
/// Callers always count from 1; endpoints disagree, so each one declares
/// its own convention instead of the engine guessing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageIndexing {
    OneBased,
    ZeroBased,
}

impl PageIndexing {
    /// The value to transmit for caller-facing page `page_num` (1-based).
    pub fn wire_page(self, page_num: u32) -> u32 {
        match self {
            Self::OneBased => page_num,
            Self::ZeroBased => page_num.saturating_sub(1),
        }
    }
}

/// Static description of a paginated endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PagedEndpoint {
    pub path: &'static str,
    pub indexing: PageIndexing,
    /// Field under the payload root holding the items; `None` when the
    /// payload root is itself the list.
    pub items_key: Option<&'static str>,
}

/// Cursor position handed to the page-fetching closure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    /// 1-based.
    pub page_num: u32,
    pub page_size: NonZeroU32,
}

/// One fetched page.
#[derive(Debug, Clone)]
pub struct Page {
    page_num: u32,
    page_size: NonZeroU32,
    items_key: Option<&'static str>,
    response: ApiResponse,
}

impl Page {
    pub fn new(request: PageRequest, items_key: Option<&'static str>, response: ApiResponse) -> Self {
        Self {
            page_num: request.page_num,
            page_size: request.page_size,
            items_key,
            response,
        }
    }

    /// 1-based page number.
    pub fn page_num(&self) -> u32 {
        self.page_num
    }

    pub fn page_size(&self) -> NonZeroU32 {
        self.page_size
    }

    pub fn response(&self) -> &ApiResponse {
        &self.response
    }

    /// The items on this page; empty when the items field is missing or
    /// not a list.
    pub fn items(&self) -> &[Value] {
        let root = match self.items_key {
            Some(key) => self.response.get(key),
            None => Some(self.response.data()),
        };
        root.and_then(Value::as_array).map_or(&[], Vec::as_slice)
    }

    pub fn len(&self) -> usize {
        self.items().len()
    }

    pub fn is_empty(&self) -> bool {
        self.items().is_empty()
    }

    pub fn into_items(self) -> Vec<Value> {
        let key = self.items_key;
        let mut data = self.response.into_data();
        let list = match key {
            Some(key) => data.get_mut(key).map(Value::take),
            None => Some(data),
        };
        match list {
            Some(Value::Array(items)) => items,
            _ => Vec::new(),
        }
    }
}

/// Turn a single-page fetch into a lazy stream of pages.
///
/// `fetch` receives the 1-based cursor and the page size; fixed filter
/// arguments are whatever it captured. An empty page ends the sequence
/// without being yielded; a short non-empty page is yielded and then ends
/// it.
pub fn paginate<'a, F, Fut>(
    fetch: F,
    items_key: Option<&'static str>,
    page_size: NonZeroU32,
) -> Pages<'a>
where
    F: Fn(PageRequest) -> Fut + Send + 'a,
    Fut: Future<Output = Result<ApiResponse, Error>> + Send + 'a,
{
    Box::pin(async_stream::try_stream! {
        let mut page_num: u32 = 1;
        loop {
            let request = PageRequest { page_num, page_size };
            debug!(page_num, page_size = page_size.get(), "fetching page");
            let response = fetch(request).await?;
            let page = Page::new(request, items_key, response);
            let received = page.len();
            if received == 0 {
                break;
            }
            yield page;
            if received < usize::try_from(page_size.get()).unwrap_or(usize::MAX) {
                break;
            }
            page_num += 1;
        }
    })
}
