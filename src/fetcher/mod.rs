pub mod http_fetcher;

use std::collections::BTreeMap;

use async_trait::async_trait;
use thiserror::Error;

use crate::normalizer::ParsedFeed;

pub use http_fetcher::HttpFetcher;

/// Everything a fetch needs to know about one feed.
#[derive(Debug, Clone, Default)]
pub struct FetchRequest<'a> {
    pub url: &'a str,
    pub etag: Option<&'a str>,
    pub modified: Option<&'a str>,
    pub credentials: Option<(&'a str, &'a str)>,
    /// Proxy URL by scheme.
    pub proxies: BTreeMap<String, String>,
}

/// What came back from the server, successful or not.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FetchResponse {
    /// HTTP status; the first redirect's status when redirects were followed.
    pub status: u16,
    /// The URL the document was finally read from.
    pub url: String,
    /// Parsed document; `None` for "not modified" and error statuses.
    pub document: Option<ParsedFeed>,
    pub etag: Option<String>,
    pub modified: Option<String>,
}

/// How the scheduler should treat a response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchStatus {
    Ok,
    /// The feed answered from a new address and should be reconfigured.
    Moved,
    /// Disallowed or gone; the feed should be unsubscribed.
    Gone,
    /// Some other client or server error.
    Error,
}

impl FetchResponse {
    pub fn classify(&self) -> FetchStatus {
        match self.status {
            301 | 302 | 308 => FetchStatus::Moved,
            403 | 410 => FetchStatus::Gone,
            400..=599 => FetchStatus::Error,
            _ => FetchStatus::Ok,
        }
    }

    pub fn item_count(&self) -> usize {
        self.document.as_ref().map_or(0, |d| d.items.len())
    }
}

/// A fetch that produced no response to classify.
#[derive(Debug, Error)]
pub enum FetchFailure {
    #[error("Timeout while reading feed")]
    Timeout,

    #[error("Error fetching feed: {0}")]
    Network(String),

    #[error("Error parsing feed: {0}")]
    Parse(String),

    #[error("Invalid feed URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("Too many redirects")]
    TooManyRedirects,
}

#[async_trait]
pub trait Fetcher: Send + Sync {
    async fn fetch(&self, request: &FetchRequest<'_>) -> Result<FetchResponse, FetchFailure>;
}
