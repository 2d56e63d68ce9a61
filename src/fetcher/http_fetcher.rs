use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, IF_MODIFIED_SINCE, IF_NONE_MATCH, LOCATION};
use reqwest::{redirect, Client, Proxy, StatusCode};
use url::Url;

use crate::app::{RawdogError, Result, VERSION};
use crate::fetcher::{FetchFailure, FetchRequest, FetchResponse, Fetcher};
use crate::normalizer::Normalizer;

const MAX_REDIRECTS: usize = 5;

pub struct HttpFetcher {
    client: Client,
    timeout: Duration,
    normalizer: Normalizer,
}

impl HttpFetcher {
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = Self::builder(timeout)
            .build()
            .map_err(|e| RawdogError::Other(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            timeout,
            normalizer: Normalizer::new(),
        })
    }

    fn builder(timeout: Duration) -> reqwest::ClientBuilder {
        Client::builder()
            .timeout(timeout)
            .gzip(true)
            .brotli(true)
            .redirect(redirect::Policy::none())
            .user_agent(format!("rawdog/{}", VERSION))
    }

    /// Feeds with proxies get a client of their own.
    fn client_for(&self, request: &FetchRequest<'_>) -> std::result::Result<Client, FetchFailure> {
        if request.proxies.is_empty() {
            return Ok(self.client.clone());
        }

        let mut builder = Self::builder(self.timeout);
        for (scheme, proxy_url) in &request.proxies {
            let proxy = match scheme.as_str() {
                "http" => Proxy::http(proxy_url),
                "https" => Proxy::https(proxy_url),
                _ => Proxy::all(proxy_url),
            }
            .map_err(|e| FetchFailure::Network(format!("bad {} proxy: {}", scheme, e)))?;
            builder = builder.proxy(proxy);
        }
        builder
            .build()
            .map_err(|e| FetchFailure::Network(e.to_string()))
    }

    fn headers(request: &FetchRequest<'_>) -> HeaderMap {
        let mut headers = HeaderMap::new();

        if let Some(etag) = request.etag {
            if let Ok(value) = HeaderValue::from_str(etag) {
                headers.insert(IF_NONE_MATCH, value);
            }
        }

        if let Some(modified) = request.modified {
            if let Ok(value) = HeaderValue::from_str(modified) {
                headers.insert(IF_MODIFIED_SINCE, value);
            }
        }

        headers
    }
}

fn transport_failure(e: reqwest::Error) -> FetchFailure {
    if e.is_timeout() {
        FetchFailure::Timeout
    } else {
        FetchFailure::Network(e.to_string())
    }
}

fn header_string(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(String::from)
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn fetch(
        &self,
        request: &FetchRequest<'_>,
    ) -> std::result::Result<FetchResponse, FetchFailure> {
        let client = self.client_for(request)?;
        let headers = Self::headers(request);
        let mut current = Url::parse(request.url)?;
        let mut redirect_status: Option<u16> = None;

        for _ in 0..=MAX_REDIRECTS {
            let mut builder = client.get(current.clone()).headers(headers.clone());
            if let Some((user, password)) = request.credentials {
                builder = builder.basic_auth(user, Some(password));
            }
            let response = builder.send().await.map_err(transport_failure)?;
            let status = response.status();

            if status.is_redirection() && status != StatusCode::NOT_MODIFIED {
                let location = header_string(response.headers(), LOCATION.as_str())
                    .ok_or_else(|| {
                        FetchFailure::Network(format!("{} redirect without Location", status))
                    })?;
                current = current.join(&location)?;
                redirect_status.get_or_insert(status.as_u16());
                tracing::debug!(from = request.url, to = %current, status = status.as_u16(), "following redirect");
                continue;
            }

            let etag = header_string(response.headers(), "etag");
            let modified = header_string(response.headers(), "last-modified");

            if !status.is_success() {
                // Not modified and error statuses carry no document.
                return Ok(FetchResponse {
                    status: status.as_u16(),
                    url: current.to_string(),
                    document: None,
                    etag: etag.or_else(|| request.etag.map(String::from)),
                    modified: modified.or_else(|| request.modified.map(String::from)),
                });
            }

            let body = response.bytes().await.map_err(transport_failure)?;
            let document = self
                .normalizer
                .normalize(&body)
                .map_err(|e| FetchFailure::Parse(e.to_string()))?;

            return Ok(FetchResponse {
                status: redirect_status.unwrap_or(status.as_u16()),
                url: current.to_string(),
                document: Some(document),
                etag,
                modified,
            });
        }

        Err(FetchFailure::TooManyRedirects)
    }
}
