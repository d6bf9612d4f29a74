use std::time::Duration;

use log::warn;
use reqwest::blocking::Client;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT_LANGUAGE, USER_AGENT};
use scraper::Html;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("server returned status {0}")]
    Status(reqwest::StatusCode),
}

/// Blocking HTML page fetcher. Any transport or status failure is surfaced as
/// a `FetchError`; the caller treats it like a not-found result for that query
/// and moves on. No retries.
pub struct PageFetcher {
    client: Client,
}

impl PageFetcher {
    pub fn new() -> Self {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static("en-US,en;q=0.9"));
        headers.insert(
            USER_AGENT,
            HeaderValue::from_static(
                "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
                 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36",
            ),
        );

        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .default_headers(headers)
            .cookie_store(true)
            .build()
            .expect("Failed to build HTTP client");

        PageFetcher { client }
    }

    /// GET the URL and parse the body into a document. The returned handle is
    /// owned by the caller and dropped when the query completes.
    pub fn fetch(&self, url: &str) -> Result<Html, FetchError> {
        let resp = self.client.get(url).send()?;
        let status = resp.status();
        if !status.is_success() {
            if status.as_u16() == 403 || status.as_u16() == 429 {
                warn!("Blocked at {}: {}", url, status);
            }
            return Err(FetchError::Status(status));
        }
        let text = resp.text()?;
        Ok(Html::parse_document(&text))
    }
}

impl Default for PageFetcher {
    fn default() -> Self {
        Self::new()
    }
}
