// src/fetch.rs

use reqwest::blocking::Client;
use reqwest::header::CONTENT_TYPE;
use std::collections::HashMap;
use tracing::{debug, instrument};

use crate::error::ScrapeError;

/// Raw body of one page plus whatever the transport told us about its charset.
#[derive(Debug, Clone)]
pub struct FetchedPage {
    pub url: String,
    pub bytes: Vec<u8>,
    pub charset: Option<String>,
}

/// Anything that can hand back the bytes behind a URL.
pub trait PageSource {
    fn fetch(&self, url: &str) -> Result<FetchedPage, ScrapeError>;
}

/// Plain blocking GET with the transport's default timeouts and redirects.
pub struct HttpSource {
    client: Client,
}

impl HttpSource {
    pub fn new() -> anyhow::Result<Self> {
        Ok(Self {
            client: Client::builder().gzip(true).build()?,
        })
    }
}

impl PageSource for HttpSource {
    #[instrument(level = "debug", skip(self))]
    fn fetch(&self, url: &str) -> Result<FetchedPage, ScrapeError> {
        let fail = |reason: String| ScrapeError::Fetch {
            url: url.to_string(),
            reason,
        };

        let resp = self
            .client
            .get(url)
            .send()
            .map_err(|e| fail(format!("GET failed: {}", e)))?;
        let status = resp.status();
        if !status.is_success() {
            return Err(fail(format!("non-success status {}", status)));
        }

        let charset = resp
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .and_then(charset_from_content_type);
        let bytes = resp
            .bytes()
            .map_err(|e| fail(format!("reading body: {}", e)))?;
        debug!(%url, len = bytes.len(), charset = ?charset, "fetched");

        Ok(FetchedPage {
            url: url.to_string(),
            bytes: bytes.to_vec(),
            charset,
        })
    }
}

/// Serves pages out of a map. Unknown URLs fail like a 404.
#[derive(Debug, Default, Clone)]
pub struct MemorySource {
    pages: HashMap<String, Vec<u8>>,
}

impl MemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, url: impl Into<String>, bytes: impl Into<Vec<u8>>) -> &mut Self {
        self.pages.insert(url.into(), bytes.into());
        self
    }
}

impl PageSource for MemorySource {
    fn fetch(&self, url: &str) -> Result<FetchedPage, ScrapeError> {
        self.pages
            .get(url)
            .map(|bytes| FetchedPage {
                url: url.to_string(),
                bytes: bytes.clone(),
                charset: None,
            })
            .ok_or_else(|| ScrapeError::Fetch {
                url: url.to_string(),
                reason: "non-success status 404 Not Found".to_string(),
            })
    }
}

/// `text/html; charset=gb2312` → `gb2312`.
fn charset_from_content_type(value: &str) -> Option<String> {
    value.split(';').skip(1).find_map(|param| {
        let (key, val) = param.split_once('=')?;
        if key.trim().eq_ignore_ascii_case("charset") {
            let val = val.trim().trim_matches('"');
            (!val.is_empty()).then(|| val.to_string())
        } else {
            None
        }
    })
}
