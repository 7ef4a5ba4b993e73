// src/error.rs

use thiserror::Error;

/// Failure of a single page: fetching it, decoding it, or pulling a draw out of it.
#[derive(Debug, Clone, Error)]
pub enum ScrapeError {
    /// Transport failure or a non-success HTTP status.
    #[error("fetch {url}: {reason}")]
    Fetch { url: String, reason: String },

    /// Bytes are not valid under the chosen encoding, or no encoding could be determined.
    #[error("decode as {encoding}: {reason}")]
    Decode { encoding: String, reason: String },

    /// Expected page structure is missing or malformed.
    #[error("parse: {0}")]
    Parse(String),
}

impl ScrapeError {
    pub(crate) fn parse(msg: impl Into<String>) -> Self {
        ScrapeError::Parse(msg.into())
    }

    /// Short tag used in log fields.
    pub fn kind(&self) -> &'static str {
        match self {
            ScrapeError::Fetch { .. } => "fetch",
            ScrapeError::Decode { .. } => "decode",
            ScrapeError::Parse(_) => "parse",
        }
    }
}
