// src/decode.rs

use chardetng::EncodingDetector;
use encoding_rs::{Encoding, GB18030, UTF_8};
use once_cell::sync::Lazy;
use regex::bytes::Regex;
use std::fmt;
use tracing::{debug, trace};

use crate::error::ScrapeError;

/// How many leading bytes are searched for a `<meta>` charset declaration.
const META_SNIFF_LEN: usize = 1024;

static META_CHARSET: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?i-u)<meta[^>]+charset\s*=\s*["']?\s*([A-Za-z0-9_:.\-]+)"#)
        .expect("meta charset regex should compile")
});

/// Which character set to read a page with.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum EncodingPolicy {
    /// Always decode with this encoding.
    Fixed(&'static Encoding),
    /// Work the encoding out from the page: BOM, header charset, `<meta>`,
    /// UTF-8 validity, then a statistical guess over the body.
    Detect,
}

impl Default for EncodingPolicy {
    fn default() -> Self {
        EncodingPolicy::Fixed(GB18030)
    }
}

impl EncodingPolicy {
    /// `auto`/`detect` selects detection; anything else must be a WHATWG encoding label.
    pub fn from_label(label: &str) -> Result<Self, ScrapeError> {
        let label = label.trim();
        if label.eq_ignore_ascii_case("auto") || label.eq_ignore_ascii_case("detect") {
            return Ok(EncodingPolicy::Detect);
        }
        Encoding::for_label(label.as_bytes())
            .map(EncodingPolicy::Fixed)
            .ok_or_else(|| ScrapeError::Decode {
                encoding: label.to_string(),
                reason: "unknown encoding label".to_string(),
            })
    }

    /// The policy tried when this one fails.
    pub fn alternate(self) -> Self {
        match self {
            EncodingPolicy::Fixed(_) => EncodingPolicy::Detect,
            EncodingPolicy::Detect => EncodingPolicy::Fixed(GB18030),
        }
    }
}

impl fmt::Display for EncodingPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EncodingPolicy::Fixed(enc) => f.write_str(enc.name()),
            EncodingPolicy::Detect => f.write_str("auto"),
        }
    }
}

/// Decode `bytes` under `policy`. `header_charset` is the label the server sent, if any.
pub fn decode(
    bytes: &[u8],
    policy: EncodingPolicy,
    header_charset: Option<&str>,
) -> Result<String, ScrapeError> {
    let encoding = match policy {
        EncodingPolicy::Fixed(enc) => enc,
        EncodingPolicy::Detect => detect(bytes, header_charset)?,
    };
    debug!(encoding = encoding.name(), len = bytes.len(), "decoding page");
    decode_strict(bytes, encoding)
}

/// Decode without replacement characters; malformed input is an error.
fn decode_strict(bytes: &[u8], encoding: &'static Encoding) -> Result<String, ScrapeError> {
    let (body, enc) = match Encoding::for_bom(bytes) {
        Some((bom_enc, bom_len)) if bom_enc == encoding => (&bytes[bom_len..], bom_enc),
        _ => (bytes, encoding),
    };
    enc.decode_without_bom_handling_and_without_replacement(body)
        .map(|text| text.into_owned())
        .ok_or_else(|| ScrapeError::Decode {
            encoding: enc.name().to_string(),
            reason: "malformed byte sequence".to_string(),
        })
}

/// Pick an encoding from the content itself.
fn detect(bytes: &[u8], header_charset: Option<&str>) -> Result<&'static Encoding, ScrapeError> {
    if let Some((enc, _)) = Encoding::for_bom(bytes) {
        trace!(encoding = enc.name(), "byte order mark");
        return Ok(enc);
    }
    if let Some(enc) = header_charset.and_then(|l| Encoding::for_label(l.trim().as_bytes())) {
        trace!(encoding = enc.name(), "header charset");
        return Ok(enc);
    }
    if let Some(enc) = sniff_meta(bytes) {
        trace!(encoding = enc.name(), "meta charset");
        return Ok(enc);
    }
    if std::str::from_utf8(bytes).is_ok() {
        return Ok(UTF_8);
    }
    let mut detector = EncodingDetector::new();
    detector.feed(bytes, true);
    let enc = detector.guess(None, false);
    trace!(encoding = enc.name(), "guessed from content");
    Ok(enc)
}

fn sniff_meta(bytes: &[u8]) -> Option<&'static Encoding> {
    let head = &bytes[..bytes.len().min(META_SNIFF_LEN)];
    let caps = META_CHARSET.captures(head)?;
    let enc = Encoding::for_label(caps.get(1)?.as_bytes())?;
    // A page that reached us as bytes cannot really be UTF-16.
    if enc == encoding_rs::UTF_16LE || enc == encoding_rs::UTF_16BE {
        return Some(UTF_8);
    }
    Some(enc)
}
