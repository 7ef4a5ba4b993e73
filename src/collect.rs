// src/collect.rs

use tracing::{info, instrument, warn};

use crate::decode::{decode, EncodingPolicy};
use crate::error::ScrapeError;
use crate::fetch::{FetchedPage, PageSource};
use crate::parse::parse_detail;
use crate::progress::Progress;
use crate::record::DrawRecord;

/// A URL that produced no record under either encoding policy.
#[derive(Debug)]
pub struct Failure {
    pub url: String,
    pub primary: ScrapeError,
    pub fallback: ScrapeError,
}

/// How a single URL went.
#[derive(Debug)]
pub enum Outcome {
    /// First attempt succeeded.
    Primary(DrawRecord),
    /// First attempt failed, the alternate policy succeeded.
    Fallback {
        record: DrawRecord,
        primary: ScrapeError,
    },
    /// Both attempts failed.
    Failed(Failure),
}

/// Records in input order, plus every URL that had to be skipped.
#[derive(Debug, Default)]
pub struct Collection {
    pub records: Vec<DrawRecord>,
    pub failures: Vec<Failure>,
}

/// Walks detail URLs one at a time: fetch, decode, parse, and on any failure
/// one more go with the alternate encoding policy.
pub struct Collector<'a, S: PageSource + ?Sized> {
    source: &'a S,
    primary: EncodingPolicy,
    fallback: EncodingPolicy,
}

impl<'a, S: PageSource + ?Sized> Collector<'a, S> {
    pub fn new(source: &'a S, primary: EncodingPolicy) -> Self {
        Self {
            source,
            primary,
            fallback: primary.alternate(),
        }
    }

    pub fn collect(&self, urls: &[String], progress: &mut dyn Progress) -> Collection {
        progress.begin(urls.len());
        let mut out = Collection::default();

        for url in urls {
            match self.process(url) {
                Outcome::Primary(record) => {
                    out.records.push(record);
                    progress.item_done(url, true);
                }
                Outcome::Fallback { record, primary } => {
                    info!(%url, first_error = %primary, "recovered with {}", self.fallback);
                    out.records.push(record);
                    progress.item_done(url, true);
                }
                Outcome::Failed(failure) => {
                    warn!(
                        %url,
                        primary = %failure.primary,
                        fallback = %failure.fallback,
                        "failed"
                    );
                    out.failures.push(failure);
                    progress.item_done(url, false);
                }
            }
        }

        progress.finish();
        out
    }

    /// Two attempts at one URL. The page is only fetched again when the
    /// first fetch itself failed; otherwise the same bytes are re-decoded.
    #[instrument(level = "debug", skip(self))]
    pub fn process(&self, url: &str) -> Outcome {
        let fetched = self.source.fetch(url);

        let primary = match &fetched {
            Ok(page) => match extract(page, self.primary) {
                Ok(record) => return Outcome::Primary(record),
                Err(e) => e,
            },
            Err(e) => e.clone(),
        };
        warn!(%url, kind = primary.kind(), error = %primary, "retrying with {}", self.fallback);

        let retry = match fetched {
            Ok(page) => extract(&page, self.fallback),
            Err(_) => self
                .source
                .fetch(url)
                .and_then(|page| extract(&page, self.fallback)),
        };

        match retry {
            Ok(record) => Outcome::Fallback { record, primary },
            Err(fallback) => Outcome::Failed(Failure {
                url: url.to_string(),
                primary,
                fallback,
            }),
        }
    }
}

fn extract(page: &FetchedPage, policy: EncodingPolicy) -> Result<DrawRecord, ScrapeError> {
    let text = decode(&page.bytes, policy, page.charset.as_deref())?;
    parse_detail(&text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetch::MemorySource;
    use crate::progress::NullProgress;
    use encoding_rs::{GBK, UTF_8};
    use std::cell::Cell;

    const STANDARD: &str = include_str!("../tests/fixtures/detail_19001.html");

    fn gbk(s: &str) -> Vec<u8> {
        GBK.encode(s).0.into_owned()
    }

    #[test]
    fn primary_success() {
        let mut src = MemorySource::new();
        src.insert("u1", gbk(STANDARD));
        let c = Collector::new(&src, EncodingPolicy::default());
        assert!(matches!(c.process("u1"), Outcome::Primary(_)));
    }

    #[test]
    fn falls_back_to_detection() {
        // utf-8 first fails on GBK bytes, detection then reads the meta charset
        let mut src = MemorySource::new();
        src.insert("u1", gbk(STANDARD));
        let c = Collector::new(&src, EncodingPolicy::Fixed(UTF_8));
        match c.process("u1") {
            Outcome::Fallback { record, primary } => {
                assert_eq!(record.secondary_number, 12);
                assert!(matches!(primary, ScrapeError::Decode { .. }));
            }
            other => panic!("unexpected outcome {:?}", other),
        }
    }

    #[test]
    fn fallback_recovers_undeclared_legacy_page() {
        let page = STANDARD.replace(
            r#"<meta http-equiv="Content-Type" content="text/html; charset=gb2312" />"#,
            "",
        );
        let mut src = MemorySource::new();
        src.insert("u1", gbk(&page));
        let c = Collector::new(&src, EncodingPolicy::Fixed(UTF_8));
        match c.process("u1") {
            Outcome::Fallback { record, .. } => {
                assert_eq!(record.primary_numbers, vec![2, 11, 13, 24, 28, 32]);
                assert_eq!(record.prize_tier_counts[&1], 9);
            }
            other => panic!("unexpected outcome {:?}", other),
        }
    }

    /// Fails the first fetch of every URL.
    struct Flaky {
        inner: MemorySource,
        calls: Cell<usize>,
    }

    impl PageSource for Flaky {
        fn fetch(&self, url: &str) -> Result<FetchedPage, ScrapeError> {
            self.calls.set(self.calls.get() + 1);
            if self.calls.get() == 1 {
                return Err(ScrapeError::Fetch {
                    url: url.to_string(),
                    reason: "connection reset".to_string(),
                });
            }
            self.inner.fetch(url)
        }
    }

    #[test]
    fn refetches_after_fetch_failure() {
        let mut inner = MemorySource::new();
        inner.insert("u1", gbk(STANDARD));
        let src = Flaky {
            inner,
            calls: Cell::new(0),
        };
        let c = Collector::new(&src, EncodingPolicy::default());
        assert!(matches!(c.process("u1"), Outcome::Fallback { .. }));
        assert_eq!(src.calls.get(), 2);
    }

    #[test]
    fn missing_page_fails_both_attempts() {
        let src = MemorySource::new();
        let c = Collector::new(&src, EncodingPolicy::default());
        let out = c.collect(&["nowhere".to_string()], &mut NullProgress);
        assert!(out.records.is_empty());
        assert_eq!(out.failures.len(), 1);
        assert!(matches!(out.failures[0].fallback, ScrapeError::Fetch { .. }));
    }
}
