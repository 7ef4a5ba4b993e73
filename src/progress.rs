// src/progress.rs

use tracing::info;

/// Hooks the collector calls while it works through the detail pages.
pub trait Progress {
    /// Called once with the number of URLs about to be processed.
    fn begin(&mut self, _total: usize) {}

    /// Called after each URL, whether or not it produced a record.
    fn item_done(&mut self, _url: &str, _ok: bool) {}

    /// Called once when the batch is exhausted.
    fn finish(&mut self) {}
}

/// A no-op progress sink.
pub struct NullProgress;
impl Progress for NullProgress {}

/// Logs a running `n/total` line per URL.
#[derive(Debug, Default)]
pub struct LogProgress {
    total: usize,
    done: usize,
    failed: usize,
}

impl Progress for LogProgress {
    fn begin(&mut self, total: usize) {
        self.total = total;
        self.done = 0;
        self.failed = 0;
    }

    fn item_done(&mut self, url: &str, ok: bool) {
        self.done += 1;
        if !ok {
            self.failed += 1;
        }
        info!(%url, ok, "[{}/{}]", self.done, self.total);
    }

    fn finish(&mut self) {
        info!(done = self.done, failed = self.failed, "collection finished");
    }
}
