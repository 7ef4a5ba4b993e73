pub mod collect;
pub mod config;
pub mod decode;
pub mod error;
pub mod fetch;
pub mod parse;
pub mod progress;
pub mod record;
pub mod run;
pub mod store;

pub use collect::{Collection, Collector, Failure, Outcome};
pub use config::Config;
pub use decode::EncodingPolicy;
pub use error::ScrapeError;
pub use fetch::{FetchedPage, HttpSource, MemorySource, PageSource};
pub use record::DrawRecord;
pub use run::{run, RunSummary};
