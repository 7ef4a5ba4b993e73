// src/run.rs

use anyhow::{Context, Result};
use std::path::PathBuf;
use tracing::{info, instrument, warn};

use crate::collect::{Collector, Failure};
use crate::config::Config;
use crate::decode::decode;
use crate::fetch::PageSource;
use crate::parse::{parse_listing, select_recent};
use crate::progress::Progress;
use crate::store::save_records;

/// What a finished run produced.
#[derive(Debug)]
pub struct RunSummary {
    pub output: PathBuf,
    pub urls: usize,
    pub records: usize,
    pub failures: Vec<Failure>,
}

/// Listing → newest detail pages → records on disk.
///
/// Only a listing page that cannot be fetched, decoded, or that yields no
/// detail links aborts the run. Per-draw failures are reported in the summary.
#[instrument(level = "info", skip_all, fields(index = %config.index_url))]
pub fn run(
    config: &Config,
    source: &dyn PageSource,
    progress: &mut dyn Progress,
) -> Result<RunSummary> {
    config.validate()?;
    let base = config.index_url()?;

    let page = source
        .fetch(base.as_str())
        .context("fetching listing page")?;
    let listing = decode(&page.bytes, config.listing_policy()?, page.charset.as_deref())
        .context("decoding listing page")?;

    let links = parse_listing(&listing, &base, &config.detail_prefix);
    if links.is_empty() {
        anyhow::bail!("no draw links found on {}", base);
    }
    let urls = select_recent(links, config.limit);
    info!("Total number of urls: {}", urls.len());

    let collector = Collector::new(source, config.detail_policy()?);
    let collection = collector.collect(&urls, progress);

    for f in &collection.failures {
        warn!(url = %f.url, error = %f.fallback, "Failed");
    }
    if !collection.failures.is_empty() {
        warn!(count = collection.failures.len(), "draws skipped");
    }

    let output = config.output_path();
    save_records(&output, &collection.records)
        .with_context(|| format!("saving records to {}", output.display()))?;
    info!(
        path = %output.display(),
        "Data download complete. Number of records: {}",
        collection.records.len()
    );

    Ok(RunSummary {
        output,
        urls: urls.len(),
        records: collection.records.len(),
        failures: collection.failures,
    })
}
