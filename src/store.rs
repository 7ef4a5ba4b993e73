// src/store.rs

use anyhow::{Context, Result};
use std::{
    fs::{self, File},
    io::{BufReader, BufWriter, Write},
    path::Path,
};
use tempfile::NamedTempFile;
use tracing::{debug, instrument};

use crate::record::DrawRecord;

/// Write `records` as pretty JSON to `path`, replacing whatever was there.
///
/// The data goes to a temp file beside `path` first and is renamed into place,
/// so a crash never leaves a half-written file behind. The parent directory is
/// created if needed.
#[instrument(level = "info", skip(records), fields(count = records.len()))]
pub fn save_records(path: &Path, records: &[DrawRecord]) -> Result<()> {
    let dir = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    fs::create_dir_all(dir).with_context(|| format!("creating {:?}", dir))?;

    let tmp = NamedTempFile::new_in(dir).with_context(|| format!("temp file in {:?}", dir))?;
    {
        let mut w = BufWriter::new(tmp.as_file());
        serde_json::to_writer_pretty(&mut w, records).context("serializing records")?;
        w.write_all(b"\n")?;
        w.flush()?;
    }
    tmp.persist(path)
        .with_context(|| format!("replacing {:?}", path))?;
    debug!(path = %path.display(), "records written");
    Ok(())
}

/// Read back a file written by [`save_records`].
pub fn load_records(path: &Path) -> Result<Vec<DrawRecord>> {
    let f = File::open(path).with_context(|| format!("opening {:?}", path))?;
    serde_json::from_reader(BufReader::new(f)).with_context(|| format!("parsing {:?}", path))
}
