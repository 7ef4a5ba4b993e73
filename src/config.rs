// src/config.rs

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::{
    env, fs,
    path::{Path, PathBuf},
};
use url::Url;

use crate::decode::EncodingPolicy;

pub const DEFAULT_INDEX_URL: &str = "http://kaijiang.500.com/shtml/ssq/19002.shtml";
pub const DEFAULT_DETAIL_PREFIX: &str = "https://kaijiang.500.com/shtml/ssq/";

/// Everything a download run needs to know.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Page whose links enumerate the draws.
    pub index_url: String,
    /// Only links starting with this are treated as draw pages.
    pub detail_prefix: String,
    /// Encoding label for the listing page.
    pub listing_encoding: String,
    /// Encoding label for detail pages, or `auto`.
    pub encoding: String,
    pub save_dir: PathBuf,
    pub file_name: String,
    /// How many of the newest draws to fetch.
    pub limit: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            index_url: DEFAULT_INDEX_URL.to_string(),
            detail_prefix: DEFAULT_DETAIL_PREFIX.to_string(),
            listing_encoding: "gbk".to_string(),
            encoding: "gb18030".to_string(),
            save_dir: PathBuf::from("./data/"),
            file_name: "shuangseqiu.json".to_string(),
            limit: 100,
        }
    }
}

impl Config {
    /// Defaults overlaid with a YAML file. Missing keys keep their defaults.
    pub fn from_yaml_file(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path).with_context(|| format!("reading {:?}", path))?;
        serde_yaml::from_str(&text).with_context(|| format!("parsing {:?}", path))
    }

    /// Apply `SSQ_SAVE_DIR`, `SSQ_ENCODING` and `SSQ_LIMIT` when set.
    pub fn apply_env(&mut self) -> Result<()> {
        self.apply_vars(|key| env::var(key).ok())
    }

    fn apply_vars(&mut self, get: impl Fn(&str) -> Option<String>) -> Result<()> {
        if let Some(dir) = get("SSQ_SAVE_DIR") {
            self.save_dir = PathBuf::from(dir);
        }
        if let Some(enc) = get("SSQ_ENCODING") {
            self.encoding = enc;
        }
        if let Some(limit) = get("SSQ_LIMIT") {
            self.limit = limit
                .trim()
                .parse()
                .with_context(|| format!("SSQ_LIMIT={:?} is not a number", limit))?;
        }
        Ok(())
    }

    /// Reject settings that would only fail later, mid-run.
    pub fn validate(&self) -> Result<()> {
        self.index_url()?;
        self.detail_policy()?;
        self.listing_policy()?;
        if self.limit == 0 {
            anyhow::bail!("limit must be at least 1");
        }
        if self.file_name.trim().is_empty() {
            anyhow::bail!("file_name is empty");
        }
        Ok(())
    }

    pub fn index_url(&self) -> Result<Url> {
        Url::parse(&self.index_url).with_context(|| format!("index_url {:?}", self.index_url))
    }

    pub fn detail_policy(&self) -> Result<EncodingPolicy> {
        EncodingPolicy::from_label(&self.encoding).context("encoding")
    }

    pub fn listing_policy(&self) -> Result<EncodingPolicy> {
        EncodingPolicy::from_label(&self.listing_encoding).context("listing_encoding")
    }

    pub fn output_path(&self) -> PathBuf {
        self.save_dir.join(&self.file_name)
    }
}
