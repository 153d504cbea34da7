// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result, anyhow, bail};
use reqwest::blocking::Client as HttpClient;
use std::env;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use sublines_app::{Dataset, DatasetDocument, ExportArtifact};
use tracing::{debug, info};
use url::Url;

pub const APP_NAME: &str = "sublines";
pub const DEFAULT_DATA_SOURCE: &str = "data.json";
pub const DEFAULT_LOAD_TIMEOUT: Duration = Duration::from_secs(5);

const DEMO_DATASET_JSON: &str = include_str!("../data/demo.json");

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DataSource {
    File(PathBuf),
    Remote(Url),
}

impl DataSource {
    pub fn parse(raw: &str) -> Result<Self> {
        validate_data_source(raw)?;
        if raw.starts_with("http://") || raw.starts_with("https://") {
            let url = Url::parse(raw).with_context(|| format!("parse data URL {raw:?}"))?;
            return Ok(Self::Remote(url));
        }
        Ok(Self::File(PathBuf::from(raw)))
    }
}

impl fmt::Display for DataSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::File(path) => write!(f, "{}", path.display()),
            Self::Remote(url) => write!(f, "{url}"),
        }
    }
}

pub fn validate_data_source(raw: &str) -> Result<()> {
    if raw.trim().is_empty() {
        bail!("data source must not be empty");
    }

    if let Some(index) = raw.find("://")
        && index > 0
    {
        let scheme = &raw[..index];
        if scheme.chars().all(char::is_alphabetic) && scheme != "http" && scheme != "https" {
            bail!(
                "data source {raw:?} uses unsupported scheme {scheme}://; pass a filesystem path or an http(s) URL"
            );
        }
    }

    if raw.starts_with("file:") {
        bail!("data source {raw:?} uses file: URI syntax; pass a plain filesystem path");
    }

    Ok(())
}

/// `SUBLINES_DATA_SOURCE` when set, otherwise `data.json` in the working
/// directory.
pub fn default_data_source() -> String {
    env::var("SUBLINES_DATA_SOURCE").unwrap_or_else(|_| DEFAULT_DATA_SOURCE.to_owned())
}

/// Loads the dataset once. There is no retry and no caching.
pub fn load_dataset(source: &DataSource, timeout: Duration) -> Result<Dataset> {
    debug!(%source, "loading dataset");
    let raw = match source {
        DataSource::File(path) => fs::read_to_string(path)
            .with_context(|| format!("read dataset file {}", path.display()))?,
        DataSource::Remote(url) => fetch_remote(url, timeout)?,
    };

    let dataset = parse_dataset(&raw).with_context(|| format!("load dataset from {source}"))?;
    info!(
        %source,
        languages = dataset.len(),
        event_types = dataset.event_types().len(),
        "dataset loaded"
    );
    Ok(dataset)
}

pub fn parse_dataset(raw: &str) -> Result<Dataset> {
    let document: DatasetDocument =
        serde_json::from_str(raw).context("decode dataset JSON document")?;
    Dataset::try_from(document)
}

pub fn demo_dataset() -> Result<Dataset> {
    parse_dataset(DEMO_DATASET_JSON).context("decode bundled demo dataset")
}

fn fetch_remote(url: &Url, timeout: Duration) -> Result<String> {
    let http = HttpClient::builder()
        .timeout(timeout)
        .build()
        .context("build HTTP client")?;

    let response = http
        .get(url.clone())
        .send()
        .map_err(|error| anyhow!("cannot reach {url} -- check the data source ({error})"))?;

    let status = response.status();
    if !status.is_success() {
        bail!("fetch {url} returned {}", status.as_u16());
    }

    response
        .text()
        .with_context(|| format!("read response body from {url}"))
}

/// Platform download directory, falling back to the working directory.
pub fn default_export_dir() -> Result<PathBuf> {
    if let Some(dir) = dirs::download_dir() {
        return Ok(dir);
    }
    env::current_dir().context("resolve current directory for exports")
}

pub fn write_export(dir: &Path, artifact: &ExportArtifact) -> Result<PathBuf> {
    fs::create_dir_all(dir)
        .with_context(|| format!("create export directory {}", dir.display()))?;
    let path = dir.join(&artifact.file_name);
    fs::write(&path, &artifact.contents)
        .with_context(|| format!("write export {}", path.display()))?;
    info!(
        path = %path.display(),
        rows = artifact.row_count,
        mime = %artifact.mime_type,
        "export written"
    );
    Ok(path)
}

pub fn cache_dir() -> Result<PathBuf> {
    let cache_root = dirs::cache_dir().ok_or_else(|| {
        anyhow!("cannot resolve cache directory; set XDG_CACHE_HOME or platform equivalent")
    })?;
    let dir = cache_root.join(APP_NAME);
    fs::create_dir_all(&dir)
        .with_context(|| format!("create cache directory {}", dir.display()))?;
    Ok(dir)
}
