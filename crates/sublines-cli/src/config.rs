// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result, anyhow, bail};
use serde::Deserialize;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use sublines_data::DataSource;

const CONFIG_VERSION: i64 = 1;
const DEFAULT_TIMEOUT: &str = "5s";
const DEFAULT_COPY_ACK: &str = "1500ms";

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub version: i64,
    #[serde(default)]
    pub data: Data,
    #[serde(default)]
    pub export: Export,
    #[serde(default)]
    pub ui: Ui,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            version: CONFIG_VERSION,
            data: Data::default(),
            export: Export::default(),
            ui: Ui::default(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Data {
    pub source: Option<String>,
    pub timeout: Option<String>,
}

impl Default for Data {
    fn default() -> Self {
        Self {
            source: None,
            timeout: Some(DEFAULT_TIMEOUT.to_owned()),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Export {
    pub dir: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Ui {
    pub copy_ack: Option<String>,
}

impl Default for Ui {
    fn default() -> Self {
        Self {
            copy_ack: Some(DEFAULT_COPY_ACK.to_owned()),
        }
    }
}

impl Config {
    pub fn default_path() -> Result<PathBuf> {
        if let Some(path) = env::var_os("SUBLINES_CONFIG_PATH") {
            return Ok(PathBuf::from(path));
        }

        let config_root = dirs::config_dir().ok_or_else(|| {
            anyhow!("cannot resolve config directory; set SUBLINES_CONFIG_PATH to the config file")
        })?;

        Ok(config_root.join(sublines_data::APP_NAME).join("config.toml"))
    }

    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let raw = fs::read_to_string(path)
            .with_context(|| format!("read config file {}", path.display()))?;
        let value: toml::Value = toml::from_str(&raw)
            .with_context(|| format!("parse TOML config {}", path.display()))?;

        let version = value
            .get("version")
            .and_then(toml::Value::as_integer)
            .ok_or_else(|| {
                anyhow!(
                    "config file {} is not versioned. Add `version = 1` and put values under [data], [export], and [ui]",
                    path.display()
                )
            })?;

        if version != CONFIG_VERSION {
            bail!(
                "unsupported config version {} in {}; expected version = 1",
                version,
                path.display()
            );
        }

        let config: Config = value
            .try_into()
            .with_context(|| format!("decode config {}", path.display()))?;
        config.validate(path)?;
        Ok(config)
    }

    fn validate(&self, path: &Path) -> Result<()> {
        if let Some(source) = &self.data.source {
            sublines_data::validate_data_source(source)
                .with_context(|| format!("invalid data.source in {}", path.display()))?;
        }

        if let Some(timeout) = &self.data.timeout {
            let parsed = parse_duration(timeout)?;
            if parsed <= Duration::ZERO {
                bail!(
                    "data.timeout in {} must be positive, got {}",
                    path.display(),
                    timeout
                );
            }
        }

        if let Some(dir) = &self.export.dir
            && dir.trim().is_empty()
        {
            bail!(
                "export.dir in {} must not be empty; remove it to use the download directory",
                path.display()
            );
        }

        if let Some(copy_ack) = &self.ui.copy_ack {
            parse_duration(copy_ack)?;
        }

        Ok(())
    }

    /// `[data] source`, then `SUBLINES_DATA_SOURCE`, then `data.json`.
    pub fn data_source(&self) -> Result<DataSource> {
        let raw = match &self.data.source {
            Some(source) => source.clone(),
            None => sublines_data::default_data_source(),
        };
        DataSource::parse(&raw)
    }

    pub fn load_timeout(&self) -> Result<Duration> {
        parse_duration(self.data.timeout.as_deref().unwrap_or(DEFAULT_TIMEOUT))
    }

    pub fn export_dir(&self) -> Result<PathBuf> {
        match &self.export.dir {
            Some(dir) => Ok(PathBuf::from(dir)),
            None => sublines_data::default_export_dir(),
        }
    }

    pub fn copy_ack(&self) -> Result<Duration> {
        parse_duration(self.ui.copy_ack.as_deref().unwrap_or(DEFAULT_COPY_ACK))
    }

    pub fn example_config(path: &Path) -> String {
        format!(
            "# sublines config\n# Place this file at: {}\n\nversion = 1\n\n[data]\n# Path or http(s) URL of the dataset. Default is data.json in the working directory.\n# source = \"https://example.com/subjects.json\"\ntimeout = \"{}\"\n\n[export]\n# Optional. Default is the platform download directory.\n# dir = \"/absolute/path/to/exports\"\n\n[ui]\ncopy_ack = \"{}\"\n",
            path.display(),
            DEFAULT_TIMEOUT,
            DEFAULT_COPY_ACK,
        )
    }
}

fn parse_duration(raw: &str) -> Result<Duration> {
    if let Some(value) = raw.strip_suffix("ms") {
        let millis: u64 = value
            .parse()
            .with_context(|| format!("invalid duration {raw:?}"))?;
        return Ok(Duration::from_millis(millis));
    }
    if let Some(value) = raw.strip_suffix('s') {
        let secs: u64 = value
            .parse()
            .with_context(|| format!("invalid duration {raw:?}"))?;
        return Ok(Duration::from_secs(secs));
    }
    if let Some(value) = raw.strip_suffix('m') {
        let mins: u64 = value
            .parse()
            .with_context(|| format!("invalid duration {raw:?}"))?;
        return Ok(Duration::from_secs(mins.saturating_mul(60)));
    }

    bail!("invalid duration {raw:?}; use one of: <N>ms, <N>s, <N>m (for example 1500ms or 5s)")
}
