//! The on-disk configuration file: exporter targets plus logging.

use std::path::Path;

use anyhow::{Context, Result};
use chainprobe_core::ExporterConfig;
use chainprobe_observability::LogConfig;
use serde::Deserialize;

#[derive(Debug)]
pub struct FileConfig {
    pub exporter: ExporterConfig,
    pub log: LogConfig,
}

/// The `log:` key, read in its own pass over the document. Every other key
/// belongs to [`ExporterConfig`]; a flattened struct would turn unquoted
/// scalars such as `args: [7]` into numbers.
#[derive(Debug, Default, Deserialize)]
struct LogSection {
    #[serde(default)]
    log: LogConfig,
}

impl FileConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("reading config file '{}'", path.display()))?;
        Self::parse(&raw).with_context(|| format!("loading config file '{}'", path.display()))
    }

    pub fn parse(yaml: &str) -> Result<Self> {
        let exporter = ExporterConfig::from_yaml_str(yaml)?;
        let LogSection { log } = serde_yaml::from_str(yaml)?;
        Ok(Self { exporter, log })
    }
}
