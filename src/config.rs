//! Designer configuration
//!
//! Defaults, overridable from a JSON file and from `DESIGNER_*` environment
//! variables (a `.env` file is honoured by the binary).

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;
use tokio::fs;

use crate::error::DesignerError;
use crate::optimizer::AssemblerSettings;

pub const ENV_OPTIMIZER_URL: &str = "DESIGNER_OPTIMIZER_URL";
pub const ENV_OPTIMIZER_API_KEY: &str = "DESIGNER_OPTIMIZER_API_KEY";
pub const ENV_OPTIMIZER_TIMEOUT_SECS: &str = "DESIGNER_OPTIMIZER_TIMEOUT_SECS";
pub const ENV_REPORT_ROWS: &str = "DESIGNER_REPORT_ROWS";
pub const ENV_REPORT_PRECISION: &str = "DESIGNER_REPORT_PRECISION";

#[derive(Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DesignerConfig {
    /// Base URL of the optimizer service
    pub optimizer_url: Option<String>,
    pub optimizer_api_key: Option<String>,
    pub optimizer_timeout_secs: u64,
    /// Number of ranked designs kept in a run report
    pub report_rows: usize,
    /// Decimals kept in a run report
    pub report_precision: usize,
    pub log_filter: String,
}

impl Default for DesignerConfig {
    fn default() -> Self {
        Self {
            optimizer_url: None,
            optimizer_api_key: None,
            optimizer_timeout_secs: 600,
            report_rows: 10,
            report_precision: 2,
            log_filter: "composite_designer=info".to_string(),
        }
    }
}

// The API key stays out of logs and debug output.
impl std::fmt::Debug for DesignerConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DesignerConfig")
            .field("optimizer_url", &self.optimizer_url)
            .field("optimizer_api_key", &self.optimizer_api_key.as_ref().map(|_| "<redacted>"))
            .field("optimizer_timeout_secs", &self.optimizer_timeout_secs)
            .field("report_rows", &self.report_rows)
            .field("report_precision", &self.report_precision)
            .field("log_filter", &self.log_filter)
            .finish()
    }
}

fn parse_var<T: std::str::FromStr>(name: &str, raw: &str) -> std::result::Result<T, DesignerError> {
    raw.trim()
        .parse()
        .map_err(|_| DesignerError::Config(format!("{} has invalid value {:?}", name, raw)))
}

impl DesignerConfig {
    /// Defaults overlaid with environment variables
    pub fn from_env() -> std::result::Result<Self, DesignerError> {
        Self::default().with_overrides(|name| std::env::var(name).ok())
    }

    /// Overlay values from `lookup` (an environment, or a map in tests)
    pub fn with_overrides<F>(mut self, lookup: F) -> std::result::Result<Self, DesignerError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup(ENV_OPTIMIZER_URL) {
            self.optimizer_url = Some(url);
        }
        if let Some(key) = lookup(ENV_OPTIMIZER_API_KEY) {
            self.optimizer_api_key = Some(key);
        }
        if let Some(raw) = lookup(ENV_OPTIMIZER_TIMEOUT_SECS) {
            self.optimizer_timeout_secs = parse_var(ENV_OPTIMIZER_TIMEOUT_SECS, &raw)?;
        }
        if let Some(raw) = lookup(ENV_REPORT_ROWS) {
            self.report_rows = parse_var(ENV_REPORT_ROWS, &raw)?;
        }
        if let Some(raw) = lookup(ENV_REPORT_PRECISION) {
            self.report_precision = parse_var(ENV_REPORT_PRECISION, &raw)?;
        }
        if self.optimizer_timeout_secs == 0 {
            return Err(DesignerError::Config("optimizer timeout must be positive".into()));
        }
        Ok(self)
    }

    pub fn assembler_settings(&self) -> AssemblerSettings {
        AssemblerSettings {
            timeout: Duration::from_secs(self.optimizer_timeout_secs),
            report_rows: self.report_rows,
            report_precision: self.report_precision,
        }
    }
}

/// Reads and writes the configuration file
pub struct ConfigManager {
    path: PathBuf,
}

impl ConfigManager {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Load the file, writing defaults first when it does not exist
    pub async fn load(&self) -> Result<DesignerConfig> {
        if !self.path.exists() {
            let default = DesignerConfig::default();
            self.save(&default).await?;
            return Ok(default);
        }
        let content = fs::read_to_string(&self.path)
            .await
            .with_context(|| format!("Failed to read config file {}", self.path.display()))?;
        let config = serde_json::from_str(&content).context("Failed to parse config file")?;
        Ok(config)
    }

    pub async fn save(&self, config: &DesignerConfig) -> Result<()> {
        let content = serde_json::to_string_pretty(config).context("Failed to serialize config")?;
        fs::write(&self.path, content)
            .await
            .with_context(|| format!("Failed to write config file {}", self.path.display()))?;
        Ok(())
    }
}
