//! Configuration file handling.
//!
//! This module handles loading and merging configuration from
//! `.agentcommits.toml` files.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Default configuration file name, looked up in the working directory.
pub const CONFIG_FILE: &str = ".agentcommits.toml";

/// Root configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// GitHub API settings.
    #[serde(default)]
    pub github: GitHubConfig,

    /// Record store settings.
    #[serde(default)]
    pub store: StoreConfig,

    /// Report settings.
    #[serde(default)]
    pub report: ReportConfig,
}

/// GitHub search API settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GitHubConfig {
    /// API base URL.
    #[serde(default = "default_api_url")]
    pub api_url: String,

    /// Request timeout in seconds.
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u64,

    /// Requests per minute to pace to (0 disables pacing).
    #[serde(default = "default_requests_per_minute")]
    pub requests_per_minute: u32,
}

impl Default for GitHubConfig {
    fn default() -> Self {
        Self {
            api_url: default_api_url(),
            timeout_seconds: default_timeout(),
            requests_per_minute: default_requests_per_minute(),
        }
    }
}

fn default_api_url() -> String {
    "https://api.github.com".to_string()
}

fn default_timeout() -> u64 {
    30
}

fn default_requests_per_minute() -> u32 {
    30 // authenticated search quota
}

/// Record store settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Directory holding one `<date>.csv` per collected day.
    #[serde(default = "default_store_dir")]
    pub dir: PathBuf,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            dir: default_store_dir(),
        }
    }
}

fn default_store_dir() -> PathBuf {
    PathBuf::from("data")
}

/// Report generation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportConfig {
    /// Output path of the chart image.
    #[serde(default = "default_chart_path")]
    pub chart_path: PathBuf,

    /// Markdown document holding the trend table sentinels.
    #[serde(default = "default_document_path")]
    pub document_path: PathBuf,

    /// Chart caption.
    #[serde(default = "default_chart_title")]
    pub chart_title: String,

    /// Watermark text drawn across the chart.
    #[serde(default = "default_watermark")]
    pub watermark: String,

    /// Number of most recent months shown in the trend table.
    #[serde(default = "default_table_months")]
    pub table_months: usize,

    /// TrueType font used for chart text. The bundled DejaVu Sans is used
    /// when unset or unreadable.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub font_path: Option<PathBuf>,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            chart_path: default_chart_path(),
            document_path: default_document_path(),
            chart_title: default_chart_title(),
            watermark: default_watermark(),
            table_months: default_table_months(),
            font_path: None,
        }
    }
}

fn default_chart_path() -> PathBuf {
    PathBuf::from("chart.png")
}

fn default_document_path() -> PathBuf {
    PathBuf::from("README.md")
}

fn default_chart_title() -> String {
    "Share of public GitHub commits made by AI coding agents".to_string()
}

fn default_watermark() -> String {
    "agentcommits".to_string()
}

fn default_table_months() -> usize {
    6
}

impl Config {
    /// Load configuration from a file path.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    /// Try to load configuration from the default location.
    ///
    /// Returns `Ok(None)` if the file doesn't exist, `Err` if it exists but can't be parsed.
    pub fn load_default() -> Result<Option<Self>> {
        let default_path = Path::new(CONFIG_FILE);

        if default_path.exists() {
            Ok(Some(Self::load(default_path)?))
        } else {
            Ok(None)
        }
    }

    /// Merge this configuration with CLI arguments.
    ///
    /// CLI arguments take precedence over config file settings, but only
    /// when they were given explicitly.
    pub fn merge_with_args(&mut self, args: &crate::cli::Args) {
        use crate::cli::Command;

        match &args.command {
            Some(Command::Collect(collect)) => {
                if let Some(ref dir) = collect.store {
                    self.store.dir = dir.clone();
                }
                if let Some(rpm) = collect.requests_per_minute {
                    self.github.requests_per_minute = rpm;
                }
            }
            Some(Command::Report(report)) => {
                if let Some(ref dir) = report.store {
                    self.store.dir = dir.clone();
                }
                if let Some(ref chart) = report.chart {
                    self.report.chart_path = chart.clone();
                }
                if let Some(ref document) = report.document {
                    self.report.document_path = document.clone();
                }
            }
            None => {}
        }
    }

    /// Generate a default configuration file content.
    pub fn default_toml() -> String {
        let config = Config::default();
        toml::to_string_pretty(&config).unwrap_or_else(|_| String::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.github.api_url, "https://api.github.com");
        assert_eq!(config.github.requests_per_minute, 30);
        assert_eq!(config.store.dir, PathBuf::from("data"));
        assert_eq!(config.report.table_months, 6);
        assert!(config.report.font_path.is_none());
    }

    #[test]
    fn test_parse_config() {
        let toml_content = r#"
[github]
requests_per_minute = 10

[store]
dir = "records"

[report]
chart_path = "docs/chart.png"
table_months = 3
"#;

        let config: Config = toml::from_str(toml_content).unwrap();
        assert_eq!(config.github.requests_per_minute, 10);
        assert_eq!(config.github.timeout_seconds, 30);
        assert_eq!(config.store.dir, PathBuf::from("records"));
        assert_eq!(config.report.chart_path, PathBuf::from("docs/chart.png"));
        assert_eq!(config.report.document_path, PathBuf::from("README.md"));
        assert_eq!(config.report.table_months, 3);
    }

    #[test]
    fn test_default_toml_generation() {
        let toml_str = Config::default_toml();
        assert!(toml_str.contains("[github]"));
        assert!(toml_str.contains("[store]"));
        assert!(toml_str.contains("[report]"));

        let parsed: Config = toml::from_str(&toml_str).unwrap();
        assert_eq!(parsed.report.chart_title, default_chart_title());
    }
}
