use clap::{Parser, ValueEnum};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::crawler::{CrawlerConfig, LINK_REQUEST_TIMEOUT_SEC};

/// Log levels as defined in log2 crate
#[derive(Debug, Serialize, Deserialize, Clone, ValueEnum)]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

/// All program arguments. `CrawlerConfig` describes only the crawler itself.
#[derive(Parser, Debug, Serialize, Deserialize)]
#[command(author, version, about, long_about = None)]
pub struct Config {
    /// URL to start crawling from
    pub url: String,
    /// Number of link layers to download (1 = only the starting page)
    #[arg(default_value_t = 1)]
    pub depth: usize,
    /// Number of download workers
    #[arg(default_value_t = 1)]
    pub downloads: usize,
    /// Number of link extraction workers
    #[arg(default_value_t = 1)]
    pub extractors: usize,
    /// Maximum simultaneous downloads per host
    #[arg(default_value_t = 1)]
    pub per_host: usize,
    /// Only crawl these hosts (may be repeated)
    #[arg(long = "host")]
    pub hosts: Vec<String>,
    /// Request timeout in seconds
    #[arg(long, default_value_t = LINK_REQUEST_TIMEOUT_SEC)]
    pub timeout: u64,
    /// Write a JSON report of the crawl to this file
    #[arg(short, long)]
    pub output: Option<PathBuf>,
    /// Logging level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info", value_enum)]
    pub log_level: LogLevel,
}

impl Config {
    pub fn new() -> Self {
        Self::parse()
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        if self.depth == 0 {
            anyhow::bail!("depth must be greater than 0");
        }
        if self.downloads == 0 {
            anyhow::bail!("downloads must be greater than 0");
        }
        if self.extractors == 0 {
            anyhow::bail!("extractors must be greater than 0");
        }
        if self.per_host == 0 {
            anyhow::bail!("per_host must be greater than 0");
        }
        self.crawler_config().validate()?;
        Ok(())
    }

    pub fn crawler_config(&self) -> CrawlerConfig {
        CrawlerConfig::new()
            .with_downloaders(self.downloads)
            .with_extractors(self.extractors)
            .with_per_host(self.per_host)
            .with_request_timeout(self.timeout)
    }
}

impl std::fmt::Display for LogLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            LogLevel::Trace => "trace",
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        };
        write!(f, "{}", s)
    }
}
