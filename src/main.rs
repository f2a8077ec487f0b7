use anyhow::Result;
use layer_crawler::config;
use layer_crawler::crawler::{self, CrawlResult};
use log2::*;
use serde::Serialize;
use std::collections::BTreeMap;
use std::time::Instant;

/// Indicates start time of a project, lazily initialized
pub static START_TIME: once_cell::sync::Lazy<Instant> = once_cell::sync::Lazy::new(Instant::now);

/// JSON shape of `--output`
#[derive(Serialize)]
struct Report<'a> {
    downloaded: &'a [String],
    errors: BTreeMap<&'a str, String>,
}

impl<'a> Report<'a> {
    fn new(result: &'a CrawlResult) -> Self {
        Self {
            downloaded: result.downloaded(),
            errors: result
                .errors()
                .iter()
                .map(|(url, e)| (url.as_str(), e.to_string()))
                .collect(),
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let _ = *START_TIME;
    let cfg = config::Config::new();
    cfg.validate()?;
    let _log2 = stdout()
        .module(true) // include module name
        .module_with_line(true) // include line number from module
        .module_filter(|module| module.starts_with("layer_crawler"))
        .compress(false)
        .level(cfg.log_level.to_string())
        .start();

    let crawler_config = cfg.crawler_config();
    let downloader = crawler::HttpDownloader::new(&crawler_config)?;
    let crawler = crawler::WebCrawler::new(downloader, &crawler_config)?;

    let outcome = if cfg.hosts.is_empty() {
        crawler.download(&cfg.url, cfg.depth).await
    } else {
        crawler
            .download_restricted(&cfg.url, cfg.depth, cfg.hosts.iter().cloned())
            .await
    };
    crawler.close().await;

    match outcome {
        Ok(result) => {
            info!(
                "Crawling completed in {:?}: {} pages downloaded, {} errors",
                START_TIME.elapsed(),
                result.downloaded().len(),
                result.errors().len()
            );
            for url in result.downloaded() {
                println!("{}", url);
            }
            for (url, e) in result.errors() {
                warn!("{}: {}", url, e);
            }

            if let Some(path) = cfg.output {
                std::fs::write(&path, serde_json::to_string_pretty(&Report::new(&result))?)?;
                info!("Report written to {:?}", path);
            }
        }
        Err(e) => {
            error!("Crawling failed: {}", e);
            return Err(e.into());
        }
    }

    Ok(())
}
