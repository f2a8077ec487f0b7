use anyhow::{Result, anyhow};
use log2::{debug, info};
use reqwest::Client;
use scraper::{Html, Selector};
use std::collections::HashSet;
use std::future::Future;
use std::time::Duration;
use url::Url;

use super::config::CrawlerConfig;
use super::error::CrawlError;

/// A fetched page that knows how to list its outgoing links.
pub trait Document: Send + Sync + 'static {
    fn extract_links(&self) -> Result<Vec<String>>;
}

/// Turns a URL into a [`Document`].
pub trait Downloader: Send + Sync + 'static {
    type Doc: Document;

    fn download(&self, url: &str) -> impl Future<Output = Result<Self::Doc>> + Send;
}

/// Host part of `url`, used as the admission key.
pub fn url_to_host(url: &str) -> Result<String, CrawlError> {
    let parsed = Url::parse(url).map_err(|e| CrawlError::MalformedUrl {
        url: url.to_string(),
        reason: e.to_string(),
    })?;
    parsed
        .host_str()
        .map(str::to_string)
        .ok_or_else(|| CrawlError::MalformedUrl {
            url: url.to_string(),
            reason: "url has no host".to_string(),
        })
}

/// If `path` is a full URL, returns it as-is. Otherwise constructs a full URL by
/// merging with `root_url`. Trailing slashes are removed and fragments stripped.
pub fn construct_url(path: &str, root_url: &Url) -> Result<Url, url::ParseError> {
    let mut url = match Url::parse(path) {
        Ok(parsed_url) if parsed_url.host().is_some() => parsed_url,
        _ => root_url.join(path)?,
    };

    let trimmed_path = url.path().trim_end_matches('/').to_string();
    url.set_path(&trimmed_path);
    url.set_fragment(None);

    Ok(url)
}

fn is_followable(href: &str) -> bool {
    !(href.starts_with('#')
        || href.starts_with("mailto:")
        || href.starts_with("tel:")
        || href.starts_with("javascript:"))
}

/// Raw HTML of a downloaded page together with the URL it came from.
#[derive(Debug, Clone)]
pub struct HtmlDocument {
    url: Url,
    body: String,
}

impl HtmlDocument {
    pub fn new(url: Url, body: String) -> Self {
        Self { url, body }
    }
}

impl Document for HtmlDocument {
    fn extract_links(&self) -> Result<Vec<String>> {
        let document = Html::parse_document(&self.body);
        let selector = Selector::parse("a[href]")
            .map_err(|e| anyhow!("Failed to parse <a> selector: {}", e))?;

        let mut seen = HashSet::new();
        let mut links = Vec::new();
        for element in document.select(&selector) {
            let Some(href) = element.value().attr("href") else {
                continue;
            };
            if !is_followable(href) {
                continue;
            }
            match construct_url(href, &self.url) {
                Ok(link) if matches!(link.scheme(), "http" | "https") => {
                    let link = link.to_string();
                    if seen.insert(link.clone()) {
                        links.push(link);
                    }
                }
                Ok(link) => debug!("Skipped non-http link: {}", link),
                Err(e) => debug!("Skipped unparsable link {} on {}: {}", href, self.url, e),
            }
        }

        info!("Found {} urls on page {}", links.len(), self.url);
        Ok(links)
    }
}

/// Downloads pages over HTTP(S).
pub struct HttpDownloader {
    client: Client,
    timeout: Duration,
}

impl HttpDownloader {
    pub fn new(config: &CrawlerConfig) -> Result<Self> {
        let client = Client::builder().build()?;
        Ok(Self {
            client,
            timeout: Duration::from_secs(config.request_timeout_sec),
        })
    }
}

impl Downloader for HttpDownloader {
    type Doc = HtmlDocument;

    async fn download(&self, url: &str) -> Result<HtmlDocument> {
        let url = Url::parse(url)?;
        let response = self
            .client
            .get(url.clone())
            .timeout(self.timeout)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(anyhow!("Failed to fetch page: {}", response.status()));
        }

        let body = response.text().await?;
        debug!("Downloaded {} ({} bytes)", url, body.len());
        Ok(HtmlDocument::new(url, body))
    }
}
