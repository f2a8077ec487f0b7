use thiserror::Error;

/// Everything that can go wrong while crawling.
///
/// `MalformedUrl`, `Fetch` and `Extract` are per-URL failures: they land in
/// the error ledger and never abort a crawl. The remaining variants are fatal
/// and surface from `WebCrawler::new` / `WebCrawler::download` directly.
#[derive(Debug, Error)]
pub enum CrawlError {
    #[error("malformed url `{url}`: {reason}")]
    MalformedUrl { url: String, reason: String },

    #[error("failed to download {url}: {source}")]
    Fetch {
        url: String,
        #[source]
        source: anyhow::Error,
    },

    #[error("failed to extract links from {url}: {source}")]
    Extract {
        url: String,
        #[source]
        source: anyhow::Error,
    },

    #[error("invalid crawler configuration: {0}")]
    InvalidConfig(String),

    #[error("crawler must be created inside a tokio runtime")]
    NoRuntime,

    #[error("crawler has been closed")]
    Closed,
}

impl CrawlError {
    /// URL the failure is recorded against, if it is a per-URL failure.
    pub fn url(&self) -> Option<&str> {
        match self {
            CrawlError::MalformedUrl { url, .. }
            | CrawlError::Fetch { url, .. }
            | CrawlError::Extract { url, .. } => Some(url),
            _ => None,
        }
    }
}
