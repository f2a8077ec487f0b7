use tokio::sync::Semaphore;

use super::error::CrawlError;

/// Default timeout for page requests in seconds
pub const LINK_REQUEST_TIMEOUT_SEC: u64 = 10;

/// Configuration for the crawler
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CrawlerConfig {
    /// Number of workers in the download pool
    pub downloaders: usize,
    /// Number of workers in the extraction pool
    pub extractors: usize,
    /// Maximum number of simultaneous downloads per host
    pub per_host: usize,
    pub request_timeout_sec: u64,
}

impl CrawlerConfig {
    pub fn new() -> Self {
        Self {
            downloaders: 1,
            extractors: 1,
            per_host: 1,
            request_timeout_sec: LINK_REQUEST_TIMEOUT_SEC,
        }
    }

    pub fn with_downloaders(mut self, downloaders: usize) -> Self {
        self.downloaders = downloaders;
        self
    }

    pub fn with_extractors(mut self, extractors: usize) -> Self {
        self.extractors = extractors;
        self
    }

    pub fn with_per_host(mut self, per_host: usize) -> Self {
        self.per_host = per_host;
        self
    }

    pub fn with_request_timeout(mut self, timeout_sec: u64) -> Self {
        self.request_timeout_sec = timeout_sec;
        self
    }

    pub fn validate(&self) -> Result<(), CrawlError> {
        if self.downloaders == 0 {
            return Err(CrawlError::InvalidConfig("downloaders must be greater than 0".into()));
        }
        if self.extractors == 0 {
            return Err(CrawlError::InvalidConfig("extractors must be greater than 0".into()));
        }
        if self.per_host == 0 {
            return Err(CrawlError::InvalidConfig("per_host must be greater than 0".into()));
        }
        if self.per_host > Semaphore::MAX_PERMITS {
            return Err(CrawlError::InvalidConfig(format!(
                "per_host must be at most {}",
                Semaphore::MAX_PERMITS
            )));
        }
        Ok(())
    }
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self::new()
    }
}
