use dashmap::mapref::entry::Entry;
use dashmap::{DashMap, DashSet};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;

use super::admission::AdmissionRegistry;
use super::barrier::LayerBarrier;
use super::error::CrawlError;

/// URLs already scheduled during one crawl.
#[derive(Default)]
pub struct VisitedSet {
    urls: DashSet<String>,
}

impl VisitedSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Marks `url` as visited. Returns `false` if someone got there first.
    pub fn insert(&self, url: &str) -> bool {
        self.urls.insert(url.to_string())
    }

    pub fn contains(&self, url: &str) -> bool {
        self.urls.contains(url)
    }

    pub fn len(&self) -> usize {
        self.urls.len()
    }

    pub fn is_empty(&self) -> bool {
        self.urls.is_empty()
    }
}

/// Failures keyed by URL. The first failure recorded for a URL sticks.
#[derive(Default)]
pub struct ErrorLedger {
    errors: DashMap<String, CrawlError>,
}

impl ErrorLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records `error` against `url`; returns `false` if `url` already had one.
    pub fn record(&self, url: &str, error: CrawlError) -> bool {
        match self.errors.entry(url.to_string()) {
            Entry::Occupied(_) => false,
            Entry::Vacant(slot) => {
                slot.insert(error);
                true
            }
        }
    }

    pub fn contains(&self, url: &str) -> bool {
        self.errors.contains_key(url)
    }

    pub fn len(&self) -> usize {
        self.errors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    /// Moves every entry out of the ledger.
    pub fn drain(&self) -> HashMap<String, CrawlError> {
        let urls: Vec<String> = self.errors.iter().map(|entry| entry.key().clone()).collect();
        urls.into_iter()
            .filter_map(|url| self.errors.remove(&url))
            .collect()
    }
}

/// State shared by every task of a single `download` call.
pub struct CrawlSession {
    pub visited: VisitedSet,
    pub errors: ErrorLedger,
    pub admission: AdmissionRegistry,
    pub barrier: Arc<LayerBarrier>,
    /// Pages fetched successfully, in completion order
    pub downloaded: Mutex<Vec<String>>,
    /// Links discovered during the current layer
    pub next_layer: Mutex<Vec<String>>,
}

impl CrawlSession {
    pub fn new(admission: AdmissionRegistry) -> Self {
        Self {
            visited: VisitedSet::new(),
            errors: ErrorLedger::new(),
            admission,
            barrier: Arc::new(LayerBarrier::new()),
            downloaded: Mutex::new(Vec::new()),
            next_layer: Mutex::new(Vec::new()),
        }
    }

    /// Hands the links gathered during the last layer to the controller.
    pub async fn take_next_layer(&self) -> Vec<String> {
        std::mem::take(&mut *self.next_layer.lock().await)
    }

    /// Builds the final result. Anything that ended up in the ledger is left
    /// out of the downloaded list.
    pub async fn finish(&self) -> CrawlResult {
        let errors = self.errors.drain();
        let downloaded = std::mem::take(&mut *self.downloaded.lock().await)
            .into_iter()
            .filter(|url| !errors.contains_key(url))
            .collect();
        CrawlResult { downloaded, errors }
    }
}

pub type CrawlSessionRef = Arc<CrawlSession>;

/// Outcome of one crawl.
#[derive(Debug, Default)]
pub struct CrawlResult {
    downloaded: Vec<String>,
    errors: HashMap<String, CrawlError>,
}

impl CrawlResult {
    /// Successfully downloaded pages, in completion order
    pub fn downloaded(&self) -> &[String] {
        &self.downloaded
    }

    pub fn errors(&self) -> &HashMap<String, CrawlError> {
        &self.errors
    }

    pub fn is_downloaded(&self, url: &str) -> bool {
        self.downloaded.iter().any(|u| u == url)
    }

    pub fn into_parts(self) -> (Vec<String>, HashMap<String, CrawlError>) {
        (self.downloaded, self.errors)
    }
}
