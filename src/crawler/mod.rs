pub mod admission;
pub mod barrier;
pub mod config;
pub mod error;
pub mod pool;
pub mod runner;
pub mod scrape;
pub mod state;


pub use admission::{AdmissionGate, AdmissionRegistry};
pub use barrier::{Arrival, LayerBarrier};
pub use config::{CrawlerConfig, LINK_REQUEST_TIMEOUT_SEC};
pub use error::CrawlError;
pub use runner::WebCrawler;
pub use scrape::{Document, Downloader, HtmlDocument, HttpDownloader, construct_url, url_to_host};
pub use state::{CrawlResult, ErrorLedger, VisitedSet};
