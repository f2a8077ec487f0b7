use log2::*;
use std::collections::HashSet;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::runtime::Handle;

use super::admission::{AdmissionGate, AdmissionRegistry};
use super::barrier::{Arrival, LayerBarrier};
use super::config::CrawlerConfig;
use super::error::CrawlError;
use super::pool::{Job, PoolHandle, WorkerPool};
use super::scrape::{Document, Downloader, url_to_host};
use super::state::{CrawlResult, CrawlSession, CrawlSessionRef};

/// Bounded-depth crawler with separate download and extraction pools and a
/// per-host cap on simultaneous downloads.
///
/// Must be created inside a tokio runtime. Call [`WebCrawler::close`] to stop
/// the workers; dropping the crawler aborts them without waiting.
pub struct WebCrawler<D: Downloader> {
    downloader: Arc<D>,
    downloaders: WorkerPool,
    extractors: WorkerPool,
    per_host: usize,
    closed: AtomicBool,
    /// Tracks `download` calls in flight so `close` can wait them out
    active: Arc<LayerBarrier>,
}

impl<D: Downloader> WebCrawler<D> {
    pub fn new(downloader: D, config: &CrawlerConfig) -> Result<Self, CrawlError> {
        config.validate()?;
        let runtime = Handle::try_current().map_err(|_| CrawlError::NoRuntime)?;

        info!(
            "Starting crawler: {} downloaders, {} extractors, {} per host",
            config.downloaders, config.extractors, config.per_host
        );

        Ok(Self {
            downloader: Arc::new(downloader),
            downloaders: WorkerPool::spawn(&runtime, "download", config.downloaders),
            extractors: WorkerPool::spawn(&runtime, "extract", config.extractors),
            per_host: config.per_host,
            closed: AtomicBool::new(false),
            active: Arc::new(LayerBarrier::new()),
        })
    }

    /// Crawls `url` and everything reachable from it within `depth` layers.
    /// `depth = 1` downloads only `url` itself.
    pub async fn download(&self, url: &str, depth: usize) -> Result<CrawlResult, CrawlError> {
        self.crawl(url, depth, None).await
    }

    /// Like [`WebCrawler::download`], but only pages on `hosts` are fetched.
    /// Links to other hosts are skipped without an error.
    pub async fn download_restricted<I, S>(
        &self,
        url: &str,
        depth: usize,
        hosts: I,
    ) -> Result<CrawlResult, CrawlError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let hosts: HashSet<String> = hosts.into_iter().map(Into::into).collect();
        self.crawl(url, depth, Some(hosts)).await
    }

    /// Stops both pools and waits until no crawl is running. Idempotent.
    ///
    /// Crawls interrupted by this return [`CrawlError::Closed`].
    pub async fn close(&self) {
        if self.closed.swap(true, Ordering::SeqCst) {
            debug!("Crawler already closed");
        }
        self.downloaders.shutdown().await;
        self.extractors.shutdown().await;
        self.active.wait().await;
        info!("Crawler closed");
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    async fn crawl(
        &self,
        url: &str,
        depth: usize,
        allowed_hosts: Option<HashSet<String>>,
    ) -> Result<CrawlResult, CrawlError> {
        let _running = self.active.register();
        if self.is_closed() {
            return Err(CrawlError::Closed);
        }

        let admission = match allowed_hosts {
            Some(hosts) => AdmissionRegistry::restricted(self.per_host, hosts),
            None => AdmissionRegistry::open(self.per_host),
        };
        let session: CrawlSessionRef = Arc::new(CrawlSession::new(admission));
        let extractors = self.extractors.handle();

        session.visited.insert(url);
        let mut frontier = vec![url.to_string()];

        for layer in 0..depth {
            if frontier.is_empty() {
                debug!("Frontier empty after {} layers", layer);
                break;
            }
            let remaining = depth - layer;
            info!("Layer {}: {} urls, remaining depth {}", layer, frontier.len(), remaining);

            for link in frontier.drain(..) {
                let Some(gate) = self.admit(&session, &link) else {
                    continue;
                };
                let job = download_job(
                    DownloadTask {
                        url: link,
                        remaining,
                        gate,
                        arrival: session.barrier.register(),
                    },
                    Arc::clone(&session),
                    Arc::clone(&self.downloader),
                    extractors.clone(),
                );
                if self.downloaders.submit(job).is_err() {
                    return Err(CrawlError::Closed);
                }
            }

            session.barrier.wait().await;
            if self.is_closed() {
                return Err(CrawlError::Closed);
            }
            frontier = session.take_next_layer().await;
        }

        let result = session.finish().await;
        info!(
            "Crawl of {} finished: {} downloaded, {} errors",
            url,
            result.downloaded().len(),
            result.errors().len()
        );
        Ok(result)
    }

    /// Resolves the admission gate for `url`. Malformed URLs go straight to the
    /// ledger; hosts without a gate are skipped silently.
    fn admit(&self, session: &CrawlSession, url: &str) -> Option<AdmissionGate> {
        let host = match url_to_host(url) {
            Ok(host) => host,
            Err(e) => {
                debug!("{}", e);
                session.errors.record(url, e);
                return None;
            }
        };
        let gate = session.admission.gate_for(&host);
        if gate.is_none() {
            debug!("Skipping {}: host {} is not allowed", url, host);
        }
        gate
    }
}

/// One page to fetch. `arrival` is held until the task and anything it
/// schedules for extraction are done.
struct DownloadTask {
    url: String,
    remaining: usize,
    gate: AdmissionGate,
    arrival: Arrival,
}

fn download_job<D: Downloader>(
    task: DownloadTask,
    session: CrawlSessionRef,
    downloader: Arc<D>,
    extractors: PoolHandle,
) -> Job {
    Box::pin(async move {
        let DownloadTask {
            url,
            remaining,
            gate,
            arrival: _arrival,
        } = task;

        let fetched = {
            let _permit = match gate.acquire_owned().await {
                Ok(permit) => permit,
                Err(e) => {
                    session.errors.record(
                        &url,
                        CrawlError::Fetch {
                            url: url.clone(),
                            source: e.into(),
                        },
                    );
                    return;
                }
            };
            debug!("Downloading {}", url);
            downloader.download(&url).await
        };

        let document = match fetched {
            Ok(document) => document,
            Err(source) => {
                debug!("Failed to download {}: {}", url, source);
                session.errors.record(
                    &url,
                    CrawlError::Fetch {
                        url: url.clone(),
                        source,
                    },
                );
                return;
            }
        };
        session.downloaded.lock().await.push(url.clone());

        if remaining > 1 {
            let job = extract_job(
                url,
                document,
                session.barrier.register(),
                Arc::clone(&session),
            );
            // a rejected job departs from the barrier as it is dropped
            if extractors.submit(job).is_err() {
                warn!("Extraction pool closed, links of a downloaded page are lost");
            }
        }
    })
}

fn extract_job<T: Document>(
    url: String,
    document: T,
    arrival: Arrival,
    session: CrawlSessionRef,
) -> Job {
    Box::pin(async move {
        let _arrival = arrival;
        let links = match document.extract_links() {
            Ok(links) => links,
            Err(source) => {
                debug!("Failed to extract links from {}: {}", url, source);
                session.errors.record(
                    &url,
                    CrawlError::Extract {
                        url: url.clone(),
                        source,
                    },
                );
                return;
            }
        };

        let fresh: Vec<String> = links
            .into_iter()
            .filter(|link| session.visited.insert(link))
            .collect();
        debug!("{}: {} new links", url, fresh.len());
        session.next_layer.lock().await.extend(fresh);
    })
}
