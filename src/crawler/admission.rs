use dashmap::DashMap;
use log2::warn;
use std::sync::Arc;
use tokio::sync::Semaphore;
use url::Host;

/// Per-host counting gate. A permit is held only while a page is being fetched.
pub type AdmissionGate = Arc<Semaphore>;

/// Maps a host to its admission gate.
///
/// In open mode gates are created on first sight of a host. In restricted mode
/// the gates are created up front for the allowed hosts only and any other host
/// has no gate at all.
pub struct AdmissionRegistry {
    gates: DashMap<String, AdmissionGate>,
    per_host: usize,
    restricted: bool,
}

impl AdmissionRegistry {
    pub fn open(per_host: usize) -> Self {
        Self {
            gates: DashMap::new(),
            per_host,
            restricted: false,
        }
    }

    pub fn restricted<I, S>(per_host: usize, hosts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let gates = DashMap::new();
        for host in hosts {
            gates.insert(normalize_host(host.into()), Arc::new(Semaphore::new(per_host)));
        }
        Self {
            gates,
            per_host,
            restricted: true,
        }
    }

    /// Gate for `host`, or `None` when the host is not admitted.
    ///
    /// Concurrent first requests for the same host converge on a single gate.
    pub fn gate_for(&self, host: &str) -> Option<AdmissionGate> {
        if self.restricted {
            return self.gates.get(host).map(|gate| Arc::clone(gate.value()));
        }
        let gate = self
            .gates
            .entry(host.to_string())
            .or_insert_with(|| Arc::new(Semaphore::new(self.per_host)))
            .clone();
        Some(gate)
    }

    pub fn host_count(&self) -> usize {
        self.gates.len()
    }
}

/// Puts `host` in the form `url_to_host` produces (lowercase, punycode), so
/// allow-list entries match the hosts of crawled urls.
fn normalize_host(host: String) -> String {
    match Host::parse(&host) {
        Ok(parsed) => parsed.to_string(),
        Err(e) => {
            warn!("Allowed host {} is not a valid host: {}", host, e);
            host
        }
    }
}
