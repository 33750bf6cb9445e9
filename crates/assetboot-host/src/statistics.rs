//! Request statistics.
//!
//! Every request that reaches the host is recorded in arrival order:
//! - Total request count
//! - Per-path hit counts
//! - The ordered request log (method and path)
//! - Host uptime

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;
use std::time::Instant;

use serde::{Deserialize, Serialize};

/// One served request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestRecord {
    pub method: String,
    pub path: String,
    pub status: u16,
}

/// Snapshot of host statistics.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HostStatistics {
    pub total_requests: u64,
    pub hits: BTreeMap<String, u64>,
    pub requests: Vec<RequestRecord>,
    pub uptime: u64,
}

/// Collects and tracks request statistics.
pub struct StatisticsCollector {
    start_time: Instant,
    total_requests: AtomicU64,
    requests: Mutex<Vec<RequestRecord>>,
}

impl StatisticsCollector {
    pub fn new() -> Self {
        Self {
            start_time: Instant::now(),
            total_requests: AtomicU64::new(0),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Record a served request.
    pub fn record(&self, method: &str, path: &str, status: u16) {
        self.total_requests.fetch_add(1, Ordering::Relaxed);
        if let Ok(mut requests) = self.requests.lock() {
            requests.push(RequestRecord {
                method: method.to_string(),
                path: path.to_string(),
                status,
            });
        }
    }

    /// Paths requested with GET, in arrival order.
    pub fn get_paths(&self) -> Vec<String> {
        self.requests
            .lock()
            .map(|requests| {
                requests
                    .iter()
                    .filter(|r| r.method == "GET")
                    .map(|r| r.path.clone())
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn total_requests(&self) -> u64 {
        self.total_requests.load(Ordering::Relaxed)
    }

    /// Get current statistics snapshot.
    pub fn snapshot(&self) -> HostStatistics {
        let requests = self
            .requests
            .lock()
            .map(|r| r.clone())
            .unwrap_or_default();

        let mut hits = BTreeMap::new();
        for request in &requests {
            *hits.entry(request.path.clone()).or_insert(0) += 1;
        }

        HostStatistics {
            total_requests: self.total_requests(),
            hits,
            requests,
            uptime: self.start_time.elapsed().as_secs(),
        }
    }
}

impl Default for StatisticsCollector {
    fn default() -> Self {
        Self::new()
    }
}
