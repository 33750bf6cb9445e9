//! Heap gate settings and memory samples.
//!
//! The gate itself is async and lives in the loader; this module holds the
//! runtime-agnostic parts.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Estimate of free memory at one instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HeapSample {
    pub free_bytes: u64,
}

impl HeapSample {
    pub fn new(free_bytes: u64) -> Self {
        Self { free_bytes }
    }

    /// Parse `MemAvailable` from the text of `/proc/meminfo`.
    ///
    /// Lines look like `MemAvailable:   8123456 kB`.
    pub fn from_meminfo(text: &str) -> Option<Self> {
        text.lines()
            .find_map(|line| line.strip_prefix("MemAvailable:"))
            .and_then(|rest| {
                let kb: u64 = rest.split_whitespace().next()?.parse().ok()?;
                Some(Self::new(kb.saturating_mul(1024)))
            })
    }
}

/// How a heap gate wait ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateOutcome {
    /// Free memory reached the threshold.
    Passed,
    /// The maximum wait elapsed first.
    TimedOut,
    /// No memory introspection available.
    Unavailable,
}

/// Heap gate parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct HeapGateSettings {
    /// Free bytes required to proceed immediately.
    pub min_free_bytes: u64,
    pub check_interval_ms: u64,
    /// The gate always proceeds after this long.
    pub max_wait_ms: u64,
}

impl Default for HeapGateSettings {
    fn default() -> Self {
        Self {
            min_free_bytes: 8_000_000,
            check_interval_ms: 100,
            max_wait_ms: 2_000,
        }
    }
}

impl HeapGateSettings {
    pub fn check_interval(&self) -> Duration {
        Duration::from_millis(self.check_interval_ms.max(1))
    }

    pub fn max_wait(&self) -> Duration {
        Duration::from_millis(self.max_wait_ms)
    }
}
