//! Heap gate.
//!
//! Best-effort backpressure before each load: wait until enough memory is
//! free, but never longer than the configured maximum.

use std::sync::Arc;

use tracing::{debug, trace};

use assetboot_core::{GateOutcome, HeapGateSettings, HeapSample};

/// Source of free-memory estimates.
pub trait HeapSampler: Send + Sync {
    /// Current estimate, `None` when the platform offers no introspection.
    fn sample(&self) -> Option<HeapSample>;
}

/// Sampler for platforms without memory introspection.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoHeapIntrospection;

impl HeapSampler for NoHeapIntrospection {
    fn sample(&self) -> Option<HeapSample> {
        None
    }
}

/// Reports a fixed amount of free memory.
#[derive(Debug, Clone, Copy)]
pub struct FixedHeapSampler(pub u64);

impl HeapSampler for FixedHeapSampler {
    fn sample(&self) -> Option<HeapSample> {
        Some(HeapSample::new(self.0))
    }
}

/// `MemAvailable` from `/proc/meminfo`.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcMeminfoSampler;

impl ProcMeminfoSampler {
    /// The best sampler for the running platform.
    pub fn detect() -> Arc<dyn HeapSampler> {
        if ProcMeminfoSampler.sample().is_some() {
            Arc::new(ProcMeminfoSampler)
        } else {
            Arc::new(NoHeapIntrospection)
        }
    }
}

impl HeapSampler for ProcMeminfoSampler {
    fn sample(&self) -> Option<HeapSample> {
        let text = std::fs::read_to_string("/proc/meminfo").ok()?;
        HeapSample::from_meminfo(&text)
    }
}

/// Polls a [`HeapSampler`] until enough memory is free.
#[derive(Clone)]
pub struct HeapGate {
    settings: HeapGateSettings,
    sampler: Arc<dyn HeapSampler>,
}

impl HeapGate {
    pub fn new(settings: HeapGateSettings, sampler: Arc<dyn HeapSampler>) -> Self {
        Self { settings, sampler }
    }

    pub fn settings(&self) -> &HeapGateSettings {
        &self.settings
    }

    /// Wait for the gate to open.
    ///
    /// Resolves as soon as a sample meets the threshold, immediately when no
    /// sample is available, and at `max_wait` at the latest.
    pub async fn wait(&self) -> GateOutcome {
        let min_free = self.settings.min_free_bytes;
        let interval = self.settings.check_interval();

        let poll = async {
            loop {
                match self.sampler.sample() {
                    None => return GateOutcome::Unavailable,
                    Some(sample) if sample.free_bytes >= min_free => return GateOutcome::Passed,
                    Some(sample) => {
                        trace!(
                            "heap gate waiting: {} bytes free, {} required",
                            sample.free_bytes,
                            min_free
                        );
                        tokio::time::sleep(interval).await;
                    }
                }
            }
        };

        match tokio::time::timeout(self.settings.max_wait(), poll).await {
            Ok(outcome) => outcome,
            Err(_) => {
                debug!(
                    "heap gate gave up after {:?}, proceeding anyway",
                    self.settings.max_wait()
                );
                GateOutcome::TimedOut
            }
        }
    }
}
