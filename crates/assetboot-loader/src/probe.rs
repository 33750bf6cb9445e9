//! One-shot CDN reachability probe.

use std::time::Duration;

use tracing::{debug, info};

use assetboot_core::CdnAvailability;

use crate::fetch::ResourceFetcher;

/// Decide whether the CDN is usable for the whole session.
///
/// Any response to a HEAD request against `url` within `timeout` means
/// available. Timeouts and transport errors mean unavailable; nothing is
/// reported as an error.
pub async fn probe_cdn<F>(fetcher: &F, url: &str, timeout: Duration) -> CdnAvailability
where
    F: ResourceFetcher + ?Sized,
{
    match tokio::time::timeout(timeout, fetcher.head(url)).await {
        Ok(Ok(())) => {
            info!("CDN reachable, using CDN for all assets");
            CdnAvailability::Available
        }
        Ok(Err(e)) => {
            debug!("CDN probe failed: {}", e);
            info!("CDN not reachable, using LOCAL for all assets");
            CdnAvailability::Unavailable
        }
        Err(_) => {
            debug!("CDN probe timed out after {:?}", timeout);
            info!("CDN not reachable, using LOCAL for all assets");
            CdnAvailability::Unavailable
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::ScriptedFetcher;

    const PROBE: &str = "https://cdn.example/probe.css";

    #[tokio::test(start_paused = true)]
    async fn test_response_before_deadline_is_available() {
        let fetcher = ScriptedFetcher::new().ok(PROBE, 120);
        let availability = probe_cdn(&fetcher, PROBE, Duration::from_millis(500)).await;
        assert_eq!(availability, CdnAvailability::Available);
        assert_eq!(fetcher.heads(), vec![PROBE.to_string()]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_error_status_still_counts_as_reachable() {
        let fetcher = ScriptedFetcher::new().fail(PROBE, 10);
        let availability = probe_cdn(&fetcher, PROBE, Duration::from_millis(500)).await;
        assert_eq!(availability, CdnAvailability::Available);
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_is_unavailable() {
        let fetcher = ScriptedFetcher::new().hang(PROBE);
        let start = tokio::time::Instant::now();
        let availability = probe_cdn(&fetcher, PROBE, Duration::from_millis(500)).await;
        assert_eq!(availability, CdnAvailability::Unavailable);
        assert_eq!(start.elapsed(), Duration::from_millis(500));
    }

    #[tokio::test(start_paused = true)]
    async fn test_slow_response_is_unavailable() {
        let fetcher = ScriptedFetcher::new().ok(PROBE, 800);
        let availability = probe_cdn(&fetcher, PROBE, Duration::from_millis(500)).await;
        assert_eq!(availability, CdnAvailability::Unavailable);
    }

    #[tokio::test]
    async fn test_network_error_is_unavailable() {
        let fetcher = ScriptedFetcher::new();
        let availability = probe_cdn(&fetcher, PROBE, Duration::from_millis(500)).await;
        assert_eq!(availability, CdnAvailability::Unavailable);
    }
}
