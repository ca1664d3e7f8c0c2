//! Per-host port fan-out.
//!
//! Every requested port of one host is probed on its own task. A semaphore
//! admits at most `port_concurrency` probes at a time; a shared connection
//! budget, when configured, additionally caps probes across all hosts.

use crate::scanner::cancel::ScanCancel;
use crate::scanner::probe::{Prober, TcpProber};
use crate::scanner::rate_limiter::RateLimiter;
use crate::scanner::report::{HostOutcome, PortOutcome};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, warn};

/// Scans all requested ports of a single host.
#[derive(Clone)]
pub struct HostScanner {
    prober: Arc<dyn Prober>,
    port_concurrency: usize,
    connection_budget: Option<Arc<Semaphore>>,
    rate_limiter: Option<RateLimiter>,
    cancel: ScanCancel,
}

impl HostScanner {
    /// Create a host scanner admitting `port_concurrency` probes at once (at least one).
    pub fn new(prober: Arc<dyn Prober>, port_concurrency: usize) -> Self {
        Self {
            prober,
            port_concurrency: port_concurrency.max(1),
            connection_budget: None,
            rate_limiter: None,
            cancel: ScanCancel::new(),
        }
    }

    /// Share a scan-wide cap on in-flight connection attempts.
    pub fn with_connection_budget(mut self, budget: Arc<Semaphore>) -> Self {
        self.connection_budget = Some(budget);
        self
    }

    pub fn with_rate_limiter(mut self, limiter: RateLimiter) -> Self {
        self.rate_limiter = Some(limiter);
        self
    }

    pub fn with_cancel(mut self, cancel: ScanCancel) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn port_concurrency(&self) -> usize {
        self.port_concurrency
    }

    /// Probe every port and wait for all probes to finish.
    ///
    /// Only open ports are kept. Closed ports and probes rejected as malformed
    /// are dropped, so the host is alive iff at least one port answered.
    pub async fn scan(&self, address: &str, ports: &[u16]) -> HostOutcome {
        let gate = Arc::new(Semaphore::new(self.port_concurrency));
        let shared_address: Arc<str> = Arc::from(address);
        let mut probes = JoinSet::new();

        for &port in ports {
            if self.cancel.is_cancelled() {
                break;
            }
            let Ok(permit) = Arc::clone(&gate).acquire_owned().await else {
                break;
            };
            if let Some(limiter) = &self.rate_limiter {
                limiter.wait().await;
            }
            // Re-check after waiting on the gate and the limiter.
            if self.cancel.is_cancelled() {
                break;
            }

            let prober = Arc::clone(&self.prober);
            let budget = self.connection_budget.clone();
            let cancel = self.cancel.clone();
            let address = Arc::clone(&shared_address);

            probes.spawn(async move {
                let _permit = permit;
                let attempt = async {
                    let _slot = match budget {
                        Some(budget) => budget.acquire_owned().await.ok(),
                        None => None,
                    };
                    prober.probe(&address, port).await
                };

                tokio::select! {
                    biased;
                    _ = cancel.cancelled() => None,
                    result = attempt => Some(result),
                }
            });
        }

        let mut open_ports: Vec<PortOutcome> = Vec::new();
        while let Some(joined) = probes.join_next().await {
            match joined {
                Ok(Some(Ok(outcome))) if outcome.open => {
                    debug!(
                        address,
                        port = outcome.port,
                        service = outcome.service.as_deref().unwrap_or(""),
                        "open port"
                    );
                    open_ports.push(outcome);
                }
                Ok(Some(Ok(_))) | Ok(None) => {}
                Ok(Some(Err(e))) => debug!(address, error = %e, "probe rejected"),
                Err(e) => warn!(address, error = %e, "probe task failed"),
            }
        }

        HostOutcome::new(address, open_ports)
    }
}

/// Scan one host with a fresh TCP prober.
pub async fn scan_host(
    address: &str,
    ports: &[u16],
    timeout: Duration,
    concurrency: usize,
    grab_banner: bool,
) -> HostOutcome {
    let prober = Arc::new(TcpProber::new(timeout, grab_banner));
    HostScanner::new(prober, concurrency).scan(address, ports).await
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::error::ProbeError;
    use async_trait::async_trait;
    use std::collections::HashSet;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Instant;

    /// Prober answering from a fixed table and recording peak concurrency.
    pub(crate) struct FakeProber {
        open: HashSet<(String, u16)>,
        rejected: HashSet<u16>,
        delay: Duration,
        in_flight: AtomicUsize,
        pub(crate) peak: AtomicUsize,
        pub(crate) calls: AtomicUsize,
    }

    impl FakeProber {
        pub(crate) fn new(open: &[(&str, u16)], delay: Duration) -> Self {
            Self {
                open: open.iter().map(|(a, p)| (a.to_string(), *p)).collect(),
                rejected: HashSet::new(),
                delay,
                in_flight: AtomicUsize::new(0),
                peak: AtomicUsize::new(0),
                calls: AtomicUsize::new(0),
            }
        }

        fn rejecting(mut self, port: u16) -> Self {
            self.rejected.insert(port);
            self
        }
    }

    #[async_trait]
    impl Prober for FakeProber {
        async fn probe(&self, address: &str, port: u16) -> Result<PortOutcome, ProbeError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.peak.fetch_max(now, Ordering::SeqCst);
            tokio::time::sleep(self.delay).await;
            self.in_flight.fetch_sub(1, Ordering::SeqCst);

            if self.rejected.contains(&port) {
                return Err(ProbeError::InvalidAddress(address.to_string()));
            }
            if self.open.contains(&(address.to_string(), port)) {
                Ok(PortOutcome::open(port))
            } else {
                Ok(PortOutcome::closed(port))
            }
        }
    }

    fn ports(range: std::ops::RangeInclusive<u16>) -> Vec<u16> {
        range.collect()
    }

    #[tokio::test]
    async fn test_keeps_only_open_ports() {
        let prober = Arc::new(FakeProber::new(
            &[("10.0.0.1", 22), ("10.0.0.1", 80)],
            Duration::from_millis(1),
        ));
        let host = HostScanner::new(prober.clone(), 8)
            .scan("10.0.0.1", &ports(1..=100))
            .await;

        assert!(host.is_alive());
        assert_eq!(host.address(), "10.0.0.1");
        let open: Vec<u16> = host.open_ports().iter().map(|p| p.port).collect();
        assert_eq!(open, vec![22, 80]);
        assert!(host.open_ports().iter().all(|p| p.open));
        assert_eq!(prober.calls.load(Ordering::SeqCst), 100);
    }

    #[tokio::test]
    async fn test_no_open_ports_means_dead() {
        let prober = Arc::new(FakeProber::new(&[], Duration::from_millis(1)));
        let host = HostScanner::new(prober, 8)
            .scan("10.0.0.2", &ports(1..=20))
            .await;
        assert!(!host.is_alive());
        assert!(host.open_ports().is_empty());
    }

    #[tokio::test]
    async fn test_concurrency_is_bounded() {
        let prober = Arc::new(FakeProber::new(&[], Duration::from_millis(5)));
        HostScanner::new(prober.clone(), 4)
            .scan("10.0.0.3", &ports(1..=60))
            .await;

        let peak = prober.peak.load(Ordering::SeqCst);
        assert!(peak <= 4, "peak {peak} exceeded the bound");
        assert!(peak > 1, "probes never overlapped");
    }

    #[tokio::test]
    async fn test_concurrency_does_not_change_results() {
        let open = [("10.0.0.4", 3), ("10.0.0.4", 17), ("10.0.0.4", 40)];
        let serial = HostScanner::new(Arc::new(FakeProber::new(&open, Duration::ZERO)), 1)
            .scan("10.0.0.4", &ports(1..=50))
            .await;
        let wide = HostScanner::new(Arc::new(FakeProber::new(&open, Duration::ZERO)), 50)
            .scan("10.0.0.4", &ports(1..=50))
            .await;
        assert_eq!(serial, wide);
    }

    #[tokio::test]
    async fn test_rejected_probes_are_absorbed() {
        let prober = Arc::new(
            FakeProber::new(&[("10.0.0.5", 13), ("10.0.0.5", 14)], Duration::ZERO).rejecting(13),
        );
        let host = HostScanner::new(prober, 4)
            .scan("10.0.0.5", &ports(10..=15))
            .await;
        let open: Vec<u16> = host.open_ports().iter().map(|p| p.port).collect();
        assert_eq!(open, vec![14]);
    }

    #[tokio::test]
    async fn test_connection_budget_spans_hosts() {
        let prober = Arc::new(FakeProber::new(&[], Duration::from_millis(5)));
        let budget = Arc::new(Semaphore::new(3));
        let scanner = HostScanner::new(prober.clone(), 10).with_connection_budget(budget);

        let ports_a = ports(1..=30);
        let ports_b = ports(1..=30);
        let (a, b) = tokio::join!(
            scanner.scan("10.0.0.6", &ports_a),
            scanner.scan("10.0.0.7", &ports_b),
        );
        assert!(!a.is_alive() && !b.is_alive());
        assert!(prober.peak.load(Ordering::SeqCst) <= 3);
        assert_eq!(prober.calls.load(Ordering::SeqCst), 60);
    }

    #[tokio::test]
    async fn test_cancelled_before_start_probes_nothing() {
        let prober = Arc::new(FakeProber::new(&[("10.0.0.8", 1)], Duration::ZERO));
        let cancel = ScanCancel::new();
        cancel.cancel();

        let host = HostScanner::new(prober.clone(), 4)
            .with_cancel(cancel)
            .scan("10.0.0.8", &ports(1..=10))
            .await;
        assert!(!host.is_alive());
        assert_eq!(prober.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_cancel_drops_in_flight_probes() {
        let prober = Arc::new(FakeProber::new(&[], Duration::from_secs(30)));
        let cancel = ScanCancel::new();
        let scanner = HostScanner::new(prober, 4).with_cancel(cancel.clone());

        let canceller = tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(20)).await;
            cancel.cancel();
        });

        let start = Instant::now();
        let host = scanner.scan("10.0.0.9", &ports(1..=100)).await;
        canceller.await.unwrap();

        assert!(!host.is_alive());
        assert!(start.elapsed() < Duration::from_secs(5));
    }

    #[tokio::test]
    async fn test_scan_host_against_localhost() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();

        let host = scan_host("127.0.0.1", &[port], Duration::from_millis(500), 4, false).await;
        assert!(host.is_alive());
        assert_eq!(host.open_ports()[0].port, port);
    }
}
