//! Network scan orchestration.
//!
//! A scan moves through `Received -> Expanding -> Scanning -> Aggregating ->
//! Complete`. Malformed input fails the scan before any probe is sent. During
//! `Scanning` each target host gets its own task, at most `concurrency` of
//! them at once, and every host task fans out over the ports in turn.

use crate::error::{ScanError, ScanResult};
use crate::scanner::cancel::ScanCancel;
use crate::scanner::host::HostScanner;
use crate::scanner::probe::{Prober, TcpProber};
use crate::scanner::rate_limiter::RateLimiter;
use crate::scanner::report::{HostOutcome, ScanReport};
use crate::scanner::request::{ScanOptions, ScanRequest};
use crate::types::TargetSpec;
use chrono::Utc;
use indicatif::ProgressBar;
use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::{Mutex, Semaphore};
use tokio::task::JoinSet;
use tracing::{debug, info, warn};

/// Lifecycle of a single scan.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanPhase {
    Received,
    Expanding,
    Scanning,
    Aggregating,
    Complete,
    Failed,
}

impl fmt::Display for ScanPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Received => "received",
            Self::Expanding => "expanding",
            Self::Scanning => "scanning",
            Self::Aggregating => "aggregating",
            Self::Complete => "complete",
            Self::Failed => "failed",
        };
        f.write_str(name)
    }
}

/// Alive/dead result sets shared by all host tasks.
#[derive(Debug, Default)]
struct Partition {
    alive: Vec<HostOutcome>,
    dead: Vec<HostOutcome>,
}

impl Partition {
    fn record(&mut self, host: HostOutcome) {
        if host.is_alive() {
            self.alive.push(host);
        } else {
            self.dead.push(host);
        }
    }
}

/// Runs a complete scan over every host of a target.
#[derive(Default)]
pub struct NetworkScanner {
    prober: Option<Arc<dyn Prober>>,
    cancel: ScanCancel,
    progress: Option<ProgressBar>,
}

impl NetworkScanner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use a custom prober instead of a TCP prober built from the request.
    pub fn with_prober(mut self, prober: Arc<dyn Prober>) -> Self {
        self.prober = Some(prober);
        self
    }

    pub fn with_cancel(mut self, cancel: ScanCancel) -> Self {
        self.cancel = cancel;
        self
    }

    /// Report per-host progress on the given bar.
    pub fn with_progress(mut self, progress: ProgressBar) -> Self {
        self.progress = Some(progress);
        self
    }

    /// Handle that cancels scans run by this scanner.
    pub fn cancel_handle(&self) -> ScanCancel {
        self.cancel.clone()
    }

    /// Run a scan to completion.
    ///
    /// # Errors
    /// Fails with a parse-class [`ScanError`] when the request is malformed,
    /// or [`ScanError::Cancelled`] when cancelled. Unreachable hosts and
    /// closed ports are never errors.
    pub async fn scan(&self, request: &ScanRequest) -> ScanResult<ScanReport> {
        let started = Instant::now();

        enter(ScanPhase::Received, request);
        let options = request.options().inspect_err(|e| fail(request, e))?;

        enter(ScanPhase::Expanding, request);
        let (ports, targets) = expand(request).inspect_err(|e| fail(request, e))?;

        info!(
            scan_target = %request.target,
            hosts = targets.len(),
            ports = ports.len(),
            concurrency = options.concurrency,
            port_concurrency = options.port_concurrency,
            "starting scan"
        );

        enter(ScanPhase::Scanning, request);
        let partition = self.scan_hosts(&options, ports, &targets).await;

        if self.cancel.is_cancelled() {
            if let Some(pb) = &self.progress {
                pb.abandon_with_message("cancelled");
            }
            let err = ScanError::Cancelled;
            fail(request, &err);
            return Err(err);
        }

        enter(ScanPhase::Aggregating, request);
        let Partition {
            mut alive,
            mut dead,
        } = partition;
        reconcile(&targets, &alive, &mut dead);
        alive.sort_by(|a, b| a.address().cmp(b.address()));
        dead.sort_by(|a, b| a.address().cmp(b.address()));

        let report = ScanReport {
            generated_at: Utc::now(),
            target: request.target.clone(),
            ports_spec: request.ports.clone(),
            duration_ms: u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX),
            alive_hosts: alive,
            dead_hosts: dead,
        };

        enter(ScanPhase::Complete, request);
        if let Some(pb) = &self.progress {
            pb.finish_with_message("scan complete");
        }
        info!(
            scan_target = %report.target,
            alive = report.alive_hosts.len(),
            dead = report.dead_hosts.len(),
            duration_ms = report.duration_ms,
            "scan complete"
        );

        Ok(report)
    }

    /// Fan out over hosts, at most `options.concurrency` at a time.
    async fn scan_hosts(
        &self,
        options: &ScanOptions,
        ports: Vec<u16>,
        targets: &[String],
    ) -> Partition {
        let prober = self.prober.clone().unwrap_or_else(|| {
            Arc::new(TcpProber::new(options.timeout, options.grab_banner))
        });

        let mut host_scanner =
            HostScanner::new(prober, options.port_concurrency).with_cancel(self.cancel.clone());
        if let Some(max) = options.max_connections {
            host_scanner = host_scanner.with_connection_budget(Arc::new(Semaphore::new(max)));
        }
        if let Some(limiter) = options.rate_limit.and_then(RateLimiter::new) {
            host_scanner = host_scanner.with_rate_limiter(limiter);
        }

        if let Some(pb) = &self.progress {
            pb.set_length(targets.len() as u64);
        }

        let ports: Arc<[u16]> = ports.into();
        let partition = Arc::new(Mutex::new(Partition::default()));
        let gate = Arc::new(Semaphore::new(options.concurrency.max(1)));
        let mut hosts = JoinSet::new();

        for address in targets {
            if self.cancel.is_cancelled() {
                break;
            }
            let Ok(permit) = Arc::clone(&gate).acquire_owned().await else {
                break;
            };
            if self.cancel.is_cancelled() {
                break;
            }

            let scanner = host_scanner.clone();
            let ports = Arc::clone(&ports);
            let partition = Arc::clone(&partition);
            let progress = self.progress.clone();
            let address = address.clone();

            hosts.spawn(async move {
                let _permit = permit;
                let outcome = scanner.scan(&address, &ports).await;

                if let Some(pb) = &progress {
                    pb.inc(1);
                    if outcome.is_alive() {
                        pb.set_message(format!("{} is alive", address));
                    }
                }

                partition.lock().await.record(outcome);
            });
        }

        while let Some(joined) = hosts.join_next().await {
            if let Err(e) = joined {
                warn!(error = %e, "host task failed");
            }
        }

        let mut guard = partition.lock().await;
        std::mem::take(&mut *guard)
    }
}

/// Scan a network with the default TCP prober.
pub async fn scan_network(request: &ScanRequest) -> ScanResult<ScanReport> {
    NetworkScanner::new().scan(request).await
}

/// Parse the port specification and expand the target.
fn expand(request: &ScanRequest) -> ScanResult<(Vec<u16>, Vec<String>)> {
    let ports = request
        .port_spec()?
        .ports()
        .into_iter()
        .map(|p| u16::try_from(p).map_err(|_| ScanError::PortOutOfRange(p)))
        .collect::<ScanResult<Vec<u16>>>()?;

    let targets = TargetSpec::parse(&request.target)?.expand();
    Ok((ports, targets))
}

/// Count hosts whose task never reported as dead, keeping the partition total.
fn reconcile(targets: &[String], alive: &[HostOutcome], dead: &mut Vec<HostOutcome>) {
    let seen: HashSet<String> = alive
        .iter()
        .chain(dead.iter())
        .map(|h| h.address().to_string())
        .collect();

    for address in targets.iter().filter(|a| !seen.contains(a.as_str())) {
        warn!(address = %address, "host produced no outcome, marking it dead");
        dead.push(HostOutcome::dead(address.as_str()));
    }
}

fn enter(phase: ScanPhase, request: &ScanRequest) {
    debug!(scan_target = %request.target, %phase, "scan phase");
}

fn fail(request: &ScanRequest, error: &ScanError) {
    debug!(
        scan_target = %request.target,
        phase = %ScanPhase::Failed,
        error = %error,
        "scan phase"
    );
}
