//! Scanning engine.
//!
//! Three layers, each a fan-out over the one below it:
//!
//! - [`NetworkScanner`] expands the target and scans hosts concurrently
//! - [`HostScanner`] probes every port of one host concurrently
//! - [`Prober`] tries a single `(address, port)` pair
//!
//! Results flow back up as [`PortOutcome`], [`HostOutcome`] and finally a
//! [`ScanReport`] with hosts split into alive and dead.

pub mod cancel;
pub mod fingerprint;
pub mod host;
pub mod network;
pub mod probe;
pub mod rate_limiter;
pub mod report;
pub mod request;

pub use cancel::ScanCancel;
pub use fingerprint::{identify_service, FINGERPRINTS};
pub use host::{scan_host, HostScanner};
pub use network::{scan_network, NetworkScanner, ScanPhase};
pub use probe::{Prober, TcpProber, BANNER_TIMEOUT, MAX_BANNER_SIZE};
pub use rate_limiter::RateLimiter;
pub use report::{HostOutcome, PortOutcome, ScanReport, ScanSummary};
pub use request::{ScanOptions, ScanRequest, DEFAULT_CONCURRENCY, DEFAULT_TIMEOUT_MS};
