//! # Trawl - a concurrent TCP network scanner
//!
//! Trawl probes a single address or every usable address of a CIDR block
//! with TCP connect attempts, optionally reads a service banner from each
//! open port, and partitions hosts into alive and dead sets.
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use trawl::scanner::{scan_network, ScanRequest};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), trawl::ScanError> {
//!     let request = ScanRequest::new("192.168.1.0/29", "22,80,443")
//!         .with_concurrency(16)
//!         .with_timeout_ms(500)
//!         .with_banner(true);
//!
//!     let report = scan_network(&request).await?;
//!     for host in &report.alive_hosts {
//!         for port in host.open_ports() {
//!             println!("{}:{} {:?}", host.address(), port.port, port.service);
//!         }
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! - [`types`] - Port list and target parsing, scan ids
//! - [`scanner`] - Probing, per-host fan-out and the network orchestrator
//! - [`config`] - Settings and scan profiles
//! - [`storage`] - Scan report persistence
//! - [`output`] - Plain text, JSON and CSV formatting
//! - [`cli`] - Command-line front end
//! - [`error`] - Error types

pub mod cli;
pub mod config;
pub mod error;
pub mod logging;
pub mod output;
pub mod scanner;
pub mod storage;
pub mod types;

pub use error::{CliError, ProbeError, ScanError};
pub use scanner::{
    scan_host, scan_network, HostOutcome, NetworkScanner, PortOutcome, ScanCancel, ScanReport,
    ScanRequest,
};
pub use types::{parse_ports, PortSpec, ScanId, TargetSpec};
