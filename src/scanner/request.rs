//! Scan request as handed over by a front end.

use crate::error::{ScanError, ScanResult};
use crate::types::PortSpec;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Host-level concurrency when the request leaves it unset.
pub const DEFAULT_CONCURRENCY: usize = 200;

/// Connect timeout in milliseconds when the request leaves it unset.
pub const DEFAULT_TIMEOUT_MS: u64 = 1000;

/// Highest port number a TCP probe can dial.
pub const MAX_TCP_PORT: u32 = u16::MAX as u32;

/// A normalized scan request.
///
/// Deserializes from the JSON accepted by front ends:
///
/// ```json
/// { "target": "192.168.1.0/24", "ports": "22,80,443", "concurrency": 100,
///   "timeout_ms": 500, "grab_banner": true }
/// ```
///
/// A zero `concurrency` or `timeout_ms` counts as unset.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanRequest {
    /// Single address or CIDR block.
    pub target: String,
    /// Port specification, e.g. `"22,80,8000-8100"`.
    pub ports: String,
    /// Hosts scanned at once.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub concurrency: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_ms: Option<u64>,
    #[serde(default)]
    pub grab_banner: bool,
    /// Ports probed at once on each host; follows `concurrency` when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub port_concurrency: Option<usize>,
    /// Cap on connection attempts in flight across the whole scan.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_connections: Option<usize>,
    /// Probes launched per second across the whole scan.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rate_limit: Option<u32>,
}

impl ScanRequest {
    pub fn new(target: impl Into<String>, ports: impl Into<String>) -> Self {
        Self {
            target: target.into(),
            ports: ports.into(),
            ..Self::default()
        }
    }

    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = Some(concurrency);
        self
    }

    pub fn with_port_concurrency(mut self, concurrency: usize) -> Self {
        self.port_concurrency = Some(concurrency);
        self
    }

    pub fn with_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.timeout_ms = Some(timeout_ms);
        self
    }

    pub fn with_banner(mut self, grab_banner: bool) -> Self {
        self.grab_banner = grab_banner;
        self
    }

    pub fn with_max_connections(mut self, max: usize) -> Self {
        self.max_connections = Some(max);
        self
    }

    pub fn with_rate_limit(mut self, per_second: u32) -> Self {
        self.rate_limit = Some(per_second);
        self
    }

    /// Check required fields and fill in defaults.
    pub fn options(&self) -> ScanResult<ScanOptions> {
        if self.target.trim().is_empty() {
            return Err(ScanError::MissingField("target"));
        }
        if self.ports.trim().is_empty() {
            return Err(ScanError::MissingField("ports"));
        }

        let concurrency = self
            .concurrency
            .filter(|&c| c > 0)
            .unwrap_or(DEFAULT_CONCURRENCY);
        let timeout_ms = self
            .timeout_ms
            .filter(|&t| t > 0)
            .unwrap_or(DEFAULT_TIMEOUT_MS);

        Ok(ScanOptions {
            concurrency,
            port_concurrency: self
                .port_concurrency
                .filter(|&c| c > 0)
                .unwrap_or(concurrency),
            timeout: Duration::from_millis(timeout_ms),
            grab_banner: self.grab_banner,
            max_connections: self.max_connections.filter(|&m| m > 0),
            rate_limit: self.rate_limit.filter(|&r| r > 0),
        })
    }
}

impl ScanRequest {
    /// Parse the port list and reject ports a TCP probe cannot dial.
    ///
    /// Only range bounds are inspected, so an absurd range fails without
    /// being expanded.
    pub fn port_spec(&self) -> ScanResult<PortSpec> {
        let spec: PortSpec = self.ports.parse()?;
        if let Some(max) = spec.max_port().filter(|&max| max > MAX_TCP_PORT) {
            return Err(ScanError::PortOutOfRange(max));
        }
        Ok(spec)
    }
}

/// Scan settings with every default applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScanOptions {
    pub concurrency: usize,
    pub port_concurrency: usize,
    pub timeout: Duration,
    pub grab_banner: bool,
    pub max_connections: Option<usize>,
    pub rate_limit: Option<u32>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_applied() {
        let options = ScanRequest::new("10.0.0.1", "22").options().unwrap();
        assert_eq!(options.concurrency, 200);
        assert_eq!(options.port_concurrency, 200);
        assert_eq!(options.timeout, Duration::from_millis(1000));
        assert!(!options.grab_banner);
        assert_eq!(options.max_connections, None);
        assert_eq!(options.rate_limit, None);
    }

    #[test]
    fn test_zero_counts_as_unset() {
        let options = ScanRequest::new("10.0.0.1", "22")
            .with_concurrency(0)
            .with_timeout_ms(0)
            .with_rate_limit(0)
            .options()
            .unwrap();
        assert_eq!(options.concurrency, DEFAULT_CONCURRENCY);
        assert_eq!(options.timeout, Duration::from_millis(DEFAULT_TIMEOUT_MS));
        assert_eq!(options.rate_limit, None);
    }

    #[test]
    fn test_port_concurrency_follows_concurrency() {
        let options = ScanRequest::new("10.0.0.1", "22")
            .with_concurrency(16)
            .options()
            .unwrap();
        assert_eq!(options.port_concurrency, 16);

        let options = ScanRequest::new("10.0.0.1", "22")
            .with_concurrency(16)
            .with_port_concurrency(64)
            .options()
            .unwrap();
        assert_eq!(options.concurrency, 16);
        assert_eq!(options.port_concurrency, 64);
    }

    #[test]
    fn test_missing_fields() {
        assert!(matches!(
            ScanRequest::new("  ", "22").options(),
            Err(ScanError::MissingField("target"))
        ));
        assert!(matches!(
            ScanRequest::new("10.0.0.1", "").options(),
            Err(ScanError::MissingField("ports"))
        ));
    }

    #[test]
    fn test_from_json() {
        let request: ScanRequest = serde_json::from_str(
            r#"{"target":"192.168.1.0/30","ports":"22,80","timeout_ms":250,"grab_banner":true}"#,
        )
        .unwrap();
        assert_eq!(request.target, "192.168.1.0/30");
        assert_eq!(request.concurrency, None);
        let options = request.options().unwrap();
        assert_eq!(options.timeout, Duration::from_millis(250));
        assert!(options.grab_banner);

        assert!(serde_json::from_str::<ScanRequest>(r#"{"ports":"22"}"#).is_err());
    }

    #[test]
    fn test_port_spec_rejects_ports_above_tcp_range() {
        let spec = ScanRequest::new("10.0.0.1", "22,8000-8002").port_spec().unwrap();
        assert_eq!(spec.count(), 4);

        assert!(matches!(
            ScanRequest::new("10.0.0.1", "65535-65536").port_spec(),
            Err(ScanError::PortOutOfRange(65536))
        ));
        assert!(matches!(
            ScanRequest::new("10.0.0.1", "1-4000000000").port_spec(),
            Err(ScanError::PortOutOfRange(4_000_000_000))
        ));
        assert!(matches!(
            ScanRequest::new("10.0.0.1", "22,x").port_spec(),
            Err(ScanError::InvalidPorts(_))
        ));
    }
}
