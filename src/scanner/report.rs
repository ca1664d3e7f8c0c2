//! Scan outcomes at port, host and network level.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Result of probing one TCP port.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PortOutcome {
    pub port: u16,
    pub open: bool,
    /// Service identified from the banner, if any marker matched.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub service: Option<String>,
    /// Trimmed banner text, present only when grabbed and non-empty.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub banner: Option<String>,
}

impl PortOutcome {
    /// A port that did not accept a connection.
    pub fn closed(port: u16) -> Self {
        Self {
            port,
            open: false,
            service: None,
            banner: None,
        }
    }

    /// A port that accepted a connection.
    pub fn open(port: u16) -> Self {
        Self {
            open: true,
            ..Self::closed(port)
        }
    }

    pub fn with_banner(mut self, banner: Option<String>) -> Self {
        self.banner = banner;
        self
    }

    pub fn with_service(mut self, service: Option<String>) -> Self {
        self.service = service;
        self
    }
}

/// Result of scanning every requested port on one host.
///
/// `alive` is derived from `open_ports` and cannot be set on its own, also
/// when the value is read back from storage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "StoredHostOutcome")]
pub struct HostOutcome {
    address: String,
    alive: bool,
    open_ports: Vec<PortOutcome>,
}

impl HostOutcome {
    /// Build an outcome; open ports are ordered by port number.
    pub fn new(address: impl Into<String>, mut open_ports: Vec<PortOutcome>) -> Self {
        open_ports.sort_by_key(|p| p.port);
        Self {
            address: address.into(),
            alive: !open_ports.is_empty(),
            open_ports,
        }
    }

    /// A host with no open ports.
    pub fn dead(address: impl Into<String>) -> Self {
        Self::new(address, Vec::new())
    }

    pub fn address(&self) -> &str {
        &self.address
    }

    pub fn is_alive(&self) -> bool {
        self.alive
    }

    pub fn open_ports(&self) -> &[PortOutcome] {
        &self.open_ports
    }
}

#[derive(Deserialize)]
struct StoredHostOutcome {
    address: String,
    #[serde(default)]
    open_ports: Vec<PortOutcome>,
}

impl From<StoredHostOutcome> for HostOutcome {
    fn from(stored: StoredHostOutcome) -> Self {
        Self::new(stored.address, stored.open_ports)
    }
}

/// Final report of one network scan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanReport {
    pub generated_at: DateTime<Utc>,
    /// Target exactly as requested (address or CIDR block).
    pub target: String,
    /// Port specification exactly as requested.
    pub ports_spec: String,
    /// Wall-clock time spent scanning.
    #[serde(default)]
    pub duration_ms: u64,
    /// Hosts with at least one open port, sorted by address.
    pub alive_hosts: Vec<HostOutcome>,
    /// Hosts with no open ports, sorted by address.
    pub dead_hosts: Vec<HostOutcome>,
}

impl ScanReport {
    pub fn summary(&self) -> ScanSummary {
        ScanSummary {
            alive: self.alive_hosts.len(),
            dead: self.dead_hosts.len(),
            open_ports: self
                .alive_hosts
                .iter()
                .map(|h| h.open_ports().len())
                .sum(),
        }
    }

    /// Number of hosts covered by the report.
    pub fn host_count(&self) -> usize {
        self.alive_hosts.len() + self.dead_hosts.len()
    }
}

/// Host counts for summary display.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ScanSummary {
    pub alive: usize,
    pub dead: usize,
    pub open_ports: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_alive_follows_open_ports() {
        assert!(!HostOutcome::dead("10.0.0.1").is_alive());
        assert!(!HostOutcome::new("10.0.0.1", vec![]).is_alive());

        let host = HostOutcome::new("10.0.0.1", vec![PortOutcome::open(22)]);
        assert!(host.is_alive());
        assert_eq!(host.open_ports().len(), 1);
    }

    #[test]
    fn test_open_ports_sorted() {
        let host = HostOutcome::new(
            "10.0.0.1",
            vec![PortOutcome::open(443), PortOutcome::open(22), PortOutcome::open(80)],
        );
        let ports: Vec<u16> = host.open_ports().iter().map(|p| p.port).collect();
        assert_eq!(ports, vec![22, 80, 443]);
    }

    #[test]
    fn test_stored_alive_flag_is_recomputed() {
        let json = r#"{"address":"10.0.0.9","alive":true,"open_ports":[]}"#;
        let host: HostOutcome = serde_json::from_str(json).unwrap();
        assert!(!host.is_alive());

        let json = r#"{"address":"10.0.0.9","alive":false,"open_ports":[{"port":22,"open":true}]}"#;
        let host: HostOutcome = serde_json::from_str(json).unwrap();
        assert!(host.is_alive());
    }

    #[test]
    fn test_port_outcome_json_omits_empty_fields() {
        let json = serde_json::to_string(&PortOutcome::open(80)).unwrap();
        assert_eq!(json, r#"{"port":80,"open":true}"#);

        let port = PortOutcome::open(22)
            .with_banner(Some("SSH-2.0-OpenSSH_8.9".to_string()))
            .with_service(Some("SSH server".to_string()));
        let json = serde_json::to_value(&port).unwrap();
        assert_eq!(json["service"], "SSH server");
    }

    #[test]
    fn test_summary_counts() {
        let report = ScanReport {
            generated_at: Utc::now(),
            target: "10.0.0.0/29".to_string(),
            ports_spec: "22,80".to_string(),
            duration_ms: 12,
            alive_hosts: vec![HostOutcome::new(
                "10.0.0.1",
                vec![PortOutcome::open(22), PortOutcome::open(80)],
            )],
            dead_hosts: vec![HostOutcome::dead("10.0.0.2"), HostOutcome::dead("10.0.0.3")],
        };
        let summary = report.summary();
        assert_eq!(summary.alive, 1);
        assert_eq!(summary.dead, 2);
        assert_eq!(summary.open_ports, 2);
        assert_eq!(report.host_count(), 3);
    }
}
