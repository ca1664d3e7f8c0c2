//! JSON output formatting.

use crate::storage::ScanRecord;
use std::io::{self, Write};

/// Write the record as pretty-printed JSON followed by a newline.
pub fn write_json<W: Write>(mut out: W, record: &ScanRecord) -> io::Result<()> {
    serde_json::to_writer_pretty(&mut out, record)?;
    writeln!(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scanner::{HostOutcome, PortOutcome, ScanReport};

    #[test]
    fn test_json_matches_report_shape() {
        let record = ScanRecord::new(ScanReport {
            generated_at: chrono::Utc::now(),
            target: "10.0.0.0/30".to_string(),
            ports_spec: "22".to_string(),
            duration_ms: 12,
            alive_hosts: vec![HostOutcome::new("10.0.0.1", vec![PortOutcome::open(22)])],
            dead_hosts: vec![HostOutcome::dead("10.0.0.2")],
        });

        let mut buf = Vec::new();
        write_json(&mut buf, &record).unwrap();
        let value: serde_json::Value = serde_json::from_slice(&buf).unwrap();

        assert_eq!(value["id"], record.id.to_string());
        assert_eq!(value["alive_hosts"][0]["address"], "10.0.0.1");
        assert_eq!(value["alive_hosts"][0]["alive"], true);
        assert_eq!(value["alive_hosts"][0]["open_ports"][0]["port"], 22);
        assert_eq!(value["dead_hosts"][0]["alive"], false);
        assert!(value["alive_hosts"][0]["open_ports"][0].get("banner").is_none());

        let parsed: ScanRecord = serde_json::from_slice(&buf).unwrap();
        assert_eq!(parsed, record);
    }
}
