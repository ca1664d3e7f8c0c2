//! CSV output formatting.
//!
//! One row per open port. Dead hosts get a single row with an empty port so
//! the file still lists every scanned address.

use crate::storage::ScanRecord;
use std::io::{self, Write};

pub fn write_csv<W: Write>(out: W, record: &ScanRecord) -> io::Result<()> {
    let mut wtr = csv::Writer::from_writer(out);

    wtr.write_record(["address", "alive", "port", "service", "banner"])?;

    for host in &record.report.alive_hosts {
        for port in host.open_ports() {
            wtr.write_record([
                host.address(),
                "true",
                &port.port.to_string(),
                port.service.as_deref().unwrap_or(""),
                port.banner.as_deref().unwrap_or(""),
            ])?;
        }
    }
    for host in &record.report.dead_hosts {
        wtr.write_record([host.address(), "false", "", "", ""])?;
    }

    wtr.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scanner::{HostOutcome, PortOutcome, ScanReport};

    #[test]
    fn test_csv_rows() {
        let record = ScanRecord::new(ScanReport {
            generated_at: chrono::Utc::now(),
            target: "10.0.0.0/30".to_string(),
            ports_spec: "22,80".to_string(),
            duration_ms: 5,
            alive_hosts: vec![HostOutcome::new(
                "10.0.0.1",
                vec![
                    PortOutcome::open(80),
                    PortOutcome::open(22)
                        .with_banner(Some("SSH-2.0-OpenSSH_9.6, test".to_string()))
                        .with_service(Some("SSH server".to_string())),
                ],
            )],
            dead_hosts: vec![HostOutcome::dead("10.0.0.2")],
        });

        let mut buf = Vec::new();
        write_csv(&mut buf, &record).unwrap();
        let text = String::from_utf8(buf).unwrap();
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(
            lines,
            vec![
                "address,alive,port,service,banner",
                "10.0.0.1,true,22,SSH server,\"SSH-2.0-OpenSSH_9.6, test\"",
                "10.0.0.1,true,80,,",
                "10.0.0.2,false,,,",
            ]
        );
    }
}
