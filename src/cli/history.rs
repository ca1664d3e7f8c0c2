//! History subcommand implementation.
//!
//! Handles `trawl history` for listing and pruning stored scans.

use crate::cli::Context;
use crate::error::CliResult;
use crate::output;
use crate::storage::{ScanRecord, ScanStore};
use clap::Parser;
use console::style;

/// View and manage scan history.
#[derive(Parser, Debug)]
pub struct HistoryCommand {
    /// Number of recent scans to show
    #[arg(short = 'n', long, default_value = "10")]
    pub count: usize,

    /// Show detailed information for each scan
    #[arg(short, long)]
    pub detailed: bool,

    /// Delete all stored scans
    #[arg(long, conflicts_with = "prune")]
    pub clear: bool,

    /// Delete scans older than N days
    #[arg(long, value_name = "DAYS")]
    pub prune: Option<u32>,
}

impl HistoryCommand {
    pub fn execute(&self, ctx: &Context) -> CliResult<()> {
        let store = ctx.store()?;

        if self.clear {
            let removed = clear(&store)?;
            if !ctx.quiet {
                output::print_success(&format!("Deleted {} stored scans", removed));
            }
            return Ok(());
        }

        if let Some(days) = self.prune {
            let removed = store.cleanup(chrono::Duration::days(i64::from(days)))?;
            if !ctx.quiet {
                output::print_success(&format!(
                    "Deleted {} scans older than {} days",
                    removed, days
                ));
            }
            return Ok(());
        }

        let records = store.list_recent(self.count)?;
        if records.is_empty() {
            if !ctx.quiet {
                println!("No stored scans.");
            }
            return Ok(());
        }

        for record in &records {
            if self.detailed {
                print_detailed(record);
            } else {
                println!(
                    "{}  {}  {}",
                    style(record.id.short()).dim(),
                    record.report.generated_at.format("%Y-%m-%d %H:%M"),
                    record.summary()
                );
            }
        }

        Ok(())
    }
}

fn clear(store: &ScanStore) -> CliResult<usize> {
    let ids = store.list_ids()?;
    for id in &ids {
        store.delete(id)?;
    }
    Ok(ids.len())
}

fn print_detailed(record: &ScanRecord) {
    let report = &record.report;
    let summary = report.summary();

    println!("{} {}", style("Scan").bold(), style(record.id).cyan());
    println!("  Generated:  {}", report.generated_at.to_rfc3339());
    println!("  Target:     {}", report.target);
    println!("  Ports:      {}", report.ports_spec);
    println!("  Duration:   {} ms", report.duration_ms);
    println!(
        "  Hosts:      {} alive, {} dead, {} open ports",
        summary.alive, summary.dead, summary.open_ports
    );
    for host in &report.alive_hosts {
        let ports: Vec<String> = host
            .open_ports()
            .iter()
            .map(|p| match &p.service {
                Some(service) => format!("{} ({})", p.port, service),
                None => p.port.to_string(),
            })
            .collect();
        println!("    {}  {}", host.address(), ports.join(", "));
    }
    println!();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scanner::{HostOutcome, ScanReport};

    #[test]
    fn test_clear_removes_everything() {
        let dir = tempfile::tempdir().unwrap();
        let store = ScanStore::with_dir(dir.path().to_path_buf()).unwrap();
        for target in ["10.0.0.1", "10.0.0.2"] {
            store
                .save(ScanReport {
                    generated_at: chrono::Utc::now(),
                    target: target.to_string(),
                    ports_spec: "22".to_string(),
                    duration_ms: 1,
                    alive_hosts: vec![],
                    dead_hosts: vec![HostOutcome::dead(target)],
                })
                .unwrap();
        }

        assert_eq!(clear(&store).unwrap(), 2);
        assert!(store.list().unwrap().is_empty());
        assert_eq!(clear(&store).unwrap(), 0);
    }
}
