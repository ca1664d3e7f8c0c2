//! Plain text output formatting.
//!
//! Produces human-readable output with colors and formatting.

use crate::storage::ScanRecord;
use console::{style, StyledObject};
use std::io::{self, Write};

const RULE_WIDTH: usize = 63;
const BANNER_WIDTH: usize = 40;

/// Write the record as a human-readable report.
pub fn write_plain<W: Write>(mut out: W, record: &ScanRecord, colored: bool) -> io::Result<()> {
    let paint = |text: String| -> StyledObject<String> { style(text).force_styling(colored) };
    let report = &record.report;
    let summary = report.summary();

    writeln!(out)?;
    writeln!(out, "{}", paint("═".repeat(RULE_WIDTH)).cyan())?;
    writeln!(
        out,
        "                    {} Scan Results",
        paint("Trawl".to_string()).cyan().bold()
    )?;
    writeln!(out, "{}", paint("═".repeat(RULE_WIDTH)).cyan())?;
    writeln!(out)?;

    writeln!(out, "  {} {}", paint("Target:".into()).bold(), report.target)?;
    writeln!(out, "  {} {}", paint("Ports:".into()).bold(), report.ports_spec)?;
    writeln!(
        out,
        "  {} {}",
        paint("Scan ID:".into()).bold(),
        paint(record.id.short()).dim()
    )?;
    writeln!(
        out,
        "  {} {}",
        paint("Generated:".into()).bold(),
        report.generated_at.format("%Y-%m-%d %H:%M:%S UTC")
    )?;
    writeln!(out)?;

    writeln!(
        out,
        "  {} {} hosts scanned in {:.2}s",
        paint("Statistics:".into()).bold(),
        report.host_count(),
        report.duration_ms as f64 / 1000.0
    )?;
    writeln!(
        out,
        "              {} alive, {} dead, {} open ports",
        paint(summary.alive.to_string()).green().bold(),
        paint(summary.dead.to_string()).red(),
        paint(summary.open_ports.to_string()).green()
    )?;
    writeln!(out)?;

    if report.alive_hosts.is_empty() {
        writeln!(out, "  {}", paint("No open ports found.".into()).dim())?;
    }

    for host in &report.alive_hosts {
        writeln!(
            out,
            "  {} {}",
            paint("Host".into()).bold(),
            paint(host.address().to_string()).white().bold()
        )?;
        writeln!(out, "  {}", paint("─".repeat(RULE_WIDTH)).dim())?;
        writeln!(
            out,
            "  {:>6}  {:<15}  {}",
            paint("PORT".into()).bold(),
            paint("SERVICE".into()).bold(),
            paint("BANNER".into()).bold()
        )?;
        for port in host.open_ports() {
            let banner = port
                .banner
                .as_deref()
                .map(|b| truncate_string(first_line(b), BANNER_WIDTH))
                .unwrap_or_default();
            writeln!(
                out,
                "  {:>6}  {:<15}  {}",
                paint(port.port.to_string()).green().bold(),
                port.service.as_deref().unwrap_or("unknown"),
                paint(banner).dim()
            )?;
        }
        writeln!(out)?;
    }

    if !report.dead_hosts.is_empty() {
        writeln!(
            out,
            "  {} {} hosts with no open ports",
            paint("Dead:".into()).bold(),
            summary.dead
        )?;
        writeln!(out)?;
    }

    writeln!(out, "{}", paint("═".repeat(RULE_WIDTH)).cyan())?;
    writeln!(out)?;

    Ok(())
}

/// Print a scan header before scanning begins.
pub fn print_scan_header(target: &str, ports_spec: &str, hosts: u128, ports: u64) {
    println!();
    println!(
        "{} {} v{}",
        style("Starting").cyan(),
        style("Trawl").cyan().bold(),
        env!("CARGO_PKG_VERSION")
    );
    println!(
        "{} Target: {} ({} hosts)",
        style("•").dim(),
        style(target).white().bold(),
        hosts
    );
    println!(
        "{} Ports: {} ({} per host)",
        style("•").dim(),
        style(ports_spec).white().bold(),
        ports
    );
    println!();
}

/// Print an error message.
pub fn print_error(msg: &str) {
    eprintln!("{} {}", style("Error:").red().bold(), msg);
}

/// Print a warning message.
pub fn print_warning(msg: &str) {
    eprintln!("{} {}", style("Warning:").yellow().bold(), msg);
}

/// Print a success message.
pub fn print_success(msg: &str) {
    println!("{} {}", style("✓").green().bold(), msg);
}

/// Print an info message.
pub fn print_info(msg: &str) {
    println!("{} {}", style("ℹ").blue().bold(), msg);
}

fn first_line(s: &str) -> &str {
    s.lines().next().unwrap_or_default()
}

/// Truncate to at most `max_len` characters, adding an ellipsis if truncated.
fn truncate_string(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}
