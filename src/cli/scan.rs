//! Scan subcommand implementation.
//!
//! Handles `trawl scan <target>`. Settings are layered: command-line flags
//! override the selected profile, which overrides the settings file.

use crate::cli::{Context, OutputFormat};
use crate::config::{AppSettings, Profile};
use crate::error::{CliResult, ProfileError, ScanError};
use crate::output;
use crate::scanner::{NetworkScanner, ScanCancel, ScanRequest};
use crate::types::TargetSpec;
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};

const DEFAULT_PORTS: &str = "1-1000";

/// Scan a host or CIDR block for open TCP ports.
#[derive(Parser, Debug)]
pub struct ScanCommand {
    /// Target to scan (IP, hostname, or CIDR notation)
    ///
    /// Examples:
    ///   192.168.1.1        Single IP address
    ///   example.com        Hostname
    ///   192.168.1.0/24     CIDR block
    #[arg(value_name = "TARGET")]
    pub target: String,

    /// Ports to scan (e.g., "80", "80,443", "1-1000", "22,80,8000-9000")
    #[arg(short, long)]
    pub ports: Option<String>,

    /// Hosts scanned at once
    #[arg(short = 'c', long)]
    pub concurrency: Option<usize>,

    /// Ports probed at once on each host
    #[arg(long)]
    pub port_concurrency: Option<usize>,

    /// Cap on connection attempts in flight across the whole scan
    #[arg(long)]
    pub max_connections: Option<usize>,

    /// Connection timeout in milliseconds
    #[arg(short = 't', long)]
    pub timeout: Option<u64>,

    /// Read a banner from each open port and identify the service
    #[arg(short = 'b', long)]
    pub banner: bool,

    /// Probes per second across the scan (0 = unlimited)
    #[arg(short = 'r', long = "rate")]
    pub rate_limit: Option<u32>,

    /// Use a saved scan profile
    #[arg(long = "profile", short = 'P')]
    pub profile: Option<String>,

    /// Output format for results
    #[arg(short, long, value_enum)]
    pub output: Option<OutputFormat>,

    /// Don't save the scan to history
    #[arg(long)]
    pub no_save: bool,
}

impl ScanCommand {
    /// Execute the scan command.
    pub async fn execute(&self, ctx: &Context) -> CliResult<()> {
        let profile = match &self.profile {
            Some(name) => Some(
                ctx.profiles()?
                    .get(name)
                    .cloned()
                    .ok_or_else(|| ProfileError::NotFound(name.clone()))?,
            ),
            None => None,
        };

        let request = self.build_request(&ctx.settings, profile.as_ref());
        let format = self.output_format(&ctx.settings);
        let chatty = !ctx.quiet && format == OutputFormat::Plain;

        // Reject malformed input before printing anything.
        request.options()?;
        let ports = request.port_spec()?;
        let hosts = TargetSpec::parse(&request.target).map_err(ScanError::from)?;

        if chatty {
            output::print_scan_header(
                &request.target,
                &request.ports,
                hosts.host_count(),
                ports.count(),
            );
        }

        let cancel = ScanCancel::new();
        let mut scanner = NetworkScanner::new().with_cancel(cancel.clone());
        if ctx.verbose && !ctx.quiet {
            scanner = scanner.with_progress(progress_bar());
        }

        let ctrl_c = tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                tracing::warn!("interrupted, cancelling scan");
                cancel.cancel();
            }
        });
        let result = scanner.scan(&request).await;
        ctrl_c.abort();

        let report = match result {
            Ok(report) => report,
            Err(ScanError::Cancelled) => {
                output::print_warning("scan cancelled, nothing was saved");
                return Err(ScanError::Cancelled.into());
            }
            Err(e) => return Err(e.into()),
        };

        let save = ctx.settings.auto_save_scans && !self.no_save;
        let record = if save {
            let record = ctx.store()?.save(report)?;
            if chatty {
                output::print_info(&format!("Scan saved as {}", record.id.short()));
            }
            record
        } else {
            crate::storage::ScanRecord::new(report)
        };

        output::print_record(&record, format)?;
        Ok(())
    }

    /// Merge flags, profile and settings into one request.
    fn build_request(&self, settings: &AppSettings, profile: Option<&Profile>) -> ScanRequest {
        let ports = self
            .ports
            .clone()
            .or_else(|| profile.map(|p| p.ports.clone()))
            .unwrap_or_else(|| DEFAULT_PORTS.to_string());

        let concurrency = self
            .concurrency
            .or(profile.map(|p| p.concurrency))
            .unwrap_or(settings.default_concurrency);
        let port_concurrency = self
            .port_concurrency
            .or(profile.and_then(|p| p.port_concurrency))
            .or(settings.default_port_concurrency);
        let timeout_ms = self
            .timeout
            .or(profile.map(|p| p.timeout_ms))
            .unwrap_or(settings.default_timeout_ms);
        let rate_limit = self
            .rate_limit
            .or(profile.map(|p| p.rate_limit))
            .unwrap_or(settings.default_rate_limit);
        let banner = self.banner || profile.is_some_and(|p| p.banner) || settings.grab_banner;

        let mut request = ScanRequest::new(self.target.clone(), ports)
            .with_concurrency(concurrency)
            .with_timeout_ms(timeout_ms)
            .with_banner(banner)
            .with_rate_limit(rate_limit);
        if let Some(per_host) = port_concurrency {
            request = request.with_port_concurrency(per_host);
        }
        if let Some(max) = self.max_connections.or(settings.max_connections) {
            request = request.with_max_connections(max);
        }
        request
    }

    fn output_format(&self, settings: &AppSettings) -> OutputFormat {
        self.output.unwrap_or_else(|| {
            settings
                .default_output_format
                .parse()
                .unwrap_or_else(|e: String| {
                    tracing::warn!(error = %e, "falling back to plain output");
                    OutputFormat::Plain
                })
        })
    }
}

fn progress_bar() -> ProgressBar {
    let pb = ProgressBar::new(0);
    if let Ok(style) = ProgressStyle::default_bar().template(
        "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} hosts ({percent}%) {msg}",
    ) {
        pb.set_style(style.progress_chars("=>-"));
    }
    pb
}
