//! Export subcommand implementation.
//!
//! Handles `trawl export <scan-id>` for writing a stored scan to stdout or a file.

use crate::cli::{Context, OutputFormat};
use crate::error::CliResult;
use crate::output;
use clap::Parser;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::PathBuf;

/// Export a stored scan.
#[derive(Parser, Debug)]
pub struct ExportCommand {
    /// Scan ID or prefix to export
    ///
    /// Can be a full UUID or the first few characters (short ID).
    #[arg(value_name = "SCAN_ID")]
    pub scan_id: String,

    /// Output format
    #[arg(short, long, value_enum, default_value = "json")]
    pub format: OutputFormat,

    /// Output file path (prints to stdout if not specified)
    #[arg(short = 'o', long = "output")]
    pub output_file: Option<PathBuf>,

    /// Export only hosts with open ports
    #[arg(long)]
    pub alive_only: bool,
}

impl ExportCommand {
    pub fn execute(&self, ctx: &Context) -> CliResult<()> {
        let mut record = ctx.store()?.find(&self.scan_id)?;
        if self.alive_only {
            record.report.dead_hosts.clear();
        }

        match &self.output_file {
            Some(path) => {
                let mut writer = BufWriter::new(File::create(path)?);
                output::write_record(&mut writer, &record, self.format, false)?;
                writer.flush()?;

                if !ctx.quiet {
                    output::print_success(&format!(
                        "Exported scan {} to {}",
                        record.id.short(),
                        path.display()
                    ));
                }
            }
            None => output::print_record(&record, self.format)?,
        }

        Ok(())
    }
}
