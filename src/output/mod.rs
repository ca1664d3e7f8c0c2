//! Output formatting module.
//!
//! Provides formatters for plain text, JSON, and CSV output of scan reports.
//! Every formatter writes to any `io::Write`, so the same code serves the
//! terminal and `trawl export --output <file>`.

mod csv_format;
mod json_format;
mod plain;

pub use csv_format::write_csv;
pub use json_format::write_json;
pub use plain::{
    print_error, print_info, print_scan_header, print_success, print_warning, write_plain,
};

use crate::cli::OutputFormat;
use crate::storage::ScanRecord;
use std::io::{self, Write};

/// Write a record in the given format. `colored` only affects plain text.
pub fn write_record<W: Write>(
    out: W,
    record: &ScanRecord,
    format: OutputFormat,
    colored: bool,
) -> io::Result<()> {
    match format {
        OutputFormat::Plain => plain::write_plain(out, record, colored),
        OutputFormat::Json => json_format::write_json(out, record),
        OutputFormat::Csv => csv_format::write_csv(out, record),
    }
}

/// Print a record to stdout.
pub fn print_record(record: &ScanRecord, format: OutputFormat) -> io::Result<()> {
    let stdout = io::stdout();
    write_record(stdout.lock(), record, format, console::colors_enabled())
}
