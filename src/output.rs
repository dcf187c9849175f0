//! Output formatting for scan results.
//!
//! One line per finding, either the fixed-width plain form or JSON.

use crate::config::OutputFormat;
use crate::scanner::ScanResult;
use std::io::{self, Write};

/// Write a single result as one line.
pub fn write_result<W: Write>(out: &mut W, result: &ScanResult, format: OutputFormat) -> io::Result<()> {
    match format {
        OutputFormat::Plain => writeln!(out, "{}", result),
        OutputFormat::Json => {
            serde_json::to_writer(&mut *out, result).map_err(io::Error::other)?;
            writeln!(out)
        }
    }
}

/// Print a single result to stdout.
pub fn print_result(result: &ScanResult, format: OutputFormat) -> io::Result<()> {
    let stdout = io::stdout();
    let mut out = stdout.lock();
    write_result(&mut out, result, format)?;
    out.flush()
}
