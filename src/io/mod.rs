pub mod output;
pub mod writers;

pub use output::{create_writer, CheckReport, FixReport, OptimizeReport, OutputWriter};
pub use writers::{CsvWriter, JsonWriter, MarkdownWriter, SarifWriter, TerminalWriter};

use anyhow::{Context, Result};
use std::fs;
use std::path::Path;

pub fn write_file(path: &Path, content: &str) -> Result<()> {
    fs::write(path, content).with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(())
}
