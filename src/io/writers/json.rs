use crate::io::output::{CheckReport, FixReport, OptimizeReport, OutputWriter};
use serde::Serialize;
use std::io::Write;

pub struct JsonWriter<W: Write> {
    writer: W,
}

impl<W: Write> JsonWriter<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    fn write_value<T: Serialize>(&mut self, value: &T) -> anyhow::Result<()> {
        let json = serde_json::to_string_pretty(value)?;
        self.writer.write_all(json.as_bytes())?;
        writeln!(self.writer)?;
        self.writer.flush()?;
        Ok(())
    }
}

impl<W: Write> OutputWriter for JsonWriter<W> {
    fn write_check(&mut self, report: &CheckReport) -> anyhow::Result<()> {
        self.write_value(report)
    }

    fn write_optimization(&mut self, report: &OptimizeReport) -> anyhow::Result<()> {
        self.write_value(report)
    }

    fn write_fix(&mut self, report: &FixReport) -> anyhow::Result<()> {
        self.write_value(report)
    }
}
