use crate::core::Violation;
use crate::io::output::{CheckReport, FixReport, OptimizeReport, OutputWriter};
use std::borrow::Cow;
use std::io::Write;

const CHECK_HEADER: [&str; 10] = [
    "Severity",
    "Project",
    "InvalidReference",
    "RuleName",
    "Description",
    "FilePath",
    "LineNumber",
    "ColumnNumber",
    "Suggestion",
    "DocumentationUrl",
];

const OPTIMIZE_HEADER: [&str; 5] = ["Project", "ProjectPath", "Reference", "Reason", "TransitivePath"];

const FIX_HEADER: [&str; 5] = ["Success", "Changed", "FilePath", "Reference", "Message"];

/// Quote a field when it holds a delimiter, quote or line break; inner quotes are doubled.
pub fn escape_field(field: &str) -> Cow<'_, str> {
    if field.contains([',', '"', '\n', '\r']) {
        Cow::Owned(format!("\"{}\"", field.replace('"', "\"\"")))
    } else {
        Cow::Borrowed(field)
    }
}

pub struct CsvWriter<W: Write> {
    writer: W,
}

impl<W: Write> CsvWriter<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    fn write_row<S: AsRef<str>>(&mut self, fields: &[S]) -> anyhow::Result<()> {
        let line = fields
            .iter()
            .map(|f| escape_field(f.as_ref()))
            .collect::<Vec<_>>()
            .join(",");
        // CRLF row terminator
        write!(self.writer, "{}\r\n", line)?;
        Ok(())
    }

    fn violation_row(violation: &Violation) -> [String; 10] {
        let (file, line, column) = match &violation.location {
            Some(loc) => (
                loc.file.display().to_string(),
                loc.line.to_string(),
                loc.column.to_string(),
            ),
            None => Default::default(),
        };
        [
            violation.severity.to_string(),
            violation.project_name.clone(),
            violation.offending_reference.clone().unwrap_or_default(),
            violation.rule_id.clone(),
            violation.description.clone(),
            file,
            line,
            column,
            violation.suggestion.clone().unwrap_or_default(),
            violation.doc_url.clone().unwrap_or_default(),
        ]
    }
}

impl<W: Write> OutputWriter for CsvWriter<W> {
    fn write_check(&mut self, report: &CheckReport) -> anyhow::Result<()> {
        self.write_row(&CHECK_HEADER)?;

        let mut ordered: Vec<&Violation> = report.violations.iter().collect();
        ordered.sort_by(|a, b| {
            a.severity
                .cmp(&b.severity)
                .then_with(|| a.project_name.cmp(&b.project_name))
        });
        for violation in ordered {
            self.write_row(&Self::violation_row(violation))?;
        }
        self.writer.flush()?;
        Ok(())
    }

    fn write_optimization(&mut self, report: &OptimizeReport) -> anyhow::Result<()> {
        self.write_row(&OPTIMIZE_HEADER)?;
        for result in &report.results {
            let path = result.descriptor_path.display().to_string();
            for reference in &result.references {
                self.write_row(&[
                    result.project_name.as_str(),
                    path.as_str(),
                    reference.reference_name.as_str(),
                    reference.reason.to_string().as_str(),
                    reference.transitive_path.as_deref().unwrap_or(""),
                ])?;
            }
        }
        self.writer.flush()?;
        Ok(())
    }

    fn write_fix(&mut self, report: &FixReport) -> anyhow::Result<()> {
        self.write_row(&FIX_HEADER)?;
        for result in &report.results {
            let path = result
                .descriptor_path
                .as_ref()
                .map(|p| p.display().to_string())
                .unwrap_or_default();
            self.write_row(&[
                result.success.to_string().as_str(),
                result.changed.to_string().as_str(),
                path.as_str(),
                result.reference.as_deref().unwrap_or(""),
                result.message.as_str(),
            ])?;
        }
        self.writer.flush()?;
        Ok(())
    }
}
