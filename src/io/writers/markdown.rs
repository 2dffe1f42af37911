use crate::core::{ReferenceReason, Severity, Violation};
use crate::io::output::{CheckReport, FixReport, ModuleSummary, OptimizeReport, OutputWriter};
use std::io::Write;

pub struct MarkdownWriter<W: Write> {
    writer: W,
}

impl<W: Write> MarkdownWriter<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    fn write_summary(&mut self, report: &CheckReport) -> anyhow::Result<()> {
        let summary = &report.summary;
        let status = if summary.is_valid { "✅ Valid" } else { "❌ Invalid" };

        writeln!(self.writer, "## Summary")?;
        writeln!(self.writer)?;
        writeln!(self.writer, "- **Total Modules**: {}", summary.total_modules)?;
        writeln!(self.writer, "- **Total Projects**: {}", summary.total_projects)?;
        writeln!(self.writer, "- **Errors**: {}", summary.error_count)?;
        writeln!(self.writer, "- **Warnings**: {}", summary.warning_count)?;
        writeln!(self.writer, "- **Info**: {}", summary.info_count)?;
        writeln!(self.writer, "- **Status**: {}", status)?;
        writeln!(self.writer)?;
        Ok(())
    }

    fn write_violations(&mut self, violations: &[Violation]) -> anyhow::Result<()> {
        if violations.is_empty() {
            return Ok(());
        }
        writeln!(self.writer, "## Violations")?;
        writeln!(self.writer)?;

        let mut ordered: Vec<&Violation> = violations.iter().collect();
        ordered.sort_by_key(|v| v.severity);

        for violation in ordered {
            writeln!(
                self.writer,
                "### {}: {}",
                severity_heading(violation.severity),
                violation.rule_id
            )?;
            writeln!(self.writer)?;
            writeln!(self.writer, "- **Project**: {}", violation.project_name)?;
            if let Some(target) = &violation.offending_reference {
                writeln!(self.writer, "- **Invalid Reference**: {}", target)?;
            }
            writeln!(self.writer, "- **Description**: {}", violation.description)?;
            if let Some(location) = &violation.location {
                writeln!(
                    self.writer,
                    "- **Location**: `{}:{}:{}`",
                    location.file.display(),
                    location.line,
                    location.column
                )?;
            }
            if let Some(suggestion) = &violation.suggestion {
                writeln!(self.writer, "- **Suggestion**: {}", suggestion)?;
            }
            if let Some(url) = &violation.doc_url {
                writeln!(self.writer, "- **Documentation**: [{0}]({0})", url)?;
            }
            writeln!(self.writer)?;
        }
        Ok(())
    }

    fn write_modules(&mut self, modules: &[ModuleSummary]) -> anyhow::Result<()> {
        writeln!(self.writer, "## Modules")?;
        writeln!(self.writer)?;

        for module in modules {
            let mut projects: Vec<_> = module.projects.iter().collect();
            projects.sort_by(|a, b| a.type_id.cmp(&b.type_id).then_with(|| a.name.cmp(&b.name)));

            writeln!(self.writer, "### {}", module.module_name)?;
            writeln!(self.writer)?;
            writeln!(self.writer, "| Project Type | Project Name | References |")?;
            writeln!(self.writer, "|--------------|--------------|------------|")?;
            for project in projects {
                writeln!(
                    self.writer,
                    "| {} | {} | {} |",
                    escape_cell(&project.type_id),
                    escape_cell(&project.name),
                    project.references.len()
                )?;
            }
            writeln!(self.writer)?;
        }
        Ok(())
    }
}

fn severity_heading(severity: Severity) -> &'static str {
    match severity {
        Severity::Error => "🔴 ERROR",
        Severity::Warning => "🟡 WARNING",
        Severity::Info => "🔵 INFO",
    }
}

/// Pipes would split a table row.
fn escape_cell(text: &str) -> String {
    text.replace('|', "\\|")
}

impl<W: Write> OutputWriter for MarkdownWriter<W> {
    fn write_check(&mut self, report: &CheckReport) -> anyhow::Result<()> {
        writeln!(self.writer, "# Modular Monolith Validation Report")?;
        writeln!(self.writer)?;
        self.write_summary(report)?;

        if !report.load_failures.is_empty() {
            writeln!(self.writer, "## Load Failures")?;
            writeln!(self.writer)?;
            for failure in &report.load_failures {
                writeln!(self.writer, "- `{}`: {}", failure.path.display(), failure.message)?;
            }
            writeln!(self.writer)?;
        }

        self.write_violations(&report.violations)?;
        self.write_modules(&report.modules)?;
        self.writer.flush()?;
        Ok(())
    }

    fn write_optimization(&mut self, report: &OptimizeReport) -> anyhow::Result<()> {
        writeln!(self.writer, "# Project Reference Optimization Report")?;
        writeln!(self.writer)?;
        writeln!(self.writer, "## Summary")?;
        writeln!(self.writer)?;
        writeln!(self.writer, "- **Total Projects**: {}", report.total_projects)?;
        writeln!(
            self.writer,
            "- **Unnecessary References**: {}",
            report.unused_count + report.transitive_count
        )?;
        writeln!(self.writer, "- **Transitive**: {}", report.transitive_count)?;
        writeln!(self.writer, "- **Unused**: {}", report.unused_count)?;
        writeln!(self.writer)?;

        if report.results.is_empty() {
            writeln!(self.writer, "_No unnecessary references found._")?;
            self.writer.flush()?;
            return Ok(());
        }

        writeln!(self.writer, "## Findings")?;
        writeln!(self.writer)?;
        writeln!(self.writer, "| Project | Reference | Reason | Path |")?;
        writeln!(self.writer, "|---------|-----------|--------|------|")?;
        for result in &report.results {
            for reference in &result.references {
                let path = match (&reference.reason, &reference.transitive_path) {
                    (ReferenceReason::Transitive, Some(path)) => escape_cell(path),
                    _ => String::new(),
                };
                writeln!(
                    self.writer,
                    "| {} | {} | {} | {} |",
                    escape_cell(&result.project_name),
                    escape_cell(&reference.reference_name),
                    reference.reason,
                    path
                )?;
            }
        }
        writeln!(self.writer)?;
        self.writer.flush()?;
        Ok(())
    }

    fn write_fix(&mut self, report: &FixReport) -> anyhow::Result<()> {
        writeln!(self.writer, "# Auto-Fix Report")?;
        writeln!(self.writer)?;
        if report.dry_run {
            writeln!(self.writer, "_Dry run: no files were modified._")?;
            writeln!(self.writer)?;
        }
        writeln!(self.writer, "- **Fixed**: {}", report.fixed)?;
        writeln!(self.writer, "- **Failed**: {}", report.failed)?;
        writeln!(self.writer)?;

        for result in &report.results {
            let mark = if result.success { "✅" } else { "❌" };
            writeln!(self.writer, "- {} {}", mark, result.message)?;
        }
        self.writer.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::output::test_support::{located_warning, modules, optimize_report, violation};
    use std::path::Path;

    fn render_check(violations: Vec<Violation>) -> String {
        let report = CheckReport::new(Path::new("/repo"), &modules(), violations, vec![]);
        let mut buffer = Vec::new();
        MarkdownWriter::new(&mut buffer).write_check(&report).unwrap();
        String::from_utf8(buffer).unwrap()
    }

    #[test]
    fn test_check_report_sections() {
        let text = render_check(vec![located_warning(), violation()]);

        assert!(text.starts_with("# Modular Monolith Validation Report\n"));
        assert!(text.contains("- **Total Modules**: 2"));
        assert!(text.contains("- **Errors**: 1"));
        assert!(text.contains("- **Status**: ❌ Invalid"));
        assert!(text.contains("- **Location**: `/repo/Orders.Admin.App/Orders.Admin.App.csproj:4:5`"));
        assert!(text.contains("- **Documentation**: [docs/rules.md#dependency-rules](docs/rules.md#dependency-rules)"));

        let error = text.find("### 🔴 ERROR: dependency-rule(core)").unwrap();
        let warning = text.find("### 🟡 WARNING: dependency-rule(app)").unwrap();
        assert!(error < warning);
    }

    #[test]
    fn test_module_tables_sorted_by_type() {
        let text = render_check(vec![]);
        assert!(text.contains("- **Status**: ✅ Valid"));
        assert!(!text.contains("## Violations"));

        let core = text.find("| core | Orders.Core | 0 |").unwrap();
        let infrastructure = text.find("| infrastructure | Orders.Infrastructure | 1 |").unwrap();
        assert!(core < infrastructure);
        assert!(text.contains("### Shared"));
    }

    #[test]
    fn test_optimization_table() {
        let mut buffer = Vec::new();
        MarkdownWriter::new(&mut buffer).write_optimization(&optimize_report()).unwrap();
        let text = String::from_utf8(buffer).unwrap();

        assert!(text.contains("- **Unnecessary References**: 2"));
        assert!(text.contains("| X | Z | transitive | X → Y → Z |"));
        assert!(text.contains("| X | W | unused |  |"));
    }
}
