use crate::core::{ReferenceReason, Severity, Violation};
use crate::io::output::{CheckReport, FixReport, ModuleSummary, OptimizeReport, OutputWriter};
use colored::*;
use comfy_table::presets::UTF8_FULL;
use comfy_table::{ContentArrangement, Table};
use std::io::Write;

pub struct TerminalWriter<W: Write> {
    writer: W,
    quiet: bool,
}

impl<W: Write> TerminalWriter<W> {
    pub fn new(writer: W) -> Self {
        Self { writer, quiet: false }
    }

    /// Quiet output keeps the findings and drops headers and the module table.
    pub fn with_quiet(mut self, quiet: bool) -> Self {
        self.quiet = quiet;
        self
    }

    fn write_header(&mut self, report: &CheckReport) -> anyhow::Result<()> {
        let source = match &report.config_source {
            Some(path) => format!("Configuration: {}", path.display()),
            None => "Using default configuration".to_string(),
        };
        let source = match &report.profile {
            Some(profile) => format!("{} (profile: {})", source, profile),
            None => source,
        };
        writeln!(self.writer, "{}", source.dimmed())?;
        writeln!(
            self.writer,
            "{} {}",
            "Scanning for projects in:".blue(),
            report.root.display()
        )?;
        writeln!(self.writer)?;
        Ok(())
    }

    fn write_module_table(&mut self, modules: &[ModuleSummary]) -> anyhow::Result<()> {
        if modules.is_empty() {
            return Ok(());
        }
        let mut table = Table::new();
        table
            .load_preset(UTF8_FULL)
            .set_content_arrangement(ContentArrangement::Dynamic)
            .set_header(vec!["Module", "Project Type", "Project Name", "References"]);

        for module in modules {
            for project in &module.projects {
                table.add_row(vec![
                    module.module_name.clone(),
                    project.type_id.clone(),
                    project.name.clone(),
                    project.references.len().to_string(),
                ]);
            }
        }
        writeln!(self.writer, "{}", table)?;
        writeln!(self.writer)?;
        Ok(())
    }

    fn write_violation(&mut self, violation: &Violation) -> anyhow::Result<()> {
        let label = severity_label(violation.severity);
        match &violation.offending_reference {
            Some(target) => writeln!(
                self.writer,
                "{} {} → {} [{}]",
                label,
                violation.project_name.bold(),
                target,
                violation.rule_id.dimmed()
            )?,
            None => writeln!(
                self.writer,
                "{} {} [{}]",
                label,
                violation.project_name.bold(),
                violation.rule_id.dimmed()
            )?,
        }
        writeln!(self.writer, "    {}", violation.description)?;
        if let Some(location) = &violation.location {
            writeln!(
                self.writer,
                "    {} {}:{}:{}",
                "at".dimmed(),
                location.file.display(),
                location.line,
                location.column
            )?;
        }
        if let Some(suggestion) = &violation.suggestion {
            for part in suggestion.split(" | ") {
                writeln!(self.writer, "    {} {}", "→".cyan(), part)?;
            }
        }
        if let Some(url) = &violation.doc_url {
            writeln!(self.writer, "    {} {}", "docs:".dimmed(), url)?;
        }
        writeln!(self.writer)?;
        Ok(())
    }
}

fn severity_label(severity: Severity) -> ColoredString {
    match severity {
        Severity::Error => "✗ Error".red().bold(),
        Severity::Warning => "⚠ Warning".yellow().bold(),
        Severity::Info => "ℹ Info".blue().bold(),
    }
}

impl<W: Write> OutputWriter for TerminalWriter<W> {
    fn write_check(&mut self, report: &CheckReport) -> anyhow::Result<()> {
        if !self.quiet {
            self.write_header(report)?;
            self.write_module_table(&report.modules)?;
        }

        for failure in &report.load_failures {
            writeln!(
                self.writer,
                "{} {}: {}",
                "Failed to load".red(),
                failure.path.display(),
                failure.message
            )?;
        }

        for violation in &report.violations {
            self.write_violation(violation)?;
        }

        let summary = &report.summary;
        if report.violations.is_empty() {
            if !self.quiet {
                writeln!(self.writer, "{}", "✓ No violations found!".green().bold())?;
            }
        } else {
            writeln!(
                self.writer,
                "{} module(s), {} project(s): {}, {}, {}",
                summary.total_modules,
                summary.total_projects,
                format!("{} error(s)", summary.error_count).red(),
                format!("{} warning(s)", summary.warning_count).yellow(),
                format!("{} info", summary.info_count).blue()
            )?;
        }
        self.writer.flush()?;
        Ok(())
    }

    fn write_optimization(&mut self, report: &OptimizeReport) -> anyhow::Result<()> {
        if !self.quiet {
            writeln!(
                self.writer,
                "{} {} ({} project(s))",
                "Analyzing project references in:".blue(),
                report.root.display(),
                report.total_projects
            )?;
            writeln!(self.writer)?;
        }

        if report.results.is_empty() {
            if !self.quiet {
                writeln!(self.writer, "{}", "✓ No unnecessary references found!".green().bold())?;
            }
            self.writer.flush()?;
            return Ok(());
        }

        for result in &report.results {
            writeln!(
                self.writer,
                "{} {}",
                result.project_name.bold(),
                result.descriptor_path.display().to_string().dimmed()
            )?;
            for reference in &result.references {
                match (&reference.reason, &reference.transitive_path) {
                    (ReferenceReason::Transitive, Some(path)) => writeln!(
                        self.writer,
                        "    {} {} (already reachable via {})",
                        "transitive".yellow(),
                        reference.reference_name,
                        path
                    )?,
                    (reason, _) => writeln!(
                        self.writer,
                        "    {} {}",
                        reason.to_string().yellow(),
                        reference.reference_name
                    )?,
                }
            }
        }
        writeln!(self.writer)?;
        writeln!(
            self.writer,
            "{} unnecessary reference(s): {} transitive, {} unused",
            report.unused_count + report.transitive_count,
            report.transitive_count,
            report.unused_count
        )?;
        self.writer.flush()?;
        Ok(())
    }

    fn write_fix(&mut self, report: &FixReport) -> anyhow::Result<()> {
        if report.dry_run && !self.quiet {
            writeln!(self.writer, "{}", "Dry run: no files will be modified".yellow())?;
            writeln!(self.writer)?;
        }

        for result in &report.results {
            if result.success {
                writeln!(self.writer, "{} {}", "✓".green(), result.message)?;
            } else {
                writeln!(self.writer, "{} {}", "✗".red(), result.message)?;
            }
        }

        if report.results.is_empty() {
            writeln!(self.writer, "{}", "Nothing to fix.".green())?;
        } else {
            writeln!(self.writer)?;
            writeln!(
                self.writer,
                "{} fixed, {} failed",
                report.fixed.to_string().green(),
                report.failed.to_string().red()
            )?;
        }
        self.writer.flush()?;
        Ok(())
    }
}
