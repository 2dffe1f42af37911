use crate::cli::OutputFormat;
use crate::core::{FixResult, ModuleInfo, OptimizationResult, ReferenceReason, Violation};
use crate::io::writers::{CsvWriter, JsonWriter, MarkdownWriter, SarifWriter, TerminalWriter};
use crate::pipeline::LoadFailure;
use crate::rules::ValidationSummary;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

/// Projects of one module group, as shown in the module summary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ModuleSummary {
    pub module_name: String,
    pub projects: Vec<ProjectSummary>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProjectSummary {
    pub name: String,
    #[serde(rename = "type")]
    pub type_id: String,
    pub descriptor_path: PathBuf,
    pub references: Vec<String>,
}

/// Group classified components by module name, sorted by module then project.
pub fn summarize_modules(modules: &[ModuleInfo]) -> Vec<ModuleSummary> {
    let mut groups: BTreeMap<&str, Vec<ProjectSummary>> = BTreeMap::new();
    for module in modules {
        groups
            .entry(module.module_name.as_str())
            .or_default()
            .push(ProjectSummary {
                name: module.name().to_string(),
                type_id: module.type_id.clone(),
                descriptor_path: module.project.descriptor_path.clone(),
                references: module
                    .project
                    .references
                    .iter()
                    .map(|r| r.target_name())
                    .collect(),
            });
    }

    groups
        .into_iter()
        .map(|(name, mut projects)| {
            projects.sort_by(|a, b| a.name.cmp(&b.name));
            ModuleSummary {
                module_name: name.to_string(),
                projects,
            }
        })
        .collect()
}

#[derive(Debug, Clone, Serialize)]
pub struct CheckReport {
    pub root: PathBuf,
    pub config_source: Option<PathBuf>,
    pub profile: Option<String>,
    pub summary: CheckSummary,
    pub modules: Vec<ModuleSummary>,
    pub violations: Vec<Violation>,
    pub load_failures: Vec<LoadFailure>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CheckSummary {
    pub total_modules: usize,
    pub total_projects: usize,
    pub error_count: usize,
    pub warning_count: usize,
    pub info_count: usize,
    pub is_valid: bool,
}

impl CheckReport {
    pub fn new(root: &Path, modules: &[ModuleInfo], violations: Vec<Violation>, load_failures: Vec<LoadFailure>) -> Self {
        let counts = ValidationSummary::from_violations(&violations);
        let modules = summarize_modules(modules);
        Self {
            root: root.to_path_buf(),
            config_source: None,
            profile: None,
            summary: CheckSummary {
                total_modules: modules.len(),
                total_projects: modules.iter().map(|m| m.projects.len()).sum(),
                error_count: counts.errors,
                warning_count: counts.warnings,
                info_count: counts.infos,
                is_valid: counts.is_valid(),
            },
            modules,
            violations,
            load_failures,
        }
    }

    pub fn with_config_source(mut self, source: Option<PathBuf>, profile: Option<String>) -> Self {
        self.config_source = source;
        self.profile = profile;
        self
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct OptimizeReport {
    pub root: PathBuf,
    pub total_projects: usize,
    pub unused_count: usize,
    pub transitive_count: usize,
    pub results: Vec<OptimizationResult>,
}

impl OptimizeReport {
    pub fn new(root: &Path, total_projects: usize, results: Vec<OptimizationResult>) -> Self {
        let count = |reason: ReferenceReason| {
            results
                .iter()
                .flat_map(|r| &r.references)
                .filter(|r| r.reason == reason)
                .count()
        };
        Self {
            root: root.to_path_buf(),
            total_projects,
            unused_count: count(ReferenceReason::Unused),
            transitive_count: count(ReferenceReason::Transitive),
            results,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct FixReport {
    pub dry_run: bool,
    pub fixed: usize,
    pub failed: usize,
    pub results: Vec<FixResult>,
}

impl FixReport {
    pub fn new(dry_run: bool, results: Vec<FixResult>) -> Self {
        let fixed = results.iter().filter(|r| r.success).count();
        Self {
            dry_run,
            fixed,
            failed: results.len() - fixed,
            results,
        }
    }
}

pub trait OutputWriter {
    fn write_check(&mut self, report: &CheckReport) -> anyhow::Result<()>;
    fn write_optimization(&mut self, report: &OptimizeReport) -> anyhow::Result<()>;
    fn write_fix(&mut self, report: &FixReport) -> anyhow::Result<()>;
}

/// Build a writer for `format`, targeting `output` or stdout.
pub fn create_writer(
    format: OutputFormat,
    output: Option<&Path>,
    quiet: bool,
) -> anyhow::Result<Box<dyn OutputWriter>> {
    let sink: Box<dyn Write> = match output {
        Some(path) => {
            colored::control::set_override(false);
            Box::new(BufWriter::new(File::create(path)?))
        }
        None => Box::new(io::stdout()),
    };

    Ok(match format {
        OutputFormat::Json => Box::new(JsonWriter::new(sink)),
        OutputFormat::Terminal => Box::new(TerminalWriter::new(sink).with_quiet(quiet)),
        OutputFormat::Markdown => Box::new(MarkdownWriter::new(sink)),
        OutputFormat::Sarif => Box::new(SarifWriter::new(sink)),
        OutputFormat::Csv => Box::new(CsvWriter::new(sink)),
    })
}
