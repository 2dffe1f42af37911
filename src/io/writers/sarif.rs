//! SARIF 2.1.0 logs for code-scanning consumers.
//!
//! Check reports map each violation to a result under its rule id. Optimize
//! reports use one rule per [`ReferenceReason`] at `note` level. Fix reports
//! list each attempt, with failures at `error` level.

use crate::core::{ReferenceReason, Severity, Violation};
use crate::io::output::{CheckReport, FixReport, OptimizeReport, OutputWriter};
use serde::Serialize;
use std::collections::BTreeMap;
use std::io::Write;

const SARIF_VERSION: &str = "2.1.0";
const SARIF_SCHEMA: &str =
    "https://raw.githubusercontent.com/oasis-tcs/sarif-spec/master/Schemata/sarif-schema-2.1.0.json";
const TOOL_NAME: &str = "modguard";

#[derive(Debug, Serialize)]
struct SarifLog {
    #[serde(rename = "$schema")]
    schema: &'static str,
    version: &'static str,
    runs: Vec<SarifRun>,
}

#[derive(Debug, Serialize)]
struct SarifRun {
    tool: SarifTool,
    results: Vec<SarifResult>,
}

#[derive(Debug, Serialize)]
struct SarifTool {
    driver: SarifDriver,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SarifDriver {
    name: &'static str,
    version: &'static str,
    rules: Vec<SarifRule>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SarifRule {
    id: String,
    name: String,
    short_description: SarifMessage,
    #[serde(skip_serializing_if = "Option::is_none")]
    help_uri: Option<String>,
    default_configuration: SarifRuleConfiguration,
}

#[derive(Debug, Serialize)]
struct SarifRuleConfiguration {
    level: &'static str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SarifResult {
    rule_id: String,
    level: &'static str,
    message: SarifMessage,
    locations: Vec<SarifLocation>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    properties: BTreeMap<&'static str, String>,
}

#[derive(Debug, Serialize)]
struct SarifMessage {
    text: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SarifLocation {
    physical_location: SarifPhysicalLocation,
    logical_locations: Vec<SarifLogicalLocation>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SarifPhysicalLocation {
    artifact_location: SarifArtifactLocation,
    #[serde(skip_serializing_if = "Option::is_none")]
    region: Option<SarifRegion>,
}

#[derive(Debug, Serialize)]
struct SarifArtifactLocation {
    uri: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SarifRegion {
    start_line: usize,
    start_column: usize,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SarifLogicalLocation {
    name: String,
    fully_qualified_name: String,
    kind: &'static str,
}

fn level(severity: Severity) -> &'static str {
    match severity {
        Severity::Error => "error",
        Severity::Warning => "warning",
        Severity::Info => "note",
    }
}

/// SARIF URIs use forward slashes on every platform.
fn artifact_uri(path: &std::path::Path) -> String {
    path.to_string_lossy().replace('\\', "/")
}

fn location(uri: String, region: Option<SarifRegion>, project: &str) -> SarifLocation {
    SarifLocation {
        physical_location: SarifPhysicalLocation {
            artifact_location: SarifArtifactLocation { uri },
            region,
        },
        logical_locations: vec![SarifLogicalLocation {
            name: project.to_string(),
            fully_qualified_name: project.to_string(),
            kind: "project",
        }],
    }
}

fn log(rules: Vec<SarifRule>, results: Vec<SarifResult>) -> SarifLog {
    SarifLog {
        schema: SARIF_SCHEMA,
        version: SARIF_VERSION,
        runs: vec![SarifRun {
            tool: SarifTool {
                driver: SarifDriver {
                    name: TOOL_NAME,
                    version: env!("CARGO_PKG_VERSION"),
                    rules,
                },
            },
            results,
        }],
    }
}

fn rule(id: &str, description: &str, help_uri: Option<String>, level: &'static str) -> SarifRule {
    SarifRule {
        id: id.to_string(),
        name: id.to_string(),
        short_description: SarifMessage {
            text: description.to_string(),
        },
        help_uri,
        default_configuration: SarifRuleConfiguration { level },
    }
}

/// One rule per distinct rule id, described by its first violation.
fn violation_rules(violations: &[Violation]) -> Vec<SarifRule> {
    let mut seen = std::collections::HashSet::new();
    violations
        .iter()
        .filter(|v| seen.insert(v.rule_id.as_str()))
        .map(|v| rule(&v.rule_id, &v.description, v.doc_url.clone(), level(v.severity)))
        .collect()
}

fn violation_result(violation: &Violation) -> SarifResult {
    let (uri, region) = match &violation.location {
        Some(loc) => (
            artifact_uri(&loc.file),
            Some(SarifRegion {
                start_line: loc.line,
                start_column: loc.column,
            }),
        ),
        None => (format!("{}.csproj", violation.project_name), None),
    };

    let mut properties = BTreeMap::new();
    if let Some(target) = &violation.offending_reference {
        properties.insert("invalidReference", target.clone());
    }
    if let Some(suggestion) = &violation.suggestion {
        properties.insert("suggestion", suggestion.clone());
    }

    SarifResult {
        rule_id: violation.rule_id.clone(),
        level: level(violation.severity),
        message: SarifMessage {
            text: violation.description.clone(),
        },
        locations: vec![location(uri, region, &violation.project_name)],
        properties,
    }
}

fn reason_rule_id(reason: ReferenceReason) -> &'static str {
    match reason {
        ReferenceReason::Unused => "unused-reference",
        ReferenceReason::Transitive => "transitive-reference",
    }
}

pub struct SarifWriter<W: Write> {
    writer: W,
}

impl<W: Write> SarifWriter<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    fn write_log(&mut self, log: &SarifLog) -> anyhow::Result<()> {
        serde_json::to_writer_pretty(&mut self.writer, log)?;
        writeln!(self.writer)?;
        self.writer.flush()?;
        Ok(())
    }
}

impl<W: Write> OutputWriter for SarifWriter<W> {
    fn write_check(&mut self, report: &CheckReport) -> anyhow::Result<()> {
        let rules = violation_rules(&report.violations);
        let results = report.violations.iter().map(violation_result).collect();
        self.write_log(&log(rules, results))
    }

    fn write_optimization(&mut self, report: &OptimizeReport) -> anyhow::Result<()> {
        let rules = vec![
            rule(
                reason_rule_id(ReferenceReason::Unused),
                "Referenced project is never used by the referencing project's sources",
                None,
                "note",
            ),
            rule(
                reason_rule_id(ReferenceReason::Transitive),
                "Referenced project is already reachable through another reference",
                None,
                "note",
            ),
        ];

        let results = report
            .results
            .iter()
            .flat_map(|result| {
                result.references.iter().map(move |reference| {
                    let text = match &reference.transitive_path {
                        Some(path) => format!(
                            "Reference to '{}' is transitive ({})",
                            reference.reference_name, path
                        ),
                        None => format!("Reference to '{}' is unused", reference.reference_name),
                    };
                    let mut properties = BTreeMap::new();
                    properties.insert("reference", reference.reference_name.clone());
                    if let Some(path) = &reference.transitive_path {
                        properties.insert("transitivePath", path.clone());
                    }
                    SarifResult {
                        rule_id: reason_rule_id(reference.reason).to_string(),
                        level: "note",
                        message: SarifMessage { text },
                        locations: vec![location(
                            artifact_uri(&result.descriptor_path),
                            None,
                            &result.project_name,
                        )],
                        properties,
                    }
                })
            })
            .collect();

        self.write_log(&log(rules, results))
    }

    fn write_fix(&mut self, report: &FixReport) -> anyhow::Result<()> {
        let rules = vec![rule("auto-fix", "Automatic removal of a forbidden reference", None, "note")];
        let results = report
            .results
            .iter()
            .map(|result| {
                let uri = result
                    .descriptor_path
                    .as_deref()
                    .map(artifact_uri)
                    .unwrap_or_default();
                let project = result
                    .descriptor_path
                    .as_deref()
                    .and_then(|p| p.file_stem())
                    .map(|s| s.to_string_lossy().into_owned())
                    .unwrap_or_default();
                let mut properties = BTreeMap::new();
                if let Some(reference) = &result.reference {
                    properties.insert("reference", reference.clone());
                }
                SarifResult {
                    rule_id: "auto-fix".to_string(),
                    level: if result.success { "note" } else { "error" },
                    message: SarifMessage {
                        text: result.message.clone(),
                    },
                    locations: vec![location(uri, None, &project)],
                    properties,
                }
            })
            .collect();
        self.write_log(&log(rules, results))
    }
}
