//! Static validation of a merged configuration.
//!
//! Every check runs independently so a single pass reports all problems.
//! Errors make the configuration unusable; warnings are advisory.
//!
//! # Example
//!
//! ```rust
//! use modguard::config::{create_default_configuration, validate_config};
//!
//! let report = validate_config(&create_default_configuration());
//! assert!(report.is_valid());
//! ```

use std::collections::HashSet;

use serde::Serialize;

use super::core::{DependencyRule, GuardConfig, ProjectPattern, SeverityOverride};
use crate::core::Severity;
use crate::patterns::has_wildcard;

/// Errors and warnings found in a configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ConfigReport {
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
}

impl ConfigReport {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    fn error(&mut self, message: String) {
        self.errors.push(message);
    }

    fn warning(&mut self, message: String) {
        self.warnings.push(message);
    }
}

#[derive(Clone, Copy)]
enum Section {
    Modules,
    Shared,
}

impl Section {
    fn label(self) -> &'static str {
        match self {
            Section::Modules => "modules",
            Section::Shared => "shared",
        }
    }
}

/// Validate a configuration, collecting every error and warning.
pub fn validate_config(config: &GuardConfig) -> ConfigReport {
    let mut report = ConfigReport::default();

    validate_pattern_set(&mut report, Section::Modules, &config.modules.patterns);
    validate_module_extraction(&mut report, &config.modules.patterns);
    validate_pattern_set(&mut report, Section::Shared, &config.shared.patterns);
    validate_working_directory(&mut report, config.shared.working_directory.as_deref());
    validate_dependency_rules(&mut report, config);
    validate_missing_rules(&mut report, config);
    validate_severity_overrides(&mut report, &config.severity_overrides);
    validate_ignored_projects(&mut report, &config.ignored_projects);

    report
}

fn validate_pattern_set(report: &mut ConfigReport, section: Section, patterns: &[ProjectPattern]) {
    let label = section.label();
    if patterns.is_empty() {
        let kind = match section {
            Section::Modules => "module",
            Section::Shared => "shared",
        };
        report.warning(format!(
            "{} configuration has no patterns defined. No {} projects will be detected.",
            capitalize(label),
            kind
        ));
        return;
    }

    let mut seen_globs = HashSet::new();
    let mut seen_types = HashSet::new();

    for pattern in patterns {
        if pattern.name.trim().is_empty() {
            report.error(format!("Project pattern in {} has empty name.", label));
        }

        if pattern.pattern.trim().is_empty() {
            report.error(format!(
                "Project pattern '{}' in {} has empty pattern.",
                pattern.name, label
            ));
        } else if !seen_globs.insert(pattern.pattern.as_str()) {
            report.error(format!(
                "Duplicate pattern '{}' found in {}. Each pattern must be unique.",
                pattern.pattern, label
            ));
        }

        if pattern.type_id.trim().is_empty() {
            report.error(format!(
                "Project pattern '{}' in {} has empty type identifier.",
                pattern.name, label
            ));
        } else if !seen_types.insert(pattern.type_id.as_str()) {
            report.error(format!(
                "Duplicate type '{}' found in {}. Each type must be unique.",
                pattern.type_id, label
            ));
        }
    }
}

fn validate_module_extraction(report: &mut ConfigReport, patterns: &[ProjectPattern]) {
    for pattern in patterns {
        let missing = pattern
            .module_extraction
            .as_deref()
            .map_or(true, |regex| regex.trim().is_empty());
        if missing {
            report.error(format!(
                "Module pattern '{}' (type: {}) must have a module_extraction regex to extract module name.",
                pattern.name, pattern.type_id
            ));
        }
    }
}

fn validate_working_directory(report: &mut ConfigReport, working_directory: Option<&str>) {
    if let Some(dir) = working_directory {
        if has_wildcard(dir) {
            report.error(format!(
                "Shared working_directory cannot contain wildcards: '{}'",
                dir
            ));
        }
    }
}

fn validate_dependency_rules(report: &mut ConfigReport, config: &GuardConfig) {
    if config.dependency_rules.is_empty() {
        report.warning(
            "No dependency rules defined. All project dependencies will be allowed.".to_string(),
        );
        return;
    }

    let declared: HashSet<&str> = config
        .module_type_ids()
        .chain(config.shared_type_ids())
        .collect();

    for (type_id, rule) in &config.dependency_rules {
        if !declared.contains(type_id.as_str()) {
            report.warning(format!(
                "Dependency rule defined for type '{}' but no project pattern with this type exists.",
                type_id
            ));
        }

        if rule.allowed.is_empty() && rule.denied.is_empty() {
            report.warning(format!(
                "Dependency rule for type '{}' has no allowed or denied patterns. This rule has no effect.",
                type_id
            ));
        }

        validate_rule_patterns(report, type_id, rule);
    }
}

fn validate_rule_patterns(report: &mut ConfigReport, type_id: &str, rule: &DependencyRule) {
    let lists = [("allowed", &rule.allowed), ("denied", &rule.denied)];
    for (category, patterns) in lists {
        if patterns.iter().any(|p| p.trim().is_empty()) {
            report.error(format!(
                "Dependency rule for type '{}' contains empty {} pattern.",
                type_id, category
            ));
        }
    }
}

fn validate_missing_rules(report: &mut ConfigReport, config: &GuardConfig) {
    let sections = [
        (
            config.modules.missing_rules_warnings,
            config.module_type_ids().collect::<Vec<_>>(),
        ),
        (
            config.shared.missing_rules_warnings,
            config.shared_type_ids().collect::<Vec<_>>(),
        ),
    ];

    let mut reported = HashSet::new();
    for (enabled, type_ids) in sections {
        if !enabled {
            continue;
        }
        for type_id in type_ids {
            if type_id.trim().is_empty() || config.dependency_rules.contains_key(type_id) {
                continue;
            }
            if reported.insert(type_id) {
                report.warning(format!(
                    "Project type '{}' has no dependency rules defined. All dependencies will be allowed for this type.",
                    type_id
                ));
            }
        }
    }
}

fn validate_severity_overrides(report: &mut ConfigReport, overrides: &[SeverityOverride]) {
    let mut seen_rules = HashSet::new();

    for entry in overrides {
        if entry.rule.trim().is_empty() {
            report.error("Severity override has empty rule name.".to_string());
            continue;
        }

        if !seen_rules.insert(entry.rule.as_str()) {
            report.warning(format!(
                "Duplicate severity override for rule '{}'. Only the last override will apply.",
                entry.rule
            ));
        }

        if entry.severity.trim().is_empty() {
            report.error(format!(
                "Severity override for rule '{}' has empty severity.",
                entry.rule
            ));
        } else if Severity::parse(&entry.severity).is_none() {
            report.error(format!(
                "Severity override for rule '{}' has invalid severity '{}'. Valid values are: Error, Warning, Info.",
                entry.rule, entry.severity
            ));
        }
    }
}

fn validate_ignored_projects(report: &mut ConfigReport, ignored: &[String]) {
    if ignored.iter().any(|pattern| pattern.trim().is_empty()) {
        report.error("Ignored projects list contains empty pattern.".to_string());
    }
}

fn capitalize(value: &str) -> String {
    let mut chars = value.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
