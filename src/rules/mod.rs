//! Dependency rule evaluation.
//!
//! The rule set is a table built from the configuration: one fallback row for
//! unclassified components followed by one row per configured type id in
//! ascending order. Every component is checked against each row that applies
//! to it, then severity overrides are applied and the result is sorted by
//! project name and severity.
//!
//! For a reference to a known component the deny list is consulted first, then
//! the allow list. An empty allow list rejects every reference.

pub mod suggestions;

use std::collections::HashMap;

use parking_lot::Mutex;
use serde::Serialize;
use tracing::{debug, trace};

use crate::config::GuardConfig;
use crate::core::{ModuleInfo, ProjectReference, Severity, Violation, UNKNOWN_TYPE};
use crate::patterns::{expand_module, GlobMatcher, MODULE_TOKEN};

pub use suggestions::{anti_pattern_note, dependency_suggestion, unknown_type_suggestion};

/// Rule id of the fallback rule for unclassified components.
pub const UNKNOWN_TYPE_RULE_ID: &str = "unknown-project-type";

pub const DEPENDENCY_RULES_DOC_URL: &str = "docs/rules.md#dependency-rules";
pub const UNKNOWN_TYPE_DOC_URL: &str = "docs/rules.md#unknown-project-type";

/// Rule id for the configured rule of a type.
pub fn dependency_rule_id(type_id: &str) -> String {
    format!("dependency-rule({})", type_id)
}

/// An allow or deny entry. Plain globs compile up front; `{module}` entries
/// compile once per module name on first use.
#[derive(Debug)]
struct RulePattern {
    source: String,
    compiled: Option<GlobMatcher>,
    expanded: Mutex<HashMap<String, GlobMatcher>>,
}

impl RulePattern {
    fn new(source: &str) -> Self {
        let compiled = (!source.contains(MODULE_TOKEN)).then(|| GlobMatcher::new(source));
        Self {
            source: source.to_string(),
            compiled,
            expanded: Mutex::new(HashMap::new()),
        }
    }

    fn matches(&self, target_name: &str, module_name: &str) -> bool {
        if let Some(matcher) = &self.compiled {
            return matcher.is_match(target_name);
        }
        self.expanded
            .lock()
            .entry(module_name.to_string())
            .or_insert_with(|| GlobMatcher::new(&expand_module(&self.source, module_name)))
            .is_match(target_name)
    }
}

#[derive(Debug)]
enum RuleKind {
    UnknownType,
    Dependency {
        type_id: String,
        allowed: Vec<RulePattern>,
        denied: Vec<RulePattern>,
        allowed_sources: Vec<String>,
    },
}

#[derive(Debug)]
struct RuleRow {
    id: String,
    kind: RuleKind,
}

impl RuleRow {
    fn applies_to(&self, module: &ModuleInfo) -> bool {
        match &self.kind {
            RuleKind::UnknownType => module.type_id == UNKNOWN_TYPE,
            RuleKind::Dependency { type_id, .. } => module.type_id.eq_ignore_ascii_case(type_id),
        }
    }
}

/// Counts of violations by severity.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ValidationSummary {
    pub errors: usize,
    pub warnings: usize,
    pub infos: usize,
}

impl ValidationSummary {
    pub fn from_violations(violations: &[Violation]) -> Self {
        violations
            .iter()
            .fold(Self::default(), |mut summary, violation| {
                match violation.severity {
                    Severity::Error => summary.errors += 1,
                    Severity::Warning => summary.warnings += 1,
                    Severity::Info => summary.infos += 1,
                }
                summary
            })
    }

    pub fn total(&self) -> usize {
        self.errors + self.warnings + self.infos
    }

    pub fn has_errors(&self) -> bool {
        self.errors > 0
    }

    pub fn has_warnings(&self) -> bool {
        self.warnings > 0
    }

    pub fn is_valid(&self) -> bool {
        !self.has_errors()
    }
}

pub struct RuleEngine {
    rows: Vec<RuleRow>,
    ignored: Vec<GlobMatcher>,
    /// Lowercased rule id to severity; the last valid override for a rule wins
    overrides: HashMap<String, Severity>,
}

impl RuleEngine {
    pub fn new(config: &GuardConfig) -> Self {
        let mut rows = vec![RuleRow {
            id: UNKNOWN_TYPE_RULE_ID.to_string(),
            kind: RuleKind::UnknownType,
        }];

        // BTreeMap iteration keeps type ids in ascending order.
        rows.extend(config.dependency_rules.iter().map(|(type_id, rule)| RuleRow {
            id: dependency_rule_id(type_id),
            kind: RuleKind::Dependency {
                type_id: type_id.clone(),
                allowed: rule.allowed.iter().map(|p| RulePattern::new(p)).collect(),
                denied: rule.denied.iter().map(|p| RulePattern::new(p)).collect(),
                allowed_sources: rule.allowed.clone(),
            },
        }));

        let overrides = config
            .severity_overrides
            .iter()
            .filter_map(|o| Severity::parse(&o.severity).map(|s| (o.rule.to_ascii_lowercase(), s)))
            .collect();

        debug!("Initialized rule engine with {} rules", rows.len());

        Self {
            rows,
            ignored: config.ignored_projects.iter().map(|g| GlobMatcher::new(g)).collect(),
            overrides,
        }
    }

    /// Rule ids in evaluation order.
    pub fn rule_ids(&self) -> Vec<&str> {
        self.rows.iter().map(|row| row.id.as_str()).collect()
    }

    pub fn is_ignored(&self, project_name: &str) -> bool {
        self.ignored.iter().any(|m| m.is_match(project_name))
    }

    /// Validate every component and return the sorted, severity-adjusted violations.
    pub fn validate_all(&self, modules: &[ModuleInfo]) -> Vec<Violation> {
        let index = ModuleIndex::new(modules);
        let mut violations = Vec::new();

        for module in modules {
            if self.is_ignored(module.name()) {
                trace!("Skipping ignored project {}", module.name());
                continue;
            }
            for row in self.rows.iter().filter(|row| row.applies_to(module)) {
                let before = violations.len();
                self.evaluate(row, module, &index, &mut violations);
                if violations.len() > before {
                    debug!(
                        "Rule '{}' found {} violation(s) in {}",
                        row.id,
                        violations.len() - before,
                        module.name()
                    );
                }
            }
        }

        for violation in &mut violations {
            self.apply_override(violation);
        }

        violations.sort_by(|a, b| {
            a.project_name
                .cmp(&b.project_name)
                .then(a.severity.cmp(&b.severity))
        });
        violations
    }

    fn evaluate(
        &self,
        row: &RuleRow,
        module: &ModuleInfo,
        index: &ModuleIndex<'_>,
        out: &mut Vec<Violation>,
    ) {
        match &row.kind {
            RuleKind::UnknownType => out.push(unknown_type_violation(module)),
            RuleKind::Dependency {
                type_id,
                allowed,
                denied,
                allowed_sources,
            } => {
                for reference in &module.project.references {
                    let Some(target) = index.resolve(reference) else {
                        continue;
                    };

                    let verdict = if denied.iter().any(|p| p.matches(target.name(), &module.module_name)) {
                        Some("This reference is explicitly denied by configuration.")
                    } else if !allowed.iter().any(|p| p.matches(target.name(), &module.module_name)) {
                        Some("This reference is not in the allowed list.")
                    } else {
                        None
                    };

                    if let Some(reason) = verdict {
                        out.push(Violation {
                            project_name: module.name().to_string(),
                            offending_reference: Some(target.name().to_string()),
                            rule_id: row.id.clone(),
                            description: format!(
                                "Project of type '{}' cannot reference '{}'. {}",
                                type_id,
                                target.name(),
                                reason
                            ),
                            severity: Severity::Error,
                            suggestion: Some(dependency_suggestion(
                                type_id,
                                allowed_sources,
                                module,
                                target,
                            )),
                            doc_url: Some(DEPENDENCY_RULES_DOC_URL.to_string()),
                            auto_fixable: true,
                            location: reference.location.clone(),
                        });
                    }
                }
            }
        }
    }

    fn apply_override(&self, violation: &mut Violation) {
        if let Some(severity) = self.overrides.get(&violation.rule_id.to_ascii_lowercase()) {
            violation.severity = *severity;
        }
    }
}

fn unknown_type_violation(module: &ModuleInfo) -> Violation {
    Violation {
        project_name: module.name().to_string(),
        offending_reference: None,
        rule_id: UNKNOWN_TYPE_RULE_ID.to_string(),
        description: format!(
            "Project '{}' does not match any module or shared pattern. Update configuration to add a matching pattern, or add this project to 'ignored_projects' if it should be excluded from validation.",
            module.name()
        ),
        severity: Severity::Error,
        suggestion: Some(unknown_type_suggestion(module.name())),
        doc_url: Some(UNKNOWN_TYPE_DOC_URL.to_string()),
        auto_fixable: false,
        location: None,
    }
}

/// Case-insensitive lookup of components by name; the first component with a name wins.
struct ModuleIndex<'a> {
    by_name: HashMap<String, &'a ModuleInfo>,
}

impl<'a> ModuleIndex<'a> {
    fn new(modules: &'a [ModuleInfo]) -> Self {
        let mut by_name = HashMap::with_capacity(modules.len());
        for module in modules {
            by_name
                .entry(module.name().to_ascii_lowercase())
                .or_insert(module);
        }
        Self { by_name }
    }

    fn resolve(&self, reference: &ProjectReference) -> Option<&'a ModuleInfo> {
        self.by_name
            .get(&reference.target_name().to_ascii_lowercase())
            .copied()
    }
}

/// Validate components against a configuration in one call.
pub fn validate_all(config: &GuardConfig, modules: &[ModuleInfo]) -> Vec<Violation> {
    RuleEngine::new(config).validate_all(modules)
}
