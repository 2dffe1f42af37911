use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::patterns::matches_any;

/// Root configuration structure for modguard
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct GuardConfig {
    /// Parent document to inherit from: a path relative to this file, an
    /// absolute path, or the keyword `default`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extends: Option<String>,

    /// Patterns recognising per-module components (e.g. `Orders.Core`)
    #[serde(default)]
    pub modules: ModuleConfig,

    /// Patterns recognising cross-module shared components (e.g. `Shared.Core`)
    #[serde(default)]
    pub shared: SharedConfig,

    /// Allowed/denied reference patterns keyed by type id
    #[serde(default, alias = "dependencyRules")]
    pub dependency_rules: BTreeMap<String, DependencyRule>,

    /// Component name globs excluded from validation
    #[serde(default, alias = "ignoredProjects")]
    pub ignored_projects: Vec<String>,

    /// Severity overrides keyed by rule id
    #[serde(default, alias = "severityOverrides")]
    pub severity_overrides: Vec<SeverityOverride>,

    /// Named partial overlays selected with `--profile`
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub profiles: BTreeMap<String, ConfigProfile>,
}

impl GuardConfig {
    /// Whether a component is excluded by an ignore glob.
    pub fn is_ignored(&self, project_name: &str) -> bool {
        matches_any(project_name, &self.ignored_projects)
    }

    pub fn profile_names(&self) -> Vec<String> {
        self.profiles.keys().cloned().collect()
    }

    pub fn module_type_ids(&self) -> impl Iterator<Item = &str> {
        self.modules.patterns.iter().map(|p| p.type_id.as_str())
    }

    pub fn shared_type_ids(&self) -> impl Iterator<Item = &str> {
        self.shared.patterns.iter().map(|p| p.type_id.as_str())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ModuleConfig {
    #[serde(default)]
    pub patterns: Vec<ProjectPattern>,

    /// Warn about module type ids without a dependency rule (default: true)
    #[serde(default = "default_missing_rules_warnings", alias = "missingRulesWarnings")]
    pub missing_rules_warnings: bool,
}

impl Default for ModuleConfig {
    fn default() -> Self {
        Self {
            patterns: Vec::new(),
            missing_rules_warnings: default_missing_rules_warnings(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SharedConfig {
    /// Directory (relative to the scanned root) that scopes shared components.
    /// When set, components inside it only match shared patterns and components
    /// outside it only match module patterns.
    #[serde(default, alias = "workingDirectory", skip_serializing_if = "Option::is_none")]
    pub working_directory: Option<String>,

    #[serde(default)]
    pub patterns: Vec<ProjectPattern>,

    /// Warn about shared type ids without a dependency rule (default: true)
    #[serde(default = "default_missing_rules_warnings", alias = "missingRulesWarnings")]
    pub missing_rules_warnings: bool,
}

impl Default for SharedConfig {
    fn default() -> Self {
        Self {
            working_directory: None,
            patterns: Vec::new(),
            missing_rules_warnings: default_missing_rules_warnings(),
        }
    }
}

fn default_missing_rules_warnings() -> bool {
    true
}

/// A name glob identifying one component type.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ProjectPattern {
    /// Display name for this component type
    #[serde(default)]
    pub name: String,

    /// Glob matched against component names
    #[serde(default)]
    pub pattern: String,

    /// Unique type identifier
    #[serde(default, rename = "type")]
    pub type_id: String,

    /// Regex whose first capture group yields the module name
    #[serde(default, alias = "moduleExtraction", skip_serializing_if = "Option::is_none")]
    pub module_extraction: Option<String>,
}

impl ProjectPattern {
    pub fn new(name: &str, pattern: &str, type_id: &str) -> Self {
        Self {
            name: name.to_string(),
            pattern: pattern.to_string(),
            type_id: type_id.to_string(),
            module_extraction: None,
        }
    }

    pub fn with_extraction(mut self, regex: &str) -> Self {
        self.module_extraction = Some(regex.to_string());
        self
    }
}

/// How a child rule combines with an inherited rule for the same type id.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum InheritMode {
    /// Discard the inherited rule
    #[default]
    #[serde(alias = "Replace")]
    Replace,
    /// Union allowed/denied lists, de-duplicated
    #[serde(alias = "Merge")]
    Merge,
    /// Keep the inherited rule and append entries it lacks
    #[serde(alias = "Extend")]
    Extend,
}

impl InheritMode {
    fn is_replace(&self) -> bool {
        *self == InheritMode::Replace
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct DependencyRule {
    #[serde(default, skip_serializing_if = "InheritMode::is_replace")]
    pub inherit: InheritMode,

    #[serde(default)]
    pub allowed: Vec<String>,

    #[serde(default)]
    pub denied: Vec<String>,
}

impl DependencyRule {
    pub fn new(allowed: &[&str], denied: &[&str]) -> Self {
        Self {
            inherit: InheritMode::Replace,
            allowed: allowed.iter().map(|s| s.to_string()).collect(),
            denied: denied.iter().map(|s| s.to_string()).collect(),
        }
    }

    pub fn with_inherit(mut self, inherit: InheritMode) -> Self {
        self.inherit = inherit;
        self
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct SeverityOverride {
    /// Rule id, e.g. `dependency-rule(core)`
    #[serde(default)]
    pub rule: String,

    /// `Error`, `Warning` or `Info`
    #[serde(default)]
    pub severity: String,
}

impl SeverityOverride {
    pub fn new(rule: &str, severity: &str) -> Self {
        Self {
            rule: rule.to_string(),
            severity: severity.to_string(),
        }
    }
}

/// A named partial overlay applied after inheritance is resolved.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct ConfigProfile {
    #[serde(default, alias = "ignoredProjects")]
    pub ignored_projects: Vec<String>,

    #[serde(default, alias = "severityOverrides")]
    pub severity_overrides: Vec<SeverityOverride>,

    #[serde(default, alias = "dependencyRules")]
    pub dependency_rules: BTreeMap<String, DependencyRule>,
}
