//! Built-in configuration for the conventional modular monolith layout.
//!
//! Every business module is split into `Core`, `Infrastructure`, three
//! application variants (`Admin.App`, `Private.App`, `Public.App`), their
//! matching endpoint components, and two cross-module contract components
//! (`Shared.Events`, `Shared.Messages`). Cross-cutting building blocks live in
//! `Shared.*` components.

use std::collections::BTreeMap;

use super::core::{
    DependencyRule, GuardConfig, ModuleConfig, ProjectPattern, SharedConfig,
};

/// Keyword accepted by `extends` to inherit from the built-in configuration.
pub const DEFAULT_EXTENDS_KEYWORD: &str = "default";

/// Build the default configuration.
pub fn create_default_configuration() -> GuardConfig {
    GuardConfig {
        extends: None,
        modules: ModuleConfig {
            patterns: default_module_patterns(),
            missing_rules_warnings: true,
        },
        shared: SharedConfig {
            working_directory: None,
            patterns: default_shared_patterns(),
            missing_rules_warnings: true,
        },
        dependency_rules: default_dependency_rules(),
        ignored_projects: Vec::new(),
        severity_overrides: Vec::new(),
        profiles: BTreeMap::new(),
    }
}

fn module_pattern(name: &str, suffix: &str, type_id: &str) -> ProjectPattern {
    let extraction = format!("^(.+)\\.{}$", suffix.replace('.', "\\."));
    ProjectPattern::new(name, &format!("*.{}", suffix), type_id).with_extraction(&extraction)
}

fn default_module_patterns() -> Vec<ProjectPattern> {
    vec![
        module_pattern("Core", "Core", "core"),
        module_pattern("Infrastructure", "Infrastructure", "infrastructure"),
        module_pattern("AdminApp", "Admin.App", "admin-app"),
        module_pattern("AdminEndpoints", "Admin.Endpoints", "admin-endpoints"),
        module_pattern("PrivateApp", "Private.App", "private-app"),
        module_pattern("PrivateEndpoints", "Private.Endpoints", "private-endpoints"),
        module_pattern("PublicApp", "Public.App", "public-app"),
        module_pattern("PublicEndpoints", "Public.Endpoints", "public-endpoints"),
        module_pattern("SharedEvents", "Shared.Events", "shared-events"),
        module_pattern("SharedMessages", "Shared.Messages", "shared-messages"),
    ]
}

fn default_shared_patterns() -> Vec<ProjectPattern> {
    vec![
        ProjectPattern::new("SharedCore", "Shared.Core", "shared-core"),
        ProjectPattern::new(
            "SharedInfrastructure",
            "Shared.Infrastructure",
            "shared-infrastructure",
        ),
        ProjectPattern::new("SharedAppAdmin", "Shared.App.Admin", "shared-app-admin"),
        ProjectPattern::new("SharedAppPrivate", "Shared.App.Private", "shared-app-private"),
        ProjectPattern::new("SharedAppPublic", "Shared.App.Public", "shared-app-public"),
    ]
}

fn app_rule(shared_app: &str) -> DependencyRule {
    DependencyRule::new(
        &[
            shared_app,
            "{module}.Core",
            "{module}.Infrastructure",
            "*.Shared.Events",
            "*.Shared.Messages",
        ],
        &["*.Endpoints"],
    )
}

fn default_dependency_rules() -> BTreeMap<String, DependencyRule> {
    let mut rules = BTreeMap::new();
    rules.insert(
        "core".to_string(),
        DependencyRule::new(
            &["Shared.Core"],
            &["*.Infrastructure", "*.App", "*.Endpoints"],
        ),
    );
    rules.insert(
        "infrastructure".to_string(),
        DependencyRule::new(
            &["Shared.Infrastructure", "{module}.Core"],
            &["*.App", "*.Endpoints"],
        ),
    );
    rules.insert("admin-app".to_string(), app_rule("Shared.App.Admin"));
    rules.insert("private-app".to_string(), app_rule("Shared.App.Private"));
    rules.insert("public-app".to_string(), app_rule("Shared.App.Public"));
    rules.insert(
        "admin-endpoints".to_string(),
        DependencyRule::new(&["{module}.Admin.App"], &["*.Core", "*.Infrastructure"]),
    );
    rules.insert(
        "private-endpoints".to_string(),
        DependencyRule::new(&["{module}.Private.App"], &["*.Core", "*.Infrastructure"]),
    );
    rules.insert(
        "public-endpoints".to_string(),
        DependencyRule::new(&["{module}.Public.App"], &["*.Core", "*.Infrastructure"]),
    );
    rules
}
