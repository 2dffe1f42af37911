//! Inheritance and profile overlays.
//!
//! Merging is field-by-field with the child taking precedence:
//!
//! - pattern sets: a non-empty child set replaces the base set wholesale
//! - dependency rules: union of type ids; conflicts follow the child's
//!   [`InheritMode`]
//! - ignore globs: union, de-duplicated, base order first
//! - severity overrides: keyed by rule id, child wins
//!
//! Profiles are applied once on the fully merged configuration and are not
//! chained.

use std::collections::BTreeMap;

use super::core::{
    ConfigProfile, DependencyRule, GuardConfig, InheritMode, ModuleConfig, SeverityOverride,
    SharedConfig,
};
use crate::core::{Error, Result};

/// Merge a child configuration over its base.
pub fn merge_configs(base: GuardConfig, child: GuardConfig) -> GuardConfig {
    let mut profiles = base.profiles;
    profiles.extend(child.profiles);

    GuardConfig {
        extends: None,
        modules: merge_modules(base.modules, child.modules),
        shared: merge_shared(base.shared, child.shared),
        dependency_rules: merge_dependency_rules(base.dependency_rules, child.dependency_rules),
        ignored_projects: union_distinct(base.ignored_projects, child.ignored_projects),
        severity_overrides: merge_severity_overrides(
            base.severity_overrides,
            child.severity_overrides,
        ),
        profiles,
    }
}

fn merge_modules(base: ModuleConfig, child: ModuleConfig) -> ModuleConfig {
    if child.patterns.is_empty() {
        base
    } else {
        child
    }
}

fn merge_shared(base: SharedConfig, child: SharedConfig) -> SharedConfig {
    if child.patterns.is_empty() {
        return base;
    }
    SharedConfig {
        working_directory: child.working_directory.or(base.working_directory),
        ..child
    }
}

fn merge_dependency_rules(
    mut base: BTreeMap<String, DependencyRule>,
    child: BTreeMap<String, DependencyRule>,
) -> BTreeMap<String, DependencyRule> {
    for (type_id, child_rule) in child {
        let merged = match base.remove(&type_id) {
            None => child_rule,
            Some(base_rule) => merge_rule(base_rule, child_rule),
        };
        base.insert(type_id, merged);
    }
    base
}

/// Combine two rules for the same type id according to the child's mode.
pub fn merge_rule(base: DependencyRule, child: DependencyRule) -> DependencyRule {
    match child.inherit {
        InheritMode::Replace => child,
        InheritMode::Merge => DependencyRule {
            inherit: InheritMode::Replace,
            allowed: union_distinct(base.allowed, child.allowed),
            denied: union_distinct(base.denied, child.denied),
        },
        InheritMode::Extend => DependencyRule {
            inherit: InheritMode::Replace,
            allowed: append_missing(base.allowed, child.allowed),
            denied: append_missing(base.denied, child.denied),
        },
    }
}

/// Keep `base` untouched and append the child entries it does not contain.
fn append_missing(mut base: Vec<String>, child: Vec<String>) -> Vec<String> {
    for item in child {
        if !base.contains(&item) {
            base.push(item);
        }
    }
    base
}

fn union_distinct(base: Vec<String>, child: Vec<String>) -> Vec<String> {
    let mut merged: Vec<String> = Vec::with_capacity(base.len() + child.len());
    for item in base.into_iter().chain(child) {
        if !merged.contains(&item) {
            merged.push(item);
        }
    }
    merged
}

/// Key overrides by rule id; later entries replace earlier ones in place.
fn merge_severity_overrides(
    base: Vec<SeverityOverride>,
    child: Vec<SeverityOverride>,
) -> Vec<SeverityOverride> {
    let mut merged: Vec<SeverityOverride> = Vec::with_capacity(base.len() + child.len());
    for entry in base.into_iter().chain(child) {
        match merged.iter_mut().find(|existing| existing.rule == entry.rule) {
            Some(existing) => *existing = entry,
            None => merged.push(entry),
        }
    }
    merged
}

/// Overlay a named profile onto a merged configuration.
pub fn apply_profile(config: GuardConfig, profile_name: &str) -> Result<GuardConfig> {
    let Some(profile) = config.profiles.get(profile_name).cloned() else {
        return Err(Error::UnknownProfile {
            name: profile_name.to_string(),
            available: config.profile_names(),
        });
    };
    Ok(overlay_profile(config, profile))
}

fn overlay_profile(config: GuardConfig, profile: ConfigProfile) -> GuardConfig {
    let mut dependency_rules = config.dependency_rules;
    dependency_rules.extend(profile.dependency_rules);

    GuardConfig {
        extends: None,
        dependency_rules,
        ignored_projects: union_distinct(config.ignored_projects, profile.ignored_projects),
        severity_overrides: merge_severity_overrides(
            config.severity_overrides,
            profile.severity_overrides,
        ),
        ..config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::core::ProjectPattern;
    use crate::config::defaults::create_default_configuration;
    use pretty_assertions::assert_eq;

    fn rules(entries: &[(&str, DependencyRule)]) -> BTreeMap<String, DependencyRule> {
        entries
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    #[test]
    fn test_merge_with_self_is_identity() {
        let config = create_default_configuration();
        let merged = merge_configs(config.clone(), config.clone());
        assert_eq!(merged, config);
    }

    #[test]
    fn test_empty_child_patterns_keep_base() {
        let base = create_default_configuration();
        let child = GuardConfig::default();
        let merged = merge_configs(base.clone(), child);
        assert_eq!(merged.modules, base.modules);
        assert_eq!(merged.shared, base.shared);
        assert_eq!(merged.dependency_rules, base.dependency_rules);
    }

    #[test]
    fn test_non_empty_child_patterns_replace_wholesale() {
        let base = create_default_configuration();
        let mut child = GuardConfig::default();
        child.modules.patterns = vec![ProjectPattern::new("Lib", "*.Lib", "lib")
            .with_extraction(r"^(.+)\.Lib$")];
        let merged = merge_configs(base, child.clone());
        assert_eq!(merged.modules.patterns, child.modules.patterns);
    }

    #[test]
    fn test_shared_working_directory_falls_back_to_base() {
        let mut base = GuardConfig::default();
        base.shared.working_directory = Some("src/Shared".into());
        base.shared.patterns = vec![ProjectPattern::new("A", "A", "a")];
        let mut child = GuardConfig::default();
        child.shared.patterns = vec![ProjectPattern::new("B", "B", "b")];

        let merged = merge_configs(base, child);
        assert_eq!(merged.shared.working_directory.as_deref(), Some("src/Shared"));
        assert_eq!(merged.shared.patterns[0].type_id, "b");
    }

    #[test]
    fn test_replace_discards_base_rule() {
        let base = GuardConfig {
            dependency_rules: rules(&[("core", DependencyRule::new(&["A"], &["X"]))]),
            ..Default::default()
        };
        let child = GuardConfig {
            dependency_rules: rules(&[("core", DependencyRule::new(&["B"], &[]))]),
            ..Default::default()
        };
        let merged = merge_configs(base, child);
        assert_eq!(merged.dependency_rules["core"], DependencyRule::new(&["B"], &[]));
    }

    #[test]
    fn test_merge_unions_without_duplicates() {
        let base = GuardConfig {
            dependency_rules: rules(&[("core", DependencyRule::new(&["A", "B"], &["X"]))]),
            ..Default::default()
        };
        let child = GuardConfig {
            dependency_rules: rules(&[(
                "core",
                DependencyRule::new(&["B", "C"], &["X", "Y"]).with_inherit(InheritMode::Merge),
            )]),
            ..Default::default()
        };
        let merged = merge_configs(base, child);
        assert_eq!(
            merged.dependency_rules["core"],
            DependencyRule::new(&["A", "B", "C"], &["X", "Y"])
        );
    }

    #[test]
    fn test_extend_appends_missing_entries_in_order() {
        let base = DependencyRule::new(&["A", "B"], &[]);
        let child = DependencyRule::new(&["C", "A", "D"], &["Z"]).with_inherit(InheritMode::Extend);
        let merged = merge_rule(base, child);
        assert_eq!(merged.allowed, vec!["A", "B", "C", "D"]);
        assert_eq!(merged.denied, vec!["Z"]);
        assert_eq!(merged.inherit, InheritMode::Replace);
    }

    #[test]
    fn test_extend_keeps_base_verbatim() {
        let base = DependencyRule::new(&["A", "A"], &[]);
        let child = DependencyRule::new(&["B"], &[]).with_inherit(InheritMode::Extend);
        assert_eq!(merge_rule(base.clone(), child.clone()).allowed, vec!["A", "A", "B"]);

        let child = child.with_inherit(InheritMode::Merge);
        assert_eq!(merge_rule(base, child).allowed, vec!["A", "B"]);
    }

    #[test]
    fn test_new_child_type_is_added() {
        let base = GuardConfig {
            dependency_rules: rules(&[("core", DependencyRule::new(&["A"], &[]))]),
            ..Default::default()
        };
        let child = GuardConfig {
            dependency_rules: rules(&[(
                "worker",
                DependencyRule::new(&["W"], &[]).with_inherit(InheritMode::Merge),
            )]),
            ..Default::default()
        };
        let merged = merge_configs(base, child);
        assert_eq!(merged.dependency_rules.len(), 2);
        assert_eq!(merged.dependency_rules["worker"].allowed, vec!["W"]);
    }

    #[test]
    fn test_ignores_and_overrides_union() {
        let base = GuardConfig {
            ignored_projects: vec!["*.Tests".into(), "Legacy".into()],
            severity_overrides: vec![
                SeverityOverride::new("r1", "Warning"),
                SeverityOverride::new("r2", "Info"),
            ],
            ..Default::default()
        };
        let child = GuardConfig {
            ignored_projects: vec!["Legacy".into(), "Tools.*".into()],
            severity_overrides: vec![SeverityOverride::new("r1", "Error")],
            ..Default::default()
        };
        let merged = merge_configs(base, child);
        assert_eq!(merged.ignored_projects, vec!["*.Tests", "Legacy", "Tools.*"]);
        assert_eq!(
            merged.severity_overrides,
            vec![
                SeverityOverride::new("r1", "Error"),
                SeverityOverride::new("r2", "Info"),
            ]
        );
    }

    #[test]
    fn test_apply_profile_overlays_fields() {
        let mut config = create_default_configuration();
        config.ignored_projects = vec!["A".into()];
        config.severity_overrides = vec![SeverityOverride::new("r", "Warning")];
        config.profiles.insert(
            "ci".into(),
            ConfigProfile {
                ignored_projects: vec!["B".into(), "A".into()],
                severity_overrides: vec![SeverityOverride::new("r", "Info")],
                dependency_rules: rules(&[("core", DependencyRule::new(&["Only"], &[]))]),
            },
        );

        let applied = apply_profile(config.clone(), "ci").unwrap();
        assert_eq!(applied.ignored_projects, vec!["A", "B"]);
        assert_eq!(applied.severity_overrides, vec![SeverityOverride::new("r", "Info")]);
        assert_eq!(applied.dependency_rules["core"].allowed, vec!["Only"]);
        assert_eq!(
            applied.dependency_rules["infrastructure"],
            config.dependency_rules["infrastructure"]
        );
        assert_eq!(applied.modules, config.modules);
    }

    #[test]
    fn test_profile_rules_replace_even_with_merge_mode() {
        let mut config = create_default_configuration();
        config.profiles.insert(
            "loose".into(),
            ConfigProfile {
                dependency_rules: rules(&[(
                    "core",
                    DependencyRule::new(&["Extra"], &[]).with_inherit(InheritMode::Merge),
                )]),
                ..Default::default()
            },
        );
        let applied = apply_profile(config, "loose").unwrap();
        assert_eq!(applied.dependency_rules["core"].allowed, vec!["Extra"]);
    }

    #[test]
    fn test_unknown_profile_lists_available() {
        let mut config = create_default_configuration();
        config.profiles.insert("dev".into(), ConfigProfile::default());
        config.profiles.insert("ci".into(), ConfigProfile::default());

        match apply_profile(config, "prod") {
            Err(Error::UnknownProfile { name, available }) => {
                assert_eq!(name, "prod");
                assert_eq!(available, vec!["ci", "dev"]);
            }
            other => panic!("expected unknown profile error, got {:?}", other),
        }
    }
}
