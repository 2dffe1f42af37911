//! Remediation text attached to dependency violations.

use crate::core::ModuleInfo;
use crate::patterns::expand_module;

const MAX_ALLOWED_EXAMPLES: usize = 3;
const SEPARATOR: &str = " | ";

/// Layering anti-patterns recognised from type ids: (source, target, note).
const ANTI_PATTERNS: [(&str, &str, &str); 3] = [
    (
        "app",
        "endpoints",
        "App projects should not reference Endpoints projects. Consider moving shared logic to Core or Infrastructure.",
    ),
    (
        "core",
        "infrastructure",
        "Core projects should not reference Infrastructure projects. Core should be infrastructure-agnostic.",
    ),
    (
        "infrastructure",
        "app",
        "Infrastructure projects should not reference App projects. Consider moving shared logic to Core.",
    ),
];

/// Build the suggestion for a rejected reference from `source` to `target`.
pub fn dependency_suggestion(
    rule_type: &str,
    allowed: &[String],
    source: &ModuleInfo,
    target: &ModuleInfo,
) -> String {
    let mut parts = vec![format!(
        "Remove the reference to '{}' from '{}'",
        target.name(),
        source.name()
    )];

    if !allowed.is_empty() {
        let examples: Vec<String> = allowed
            .iter()
            .take(MAX_ALLOWED_EXAMPLES)
            .map(|pattern| expand_module(pattern, &source.module_name))
            .collect();
        parts.push(format!(
            "Allowed references for {}: {}",
            rule_type,
            examples.join(", ")
        ));
    }

    if let Some(note) = anti_pattern_note(&source.type_id, &target.type_id) {
        parts.push(note.to_string());
    }

    parts.join(SEPARATOR)
}

/// First anti-pattern note whose source and target fragments both occur in the type ids.
pub fn anti_pattern_note(source_type: &str, target_type: &str) -> Option<&'static str> {
    let source_type = source_type.to_ascii_lowercase();
    let target_type = target_type.to_ascii_lowercase();
    ANTI_PATTERNS
        .iter()
        .find(|(source, target, _)| source_type.contains(source) && target_type.contains(target))
        .map(|(_, _, note)| *note)
}

pub fn unknown_type_suggestion(project_name: &str) -> String {
    format!(
        "Add a project type pattern in the configuration file, or add '{}' to 'ignored_projects' list.",
        project_name
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::ProjectInfo;

    fn module(name: &str, module_name: &str, type_id: &str) -> ModuleInfo {
        ModuleInfo::new(module_name, type_id, ProjectInfo::new(name, format!("{}.csproj", name), vec![]))
    }

    #[test]
    fn test_suggestion_lists_three_expanded_examples() {
        let source = module("Orders.Admin.App", "Orders", "admin-app");
        let target = module("Orders.Admin.Endpoints", "Orders", "admin-endpoints");
        let allowed: Vec<String> = ["Shared.App.Admin", "{module}.Core", "{module}.Infrastructure", "*.Shared.Events"]
            .iter()
            .map(|s| s.to_string())
            .collect();

        let text = dependency_suggestion("admin-app", &allowed, &source, &target);
        assert_eq!(
            text,
            "Remove the reference to 'Orders.Admin.Endpoints' from 'Orders.Admin.App' | \
             Allowed references for admin-app: Shared.App.Admin, Orders.Core, Orders.Infrastructure | \
             App projects should not reference Endpoints projects. Consider moving shared logic to Core or Infrastructure."
        );
    }

    #[test]
    fn test_empty_allow_list_omits_examples() {
        let source = module("Orders.Core", "Orders", "core");
        let target = module("Billing.Core", "Billing", "core");
        let text = dependency_suggestion("core", &[], &source, &target);
        assert_eq!(text, "Remove the reference to 'Billing.Core' from 'Orders.Core'");
    }

    #[test]
    fn test_anti_pattern_notes() {
        assert!(anti_pattern_note("core", "infrastructure").unwrap().starts_with("Core projects"));
        assert!(anti_pattern_note("infrastructure", "public-app").unwrap().starts_with("Infrastructure"));
        assert!(anti_pattern_note("PRIVATE-APP", "private-endpoints").unwrap().starts_with("App projects"));
        assert_eq!(anti_pattern_note("core", "shared-core"), None);
    }
}
