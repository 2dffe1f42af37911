//! Component classification.
//!
//! A [`Classifier`] is built from one resolved configuration and compiles its
//! pattern sets once. It assigns every component a type id and a module group:
//!
//! - shared patterns are tried before module patterns, so `Shared.Core` is
//!   `shared-core` even though it also matches `*.Core`
//! - with a shared working directory and path context, components inside the
//!   directory only see shared patterns and components outside only see module
//!   patterns
//! - no match yields [`UNKNOWN_TYPE`]

use std::path::{Component, Path, PathBuf};

use regex::Regex;
use tracing::warn;

use crate::config::{GuardConfig, ProjectPattern};
use crate::core::{ModuleInfo, ProjectInfo, SHARED_MODULE, UNKNOWN_MODULE, UNKNOWN_TYPE};
use crate::patterns::GlobMatcher;

/// Type id and module group assigned to one component.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Classification {
    pub type_id: String,
    pub module_name: String,
}

#[derive(Debug)]
struct CompiledPattern {
    type_id: String,
    matcher: GlobMatcher,
    extraction: Option<Regex>,
}

impl CompiledPattern {
    fn compile(pattern: &ProjectPattern) -> Self {
        let extraction = pattern
            .module_extraction
            .as_deref()
            .filter(|source| !source.trim().is_empty())
            .and_then(|source| match Regex::new(source) {
                Ok(regex) => Some(regex),
                Err(e) => {
                    warn!(
                        "Module extraction '{}' for type '{}' cannot be compiled: {}",
                        source, pattern.type_id, e
                    );
                    None
                }
            });

        Self {
            type_id: pattern.type_id.clone(),
            matcher: GlobMatcher::new(&pattern.pattern),
            extraction,
        }
    }
}

#[derive(Debug)]
pub struct Classifier {
    module_patterns: Vec<CompiledPattern>,
    shared_patterns: Vec<CompiledPattern>,
    shared_directory: Option<String>,
}

impl Classifier {
    pub fn new(config: &GuardConfig) -> Self {
        Self {
            module_patterns: config.modules.patterns.iter().map(CompiledPattern::compile).collect(),
            shared_patterns: config.shared.patterns.iter().map(CompiledPattern::compile).collect(),
            shared_directory: normalize_directory(config.shared.working_directory.as_deref()),
        }
    }

    /// Classify a component by name, using its location when both paths are known.
    pub fn classify(
        &self,
        name: &str,
        descriptor_path: Option<&Path>,
        root: Option<&Path>,
    ) -> Classification {
        let type_id = self.detect_type(name, descriptor_path, root);
        let module_name = self.module_name(name, &type_id);
        Classification {
            type_id,
            module_name,
        }
    }

    /// Classify a loaded project into a [`ModuleInfo`].
    pub fn classify_project(&self, project: ProjectInfo, root: Option<&Path>) -> ModuleInfo {
        let classification = self.classify(&project.name, Some(&project.descriptor_path), root);
        ModuleInfo::new(classification.module_name, classification.type_id, project)
    }

    pub fn detect_type(
        &self,
        name: &str,
        descriptor_path: Option<&Path>,
        root: Option<&Path>,
    ) -> String {
        let scoped = match (&self.shared_directory, descriptor_path, root) {
            (Some(dir), Some(path), Some(root)) => Some(is_inside_directory(path, root, dir)),
            _ => None,
        };

        let found = match scoped {
            Some(true) => first_match(&self.shared_patterns, name),
            Some(false) => first_match(&self.module_patterns, name),
            None => first_match(&self.shared_patterns, name)
                .or_else(|| first_match(&self.module_patterns, name)),
        };

        found.unwrap_or(UNKNOWN_TYPE).to_string()
    }

    /// Derive the module group for a component of the given type.
    pub fn module_name(&self, name: &str, type_id: &str) -> String {
        if type_id == UNKNOWN_TYPE {
            return UNKNOWN_MODULE.to_string();
        }

        if self.shared_patterns.iter().any(|p| p.type_id == type_id) {
            return SHARED_MODULE.to_string();
        }

        let extracted = self
            .module_patterns
            .iter()
            .find(|p| p.type_id == type_id)
            .and_then(|p| p.extraction.as_ref())
            .and_then(|regex| regex.captures(name))
            .and_then(|captures| captures.get(1))
            .map(|group| group.as_str().to_string());

        // A non-matching extraction falls back to the leading name segment, which
        // can group a component under the wrong module.
        extracted.unwrap_or_else(|| leading_segment(name).to_string())
    }
}

fn first_match<'a>(patterns: &'a [CompiledPattern], name: &str) -> Option<&'a str> {
    patterns
        .iter()
        .find(|p| p.matcher.is_match(name))
        .map(|p| p.type_id.as_str())
}

fn leading_segment(name: &str) -> &str {
    match name.find('.') {
        Some(index) if index > 0 => &name[..index],
        _ => name,
    }
}

fn normalize_directory(directory: Option<&str>) -> Option<String> {
    let trimmed = directory?.trim().replace('\\', "/");
    let trimmed = trimmed.trim_matches('/');
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

fn is_inside_directory(descriptor_path: &Path, root: &Path, directory: &str) -> bool {
    let project = normalize_path(descriptor_path);
    let scope = normalize_path(&root.join(directory));
    let prefix = format!("{}/", scope.trim_end_matches('/'));
    project.len() >= prefix.len()
        && project.is_char_boundary(prefix.len())
        && project[..prefix.len()].eq_ignore_ascii_case(&prefix)
}

/// Absolute, lexically normalised path with `/` separators.
fn normalize_path(path: &Path) -> String {
    let unified = PathBuf::from(path.to_string_lossy().replace('\\', "/"));
    let absolute = if unified.is_absolute() {
        unified
    } else {
        std::env::current_dir()
            .map(|cwd| cwd.join(&unified))
            .unwrap_or(unified)
    };

    let mut normalized = PathBuf::new();
    for component in absolute.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                normalized.pop();
            }
            other => normalized.push(other.as_os_str()),
        }
    }
    normalized.to_string_lossy().replace('\\', "/")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::create_default_configuration;

    fn default_classifier() -> Classifier {
        Classifier::new(&create_default_configuration())
    }

    fn scoped_classifier(dir: &str) -> Classifier {
        let mut config = create_default_configuration();
        config.shared.working_directory = Some(dir.to_string());
        Classifier::new(&config)
    }

    #[test]
    fn test_shared_wins_on_overlap() {
        let classifier = default_classifier();
        let result = classifier.classify("Shared.Core", None, None);
        assert_eq!(result.type_id, "shared-core");
        assert_eq!(result.module_name, SHARED_MODULE);
    }

    #[test]
    fn test_module_patterns_and_extraction() {
        let classifier = default_classifier();
        let result = classifier.classify("Orders.Admin.App", None, None);
        assert_eq!(result.type_id, "admin-app");
        assert_eq!(result.module_name, "Orders");

        let result = classifier.classify("Sales.Orders.Infrastructure", None, None);
        assert_eq!(result.type_id, "infrastructure");
        assert_eq!(result.module_name, "Sales.Orders");
    }

    #[test]
    fn test_unknown_component() {
        let classifier = default_classifier();
        let result = classifier.classify("Tools.Migrator", None, None);
        assert_eq!(result.type_id, UNKNOWN_TYPE);
        assert_eq!(result.module_name, UNKNOWN_MODULE);
    }

    #[test]
    fn test_extraction_mismatch_falls_back_to_leading_segment() {
        let mut config = create_default_configuration();
        config.modules.patterns[0].module_extraction = Some(r"^Mod-(\w+)$".into());
        let classifier = Classifier::new(&config);
        assert_eq!(classifier.module_name("Billing.Core", "core"), "Billing");
        assert_eq!(classifier.module_name("Core", "core"), "Core");
        assert_eq!(classifier.module_name(".Core", "core"), ".Core");
    }

    #[test]
    fn test_scoped_directory_restricts_pattern_sets() {
        let classifier = scoped_classifier("src/Shared");
        let root = Path::new("/repo");

        let inside = Path::new("/repo/src/Shared/Shared.Core/Shared.Core.csproj");
        assert_eq!(classifier.detect_type("Shared.Core", Some(inside), Some(root)), "shared-core");
        // Inside the shared directory module patterns are not consulted.
        assert_eq!(classifier.detect_type("Orders.Core", Some(inside), Some(root)), UNKNOWN_TYPE);

        let outside = Path::new("/repo/src/Modules/Shared.Core/Shared.Core.csproj");
        assert_eq!(classifier.detect_type("Shared.Core", Some(outside), Some(root)), "core");
    }

    #[test]
    fn test_scoped_directory_respects_segment_boundaries() {
        let classifier = scoped_classifier("/src/Shared/");
        let root = Path::new("/repo");
        let sibling = Path::new("/repo/src/SharedX/Shared.Core/Shared.Core.csproj");
        assert_eq!(classifier.detect_type("Shared.Core", Some(sibling), Some(root)), "core");
    }

    #[test]
    fn test_scoped_directory_is_case_insensitive_and_normalised() {
        let classifier = scoped_classifier(r"src\shared");
        let root = Path::new("/repo/tools/..");
        let inside = Path::new("/repo/SRC/Shared/./Shared.Core/Shared.Core.csproj");
        assert_eq!(classifier.detect_type("Shared.Core", Some(inside), Some(root)), "shared-core");
    }

    #[test]
    fn test_missing_path_context_uses_name_only() {
        let classifier = scoped_classifier("src/Shared");
        assert_eq!(classifier.detect_type("Shared.Core", None, None), "shared-core");
        assert_eq!(
            classifier.detect_type("Orders.Core", Some(Path::new("/x/Orders.Core.csproj")), None),
            "core"
        );
    }

    #[test]
    fn test_classify_project_builds_module_info() {
        let classifier = default_classifier();
        let project = ProjectInfo::new("Orders.Core", "/repo/Orders.Core/Orders.Core.csproj", vec![]);
        let module = classifier.classify_project(project, Some(Path::new("/repo")));
        assert_eq!(module.type_id, "core");
        assert_eq!(module.module_name, "Orders");
        assert_eq!(module.name(), "Orders.Core");
    }
}
