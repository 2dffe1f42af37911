pub mod errors;

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

pub use errors::{Error, Result};

/// Type id assigned to components no pattern recognises.
pub const UNKNOWN_TYPE: &str = "unknown";

/// Module group label for components matched by a shared pattern.
pub const SHARED_MODULE: &str = "Shared";

/// Module group label for unclassified components.
pub const UNKNOWN_MODULE: &str = "Unknown";

/// `OutputItemType` value marking a build-time analyzer reference.
const ANALYZER_ITEM_TYPE: &str = "Analyzer";

/// Where a declaration lives inside its descriptor file.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct SourceLocation {
    pub file: PathBuf,
    pub line: usize,
    pub column: usize,
}

/// One declared reference edge from a component to another component.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct ProjectReference {
    /// Include path exactly as declared (may use `\` separators)
    pub target_path: String,
    pub output_item_type: Option<String>,
    pub produces_runtime_output: bool,
    pub location: Option<SourceLocation>,
}

impl ProjectReference {
    pub fn new(target_path: impl Into<String>) -> Self {
        Self {
            target_path: target_path.into(),
            output_item_type: None,
            produces_runtime_output: true,
            location: None,
        }
    }

    pub fn with_output_item_type(mut self, item_type: impl Into<String>) -> Self {
        self.output_item_type = Some(item_type.into());
        self
    }

    pub fn with_runtime_output(mut self, produces: bool) -> Self {
        self.produces_runtime_output = produces;
        self
    }

    pub fn with_location(mut self, location: SourceLocation) -> Self {
        self.location = Some(location);
        self
    }

    /// Name of the referenced component: the file stem of the include path.
    pub fn target_name(&self) -> String {
        reference_name_from_path(&self.target_path)
    }

    /// Build-time-only references never take part in optimization.
    pub fn is_special(&self) -> bool {
        let analyzer = self
            .output_item_type
            .as_deref()
            .is_some_and(|t| t.eq_ignore_ascii_case(ANALYZER_ITEM_TYPE));
        analyzer || !self.produces_runtime_output
    }
}

/// Extract a component name from an include path such as `..\Orders.Core\Orders.Core.csproj`.
pub fn reference_name_from_path(path: &str) -> String {
    let normalized = path.replace('\\', "/");
    Path::new(&normalized)
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or(normalized)
}

/// A loaded component descriptor.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct ProjectInfo {
    pub name: String,
    pub descriptor_path: PathBuf,
    pub references: Vec<ProjectReference>,
}

impl ProjectInfo {
    pub fn new(
        name: impl Into<String>,
        descriptor_path: impl Into<PathBuf>,
        references: Vec<ProjectReference>,
    ) -> Self {
        Self {
            name: name.into(),
            descriptor_path: descriptor_path.into(),
            references,
        }
    }

    /// Directory holding the descriptor, used to locate the component's sources.
    pub fn directory(&self) -> Option<&Path> {
        self.descriptor_path
            .parent()
            .filter(|dir| !dir.as_os_str().is_empty())
    }
}

/// A classified component. Derived per run, never persisted.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct ModuleInfo {
    pub module_name: String,
    pub type_id: String,
    pub project: ProjectInfo,
}

impl ModuleInfo {
    pub fn new(module_name: impl Into<String>, type_id: impl Into<String>, project: ProjectInfo) -> Self {
        Self {
            module_name: module_name.into(),
            type_id: type_id.into(),
            project,
        }
    }

    pub fn name(&self) -> &str {
        &self.project.name
    }

    pub fn is_shared(&self) -> bool {
        self.module_name == SHARED_MODULE
    }
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Severity {
    Error,
    Warning,
    Info,
}

impl Severity {
    /// Parse a configured severity name, ignoring case. Empty or unknown names yield `None`.
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "error" => Some(Severity::Error),
            "warning" => Some(Severity::Warning),
            "info" => Some(Severity::Info),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Severity::Error => "Error",
            Severity::Warning => "Warning",
            Severity::Info => "Info",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A reported rule breach.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Violation {
    pub project_name: String,
    /// Offending reference; `None` for violations about the component itself
    pub offending_reference: Option<String>,
    pub rule_id: String,
    pub description: String,
    pub severity: Severity,
    pub suggestion: Option<String>,
    pub doc_url: Option<String>,
    pub auto_fixable: bool,
    pub location: Option<SourceLocation>,
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub enum ReferenceReason {
    Unused,
    Transitive,
}

impl fmt::Display for ReferenceReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReferenceReason::Unused => f.write_str("unused"),
            ReferenceReason::Transitive => f.write_str("transitive"),
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct UnnecessaryReference {
    pub reference_name: String,
    pub reason: ReferenceReason,
    pub transitive_path: Option<String>,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct OptimizationResult {
    pub project_name: String,
    pub descriptor_path: PathBuf,
    pub references: Vec<UnnecessaryReference>,
}

/// Outcome of one auto-fix attempt.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct FixResult {
    pub success: bool,
    pub message: String,
    pub descriptor_path: Option<PathBuf>,
    pub reference: Option<String>,
    pub changed: bool,
}

impl FixResult {
    pub fn failed(message: impl Into<String>, descriptor_path: Option<PathBuf>, reference: Option<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
            descriptor_path,
            reference,
            changed: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reference_name_handles_windows_separators() {
        assert_eq!(
            reference_name_from_path(r"..\Orders.Core\Orders.Core.csproj"),
            "Orders.Core"
        );
        assert_eq!(
            reference_name_from_path("../Billing.App/Billing.App.csproj"),
            "Billing.App"
        );
        assert_eq!(reference_name_from_path("Plain"), "Plain");
    }

    #[test]
    fn test_special_references() {
        let normal = ProjectReference::new("A.csproj");
        assert!(!normal.is_special());

        let analyzer = ProjectReference::new("Gen.csproj").with_output_item_type("analyzer");
        assert!(analyzer.is_special());

        let build_only = ProjectReference::new("Tool.csproj").with_runtime_output(false);
        assert!(build_only.is_special());

        let other_item = ProjectReference::new("Content.csproj").with_output_item_type("Content");
        assert!(!other_item.is_special());
    }

    #[test]
    fn test_severity_parse_is_case_insensitive() {
        assert_eq!(Severity::parse("warning"), Some(Severity::Warning));
        assert_eq!(Severity::parse("ERROR"), Some(Severity::Error));
        assert_eq!(Severity::parse(" Info "), Some(Severity::Info));
        assert_eq!(Severity::parse(""), None);
        assert_eq!(Severity::parse("fatal"), None);
    }

    #[test]
    fn test_severity_orders_errors_first() {
        let mut severities = vec![Severity::Info, Severity::Error, Severity::Warning];
        severities.sort();
        assert_eq!(severities, vec![Severity::Error, Severity::Warning, Severity::Info]);
    }

    #[test]
    fn test_project_directory() {
        let project = ProjectInfo::new("A", "/repo/A/A.csproj", vec![]);
        assert_eq!(project.directory(), Some(Path::new("/repo/A")));

        let bare = ProjectInfo::new("B", "B.csproj", vec![]);
        assert_eq!(bare.directory(), None);
    }
}
