//! Discover, load and classify the components under a root directory.
//!
//! Loading runs in parallel; everything downstream sees modules sorted by
//! project name so reports are deterministic.

use std::path::{Path, PathBuf};

use rayon::prelude::*;
use serde::Serialize;
use tracing::{debug, info, info_span, warn};

use crate::classify::Classifier;
use crate::config::GuardConfig;
use crate::core::{ModuleInfo, ProjectInfo};
use crate::descriptor::{discover_descriptors, DescriptorLoader};

/// A descriptor that could not be loaded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LoadFailure {
    pub path: PathBuf,
    pub message: String,
}

/// Classified components of one run.
#[derive(Debug, Clone, Default)]
pub struct Workspace {
    pub root: PathBuf,
    pub modules: Vec<ModuleInfo>,
    pub failures: Vec<LoadFailure>,
    /// Components skipped because they match an ignore glob
    pub ignored: usize,
}

impl Workspace {
    pub fn projects(&self) -> Vec<ProjectInfo> {
        self.modules.iter().map(|m| m.project.clone()).collect()
    }
}

/// Load every descriptor under `root`, in path order.
///
/// Failures are collected rather than aborting the run.
pub fn load_projects<L: DescriptorLoader>(
    root: &Path,
    loader: &L,
) -> (Vec<ProjectInfo>, Vec<LoadFailure>) {
    let paths = discover_descriptors(root);
    debug!("Discovered {} descriptor(s) under {}", paths.len(), root.display());

    let loaded: Vec<_> = paths
        .par_iter()
        .map(|path| (path, loader.load(path)))
        .collect();

    let mut projects = Vec::with_capacity(loaded.len());
    let mut failures = Vec::new();
    for (path, outcome) in loaded {
        match outcome {
            Ok(project) => projects.push(project),
            Err(e) => {
                warn!("Skipping {}: {}", path.display(), e);
                failures.push(LoadFailure {
                    path: path.clone(),
                    message: e.to_string(),
                });
            }
        }
    }
    (projects, failures)
}

/// Discover, load, filter and classify the components under `root`.
pub fn load_workspace<L: DescriptorLoader>(root: &Path, config: &GuardConfig, loader: &L) -> Workspace {
    let _span = info_span!("load_workspace", root = %root.display()).entered();

    let (projects, failures) = load_projects(root, loader);
    let classifier = Classifier::new(config);

    let total = projects.len();
    let mut modules: Vec<ModuleInfo> = projects
        .into_iter()
        .filter(|project| !config.is_ignored(&project.name))
        .map(|project| classifier.classify_project(project, Some(root)))
        .collect();
    modules.sort_by(|a, b| a.name().cmp(b.name()));

    let ignored = total - modules.len();
    info!(
        "Loaded {} project(s), {} ignored, {} failed",
        modules.len(),
        ignored,
        failures.len()
    );

    Workspace {
        root: root.to_path_buf(),
        modules,
        failures,
        ignored,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::create_default_configuration;
    use crate::descriptor::ProjectFileLoader;
    use std::fs;
    use tempfile::TempDir;

    fn write(root: &Path, name: &str, body: &str) {
        let dir = root.join(name);
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join(format!("{}.csproj", name)), body).unwrap();
    }

    #[test]
    fn test_workspace_is_sorted_filtered_and_classified() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "Orders.Infrastructure", "<Project/>");
        write(dir.path(), "Orders.Core", "<Project/>");
        write(dir.path(), "Orders.Tests", "<Project/>");
        write(dir.path(), "Broken", "<Project>");

        let mut config = create_default_configuration();
        config.ignored_projects = vec!["*.Tests".into()];

        let workspace = load_workspace(dir.path(), &config, &ProjectFileLoader::new());
        let names: Vec<_> = workspace.modules.iter().map(|m| m.name()).collect();
        assert_eq!(names, vec!["Orders.Core", "Orders.Infrastructure"]);
        assert_eq!(workspace.modules[0].type_id, "core");
        assert_eq!(workspace.modules[0].module_name, "Orders");
        assert_eq!(workspace.ignored, 1);
        assert_eq!(workspace.failures.len(), 1);
        assert!(workspace.failures[0].path.ends_with("Broken/Broken.csproj"));
    }

    #[test]
    fn test_missing_root_gives_empty_workspace() {
        let dir = TempDir::new().unwrap();
        let workspace = load_workspace(
            &dir.path().join("missing"),
            &create_default_configuration(),
            &ProjectFileLoader::new(),
        );
        assert!(workspace.modules.is_empty());
        assert!(workspace.failures.is_empty());
    }
}
