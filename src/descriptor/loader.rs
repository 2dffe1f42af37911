use std::path::Path;

use tracing::trace;

use super::document::DescriptorDocument;
use crate::core::{ProjectInfo, Result};

/// Turns a descriptor file into a [`ProjectInfo`].
pub trait DescriptorLoader: Send + Sync {
    fn load(&self, path: &Path) -> Result<ProjectInfo>;
}

/// Loader for MSBuild-style project files.
#[derive(Debug, Default, Clone, Copy)]
pub struct ProjectFileLoader;

impl ProjectFileLoader {
    pub fn new() -> Self {
        Self
    }
}

impl DescriptorLoader for ProjectFileLoader {
    fn load(&self, path: &Path) -> Result<ProjectInfo> {
        let document = DescriptorDocument::load(path)?;
        let name = document
            .project_name()
            .unwrap_or_else(|| file_stem(path));
        let references = document.project_references();
        trace!(
            "Loaded {} with {} reference(s) from {}",
            name,
            references.len(),
            path.display()
        );
        Ok(ProjectInfo::new(name, path, references))
    }
}

fn file_stem(path: &Path) -> String {
    path.file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}
