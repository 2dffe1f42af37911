use ignore::WalkBuilder;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Extension of project descriptor files.
pub const DESCRIPTOR_EXTENSION: &str = "csproj";

pub struct DescriptorWalker {
    root: PathBuf,
    extension: String,
    respect_gitignore: bool,
}

impl DescriptorWalker {
    pub fn new(root: PathBuf) -> Self {
        Self {
            root,
            extension: DESCRIPTOR_EXTENSION.to_string(),
            respect_gitignore: true,
        }
    }

    pub fn with_extension(mut self, extension: &str) -> Self {
        self.extension = extension.trim_start_matches('.').to_string();
        self
    }

    pub fn with_gitignore(mut self, respect: bool) -> Self {
        self.respect_gitignore = respect;
        self
    }

    /// Every matching file under the root, sorted. Unreadable entries are skipped.
    pub fn walk(&self) -> Vec<PathBuf> {
        if !self.root.is_dir() {
            debug!("Discovery root {} is not a directory", self.root.display());
            return Vec::new();
        }

        let walker = WalkBuilder::new(&self.root)
            .hidden(false)
            .git_ignore(self.respect_gitignore)
            .build();

        let mut files: Vec<PathBuf> = walker
            .filter_map(|entry| match entry {
                Ok(entry) => Some(entry),
                Err(e) => {
                    debug!("Skipping unreadable entry: {}", e);
                    None
                }
            })
            .filter(|entry| entry.file_type().is_some_and(|ft| ft.is_file()))
            .map(|entry| entry.into_path())
            .filter(|path| self.should_process(path))
            .collect();

        files.sort();
        files
    }

    fn should_process(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case(&self.extension))
    }
}

/// Find every project descriptor under `root`; empty when the root is missing.
pub fn discover_descriptors(root: &Path) -> Vec<PathBuf> {
    DescriptorWalker::new(root.to_path_buf()).walk()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_discovers_sorted_descriptors() {
        let dir = TempDir::new().unwrap();
        for path in ["b/B.csproj", "a/A.csproj", "a/nested/C.CSPROJ", "a/readme.md"] {
            let full = dir.path().join(path);
            fs::create_dir_all(full.parent().unwrap()).unwrap();
            fs::write(full, "<Project/>").unwrap();
        }

        let found: Vec<_> = discover_descriptors(dir.path())
            .into_iter()
            .map(|p| p.strip_prefix(dir.path()).unwrap().to_path_buf())
            .collect();
        assert_eq!(
            found,
            vec![
                PathBuf::from("a/A.csproj"),
                PathBuf::from("a/nested/C.CSPROJ"),
                PathBuf::from("b/B.csproj"),
            ]
        );
    }

    #[test]
    fn test_missing_root_is_empty() {
        let dir = TempDir::new().unwrap();
        assert!(discover_descriptors(&dir.path().join("nope")).is_empty());
    }

    #[test]
    fn test_custom_extension() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("Lib.fsproj"), "<Project/>").unwrap();
        fs::write(dir.path().join("App.csproj"), "<Project/>").unwrap();
        let found = DescriptorWalker::new(dir.path().to_path_buf())
            .with_extension(".fsproj")
            .walk();
        assert_eq!(found.len(), 1);
        assert!(found[0].ends_with("Lib.fsproj"));
    }
}
