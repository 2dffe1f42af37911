//! Best-effort scan of C# sources for namespace-like tokens.
//!
//! Two kinds of tokens are collected:
//!
//! - targets of `using` directives (`using X.Y;`, `using static X.Y;`,
//!   `using Alias = X.Y;`, `global using X.Y;`)
//! - the leading identifier of dotted qualified names (`A.B.C` yields `A`)
//!
//! No parsing happens beyond that, so the scan never fails on malformed code.

use std::collections::HashSet;
use std::fs;
use std::path::Path;

use once_cell::sync::Lazy;
use regex::Regex;
use tracing::trace;
use walkdir::{DirEntry, WalkDir};

use crate::core::ProjectInfo;

static USING_DIRECTIVE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?m)^\s*(?:global\s+)?using\s+(?:static\s+)?(?:[A-Za-z_]\w*\s*=\s*)?([A-Za-z_][\w.]*)\s*;",
    )
    .expect("valid using-directive regex")
});

static QUALIFIED_NAME: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?:^|[^\w.])([A-Za-z_]\w*)(?:\.[A-Za-z_]\w*)+")
        .expect("valid qualified-name regex")
});

const SOURCE_EXTENSION: &str = "cs";
const SKIPPED_DIRECTORIES: [&str; 2] = ["obj", "bin"];

/// Supplies the usage tokens of a component, or `None` when nothing is known.
pub trait UsageSource: Sync {
    fn tokens_for(&self, project: &ProjectInfo) -> Option<HashSet<String>>;
}

/// Skips unused-reference detection entirely.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoUsage;

impl UsageSource for NoUsage {
    fn tokens_for(&self, _project: &ProjectInfo) -> Option<HashSet<String>> {
        None
    }
}

/// Precomputed tokens keyed by project name.
impl UsageSource for std::collections::HashMap<String, HashSet<String>> {
    fn tokens_for(&self, project: &ProjectInfo) -> Option<HashSet<String>> {
        self.get(&project.name).cloned()
    }
}

/// Scans the sources next to each descriptor.
#[derive(Debug, Default, Clone, Copy)]
pub struct UsageScanner;

impl UsageScanner {
    pub fn new() -> Self {
        Self
    }

    /// Collect tokens from every source file under `dir`.
    ///
    /// Returns `None` when the directory holds no source files.
    pub fn used_tokens(&self, dir: &Path) -> Option<HashSet<String>> {
        let mut tokens = HashSet::new();
        let mut sources = 0usize;

        let walker = WalkDir::new(dir)
            .follow_links(false)
            .into_iter()
            .filter_entry(|entry| !is_skipped_directory(entry));

        for entry in walker.filter_map(|e| e.ok()) {
            if !entry.file_type().is_file() || !is_source_file(entry.path()) {
                continue;
            }
            sources += 1;
            match fs::read(entry.path()) {
                Ok(bytes) => collect_tokens(&String::from_utf8_lossy(&bytes), &mut tokens),
                Err(e) => trace!("Skipping unreadable source {}: {}", entry.path().display(), e),
            }
        }

        (sources > 0).then_some(tokens)
    }
}

impl UsageSource for UsageScanner {
    fn tokens_for(&self, project: &ProjectInfo) -> Option<HashSet<String>> {
        self.used_tokens(project.directory()?)
    }
}

fn is_skipped_directory(entry: &DirEntry) -> bool {
    entry.depth() > 0
        && entry.file_type().is_dir()
        && entry
            .file_name()
            .to_str()
            .is_some_and(|name| SKIPPED_DIRECTORIES.iter().any(|s| name.eq_ignore_ascii_case(s)))
}

fn is_source_file(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case(SOURCE_EXTENSION))
}

/// Extract tokens from one source text.
pub fn collect_tokens(source: &str, tokens: &mut HashSet<String>) {
    for captures in USING_DIRECTIVE.captures_iter(source) {
        if let Some(target) = captures.get(1) {
            tokens.insert(target.as_str().trim_end_matches('.').to_string());
        }
    }
    for captures in QUALIFIED_NAME.captures_iter(source) {
        if let Some(head) = captures.get(1) {
            tokens.insert(head.as_str().to_string());
        }
    }
}
