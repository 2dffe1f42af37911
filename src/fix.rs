//! Automatic removal of rejected references.
//!
//! Removals are batched per descriptor: each file is read once, every removal
//! targeting it is applied in memory, empty item groups are pruned and the file
//! is written once. Dry runs never write.

use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use crate::core::{FixResult, ModuleInfo, Severity, Violation};
use crate::descriptor::DescriptorDocument;

/// Removes references from descriptors, optionally as a dry run.
#[derive(Debug, Clone, Copy, Default)]
pub struct AutoFixEngine {
    dry_run: bool,
}

/// Removals requested for one descriptor, with the result slot each one fills.
struct FileBatch {
    path: PathBuf,
    removals: Vec<(usize, String)>,
}

impl AutoFixEngine {
    pub fn new(dry_run: bool) -> Self {
        Self { dry_run }
    }

    pub fn is_dry_run(&self) -> bool {
        self.dry_run
    }

    /// Remove one reference from one descriptor.
    pub fn remove_reference(&self, descriptor_path: &Path, reference_name: &str) -> FixResult {
        let batch = FileBatch {
            path: descriptor_path.to_path_buf(),
            removals: vec![(0, reference_name.to_string())],
        };
        self.apply_batch(&batch)
            .pop()
            .map(|(_, result)| result)
            .unwrap_or_else(|| {
                FixResult::failed(
                    "No removal was performed",
                    Some(descriptor_path.to_path_buf()),
                    Some(reference_name.to_string()),
                )
            })
    }

    /// Fix every eligible violation; results follow the order of `violations`.
    pub fn fix_violations(&self, violations: &[Violation], modules: &[ModuleInfo]) -> Vec<FixResult> {
        let mut results: Vec<Option<FixResult>> = vec![None; violations.len()];
        let mut batches: Vec<FileBatch> = Vec::new();

        for (slot, violation) in violations.iter().enumerate() {
            let descriptor = find_descriptor(&violation.project_name, modules);

            let target = match fixable_target(violation) {
                Some(target) => target,
                None => {
                    results[slot] = Some(FixResult::failed(
                        format!(
                            "Violation '{}' cannot be automatically fixed; manual intervention is required",
                            violation.rule_id
                        ),
                        descriptor.map(Path::to_path_buf),
                        violation.offending_reference.clone(),
                    ));
                    continue;
                }
            };

            let Some(path) = descriptor else {
                results[slot] = Some(FixResult::failed(
                    format!("Could not find project file for '{}'", violation.project_name),
                    None,
                    Some(target.to_string()),
                ));
                continue;
            };

            match batches.iter_mut().find(|batch| batch.path == path) {
                Some(batch) => batch.removals.push((slot, target.to_string())),
                None => batches.push(FileBatch {
                    path: path.to_path_buf(),
                    removals: vec![(slot, target.to_string())],
                }),
            }
        }

        for batch in &batches {
            for (slot, result) in self.apply_batch(batch) {
                results[slot] = Some(result);
            }
        }

        results
            .into_iter()
            .flatten()
            .inspect(|result| {
                if !result.success {
                    warn!("{}", result.message);
                }
            })
            .collect()
    }

    /// One read, all removals in memory, at most one write.
    fn apply_batch(&self, batch: &FileBatch) -> Vec<(usize, FixResult)> {
        let path = batch.path.as_path();
        let file_name = display_name(path);
        let fail_all = |message: String| -> Vec<(usize, FixResult)> {
            batch
                .removals
                .iter()
                .map(|(slot, name)| {
                    (
                        *slot,
                        FixResult::failed(message.clone(), Some(path.to_path_buf()), Some(name.clone())),
                    )
                })
                .collect()
        };

        if !path.is_file() {
            return fail_all(format!("Project file not found: {}", path.display()));
        }

        let mut document = match DescriptorDocument::load(path) {
            Ok(document) => document,
            Err(e) => return fail_all(format!("Failed to fix project file: {}", e)),
        };

        let mut outcomes: Vec<(usize, String, Result<(), String>)> = Vec::with_capacity(batch.removals.len());
        for (slot, name) in &batch.removals {
            // Dry runs edit the in-memory copy too, so previews match a real run.
            let outcome = match document.remove_reference(name) {
                Ok(true) => Ok(()),
                Ok(false) => Err(format!("Reference to '{}' not found in project file", name)),
                Err(e) => Err(format!("Failed to fix project file: {}", e)),
            };
            outcomes.push((*slot, name.clone(), outcome));
        }

        let mut save_error: Option<String> = None;
        if !self.dry_run && document.is_modified() {
            let saved = document
                .prune_empty_groups()
                .and_then(|pruned| {
                    if pruned > 0 {
                        debug!("Pruned {} empty item group(s) from {}", pruned, path.display());
                    }
                    document.save()
                });
            match saved {
                Ok(()) => info!("Updated {}", path.display()),
                Err(e) => save_error = Some(format!("Failed to save project file: {}", e)),
            }
        }

        outcomes
            .into_iter()
            .map(|(slot, name, outcome)| {
                let failure = match outcome {
                    Err(message) => Some(message),
                    Ok(()) => save_error.clone(),
                };
                let result = match failure {
                    Some(message) => {
                        FixResult::failed(message, Some(path.to_path_buf()), Some(name))
                    }
                    None if self.dry_run => FixResult {
                        success: true,
                        message: format!("[DRY RUN] Would remove reference to '{}' from {}", name, file_name),
                        descriptor_path: Some(path.to_path_buf()),
                        reference: Some(name),
                        changed: false,
                    },
                    None => FixResult {
                        success: true,
                        message: format!("Successfully removed reference to '{}' from {}", name, file_name),
                        descriptor_path: Some(path.to_path_buf()),
                        reference: Some(name),
                        changed: true,
                    },
                };
                (slot, result)
            })
            .collect()
    }
}

/// Target of an auto-fixable error violation.
fn fixable_target(violation: &Violation) -> Option<&str> {
    if !violation.auto_fixable || violation.severity != Severity::Error {
        return None;
    }
    violation
        .offending_reference
        .as_deref()
        .filter(|name| !name.trim().is_empty())
}

fn find_descriptor<'a>(project_name: &str, modules: &'a [ModuleInfo]) -> Option<&'a Path> {
    modules
        .iter()
        .find(|m| m.name().eq_ignore_ascii_case(project_name))
        .map(|m| m.project.descriptor_path.as_path())
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

/// Remove one reference in one call.
pub fn remove_reference(descriptor_path: &Path, reference_name: &str, dry_run: bool) -> FixResult {
    AutoFixEngine::new(dry_run).remove_reference(descriptor_path, reference_name)
}

/// Fix violations in one call.
pub fn fix_violations(violations: &[Violation], modules: &[ModuleInfo], dry_run: bool) -> Vec<FixResult> {
    AutoFixEngine::new(dry_run).fix_violations(violations, modules)
}
