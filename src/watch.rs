//! Continuous revalidation on descriptor and configuration changes.
//!
//! Changes are detected by polling modification times. Bursts of notifications
//! are absorbed by a settle delay, revalidations are serialised through a single
//! gate, and a shared cancellation flag stops the loop between polls.

use std::collections::{BTreeSet, HashMap};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant, SystemTime};

use chrono::{DateTime, Local};
use parking_lot::Mutex;
use tracing::{debug, info_span, trace};
use walkdir::WalkDir;

use crate::config::{load_configuration, load_configuration_file, CONFIG_FILE_NAMES};
use crate::core::{Result, Violation};
use crate::descriptor::{ProjectFileLoader, DESCRIPTOR_EXTENSION};
use crate::pipeline::{load_workspace, LoadFailure};
use crate::rules::{validate_all, ValidationSummary};

/// Default pause between a detected change and the revalidation it triggers.
pub const DEFAULT_SETTLE_DELAY: Duration = Duration::from_millis(100);

/// Default pause between two polls when nothing changed.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(250);

/// Longest uninterrupted sleep; bounds how late a cancellation is noticed.
const SLEEP_SLICE: Duration = Duration::from_millis(25);

const SKIPPED_DIRECTORIES: [&str; 4] = ["bin", "obj", ".git", "node_modules"];

/// Shared stop signal for a watch loop.
#[derive(Debug, Clone, Default)]
pub struct CancellationFlag(Arc<AtomicBool>);

impl CancellationFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Something that reports which watched files changed since the last call.
pub trait ChangeSource {
    fn poll(&mut self) -> Vec<PathBuf>;
}

/// Compares modification-time snapshots of descriptors and configuration documents.
pub struct PollingChangeSource {
    root: PathBuf,
    snapshot: HashMap<PathBuf, Option<SystemTime>>,
}

impl PollingChangeSource {
    /// Take the initial snapshot; files present now are not reported as changed.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        let snapshot = take_snapshot(&root);
        debug!("Watching {} file(s) under {}", snapshot.len(), root.display());
        Self { root, snapshot }
    }

    pub fn watched_files(&self) -> usize {
        self.snapshot.len()
    }
}

impl ChangeSource for PollingChangeSource {
    fn poll(&mut self) -> Vec<PathBuf> {
        let current = take_snapshot(&self.root);
        let mut changed: BTreeSet<PathBuf> = BTreeSet::new();

        for (path, modified) in &current {
            if self.snapshot.get(path) != Some(modified) {
                changed.insert(path.clone());
            }
        }
        for path in self.snapshot.keys() {
            if !current.contains_key(path) {
                changed.insert(path.clone());
            }
        }

        self.snapshot = current;
        changed.into_iter().collect()
    }
}

fn take_snapshot(root: &Path) -> HashMap<PathBuf, Option<SystemTime>> {
    WalkDir::new(root)
        .into_iter()
        .filter_entry(|entry| {
            entry.depth() == 0
                || !entry.file_type().is_dir()
                || !SKIPPED_DIRECTORIES
                    .iter()
                    .any(|skip| entry.file_name().eq_ignore_ascii_case(skip))
        })
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().is_file() && is_watched(entry.path()))
        .map(|entry| {
            let modified = entry.metadata().ok().and_then(|m| m.modified().ok());
            (entry.into_path(), modified)
        })
        .collect()
}

fn is_watched(path: &Path) -> bool {
    let descriptor = path
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case(DESCRIPTOR_EXTENSION));
    let config = path
        .file_name()
        .and_then(|name| name.to_str())
        .is_some_and(|name| CONFIG_FILE_NAMES.contains(&name));
    descriptor || config
}

/// Drives a [`ChangeSource`] and runs one revalidation per settled burst.
pub struct WatchSession<S: ChangeSource> {
    source: Mutex<S>,
    gate: Mutex<()>,
    cancel: CancellationFlag,
    settle_delay: Duration,
    poll_interval: Duration,
}

impl<S: ChangeSource> WatchSession<S> {
    pub fn new(source: S, cancel: CancellationFlag) -> Self {
        Self {
            source: Mutex::new(source),
            gate: Mutex::new(()),
            cancel,
            settle_delay: DEFAULT_SETTLE_DELAY,
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }

    pub fn with_settle_delay(mut self, delay: Duration) -> Self {
        self.settle_delay = delay;
        self
    }

    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// Run a revalidation while holding the gate, so runs never interleave.
    pub fn revalidate_now<R>(&self, changes: &[PathBuf], revalidate: impl FnOnce(&[PathBuf]) -> R) -> R {
        let _gate = self.gate.lock();
        revalidate(changes)
    }

    /// Poll until cancelled; returns the number of revalidations performed.
    pub fn run<F>(&self, mut revalidate: F) -> usize
    where
        F: FnMut(&[PathBuf]),
    {
        let mut runs = 0;
        while !self.cancel.is_cancelled() {
            let first = self.source.lock().poll();
            if first.is_empty() {
                self.sleep(self.poll_interval);
                continue;
            }

            self.sleep(self.settle_delay);
            let changes = self.drain(first);

            if self.cancel.is_cancelled() {
                break;
            }
            trace!("Revalidating after {} change(s)", changes.len());
            self.revalidate_now(&changes, &mut revalidate);
            runs += 1;
        }
        runs
    }

    /// Fold notifications queued during the settle delay into one batch.
    fn drain(&self, first: Vec<PathBuf>) -> Vec<PathBuf> {
        let mut changes: BTreeSet<PathBuf> = first.into_iter().collect();
        let mut source = self.source.lock();
        loop {
            let more = source.poll();
            if more.is_empty() {
                break;
            }
            changes.extend(more);
        }
        changes.into_iter().collect()
    }

    fn sleep(&self, duration: Duration) {
        let deadline = Instant::now() + duration;
        loop {
            if self.cancel.is_cancelled() {
                return;
            }
            let now = Instant::now();
            if now >= deadline {
                return;
            }
            thread::sleep((deadline - now).min(SLEEP_SLICE));
        }
    }
}

/// Outcome of one revalidation pass.
#[derive(Debug, Clone)]
pub struct RevalidationReport {
    pub timestamp: DateTime<Local>,
    pub projects: usize,
    pub violations: Vec<Violation>,
    pub failures: Vec<LoadFailure>,
    pub summary: ValidationSummary,
}

impl RevalidationReport {
    /// One-line summary, e.g. `[14:02:11] 12 project(s): 1 error(s), 0 warning(s), 2 info`.
    pub fn summary_line(&self) -> String {
        format!(
            "[{}] {} project(s): {} error(s), {} warning(s), {} info",
            self.timestamp.format("%H:%M:%S"),
            self.projects,
            self.summary.errors,
            self.summary.warnings,
            self.summary.infos
        )
    }
}

/// Reload configuration and classification from disk, then validate.
pub fn revalidate(root: &Path, config_file: Option<&Path>, profile: Option<&str>) -> Result<RevalidationReport> {
    let _span = info_span!("revalidate").entered();

    let loaded = match config_file {
        Some(path) => load_configuration_file(path, profile)?,
        None => load_configuration(root, profile)?,
    };
    let workspace = load_workspace(root, &loaded.config, &ProjectFileLoader::new());
    let violations = validate_all(&loaded.config, &workspace.modules);

    Ok(RevalidationReport {
        timestamp: Local::now(),
        projects: workspace.modules.len(),
        summary: ValidationSummary::from_violations(&violations),
        violations,
        failures: workspace.failures,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;
    use std::fs;
    use tempfile::TempDir;

    struct Scripted {
        batches: VecDeque<Vec<PathBuf>>,
    }

    impl Scripted {
        fn new(batches: Vec<Vec<&str>>) -> Self {
            Self {
                batches: batches
                    .into_iter()
                    .map(|batch| batch.into_iter().map(PathBuf::from).collect())
                    .collect(),
            }
        }
    }

    impl ChangeSource for Scripted {
        fn poll(&mut self) -> Vec<PathBuf> {
            self.batches.pop_front().unwrap_or_default()
        }
    }

    fn session(source: Scripted, cancel: &CancellationFlag) -> WatchSession<Scripted> {
        WatchSession::new(source, cancel.clone())
            .with_settle_delay(Duration::from_millis(1))
            .with_poll_interval(Duration::from_millis(1))
    }

    #[test]
    fn test_burst_collapses_into_one_revalidation() {
        let cancel = CancellationFlag::new();
        let session = session(Scripted::new(vec![vec!["b.csproj"], vec!["a.csproj"], vec!["b.csproj"]]), &cancel);

        let mut seen = Vec::new();
        let runs = session.run(|changes| {
            seen.push(changes.to_vec());
            cancel.cancel();
        });

        assert_eq!(runs, 1);
        assert_eq!(seen, vec![vec![PathBuf::from("a.csproj"), PathBuf::from("b.csproj")]]);
    }

    #[test]
    fn test_separate_bursts_revalidate_separately() {
        let cancel = CancellationFlag::new();
        let session = session(
            Scripted::new(vec![vec!["a.csproj"], vec![], vec![], vec!["b.csproj"]]),
            &cancel,
        );

        let mut runs_seen = 0;
        let runs = session.run(|_| {
            runs_seen += 1;
            if runs_seen == 2 {
                cancel.cancel();
            }
        });
        assert_eq!(runs, 2);
    }

    #[test]
    fn test_cancelled_session_never_revalidates() {
        let cancel = CancellationFlag::new();
        cancel.cancel();
        let session = session(Scripted::new(vec![vec!["a.csproj"]]), &cancel);
        assert_eq!(session.run(|_| panic!("must not run")), 0);
    }

    #[test]
    fn test_polling_reports_created_modified_and_removed_files() {
        let dir = TempDir::new().unwrap();
        let existing = dir.path().join("A.csproj");
        fs::write(&existing, "<Project/>").unwrap();
        fs::write(dir.path().join("notes.txt"), "ignored").unwrap();

        let mut source = PollingChangeSource::new(dir.path());
        assert_eq!(source.watched_files(), 1);
        assert!(source.poll().is_empty());

        let config = dir.path().join(".modguard.toml");
        fs::write(&config, "").unwrap();
        fs::write(dir.path().join("notes.txt"), "still ignored").unwrap();
        assert_eq!(source.poll(), vec![config.clone()]);

        let file = fs::File::options().write(true).open(&existing).unwrap();
        file.set_modified(SystemTime::now() + Duration::from_secs(10)).unwrap();
        drop(file);
        assert_eq!(source.poll(), vec![existing.clone()]);

        fs::remove_file(&existing).unwrap();
        assert_eq!(source.poll(), vec![existing]);
    }

    #[test]
    fn test_build_output_directories_are_not_watched() {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join("A/obj")).unwrap();
        fs::write(dir.path().join("A/obj/A.csproj"), "<Project/>").unwrap();
        fs::write(dir.path().join("A/A.csproj"), "<Project/>").unwrap();
        assert_eq!(PollingChangeSource::new(dir.path()).watched_files(), 1);
    }

    #[test]
    fn test_revalidate_reads_current_disk_state() {
        let dir = TempDir::new().unwrap();
        let core = dir.path().join("Orders.Core");
        fs::create_dir_all(&core).unwrap();
        fs::write(
            core.join("Orders.Core.csproj"),
            r#"<Project><ItemGroup><ProjectReference Include="..\Orders.Infrastructure\Orders.Infrastructure.csproj" /></ItemGroup></Project>"#,
        )
        .unwrap();
        let infrastructure = dir.path().join("Orders.Infrastructure");
        fs::create_dir_all(&infrastructure).unwrap();
        fs::write(infrastructure.join("Orders.Infrastructure.csproj"), "<Project/>").unwrap();

        let report = revalidate(dir.path(), None, None).unwrap();
        assert_eq!(report.projects, 2);
        assert_eq!(report.summary.errors, 1);
        assert!(report.summary_line().contains("2 project(s): 1 error(s)"));

        fs::write(dir.path().join(".modguard.toml"), "extends = \"missing.toml\"").unwrap();
        assert!(revalidate(dir.path(), None, None).is_err());
    }
}
