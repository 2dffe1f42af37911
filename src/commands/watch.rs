use anyhow::{Context, Result};
use colored::*;
use std::future::Future;
use std::path::{Path, PathBuf};
use std::thread;
use tracing::{debug, warn};

use super::{load_config, resolve_root, EXIT_FAILURE, EXIT_SUCCESS};
use crate::cli::CommonArgs;
use crate::io::{create_writer, CheckReport};
use crate::watch::{revalidate, CancellationFlag, PollingChangeSource, WatchSession};

pub fn run(common: &CommonArgs) -> Result<i32> {
    let root = resolve_root(common)?;

    // Fail fast on a broken configuration before entering the loop.
    let loaded = load_config(common, &root)?;
    if !common.quiet {
        let source = match &loaded.source {
            Some(path) => format!("Found configuration file {}", path.display()),
            None => "Using default configuration".to_string(),
        };
        println!("{}", source.dimmed());
        println!("{}", "Starting watch mode...".cyan());
        println!("{}", "Press Ctrl+C to exit".dimmed());
        println!();
    }

    let cancel = CancellationFlag::new();
    install_ctrl_c_handler(cancel.clone())?;

    let mut last_exit = run_once(common, &root, &[]);

    let session = WatchSession::new(PollingChangeSource::new(&root), cancel);
    if !common.quiet {
        println!("{}", "✓ Watching for .csproj changes...".green());
        println!();
    }

    session.run(|changes| {
        last_exit = run_once(common, &root, changes);
    });

    if !common.quiet {
        println!();
        println!("{}", "Watch mode stopped.".yellow());
    }
    Ok(last_exit)
}

/// One revalidation; configuration errors are reported and the loop keeps going.
fn run_once(common: &CommonArgs, root: &Path, changes: &[PathBuf]) -> i32 {
    if !common.quiet {
        for path in changes {
            let shown = pathdiff::diff_paths(path, root).unwrap_or_else(|| path.clone());
            let marker = if path.exists() {
                "⟳ Changed:".yellow()
            } else {
                "✗ Deleted:".red()
            };
            println!("{} {}", marker, shown.display());
        }
    }

    let report = match revalidate(root, common.config.as_deref(), common.profile.as_deref()) {
        Ok(report) => report,
        Err(e) => {
            println!("{} {}", "Error:".red(), e);
            return EXIT_FAILURE;
        }
    };

    println!("{}", format!("── {}", report.summary_line()).dimmed());

    if !report.violations.is_empty() || !report.failures.is_empty() {
        let check = CheckReport::new(root, &[], report.violations.clone(), report.failures.clone());
        match create_writer(common.format, None, true) {
            Ok(mut writer) => {
                if let Err(e) = writer.write_check(&check) {
                    warn!("Failed to write report: {}", e);
                }
            }
            Err(e) => warn!("Failed to create report writer: {}", e),
        }
    }

    if report.summary.has_errors() {
        EXIT_FAILURE
    } else {
        EXIT_SUCCESS
    }
}

/// Set `cancel` on Ctrl+C from a dedicated single-threaded runtime.
fn install_ctrl_c_handler(cancel: CancellationFlag) -> Result<()> {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("Failed to start signal handler runtime")?;

    thread::Builder::new()
        .name("modguard-signal".into())
        .spawn(move || runtime.block_on(cancel_on_interrupt(tokio::signal::ctrl_c(), &cancel)))
        .context("Failed to spawn signal handler thread")?;
    Ok(())
}

/// Cancel once `interrupt` fires. A listener that fails leaves the session running.
async fn cancel_on_interrupt<F>(interrupt: F, cancel: &CancellationFlag)
where
    F: Future<Output = std::io::Result<()>>,
{
    match interrupt.await {
        Ok(()) => {
            debug!("Interrupt received");
            cancel.cancel();
        }
        Err(e) => warn!("Failed to listen for Ctrl+C: {}", e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::future::ready;
    use std::io;

    fn block_on<F: Future>(future: F) -> F::Output {
        tokio::runtime::Builder::new_current_thread()
            .build()
            .unwrap()
            .block_on(future)
    }

    #[test]
    fn test_interrupt_cancels_session() {
        let cancel = CancellationFlag::new();
        block_on(cancel_on_interrupt(ready(Ok(())), &cancel));
        assert!(cancel.is_cancelled());
    }

    #[test]
    fn test_failed_listener_keeps_session_running() {
        let cancel = CancellationFlag::new();
        let failure = ready(Err(io::Error::new(io::ErrorKind::Other, "no signal support")));
        block_on(cancel_on_interrupt(failure, &cancel));
        assert!(!cancel.is_cancelled());
    }
}
