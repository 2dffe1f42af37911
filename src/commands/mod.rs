//! CLI command implementations.
//!
//! Available commands:
//! - **check**: validate references against the dependency rules
//! - **fix**: remove references that violate the rules
//! - **optimize**: report transitive and unused references
//! - **watch**: revalidate on every project or configuration change
//! - **init**: write the built-in configuration
//!
//! Every handler returns the process exit code: 0 when nothing error-level was
//! found, 1 otherwise. Fatal configuration and load problems surface as errors.

pub mod check;
pub mod fix;
pub mod init;
pub mod optimize;
pub mod watch;

use anyhow::{Context, Result};
use std::path::PathBuf;

use crate::cli::{CommonArgs, Commands};
use crate::config::{load_configuration, load_configuration_file, LoadedConfiguration};

pub const EXIT_SUCCESS: i32 = 0;
pub const EXIT_FAILURE: i32 = 1;

pub fn dispatch(command: Commands) -> Result<i32> {
    match command {
        Commands::Check { common } => check::run(&common),
        Commands::Fix { common, dry_run } => fix::run(&common, dry_run),
        Commands::Optimize { common } => optimize::run(&common),
        Commands::Watch { common } => watch::run(&common),
        Commands::Init { format, force } => {
            init::init_config(format.into(), force)?;
            Ok(EXIT_SUCCESS)
        }
    }
}

/// Absolute path of the directory to scan.
pub(crate) fn resolve_root(common: &CommonArgs) -> Result<PathBuf> {
    if !common.path.is_dir() {
        anyhow::bail!("Directory not found: {}", common.path.display());
    }
    common
        .path
        .canonicalize()
        .with_context(|| format!("Failed to resolve {}", common.path.display()))
}

/// Load the configuration named by `--config`, or discover one in `root`.
pub(crate) fn load_config(common: &CommonArgs, root: &std::path::Path) -> Result<LoadedConfiguration> {
    let profile = common.profile.as_deref();
    let loaded = match &common.config {
        Some(path) => load_configuration_file(path, profile),
        None => load_configuration(root, profile),
    };
    loaded.context("Failed to load configuration")
}
