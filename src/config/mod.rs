//! Configuration model, inheritance, profiles and validation.
//!
//! A configuration is resolved once per run:
//!
//! ```text
//! read document -> resolve `extends` recursively -> merge child over base
//!               -> apply profile (optional) -> validate -> ready
//! ```
//!
//! Nothing is cached between runs; watch mode reloads on every revalidation.

mod core;
mod defaults;
mod loader;
mod merge;
pub mod validation;

pub use self::core::{
    ConfigProfile, DependencyRule, GuardConfig, InheritMode, ModuleConfig, ProjectPattern,
    SeverityOverride, SharedConfig,
};
pub use defaults::{create_default_configuration, DEFAULT_EXTENDS_KEYWORD};
pub use loader::{
    find_config_file, load_configuration, load_configuration_file, parse_config, render_config,
    DocumentFormat, LoadedConfiguration, CONFIG_FILE_NAMES,
};
pub use merge::{apply_profile, merge_configs, merge_rule};
pub use validation::{validate_config, ConfigReport};
