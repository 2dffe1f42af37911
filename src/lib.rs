// Export modules for library usage
pub mod classify;
pub mod cli;
pub mod commands;
pub mod config;
pub mod core;
pub mod descriptor;
pub mod fix;
pub mod io;
pub mod observability;
pub mod optimizer;
pub mod patterns;
pub mod pipeline;
pub mod rules;
pub mod watch;

// Re-export commonly used types
pub use crate::core::{
    Error, FixResult, ModuleInfo, OptimizationResult, ProjectInfo, ProjectReference,
    ReferenceReason, Result, Severity, SourceLocation, UnnecessaryReference, Violation,
};

pub use crate::config::{
    create_default_configuration, load_configuration, load_configuration_file, GuardConfig,
    LoadedConfiguration,
};

pub use crate::classify::{Classification, Classifier};

pub use crate::rules::{validate_all, RuleEngine, ValidationSummary};

pub use crate::optimizer::{analyze_optimizations, ReferenceOptimizer, UsageScanner, UsageSource};

pub use crate::fix::{fix_violations, remove_reference, AutoFixEngine};

pub use crate::descriptor::{discover_descriptors, DescriptorLoader, ProjectFileLoader};

pub use crate::pipeline::{load_workspace, Workspace};

pub use crate::io::output::{create_writer, OutputWriter};
