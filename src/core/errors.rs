//! Shared error types for the library

use std::path::{Path, PathBuf};
use thiserror::Error;

/// Main error type for modguard operations
#[derive(Debug, Error)]
pub enum Error {
    /// A configuration document (or an `extends` target) does not exist
    #[error("Configuration file not found: {}", .path.display())]
    ConfigNotFound { path: PathBuf },

    /// A configuration document could not be deserialized
    #[error("Failed to parse configuration file '{}': {message}", .path.display())]
    ConfigParse { path: PathBuf, message: String },

    /// The configuration document has an extension we cannot parse
    #[error("Unsupported configuration file format: {}", .path.display())]
    UnsupportedConfigFormat { path: PathBuf },

    /// The `extends` chain loops back onto a file that is still being resolved
    #[error("Circular configuration dependency detected: {}", format_chain(.chain))]
    CircularExtends { chain: Vec<PathBuf> },

    /// A profile was requested that the merged configuration does not declare
    #[error(
        "Profile '{name}' not found in configuration. Available profiles: {}",
        format_available(.available)
    )]
    UnknownProfile {
        name: String,
        available: Vec<String>,
    },

    /// The merged configuration failed validation
    #[error("Configuration {} contains errors:\n{}", format_origin(.path.as_deref()), format_items(.errors))]
    InvalidConfiguration {
        path: Option<PathBuf>,
        errors: Vec<String>,
    },

    /// A project descriptor could not be read or understood
    #[error("Failed to load project {}: {message}", .path.display())]
    ProjectLoad { path: PathBuf, message: String },

    /// File system related errors
    #[error("File system error: {message}")]
    FileSystem {
        message: String,
        path: Option<PathBuf>,
        #[source]
        source: Option<std::io::Error>,
    },

    /// IO errors
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// JSON errors
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Create a file system error with path context
    pub fn file_system(message: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self::FileSystem {
            message: message.into(),
            path: Some(path.into()),
            source: None,
        }
    }

    /// Wrap an I/O failure with the path it happened on
    pub fn io_at(source: std::io::Error, path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        Self::FileSystem {
            message: format!("{}: {}", path.display(), source),
            path: Some(path.to_path_buf()),
            source: Some(source),
        }
    }

    /// Create a project load error naming the descriptor
    pub fn project_load(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::ProjectLoad {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Whether the error belongs to the configuration class (fatal for a run)
    pub fn is_configuration_error(&self) -> bool {
        matches!(
            self,
            Self::ConfigNotFound { .. }
                | Self::ConfigParse { .. }
                | Self::UnsupportedConfigFormat { .. }
                | Self::CircularExtends { .. }
                | Self::UnknownProfile { .. }
                | Self::InvalidConfiguration { .. }
        )
    }
}

fn format_chain(chain: &[PathBuf]) -> String {
    chain
        .iter()
        .map(|p| p.display().to_string())
        .collect::<Vec<_>>()
        .join(" -> ")
}

fn format_available(available: &[String]) -> String {
    if available.is_empty() {
        "(none)".to_string()
    } else {
        available.join(", ")
    }
}

fn format_origin(path: Option<&Path>) -> String {
    match path {
        Some(path) => format!("file '{}'", path.display()),
        None => "(built-in)".to_string(),
    }
}

fn format_items(items: &[String]) -> String {
    items
        .iter()
        .map(|item| format!("  - {}", item))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Result type alias using our error type
pub type Result<T> = std::result::Result<T, Error>;
