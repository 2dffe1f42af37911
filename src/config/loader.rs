use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use super::core::GuardConfig;
use super::defaults::{create_default_configuration, DEFAULT_EXTENDS_KEYWORD};
use super::merge::{apply_profile, merge_configs};
use super::validation::validate_config;
use crate::core::{Error, Result};

/// Configuration document names probed in a directory, first hit wins.
pub const CONFIG_FILE_NAMES: [&str; 8] = [
    ".modguard.toml",
    ".modguard.yml",
    ".modguard.yaml",
    ".modguard.json",
    "modguard.toml",
    "modguard.yml",
    "modguard.yaml",
    "modguard.json",
];

/// Encodings accepted for configuration documents.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentFormat {
    Toml,
    Yaml,
    Json,
}

impl DocumentFormat {
    /// Infer the encoding from a file extension.
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "toml" => Some(Self::Toml),
            "yml" | "yaml" => Some(Self::Yaml),
            "json" => Some(Self::Json),
            _ => None,
        }
    }

    pub fn extension(self) -> &'static str {
        match self {
            Self::Toml => "toml",
            Self::Yaml => "yml",
            Self::Json => "json",
        }
    }

    /// Default document name for this encoding.
    pub fn file_name(self) -> String {
        format!(".modguard.{}", self.extension())
    }
}

/// A ready-to-use configuration with its provenance.
#[derive(Debug, Clone)]
pub struct LoadedConfiguration {
    pub config: GuardConfig,
    /// Document the configuration was read from; `None` for the built-in default
    pub source: Option<PathBuf>,
    pub warnings: Vec<String>,
}

/// Find the configuration document in `dir`.
pub fn find_config_file(dir: &Path) -> Option<PathBuf> {
    CONFIG_FILE_NAMES
        .iter()
        .map(|name| dir.join(name))
        .find(|path| path.is_file())
}

/// Discover and load the configuration for `dir`, falling back to the built-in default.
pub fn load_configuration(dir: &Path, profile: Option<&str>) -> Result<LoadedConfiguration> {
    match find_config_file(dir) {
        Some(path) => load_configuration_file(&path, profile),
        None => {
            debug!(
                "No configuration found in {}. Using default configuration.",
                dir.display()
            );
            finish(create_default_configuration(), None, profile)
        }
    }
}

/// Load an explicit configuration document, resolving its `extends` chain.
pub fn load_configuration_file(path: &Path, profile: Option<&str>) -> Result<LoadedConfiguration> {
    let mut chain = Vec::new();
    let config = resolve(path, &mut chain)?;
    finish(config, Some(path.to_path_buf()), profile)
}

fn finish(
    config: GuardConfig,
    source: Option<PathBuf>,
    profile: Option<&str>,
) -> Result<LoadedConfiguration> {
    let config = match profile {
        Some(name) => apply_profile(config, name)?,
        None => config,
    };

    let report = validate_config(&config);
    if !report.is_valid() {
        return Err(Error::InvalidConfiguration {
            path: source,
            errors: report.errors,
        });
    }

    for warning in &report.warnings {
        warn!("{}", warning);
    }

    Ok(LoadedConfiguration {
        config,
        source,
        warnings: report.warnings,
    })
}

/// Read one document and everything it extends.
///
/// `chain` holds the canonical paths currently being resolved by this load and is
/// the only cycle-detection state.
fn resolve(path: &Path, chain: &mut Vec<PathBuf>) -> Result<GuardConfig> {
    if !path.is_file() {
        return Err(Error::ConfigNotFound {
            path: path.to_path_buf(),
        });
    }
    let canonical = fs::canonicalize(path).map_err(|e| Error::io_at(e, path))?;

    if chain.contains(&canonical) {
        let mut cycle = chain.clone();
        cycle.push(canonical);
        return Err(Error::CircularExtends { chain: cycle });
    }

    let contents = read_config_file(path)?;
    let config = parse_config(&contents, path)?;
    debug!("Loaded configuration document {}", path.display());

    let Some(extends) = config.extends.clone() else {
        return Ok(config);
    };

    chain.push(canonical);
    let base = resolve_parent(&extends, path, chain);
    chain.pop();

    Ok(merge_configs(base?, config))
}

fn resolve_parent(extends: &str, child: &Path, chain: &mut Vec<PathBuf>) -> Result<GuardConfig> {
    let extends = extends.trim();
    if extends.eq_ignore_ascii_case(DEFAULT_EXTENDS_KEYWORD) {
        return Ok(create_default_configuration());
    }

    let target = Path::new(extends);
    let parent_path = if target.is_absolute() {
        target.to_path_buf()
    } else {
        child
            .parent()
            .map(|dir| dir.join(target))
            .unwrap_or_else(|| target.to_path_buf())
    };

    debug!(
        "{} extends {}",
        child.display(),
        parent_path.display()
    );
    resolve(&parent_path, chain)
}

pub(crate) fn read_config_file(path: &Path) -> Result<String> {
    fs::read_to_string(path).map_err(|e| Error::io_at(e, path))
}

/// Parse a document, choosing the decoder from the file extension.
pub fn parse_config(contents: &str, path: &Path) -> Result<GuardConfig> {
    let format = DocumentFormat::from_path(path).ok_or_else(|| Error::UnsupportedConfigFormat {
        path: path.to_path_buf(),
    })?;

    let parsed = match format {
        DocumentFormat::Toml => toml::from_str(contents).map_err(|e| e.to_string()),
        DocumentFormat::Yaml => serde_yaml::from_str(contents).map_err(|e| e.to_string()),
        DocumentFormat::Json => serde_json::from_str(contents).map_err(|e| e.to_string()),
    };

    parsed.map_err(|message| Error::ConfigParse {
        path: path.to_path_buf(),
        message,
    })
}

/// Render a configuration in the requested encoding.
pub fn render_config(config: &GuardConfig, format: DocumentFormat) -> Result<String> {
    let rendered = match format {
        DocumentFormat::Toml => toml::to_string_pretty(config).map_err(|e| e.to_string()),
        DocumentFormat::Yaml => serde_yaml::to_string(config).map_err(|e| e.to_string()),
        DocumentFormat::Json => return Ok(serde_json::to_string_pretty(config)?),
    };
    rendered.map_err(|message| Error::ConfigParse {
        path: PathBuf::from(format.file_name()),
        message,
    })
}
