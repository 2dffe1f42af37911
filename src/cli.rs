use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use crate::config::DocumentFormat;

#[derive(Parser, Debug)]
#[command(name = "modguard")]
#[command(about = "Architectural dependency guard for modular monoliths", long_about = None)]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Validate project references against the configured dependency rules
    Check {
        #[command(flatten)]
        common: CommonArgs,
    },

    /// Remove references that violate dependency rules
    Fix {
        #[command(flatten)]
        common: CommonArgs,

        /// Show what would be removed without modifying any file
        #[arg(long = "dry-run")]
        dry_run: bool,
    },

    /// Find transitive and unused project references
    Optimize {
        #[command(flatten)]
        common: CommonArgs,
    },

    /// Revalidate whenever a project file or configuration changes
    Watch {
        #[command(flatten)]
        common: CommonArgs,
    },

    /// Write the built-in configuration to the current directory
    Init {
        /// Configuration document format
        #[arg(short, long, value_enum, default_value = "toml")]
        format: ConfigFormat,

        /// Overwrite an existing configuration file
        #[arg(long)]
        force: bool,
    },
}

impl Commands {
    pub fn verbosity(&self) -> u8 {
        match self {
            Commands::Check { common }
            | Commands::Fix { common, .. }
            | Commands::Optimize { common }
            | Commands::Watch { common } => common.verbosity,
            Commands::Init { .. } => 0,
        }
    }
}

/// Flags shared by every command that inspects a directory.
#[derive(Args, Debug, Clone)]
pub struct CommonArgs {
    /// Directory to scan for project files
    #[arg(default_value = ".")]
    pub path: PathBuf,

    /// Configuration file (defaults to discovery in PATH)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Configuration profile to apply
    #[arg(short, long)]
    pub profile: Option<String>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "terminal")]
    pub format: OutputFormat,

    /// Output file (defaults to stdout)
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Only print findings
    #[arg(short, long)]
    pub quiet: bool,

    /// Increase log verbosity (can be repeated: -v, -vv, -vvv)
    #[arg(short = 'v', long = "verbose", action = clap::ArgAction::Count)]
    pub verbosity: u8,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Terminal,
    Json,
    Markdown,
    Sarif,
    Csv,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ConfigFormat {
    Toml,
    #[value(alias = "yml")]
    Yaml,
    Json,
}

impl From<ConfigFormat> for DocumentFormat {
    fn from(format: ConfigFormat) -> Self {
        match format {
            ConfigFormat::Toml => DocumentFormat::Toml,
            ConfigFormat::Yaml => DocumentFormat::Yaml,
            ConfigFormat::Json => DocumentFormat::Json,
        }
    }
}
