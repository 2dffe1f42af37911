use crate::config::{create_default_configuration, render_config, DocumentFormat};
use crate::io;
use anyhow::Result;
use std::path::{Path, PathBuf};

pub fn init_config(format: DocumentFormat, force: bool) -> Result<()> {
    let config_path = PathBuf::from(format.file_name());
    write_default_config(&config_path, format, force)?;
    println!("Created {} configuration file", config_path.display());
    Ok(())
}

/// Render the built-in configuration to `path`.
pub fn write_default_config(path: &Path, format: DocumentFormat, force: bool) -> Result<()> {
    if path.exists() && !force {
        anyhow::bail!("Configuration file already exists. Use --force to overwrite.");
    }

    let contents = render_config(&create_default_configuration(), format)?;
    io::write_file(path, &contents)?;
    Ok(())
}
