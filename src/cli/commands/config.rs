//! Config Command
//!
//! Usage:
//!   testscribe config show [-g] [-f toml|json|yaml]
//!   testscribe config path
//!   testscribe config init [-g] [--force]

use crate::config::{ConfigFormat, ConfigLoader};
use crate::types::{Result, ScribeError};

/// Show configuration
pub fn show(global: bool, format: &str) -> Result<()> {
    let format: ConfigFormat = format.parse().map_err(ScribeError::usage)?;

    if global {
        let Some(global_path) = ConfigLoader::global_config_path() else {
            eprintln!("Cannot determine global config directory.");
            return Ok(());
        };
        if !global_path.exists() {
            eprintln!("No global config found.");
            eprintln!("Run 'testscribe config init --global' to create one.");
            return Ok(());
        }
        let config = ConfigLoader::load_from_file(&global_path)?;
        eprintln!("# Global Config: {}", global_path.display());
        println!("{}", ConfigLoader::render(&config, format)?);
    } else {
        // Merged effective config
        let config = ConfigLoader::load()?;
        println!("{}", ConfigLoader::render(&config, format)?);
    }
    Ok(())
}

/// Show configuration paths
pub fn path() -> Result<()> {
    ConfigLoader::show_path();
    Ok(())
}

/// Initialize global configuration
pub fn init_global(force: bool) -> Result<()> {
    let dir = ConfigLoader::init_global(force)?;
    eprintln!("✓ Initialized global configuration");
    eprintln!("  Directory: {}", dir.display());
    if let Some(config_path) = ConfigLoader::global_config_path() {
        eprintln!("  Config:    {}", config_path.display());
    }
    Ok(())
}

/// Initialize project configuration
pub fn init_project(force: bool) -> Result<()> {
    let dir = ConfigLoader::init_project(force)?;
    eprintln!("✓ Initialized project configuration");
    eprintln!("  Directory: {}", dir.display());
    eprintln!(
        "  Config:    {}",
        ConfigLoader::project_config_path().display()
    );
    Ok(())
}
