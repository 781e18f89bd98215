//! Init Command
//!
//! Create the state directory and project configuration in the current
//! directory.

use crate::config::ConfigLoader;
use crate::constants::state;
use crate::types::{Result, ScribeError};

pub fn run(force: bool) -> Result<()> {
    if ConfigLoader::is_project_initialized() && !force {
        return Err(ScribeError::Config(
            "Already initialized. Use --force to overwrite.".to_string(),
        ));
    }

    ConfigLoader::init_project(force)?;

    // Global defaults are optional; never overwrite them here
    if let Err(e) = ConfigLoader::init_global(false) {
        tracing::debug!("Global config init skipped: {}", e);
    }

    eprintln!("✓ Initialized testscribe in {}/", state::DIR);
    eprintln!();
    eprintln!("Next steps:");
    eprintln!("  1. testscribe detect          # build the work list");
    eprintln!("  2. run documentation batches into {}/{}/", state::DIR, state::BATCH_DIR);
    eprintln!("  3. testscribe merge && testscribe failures && testscribe metadata update");

    Ok(())
}
