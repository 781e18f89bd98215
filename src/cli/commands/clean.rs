//! Clean Command
//!
//! Clears run artifacts, leases or the whole state directory.

use crate::cli::ui::Output;
use crate::cli::util::CommandContext;
use crate::types::{Result, ResultExt};

#[derive(Debug, Clone, Copy, Default)]
pub struct CleanOptions {
    /// Remove the whole state directory
    pub all: bool,
    /// Remove batch result files
    pub batches: bool,
    /// Remove lease tables
    pub leases: bool,
    /// Remove the work list, failed list and failure report
    pub run: bool,
}

/// Returns the number of artifacts removed
pub async fn clean(ctx: &CommandContext, options: CleanOptions) -> Result<usize> {
    if options.all {
        if ctx.state_dir.exists() {
            tokio::fs::remove_dir_all(&ctx.state_dir)
                .await
                .with_context_fn(|| format!("removing {}", ctx.state_dir.display()))?;
            return Ok(1);
        }
        return Ok(0);
    }

    let mut removed = 0;
    let state = &ctx.config.state;

    if options.batches {
        let dir = ctx.batch_dir();
        if dir.exists() {
            let mut entries = tokio::fs::read_dir(&dir).await?;
            while let Some(entry) = entries.next_entry().await? {
                if entry.file_type().await?.is_file() {
                    tokio::fs::remove_file(entry.path()).await?;
                    removed += 1;
                }
            }
        }
    }

    let mut keys = Vec::new();
    if options.leases {
        keys.extend([&state.model_leases, &state.provider_leases]);
    }
    if options.run {
        keys.extend([&state.work_list, &state.failed_list, &state.failure_report]);
    }
    for key in keys {
        if ctx.backend.remove(key).await? {
            removed += 1;
        }
    }

    Ok(removed)
}

pub async fn run(options: CleanOptions) -> Result<()> {
    let ctx = CommandContext::load()?;
    let out = Output::new();

    if !(options.all || options.batches || options.leases || options.run) {
        out.info("Nothing selected. Use --all, --batches, --leases or --run.");
        return Ok(());
    }

    let removed = clean(&ctx, options).await?;
    if options.all {
        out.success(&format!("Removed {}/", ctx.state_dir.display()));
    } else if removed > 0 {
        out.success(&format!("Removed {} artifacts", removed));
    } else {
        out.info("Nothing to remove");
    }
    Ok(())
}
