//! CLI Common Utilities
//!
//! Shared initialization and context management for CLI commands.

use std::path::{Path, PathBuf};

use crate::config::{Config, ConfigLoader};
use crate::coord::{AcquirePolicy, ModelBalancer, RateLimiter};
use crate::detect::{PathList, TestScanner};
use crate::docs::DocMerger;
use crate::failure::FailureIdentifier;
use crate::storage::{FileBackend, MetadataStore, SharedBackend};
use crate::types::{Result, ScribeError};

/// Command execution context
///
/// Resolves the state directory from configuration and hands out the
/// components each command works with, all sharing one backend.
#[derive(Clone)]
pub struct CommandContext {
    /// Loaded configuration
    pub config: Config,
    /// State directory (`.testscribe` unless configured otherwise)
    pub state_dir: PathBuf,
    /// Backend rooted at `state_dir`
    pub backend: SharedBackend,
}

impl CommandContext {
    /// Load configuration and require an initialized state directory
    pub fn load() -> Result<Self> {
        let config = ConfigLoader::load()?;
        let state_dir = config.state.dir.clone();
        if !state_dir.exists() {
            return Err(ScribeError::NotInitialized);
        }
        Ok(Self::with_config(config, state_dir))
    }

    pub fn with_config(config: Config, state_dir: PathBuf) -> Self {
        let backend = FileBackend::shared(&state_dir);
        Self {
            config,
            state_dir,
            backend,
        }
    }

    /// Directory discovered test paths are relative to
    pub fn project_root(&self) -> &Path {
        &self.config.discovery.root
    }

    pub fn scanner(&self) -> Result<TestScanner> {
        TestScanner::from_config(&self.config.discovery)
    }

    pub fn metadata_store(&self) -> MetadataStore {
        MetadataStore::new(self.backend.clone(), &self.config.state.metadata)
    }

    pub fn work_list(&self) -> PathList {
        PathList::new(self.backend.clone(), &self.config.state.work_list)
    }

    pub fn failed_list(&self) -> PathList {
        PathList::new(self.backend.clone(), &self.config.state.failed_list)
    }

    pub fn batch_dir(&self) -> PathBuf {
        self.config.state.resolve(&self.config.state.batch_dir)
    }

    pub fn merger(&self) -> DocMerger {
        DocMerger::new(
            self.backend.clone(),
            &self.config.state.docs,
            &self.config.state.existing_docs,
            &self.config.docs.title,
        )
    }

    pub fn failure_identifier(&self) -> FailureIdentifier {
        FailureIdentifier::new(
            self.backend.clone(),
            &self.config.state.failure_report,
            &self.config.state.failed_list,
        )
    }

    pub fn balancer(&self) -> ModelBalancer {
        ModelBalancer::from_config(self.backend.clone(), &self.config)
    }

    pub fn rate_limiter(&self) -> RateLimiter {
        RateLimiter::from_config(self.backend.clone(), &self.config)
    }

    pub fn acquire_policy(&self, max_wait_secs: Option<u64>) -> AcquirePolicy {
        AcquirePolicy::new(
            std::time::Duration::from_millis(self.config.leases.poll_interval_ms),
            std::time::Duration::from_secs(max_wait_secs.unwrap_or(self.config.leases.max_wait_secs)),
        )
    }
}

/// Print a machine-readable `key=value` line on stdout
pub fn emit(key: &str, value: impl std::fmt::Display) {
    println!("{}={}", key, value);
}

/// Check if the state directory exists
pub fn is_initialized(config: &Config) -> bool {
    config.state.dir.exists()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_context_resolves_state_paths() {
        let temp = TempDir::new().unwrap();
        let mut config = Config::default();
        config.state.dir = temp.path().join(".testscribe");

        let ctx = CommandContext::with_config(config.clone(), config.state.dir.clone());
        assert_eq!(ctx.batch_dir(), temp.path().join(".testscribe/batches"));
        assert_eq!(ctx.work_list().key(), Path::new("work-list.txt"));
        assert!(!is_initialized(&ctx.config));
    }
}
