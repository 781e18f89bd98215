//! Configuration Types
//!
//! All configuration structures with sensible defaults.
//! Supports global (~/.config/testscribe/) and project (.testscribe/) level configuration.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::constants::{discovery, docs, lease, state};

/// Root configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Configuration version
    pub version: String,

    /// Test file discovery settings
    pub discovery: DiscoveryConfig,

    /// Shared state layout
    pub state: StateConfig,

    /// Resource coordinator settings
    pub leases: LeaseConfig,

    /// Consolidated documentation settings
    pub docs: DocsConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            version: "1.0".to_string(),
            discovery: DiscoveryConfig::default(),
            state: StateConfig::default(),
            leases: LeaseConfig::default(),
            docs: DocsConfig::default(),
        }
    }
}

impl Config {
    /// Validate configuration values are within acceptable ranges.
    /// Returns `ScribeError::Config` on validation failure.
    pub fn validate(&self) -> crate::types::Result<()> {
        if self.discovery.include.is_empty() {
            return Err(crate::types::ScribeError::Config(
                "discovery.include must contain at least one pattern".to_string(),
            ));
        }

        if self.leases.model_ttl_secs == 0 {
            return Err(crate::types::ScribeError::Config(
                "leases.model_ttl_secs must be greater than 0".to_string(),
            ));
        }

        if self.leases.provider_ttl_secs == 0 {
            return Err(crate::types::ScribeError::Config(
                "leases.provider_ttl_secs must be greater than 0".to_string(),
            ));
        }

        for pattern in self
            .discovery
            .include
            .iter()
            .chain(self.discovery.exclude.iter())
        {
            glob::Pattern::new(pattern)?;
        }

        Ok(())
    }
}

// =============================================================================
// Discovery Configuration
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DiscoveryConfig {
    /// Project root to scan
    pub root: PathBuf,

    /// Glob patterns to include (relative to root)
    pub include: Vec<String>,

    /// Glob patterns to exclude (relative to root)
    pub exclude: Vec<String>,

    /// Maximum file size in bytes
    pub max_file_size: u64,
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from("."),
            include: discovery::DEFAULT_INCLUDE
                .iter()
                .map(|s| s.to_string())
                .collect(),
            exclude: discovery::DEFAULT_EXCLUDE
                .iter()
                .map(|s| s.to_string())
                .collect(),
            max_file_size: discovery::MAX_FILE_SIZE,
        }
    }
}

// =============================================================================
// State Layout Configuration
// =============================================================================

/// Where each shared artifact lives. File names are relative to `dir`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StateConfig {
    pub dir: PathBuf,
    pub metadata: PathBuf,
    pub work_list: PathBuf,
    pub batch_dir: PathBuf,
    pub docs: PathBuf,
    pub existing_docs: PathBuf,
    pub model_leases: PathBuf,
    pub provider_leases: PathBuf,
    pub failure_report: PathBuf,
    pub failed_list: PathBuf,
    pub extracted: PathBuf,
}

impl Default for StateConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from(state::DIR),
            metadata: PathBuf::from(state::METADATA_FILE),
            work_list: PathBuf::from(state::WORK_LIST_FILE),
            batch_dir: PathBuf::from(state::BATCH_DIR),
            docs: PathBuf::from(state::DOCS_FILE),
            existing_docs: PathBuf::from(state::EXISTING_DOCS_FILE),
            model_leases: PathBuf::from(state::MODEL_LEASES_FILE),
            provider_leases: PathBuf::from(state::PROVIDER_LEASES_FILE),
            failure_report: PathBuf::from(state::FAILURE_REPORT_FILE),
            failed_list: PathBuf::from(state::FAILED_LIST_FILE),
            extracted: PathBuf::from(state::EXTRACT_FILE),
        }
    }
}

impl StateConfig {
    /// Absolute-or-cwd-relative location of a state artifact
    pub fn resolve(&self, relative: &Path) -> PathBuf {
        self.dir.join(relative)
    }
}

// =============================================================================
// Lease Configuration
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LeaseConfig {
    /// Model balancer lease lifetime
    pub model_ttl_secs: u64,

    /// Provider rate-limit lease lifetime
    pub provider_ttl_secs: u64,

    /// Models in priority order
    pub models: Vec<String>,

    /// Providers in priority order
    pub providers: Vec<String>,

    /// Poll interval for `lease acquire`
    pub poll_interval_ms: u64,

    /// Maximum wait for `lease acquire`
    pub max_wait_secs: u64,
}

impl Default for LeaseConfig {
    fn default() -> Self {
        Self {
            model_ttl_secs: lease::MODEL_TTL_SECS,
            provider_ttl_secs: lease::PROVIDER_TTL_SECS,
            models: vec![
                "gpt-4o".to_string(),
                "gpt-4o-mini".to_string(),
                "gpt-4".to_string(),
            ],
            providers: vec!["openai".to_string(), "anthropic".to_string()],
            poll_interval_ms: lease::ACQUIRE_POLL_MS,
            max_wait_secs: lease::ACQUIRE_MAX_WAIT_SECS,
        }
    }
}

impl LeaseConfig {
    pub fn model_ttl(&self) -> Duration {
        Duration::from_secs(self.model_ttl_secs)
    }

    pub fn provider_ttl(&self) -> Duration {
        Duration::from_secs(self.provider_ttl_secs)
    }
}

// =============================================================================
// Documentation Configuration
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DocsConfig {
    /// Heading of the consolidated document
    pub title: String,

    /// Provenance tag written into metadata records
    pub provenance: Option<String>,
}

impl Default for DocsConfig {
    fn default() -> Self {
        Self {
            title: docs::DEFAULT_TITLE.to_string(),
            provenance: Some("ai-docs".to_string()),
        }
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.version, "1.0");
        assert_eq!(config.leases.model_ttl(), Duration::from_secs(60));
        assert_eq!(config.leases.provider_ttl(), Duration::from_secs(120));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_state_resolve() {
        let config = StateConfig::default();
        assert_eq!(
            config.resolve(&config.metadata),
            PathBuf::from(".testscribe/metadata.json")
        );
    }

    #[test]
    fn test_validate_rejects_zero_ttl() {
        let mut config = Config::default();
        config.leases.model_ttl_secs = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_empty_include() {
        let mut config = Config::default();
        config.discovery.include.clear();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_bad_glob() {
        let mut config = Config::default();
        config.discovery.exclude.push("tests/[".to_string());
        assert!(config.validate().is_err());
    }
}
