//! Global Constants
//!
//! Centralized constants for configuration and tuning.
//! All magic numbers should be defined here with documentation.

/// Resource lease constants
pub mod lease {
    /// Model balancer lease lifetime (seconds)
    pub const MODEL_TTL_SECS: u64 = 60;

    /// Provider rate-limit lease lifetime (seconds)
    pub const PROVIDER_TTL_SECS: u64 = 120;

    /// Poll interval while waiting for a free resource (milliseconds)
    pub const ACQUIRE_POLL_MS: u64 = 2_000;

    /// Default maximum wait for a free resource (seconds)
    pub const ACQUIRE_MAX_WAIT_SECS: u64 = 300;
}

/// Consolidated documentation format
pub mod docs {
    /// Line separating entries in the consolidated document
    pub const ENTRY_DELIMITER: &str = "<!-- testscribe:entry -->";

    /// Line after which the footer begins; everything past it is regenerated
    pub const FOOTER_MARKER: &str = "<!-- testscribe:footer -->";

    /// Arrow between file name and test name in entry headers
    pub const HEADER_ARROW: &str = "→";

    /// Default document title
    pub const DEFAULT_TITLE: &str = "Test Documentation";
}

/// State directory layout (relative to the state dir)
pub mod state {
    pub const DIR: &str = ".testscribe";
    pub const METADATA_FILE: &str = "metadata.json";
    pub const WORK_LIST_FILE: &str = "work-list.txt";
    pub const BATCH_DIR: &str = "batches";
    pub const BATCH_GLOB: &str = "*.json";
    pub const DOCS_FILE: &str = "docs/TEST_DOCUMENTATION.md";
    pub const EXISTING_DOCS_FILE: &str = "docs/existing.md";
    pub const MODEL_LEASES_FILE: &str = "leases/models.json";
    pub const PROVIDER_LEASES_FILE: &str = "leases/providers.json";
    pub const FAILURE_REPORT_FILE: &str = "failures.json";
    pub const FAILED_LIST_FILE: &str = "failed-tests.txt";
    pub const EXTRACT_FILE: &str = "extracted.json";
    pub const CONFIG_FILE: &str = "config.toml";
}

/// Test discovery constants
pub mod discovery {
    /// Default include globs (relative to the project root)
    pub const DEFAULT_INCLUDE: &[&str] = &["tests/**/*.spec.js", "tests/**/*.spec.ts"];

    /// Default exclude globs
    pub const DEFAULT_EXCLUDE: &[&str] = &["node_modules/**", ".testscribe/**"];

    /// Maximum file size to fingerprint (5MB)
    pub const MAX_FILE_SIZE: u64 = 5 * 1024 * 1024;
}
