//! Unified Error Type System
//!
//! Centralized error types for the entire application.
//!
//! ## Recovery Policy
//!
//! - **Missing state** (no metadata, lease or documentation file yet): not an
//!   error, callers see an empty baseline
//! - **Malformed state**: recovered where it is read, logged as a warning
//! - **Missing input file**: skipped with a warning
//! - **Coordinator I/O**: swallowed inside the lease table
//!
//! Only usage errors and genuinely required inputs surface as `ScribeError`
//! at the process boundary.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ScribeError {
    // -------------------------------------------------------------------------
    // System Errors (auto From impl)
    // -------------------------------------------------------------------------
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Invalid glob pattern: {0}")]
    Pattern(#[from] glob::PatternError),

    // -------------------------------------------------------------------------
    // Domain Errors
    // -------------------------------------------------------------------------
    #[error("Config error: {0}")]
    Config(String),

    #[error("Usage error: {0}")]
    Usage(String),

    #[error("Required input missing: {}", path.display())]
    MissingInput { path: PathBuf },

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Not initialized: run 'testscribe init' first")]
    NotInitialized,

    #[error("No {kind} available among [{candidates}]")]
    Busy { kind: String, candidates: String },
}

pub type Result<T> = std::result::Result<T, ScribeError>;

impl ScribeError {
    /// Create a usage error
    pub fn usage(message: impl Into<String>) -> Self {
        Self::Usage(message.into())
    }

    /// Create a missing-input error for a required file
    pub fn missing_input(path: impl Into<PathBuf>) -> Self {
        Self::MissingInput { path: path.into() }
    }

    /// Create a busy error listing the candidates that were all taken
    pub fn busy<S: AsRef<str>>(kind: impl Into<String>, candidates: &[S]) -> Self {
        Self::Busy {
            kind: kind.into(),
            candidates: candidates
                .iter()
                .map(|c| c.as_ref())
                .collect::<Vec<_>>()
                .join(", "),
        }
    }

    /// Whether every candidate resource was taken
    pub fn is_busy(&self) -> bool {
        matches!(self, Self::Busy { .. })
    }

    /// Whether the error is caused by how the command was invoked
    pub fn is_usage(&self) -> bool {
        matches!(
            self,
            Self::Usage(_) | Self::MissingInput { .. } | Self::NotInitialized
        )
    }
}

/// Context extension trait for adding context to errors
pub trait ResultExt<T> {
    /// Add context to an error
    fn with_context<C: Into<String>>(self, context: C) -> Result<T>;

    /// Add context using a closure (lazy evaluation)
    fn with_context_fn<F, C>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> C,
        C: Into<String>;
}

impl<T, E: std::error::Error + Send + Sync + 'static> ResultExt<T> for std::result::Result<T, E> {
    fn with_context<C: Into<String>>(self, context: C) -> Result<T> {
        self.map_err(|e| ScribeError::Storage(format!("{}: {}", context.into(), e)))
    }

    fn with_context_fn<F, C>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> C,
        C: Into<String>,
    {
        self.map_err(|e| ScribeError::Storage(format!("{}: {}", f().into(), e)))
    }
}
