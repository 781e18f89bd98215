//! testscribe - Incremental Documentation Coordinator for Test Suites
//!
//! Keeps AI-generated documentation of an end-to-end test suite current
//! without regenerating it from scratch on every run.
//!
//! ## Pipeline
//!
//! ```text
//! detect ──► work list ──► parallel batches (external) ──► batch results
//!                              │  lease acquire/release        │
//!                              ▼                               ▼
//!                    ModelBalancer / RateLimiter     merge ─► consolidated docs
//!                                                    failures ─► retry list
//!                                                    metadata update
//! ```
//!
//! ## Modules
//!
//! - [`detect`]: discovery, fingerprinting and change detection
//! - [`docs`]: batch results, the consolidated document and the merger
//! - [`coord`]: advisory TTL leases for models and providers
//! - [`failure`]: reconciling scheduled files against produced entries
//! - [`storage`]: whole-document state backends and the metadata store
//! - [`config`]: layered configuration

pub mod cli;
pub mod config;
pub mod constants;
pub mod coord;
pub mod detect;
pub mod docs;
pub mod failure;
pub mod storage;
pub mod types;

// =============================================================================
// Core Re-exports
// =============================================================================

// Configuration
pub use config::{Config, ConfigLoader};

// Error Types
pub use types::error::{Result, ResultExt, ScribeError};

// Storage
pub use storage::{FileBackend, MemoryBackend, MetadataStore, SharedBackend, StateBackend};

// =============================================================================
// Pipeline Re-exports
// =============================================================================

pub use coord::{LeaseTable, ModelBalancer, RateLimiter};
pub use detect::{ChangeDetector, DetectionReport, TestScanner, fingerprint};
pub use docs::{BatchResult, DocMerger, DocumentationEntry, MergeStats};
pub use failure::{FailureIdentifier, FailureReport};
