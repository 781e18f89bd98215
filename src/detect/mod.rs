//! Change Detection
//!
//! Decides which test files need (re)documentation:
//!
//! ```text
//! TestScanner → ChangeDetector (fingerprint vs MetadataStore) → work list
//!                                                     ↓
//!                     batches run ... → record_processed_except
//! ```

pub mod detector;
pub mod fingerprint;
pub mod scanner;
pub mod update;
pub mod worklist;

pub use detector::{ChangeDetector, ChangeKind, DetectionMode, DetectionReport};
pub use fingerprint::{FileSnapshot, Fingerprint, fingerprint, snapshot_file};
pub use scanner::TestScanner;
pub use update::{RecordOutcome, record_processed, record_processed_except};
pub use worklist::PathList;
