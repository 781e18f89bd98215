//! Documentation artifacts
//!
//! - [`entry`]: batch result files written by external workers
//! - [`document`]: the consolidated markdown document
//! - [`merger`]: folding batch results into the consolidated document
//! - [`extract`]: structured hints extracted from test sources

pub mod document;
pub mod entry;
pub mod extract;
pub mod merger;

pub use document::{EntryMap, parse_document, parse_header, render_document, render_entry};
pub use entry::{BatchResult, DocumentationEntry, load_batches};
pub use extract::{TestMetadata, extract_files, extract_metadata};
pub use merger::{DocMerger, MergeOutcome, MergeStats, merge_entries};
