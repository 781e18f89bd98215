pub mod backend;
pub mod metadata;

pub use backend::{FileBackend, MemoryBackend, SharedBackend, StateBackend};
pub use metadata::{FileRecord, MetadataMap, MetadataStore};
