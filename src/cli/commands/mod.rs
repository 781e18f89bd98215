pub mod clean;
pub mod config;
pub mod detect;
pub mod extract;
pub mod failures;
pub mod init;
pub mod lease;
pub mod merge;
pub mod metadata;
pub mod status;
