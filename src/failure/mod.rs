//! Failure identification and retry lists

pub mod identifier;

pub use identifier::{BatchHealth, FailureIdentifier, FailureReport, identify_failures};
