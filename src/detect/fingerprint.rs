//! Content fingerprints used as change-detection keys.

use std::fmt;
use std::path::Path;

use sha2::{Digest, Sha256};

use crate::types::{Result, system_time_millis};

/// Hex-encoded SHA-256 digest of file contents
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Fingerprint(String);

impl Fingerprint {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Fingerprint raw bytes
pub fn fingerprint(bytes: &[u8]) -> Fingerprint {
    let digest = Sha256::digest(bytes);
    Fingerprint(format!("{:x}", digest))
}

/// Current content fingerprint and modification time of a file
#[derive(Debug, Clone)]
pub struct FileSnapshot {
    pub fingerprint: Fingerprint,
    pub modified_ms: i64,
    pub size: u64,
}

/// Read a file once and fingerprint it
pub async fn snapshot_file(path: &Path) -> Result<FileSnapshot> {
    let bytes = tokio::fs::read(path).await?;
    let metadata = tokio::fs::metadata(path).await?;
    let modified_ms = metadata.modified().map(system_time_millis).unwrap_or(0);

    Ok(FileSnapshot {
        fingerprint: fingerprint(&bytes),
        modified_ms,
        size: bytes.len() as u64,
    })
}
