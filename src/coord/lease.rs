//! Advisory TTL lease table
//!
//! A lease marks a named resource (a model, a provider) as taken by some
//! batch. Leases expire on their own after the table's TTL so a crashed
//! worker never blocks a resource for longer than that.
//!
//! ## Consistency
//!
//! The table is one whole document on a [`StateBackend`](crate::storage::StateBackend).
//! Every mutation is read-modify-write of that document with no lock, so two
//! concurrent writers may lose one another's update and two callers of
//! [`LeaseTable::next_available`] may pick the same resource. Leases are
//! hints for spreading load, not mutual exclusion.
//!
//! ## Failure Handling
//!
//! Coordinators never fail their caller: a load error reads as "no leases",
//! a save error is logged and dropped.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::storage::SharedBackend;
use crate::types::millis;

/// One persisted lease
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Lease {
    #[serde(alias = "rateLimited")]
    pub busy: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner: Option<String>,
    /// Milliseconds since the Unix epoch when the lease was taken
    pub timestamp: i64,
}

pub type LeaseMap = BTreeMap<String, Lease>;

/// Lease as seen at a given instant
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LeaseState {
    pub name: String,
    pub owner: Option<String>,
    pub taken_at: i64,
    pub held: bool,
    /// Time left before expiry; zero once released or expired
    pub remaining_secs: u64,
}

pub struct LeaseTable {
    backend: SharedBackend,
    key: PathBuf,
    ttl: Duration,
    kind: &'static str,
}

impl LeaseTable {
    /// `kind` names the resource in logs ("model", "provider")
    pub fn new(
        backend: SharedBackend,
        key: impl Into<PathBuf>,
        ttl: Duration,
        kind: &'static str,
    ) -> Self {
        Self {
            backend,
            key: key.into(),
            ttl,
            kind,
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub fn kind(&self) -> &'static str {
        self.kind
    }

    pub fn key(&self) -> &Path {
        &self.key
    }

    fn ttl_ms(&self) -> i64 {
        i64::try_from(self.ttl.as_millis()).unwrap_or(i64::MAX)
    }

    /// Whether a lease still holds its resource at `now`.
    ///
    /// Expired means strictly older than the TTL, or stamped more than one
    /// TTL in the future.
    pub fn is_held(&self, lease: &Lease, now: DateTime<Utc>) -> bool {
        let age = millis(now).saturating_sub(lease.timestamp);
        lease.busy && age.saturating_abs() <= self.ttl_ms()
    }

    // =========================================================================
    // Persistence
    // =========================================================================

    pub async fn load(&self) -> LeaseMap {
        let content = match self.backend.read(&self.key).await {
            Ok(Some(content)) => content,
            Ok(None) => return LeaseMap::new(),
            Err(e) => {
                warn!("Cannot read {} leases ({}), assuming none", self.kind, e);
                return LeaseMap::new();
            }
        };
        if content.trim().is_empty() {
            return LeaseMap::new();
        }

        serde_json::from_str(&content).unwrap_or_else(|e| {
            warn!(
                "Malformed {} leases at {} ({}), assuming none",
                self.kind,
                self.backend.locate(&self.key),
                e
            );
            LeaseMap::new()
        })
    }

    async fn save(&self, leases: &LeaseMap) {
        let content = match serde_json::to_string_pretty(leases) {
            Ok(content) => content,
            Err(e) => {
                warn!("Cannot encode {} leases: {}", self.kind, e);
                return;
            }
        };
        if let Err(e) = self.backend.write(&self.key, &content).await {
            warn!("Dropping {} lease update: {}", self.kind, e);
        }
    }

    // =========================================================================
    // Operations
    // =========================================================================

    pub async fn is_busy(&self, name: &str) -> bool {
        self.is_busy_at(name, Utc::now()).await
    }

    pub async fn is_busy_at(&self, name: &str, now: DateTime<Utc>) -> bool {
        self.load()
            .await
            .get(name)
            .is_some_and(|lease| self.is_held(lease, now))
    }

    pub async fn mark_busy(&self, name: &str, owner: Option<&str>) {
        self.mark_busy_at(name, owner, Utc::now()).await
    }

    /// Take the lease unconditionally; the last writer wins
    pub async fn mark_busy_at(&self, name: &str, owner: Option<&str>, now: DateTime<Utc>) {
        let mut leases = self.load().await;
        leases.insert(
            name.to_string(),
            Lease {
                busy: true,
                owner: owner.map(String::from),
                timestamp: millis(now),
            },
        );
        self.save(&leases).await;
        debug!("{} {} marked busy by {:?}", self.kind, name, owner);
    }

    /// Release a lease. Returns whether one was present.
    pub async fn mark_available(&self, name: &str) -> bool {
        let mut leases = self.load().await;
        if leases.remove(name).is_none() {
            return false;
        }
        self.save(&leases).await;
        debug!("{} {} released", self.kind, name);
        true
    }

    pub async fn next_available<S: AsRef<str>>(&self, candidates: &[S]) -> Option<String> {
        self.next_available_at(candidates, Utc::now()).await
    }

    /// First candidate, in priority order, without a live lease
    pub async fn next_available_at<S: AsRef<str>>(
        &self,
        candidates: &[S],
        now: DateTime<Utc>,
    ) -> Option<String> {
        let leases = self.load().await;
        candidates
            .iter()
            .map(AsRef::as_ref)
            .find(|name| !leases.get(*name).is_some_and(|l| self.is_held(l, now)))
            .map(String::from)
    }

    pub async fn cleanup_expired(&self) -> usize {
        self.cleanup_expired_at(Utc::now()).await
    }

    /// Drop every lease that no longer holds its resource
    pub async fn cleanup_expired_at(&self, now: DateTime<Utc>) -> usize {
        let mut leases = self.load().await;
        let before = leases.len();
        leases.retain(|_, lease| self.is_held(lease, now));
        let removed = before - leases.len();
        if removed > 0 {
            self.save(&leases).await;
            debug!("Removed {} expired {} leases", removed, self.kind);
        }
        removed
    }

    pub async fn snapshot(&self) -> Vec<LeaseState> {
        self.snapshot_at(Utc::now()).await
    }

    pub async fn snapshot_at(&self, now: DateTime<Utc>) -> Vec<LeaseState> {
        let now_ms = millis(now);
        self.load()
            .await
            .into_iter()
            .map(|(name, lease)| {
                let held = self.is_held(&lease, now);
                let remaining_ms = if held {
                    lease
                        .timestamp
                        .saturating_add(self.ttl_ms())
                        .saturating_sub(now_ms)
                        .max(0)
                } else {
                    0
                };
                LeaseState {
                    name,
                    owner: lease.owner,
                    taken_at: lease.timestamp,
                    held,
                    remaining_secs: (remaining_ms / 1000) as u64,
                }
            })
            .collect()
    }
}
