//! Provider Rate Limiter
//!
//! A batch that hits a provider rate limit marks the provider; others skip
//! it until the mark is cleared or 120 seconds pass.

use std::path::PathBuf;
use std::time::Duration;

use super::lease::{LeaseState, LeaseTable};
use crate::config::Config;
use crate::storage::SharedBackend;

pub struct RateLimiter {
    table: LeaseTable,
    providers: Vec<String>,
}

impl RateLimiter {
    pub fn new(
        backend: SharedBackend,
        key: impl Into<PathBuf>,
        ttl: Duration,
        providers: Vec<String>,
    ) -> Self {
        Self {
            table: LeaseTable::new(backend, key, ttl, "provider"),
            providers,
        }
    }

    pub fn from_config(backend: SharedBackend, config: &Config) -> Self {
        Self::new(
            backend,
            &config.state.provider_leases,
            config.leases.provider_ttl(),
            config.leases.providers.clone(),
        )
    }

    pub fn table(&self) -> &LeaseTable {
        &self.table
    }

    pub fn providers(&self) -> &[String] {
        &self.providers
    }

    pub async fn is_provider_rate_limited(&self, provider: &str) -> bool {
        self.table.is_busy(provider).await
    }

    pub async fn mark_provider_rate_limited(&self, provider: &str, owner: Option<&str>) {
        self.table.mark_busy(provider, owner).await
    }

    pub async fn mark_provider_available(&self, provider: &str) -> bool {
        self.table.mark_available(provider).await
    }

    /// First provider not rate limited among `candidates`, or among the
    /// configured providers when `candidates` is empty
    pub async fn next_available_provider<S: AsRef<str>>(&self, candidates: &[S]) -> Option<String> {
        if candidates.is_empty() {
            self.table.next_available(&self.providers).await
        } else {
            self.table.next_available(candidates).await
        }
    }

    pub async fn cleanup_expired(&self) -> usize {
        self.table.cleanup_expired().await
    }

    pub async fn snapshot(&self) -> Vec<LeaseState> {
        self.table.snapshot().await
    }
}
