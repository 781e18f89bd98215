//! Model Balancer
//!
//! Spreads parallel batches across models: a batch takes the first model
//! nobody holds, marks it busy, and releases it when done. Leases last
//! 60 seconds by default.

use std::time::Duration;

use super::lease::{LeaseState, LeaseTable};
use crate::config::Config;
use crate::storage::SharedBackend;

pub struct ModelBalancer {
    table: LeaseTable,
    models: Vec<String>,
}

impl ModelBalancer {
    pub fn new(
        backend: SharedBackend,
        key: impl Into<std::path::PathBuf>,
        ttl: Duration,
        models: Vec<String>,
    ) -> Self {
        Self {
            table: LeaseTable::new(backend, key, ttl, "model"),
            models,
        }
    }

    /// Balancer over the configured model leases and priority list
    pub fn from_config(backend: SharedBackend, config: &Config) -> Self {
        Self::new(
            backend,
            &config.state.model_leases,
            config.leases.model_ttl(),
            config.leases.models.clone(),
        )
    }

    pub fn table(&self) -> &LeaseTable {
        &self.table
    }

    /// Configured models in priority order
    pub fn models(&self) -> &[String] {
        &self.models
    }

    pub async fn is_model_busy(&self, model: &str) -> bool {
        self.table.is_busy(model).await
    }

    pub async fn mark_model_busy(&self, model: &str, owner: Option<&str>) {
        self.table.mark_busy(model, owner).await
    }

    pub async fn mark_model_available(&self, model: &str) -> bool {
        self.table.mark_available(model).await
    }

    /// First free model among `candidates`, or among the configured models
    /// when `candidates` is empty
    pub async fn next_available_model<S: AsRef<str>>(&self, candidates: &[S]) -> Option<String> {
        if candidates.is_empty() {
            self.table.next_available(&self.models).await
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
