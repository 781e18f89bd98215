//! Waiting for a free resource
//!
//! Polls a [`LeaseTable`] at a fixed interval until one of the candidates is
//! free, then takes its lease. Two waiters may still end up with the same
//! resource; see the consistency notes on [`LeaseTable`].

use std::time::Duration;

use backon::{ConstantBuilder, Retryable};
use tracing::{debug, info};

use super::lease::LeaseTable;
use crate::types::{Result, ScribeError};

/// Poll settings for [`acquire`]
#[derive(Debug, Clone, Copy)]
pub struct AcquirePolicy {
    pub poll_interval: Duration,
    pub max_wait: Duration,
}

impl AcquirePolicy {
    pub fn new(poll_interval: Duration, max_wait: Duration) -> Self {
        Self {
            poll_interval,
            max_wait,
        }
    }

    /// Retries after the first attempt
    fn attempts(&self) -> usize {
        let interval = self.poll_interval.as_millis().max(1);
        (self.max_wait.as_millis() / interval) as usize
    }
}

/// Take the first free candidate, waiting up to `policy.max_wait`.
///
/// Returns [`ScribeError::Busy`] once the wait is exhausted.
pub async fn acquire<S: AsRef<str>>(
    table: &LeaseTable,
    candidates: &[S],
    owner: Option<&str>,
    policy: AcquirePolicy,
) -> Result<String> {
    if candidates.is_empty() {
        return Err(ScribeError::usage(format!(
            "no {} candidates configured",
            table.kind()
        )));
    }

    let backoff = ConstantBuilder::default()
        .with_delay(policy.poll_interval)
        .with_max_times(policy.attempts());

    let name = (|| async move {
        table
            .next_available(candidates)
            .await
            .ok_or_else(|| ScribeError::busy(table.kind(), candidates))
    })
    .retry(backoff)
    .when(ScribeError::is_busy)
    .notify(|_, wait| debug!("All {}s busy, polling again in {:?}", table.kind(), wait))
    .await?;

    table.mark_busy(&name, owner).await;
    info!("Acquired {} {} for {:?}", table.kind(), name, owner);
    Ok(name)
}
