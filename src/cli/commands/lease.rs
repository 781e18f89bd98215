//! Lease Command
//!
//! Scriptable access to the model balancer and provider rate limiter for
//! batch workers:
//!
//! ```text
//! MODEL=$(testscribe lease acquire model --owner batch-3 | cut -d= -f2)
//! ...
//! testscribe lease release model "$MODEL"
//! ```

use clap::ValueEnum;

use crate::cli::ui::Output;
use crate::cli::util::{CommandContext, emit};
use crate::coord::{LeaseState, acquire};
use crate::types::{BatchId, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LeaseKind {
    Model,
    Provider,
}

impl LeaseKind {
    fn label(self) -> &'static str {
        match self {
            Self::Model => "model",
            Self::Provider => "provider",
        }
    }
}

pub async fn status(json: bool) -> Result<()> {
    let ctx = CommandContext::load()?;
    let models = ctx.balancer().snapshot().await;
    let providers = ctx.rate_limiter().snapshot().await;

    if json {
        let value = serde_json::json!({ "models": models, "providers": providers });
        println!("{}", serde_json::to_string_pretty(&value)?);
        return Ok(());
    }

    let out = Output::new();
    print_leases(&out, "Model leases", &models);
    print_leases(&out, "Provider rate limits", &providers);
    Ok(())
}

fn print_leases(out: &Output, title: &str, leases: &[LeaseState]) {
    out.section(title);
    if leases.is_empty() {
        out.info("none");
        return;
    }
    for lease in leases {
        let state = if lease.held {
            format!("held, {}s left", lease.remaining_secs)
        } else {
            "expired".to_string()
        };
        let owner = lease.owner.as_deref().unwrap_or("-");
        out.row(&lease.name, format!("{} (owner {})", state, owner));
    }
}

/// Wait for a free resource, take it and print its name
pub async fn acquire_cmd(
    kind: LeaseKind,
    candidates: Vec<String>,
    owner: Option<String>,
    max_wait_secs: Option<u64>,
) -> Result<()> {
    let ctx = CommandContext::load()?;
    let policy = ctx.acquire_policy(max_wait_secs);
    let owner = owner.map(BatchId::from).unwrap_or_else(BatchId::generate);

    let name = match kind {
        LeaseKind::Model => {
            let balancer = ctx.balancer();
            let candidates = if candidates.is_empty() {
                balancer.models().to_vec()
            } else {
                candidates
            };
            acquire(balancer.table(), &candidates, Some(owner.as_str()), policy).await?
        }
        LeaseKind::Provider => {
            let limiter = ctx.rate_limiter();
            let candidates = if candidates.is_empty() {
                limiter.providers().to_vec()
            } else {
                candidates
            };
            acquire(limiter.table(), &candidates, Some(owner.as_str()), policy).await?
        }
    };

    emit(kind.label(), name);
    Ok(())
}

pub async fn release(kind: LeaseKind, name: &str) -> Result<()> {
    let ctx = CommandContext::load()?;
    let released = match kind {
        LeaseKind::Model => ctx.balancer().mark_model_available(name).await,
        LeaseKind::Provider => ctx.rate_limiter().mark_provider_available(name).await,
    };

    let out = Output::new();
    if released {
        out.success(&format!("Released {} {}", kind.label(), name));
    } else {
        out.info(&format!("{} {} was not held", kind.label(), name));
    }
    Ok(())
}

pub async fn mark(kind: LeaseKind, name: &str, owner: Option<String>) -> Result<()> {
    let ctx = CommandContext::load()?;
    match kind {
        LeaseKind::Model => {
            ctx.balancer()
                .mark_model_busy(name, owner.as_deref())
                .await
        }
        LeaseKind::Provider => {
            ctx.rate_limiter()
                .mark_provider_rate_limited(name, owner.as_deref())
                .await
        }
    }
    Output::new().success(&format!("Marked {} {} busy", kind.label(), name));
    Ok(())
}

/// Exit status reflects whether `name` is currently held
pub async fn check(kind: LeaseKind, name: &str) -> Result<bool> {
    let ctx = CommandContext::load()?;
    let busy = match kind {
        LeaseKind::Model => ctx.balancer().is_model_busy(name).await,
        LeaseKind::Provider => ctx.rate_limiter().is_provider_rate_limited(name).await,
    };
    emit("busy", busy);
    Ok(busy)
}

pub async fn cleanup() -> Result<()> {
    let ctx = CommandContext::load()?;
    let removed = ctx.balancer().cleanup_expired().await + ctx.rate_limiter().cleanup_expired().await;
    Output::new().success(&format!("Removed {} expired leases", removed));
    emit("removed", removed);
    Ok(())
}
