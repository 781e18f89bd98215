//! Status Command
//!
//! Summarize the shared state: tracked files, the pending work list, batch
//! results, the last failure report and live leases.

use serde::Serialize;

use crate::cli::ui::Output;
use crate::cli::util::{CommandContext, is_initialized};
use crate::config::ConfigLoader;
use crate::constants::state::BATCH_GLOB;
use crate::docs::load_batches;
use crate::failure::FailureReport;
use crate::types::Result;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusSummary {
    pub tracked_files: usize,
    /// `None` when no detection has run yet
    pub scheduled: Option<usize>,
    pub batches: usize,
    pub working_batches: usize,
    pub last_report: Option<FailureReport>,
    pub models_held: usize,
    pub providers_limited: usize,
}

pub async fn summarize(ctx: &CommandContext) -> Result<StatusSummary> {
    let tracked_files = ctx.metadata_store().load().await?.len();
    let scheduled = ctx.work_list().load().await?.map(|list| list.len());
    let batches = load_batches(&ctx.batch_dir(), BATCH_GLOB).await?;
    let held = |leases: Vec<crate::coord::LeaseState>| leases.iter().filter(|l| l.held).count();

    Ok(StatusSummary {
        tracked_files,
        scheduled,
        batches: batches.len(),
        working_batches: batches.iter().filter(|b| b.is_working()).count(),
        last_report: ctx.failure_identifier().load_report().await,
        models_held: held(ctx.balancer().snapshot().await),
        providers_limited: held(ctx.rate_limiter().snapshot().await),
    })
}

pub async fn run(format: &str, detailed: bool) -> Result<()> {
    let json_output = format == "json";
    let config = ConfigLoader::load()?;

    if !is_initialized(&config) {
        if json_output {
            println!("{{\"status\": \"not_initialized\"}}");
        } else {
            eprintln!("Not initialized. Run 'testscribe init' first.");
        }
        // Informational command
        return Ok(());
    }

    let ctx = CommandContext::with_config(config.clone(), config.state.dir.clone());
    let summary = summarize(&ctx).await?;

    if json_output {
        println!("{}", serde_json::to_string_pretty(&summary)?);
        return Ok(());
    }

    let out = Output::new();
    out.header("testscribe status");
    out.row("Tracked", summary.tracked_files);
    out.row(
        "Work list",
        summary
            .scheduled
            .map_or_else(|| "none".to_string(), |n| format!("{} files", n)),
    );
    out.row(
        "Batches",
        format!("{} ({} working)", summary.batches, summary.working_batches),
    );
    match &summary.last_report {
        Some(report) => out.row(
            "Last check",
            format!(
                "{} failed of {} ({})",
                report.failed, report.total_tests, report.mode
            ),
        ),
        None => out.row("Last check", "never"),
    }
    out.row("Models held", summary.models_held);
    out.row("Rate limited", summary.providers_limited);

    if detailed {
        out.section("Paths");
        let state = &ctx.config.state;
        for (label, key) in [
            ("Metadata", &state.metadata),
            ("Work list", &state.work_list),
            ("Docs", &state.docs),
            ("Failures", &state.failure_report),
            ("Model leases", &state.model_leases),
            ("Providers", &state.provider_leases),
        ] {
            out.row(label, ctx.backend.locate(key));
        }
        out.row("Batches", ctx.batch_dir().display());
    }

    Ok(())
}
