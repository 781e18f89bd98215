//! Failures Command
//!
//! Compare the scheduled files against the batch results and write the
//! retry list.

use crate::cli::ui::Output;
use crate::cli::util::{CommandContext, emit};
use crate::constants::state::BATCH_GLOB;
use crate::detect::DetectionMode;
use crate::docs::load_batches;
use crate::failure::FailureReport;
use crate::types::Result;

/// Without a work list every discoverable file counts as scheduled
pub async fn identify(ctx: &CommandContext) -> Result<FailureReport> {
    let (mode, scheduled) = match ctx.work_list().load().await? {
        Some(list) => (DetectionMode::Incremental, list),
        None => (DetectionMode::Full, ctx.scanner()?.discover()?),
    };
    let batches = load_batches(&ctx.batch_dir(), BATCH_GLOB).await?;

    ctx.failure_identifier()
        .run(mode, &scheduled, &batches)
        .await
}

pub async fn run(json: bool) -> Result<()> {
    let ctx = CommandContext::load()?;
    let report = identify(&ctx).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    let out = Output::new();
    out.section(&format!("Failure report ({})", report.mode));
    out.row("Scheduled", report.total_tests);
    out.row("Documented", report.documented);
    out.row("Failed", report.failed);
    out.row(
        "Batches",
        format!("{}/{} working", report.working_batches, report.batches.len()),
    );
    for batch in report.batches.iter().filter(|b| !b.working) {
        out.item(&format!("{} produced no entries", batch.id));
    }
    if report.needs_retry {
        out.warning(&format!(
            "Retry list written to {}",
            ctx.backend.locate(&ctx.config.state.failed_list)
        ));
        for path in &report.failed_files {
            out.item(path);
        }
    } else {
        out.success("Every scheduled test was documented");
    }

    emit("failed_count", report.failed);
    Ok(())
}
