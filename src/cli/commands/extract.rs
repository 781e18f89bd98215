//! Extract Command
//!
//! Write structured metadata for every scheduled test file as the prompt
//! input for the documentation workers.

use crate::cli::ui::Output;
use crate::cli::util::{CommandContext, emit};
use crate::docs::{TestMetadata, extract_files};
use crate::types::{Result, ScribeError};

/// Extract metadata for `files`, or for the work list when `files` is empty
pub async fn extract(ctx: &CommandContext, files: &[String]) -> Result<Vec<TestMetadata>> {
    let paths = if files.is_empty() {
        let work_list = ctx.work_list();
        work_list
            .load()
            .await?
            .ok_or_else(|| ScribeError::missing_input(work_list.locate()))?
    } else {
        files.to_vec()
    };

    let extracted = extract_files(ctx.project_root(), &paths).await;
    ctx.backend
        .write(
            &ctx.config.state.extracted,
            &serde_json::to_string_pretty(&extracted)?,
        )
        .await?;
    Ok(extracted)
}

pub async fn run(files: Vec<String>, stdout: bool) -> Result<()> {
    let ctx = CommandContext::load()?;
    let extracted = extract(&ctx, &files).await?;

    if stdout {
        println!("{}", serde_json::to_string_pretty(&extracted)?);
        return Ok(());
    }

    let out = Output::new();
    let without_tests = extracted.iter().filter(|m| m.is_empty()).count();
    out.success(&format!(
        "Extracted metadata for {} files into {}",
        extracted.len(),
        ctx.backend.locate(&ctx.config.state.extracted)
    ));
    if without_tests > 0 {
        out.warning(&format!("{} files declare no tests", without_tests));
    }
    emit("extracted", extracted.len());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use tempfile::TempDir;

    fn context(temp: &TempDir) -> CommandContext {
        let mut config = Config::default();
        config.discovery.root = temp.path().to_path_buf();
        config.state.dir = temp.path().join(".testscribe");
        CommandContext::with_config(config.clone(), config.state.dir.clone())
    }

    #[tokio::test]
    async fn test_extract_requires_work_list() {
        let temp = TempDir::new().unwrap();
        let err = extract(&context(&temp), &[]).await.unwrap_err();
        assert!(err.is_usage());
    }

    #[tokio::test]
    async fn test_extract_work_list() {
        let temp = TempDir::new().unwrap();
        std::fs::create_dir_all(temp.path().join("tests")).unwrap();
        std::fs::write(
            temp.path().join("tests/login.spec.js"),
            "test('logs in @smoke', async ({ page }) => { await page.goto('/login'); });",
        )
        .unwrap();
        let ctx = context(&temp);
        ctx.work_list()
            .save(&["tests/login.spec.js", "tests/gone.spec.js"])
            .await
            .unwrap();

        let extracted = extract(&ctx, &[]).await.unwrap();
        assert_eq!(extracted.len(), 1);
        assert_eq!(extracted[0].file_name, "login.spec.js");
        assert_eq!(extracted[0].tags, vec!["@smoke"]);

        let written = std::fs::read_to_string(temp.path().join(".testscribe/extracted.json")).unwrap();
        assert!(written.contains("\"fileName\": \"login.spec.js\""));
    }
}
