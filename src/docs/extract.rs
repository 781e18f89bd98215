//! Test Metadata Extractor
//!
//! Pulls structured hints out of Playwright/Jest-style test sources so the
//! external documentation worker gets titles, tags, endpoints and UI
//! identifiers alongside the raw file.

use std::path::Path;
use std::sync::OnceLock;

use regex::{Captures, Regex};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::types::basename;

/// Quoted string literal; the value lands in one of three groups
const QUOTED: &str = r#"(?:'((?:[^'\\]|\\.)*)'|"((?:[^"\\]|\\.)*)"|`([^`]*)`)"#;

struct Patterns {
    test: Regex,
    describe: Regex,
    title_tag: Regex,
    tag_option: Regex,
    tag_token: Regex,
    goto: Regex,
    endpoint: Regex,
    test_id: Regex,
    data_test_id: Regex,
    role: Regex,
}

fn patterns() -> &'static Patterns {
    static PATTERNS: OnceLock<Patterns> = OnceLock::new();
    PATTERNS.get_or_init(|| {
        let re = |pattern: String| Regex::new(&pattern).expect("valid regex");
        Patterns {
            test: re(format!(
                r"\b(?:test|it)(?:\.(?:only|skip|fixme|fail|slow))?\s*\(\s*{QUOTED}"
            )),
            describe: re(format!(
                r"\b(?:test\.)?describe(?:\.(?:only|skip|fixme|serial|parallel))?\s*\(\s*{QUOTED}"
            )),
            title_tag: re(r"(?:^|\s)(@[\w-]+)".to_string()),
            tag_option: re(r#"\btag\s*:\s*(\[[^\]]*\]|'[^']*'|"[^"]*")"#.to_string()),
            tag_token: re(r"@[\w-]+".to_string()),
            goto: re(format!(r"\.goto\s*\(\s*{QUOTED}")),
            endpoint: re(
                r#"['"`]((?:https?://[^'"`\s]+)|(?:[^'"`\s]*/api/[^'"`\s]*))['"`]"#.to_string(),
            ),
            test_id: re(format!(r"getByTestId\s*\(\s*{QUOTED}")),
            data_test_id: re(r#"data-testid\s*=\s*\\?["']([^"'\\]+)"#.to_string()),
            role: re(format!(
                r"getByRole\s*\(\s*{QUOTED}\s*,\s*\{{[^}}]*?\bname\s*:\s*{QUOTED}"
            )),
        }
    })
}

/// First non-empty group among the three alternatives of a [`QUOTED`]
/// literal starting at group `first`
fn quoted(caps: &Captures<'_>, first: usize) -> Option<String> {
    (first..first + 3)
        .find_map(|i| caps.get(i))
        .map(|m| m.as_str().trim().to_string())
        .filter(|s| !s.is_empty())
}

fn push_unique(list: &mut Vec<String>, value: String) {
    if !list.contains(&value) {
        list.push(value);
    }
}

/// Structured metadata for one test file
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestMetadata {
    pub file_name: String,
    pub path: String,
    /// Display name: the first describe title, else the first test title
    pub test_name: Option<String>,
    pub describes: Vec<String>,
    pub tests: Vec<String>,
    pub tags: Vec<String>,
    pub endpoints: Vec<String>,
    pub ui_elements: Vec<String>,
}

impl TestMetadata {
    pub fn is_empty(&self) -> bool {
        self.tests.is_empty() && self.describes.is_empty()
    }
}

/// Extract metadata from test source
pub fn extract_metadata(path: &str, source: &str) -> TestMetadata {
    let p = patterns();
    let mut meta = TestMetadata {
        file_name: basename(path).to_string(),
        path: path.to_string(),
        ..Default::default()
    };

    for caps in p.describe.captures_iter(source) {
        if let Some(title) = quoted(&caps, 1) {
            push_unique(&mut meta.describes, title);
        }
    }
    for caps in p.test.captures_iter(source) {
        if let Some(title) = quoted(&caps, 1) {
            push_unique(&mut meta.tests, title);
        }
    }

    for title in meta.describes.iter().chain(&meta.tests) {
        for caps in p.title_tag.captures_iter(title) {
            push_unique(&mut meta.tags, caps[1].to_string());
        }
    }
    for caps in p.tag_option.captures_iter(source) {
        for token in p.tag_token.find_iter(&caps[1]) {
            push_unique(&mut meta.tags, token.as_str().to_string());
        }
    }

    for caps in p.goto.captures_iter(source) {
        if let Some(target) = quoted(&caps, 1) {
            push_unique(&mut meta.endpoints, target);
        }
    }
    for caps in p.endpoint.captures_iter(source) {
        push_unique(&mut meta.endpoints, caps[1].to_string());
    }

    for caps in p.test_id.captures_iter(source) {
        if let Some(id) = quoted(&caps, 1) {
            push_unique(&mut meta.ui_elements, id);
        }
    }
    for caps in p.data_test_id.captures_iter(source) {
        push_unique(&mut meta.ui_elements, caps[1].to_string());
    }
    for caps in p.role.captures_iter(source) {
        if let (Some(role), Some(name)) = (quoted(&caps, 1), quoted(&caps, 4)) {
            push_unique(&mut meta.ui_elements, format!("{}:{}", role, name));
        }
    }

    meta.test_name = meta
        .describes
        .first()
        .or_else(|| meta.tests.first())
        .cloned();

    debug!(
        "Extracted {} tests, {} tags, {} endpoints from {}",
        meta.tests.len(),
        meta.tags.len(),
        meta.endpoints.len(),
        path
    );
    meta
}

/// Extract metadata for every path under `root`, skipping unreadable files
pub async fn extract_files(root: &Path, paths: &[String]) -> Vec<TestMetadata> {
    let mut out = Vec::with_capacity(paths.len());
    for path in paths {
        match tokio::fs::read_to_string(root.join(path)).await {
            Ok(source) => out.push(extract_metadata(path, &source)),
            Err(e) => warn!("Skipping {}: {}", path, e),
        }
    }
    out
}
