//! Consolidated documentation document
//!
//! Layout:
//!
//! ```text
//! # Test Documentation
//!
//! <!-- testscribe:entry -->
//! ## tests/auth/login.spec.js → Login flow
//! ...markdown...
//!
//! <!-- testscribe:entry -->
//! ## checkout.spec.js → Checkout
//! ...
//!
//! <!-- testscribe:footer -->
//! _Generated 2026-01-01T00:00:00Z · 2 test files_
//! ```
//!
//! Entries are keyed by the basename of the file named in their header and
//! rendered in ascending key order. Everything after the footer marker is
//! regenerated on every write.

use std::collections::BTreeMap;
use std::sync::OnceLock;

use chrono::{DateTime, SecondsFormat, Utc};
use regex::Regex;
use tracing::warn;

use super::entry::DocumentationEntry;
use crate::constants::docs::{ENTRY_DELIMITER, FOOTER_MARKER, HEADER_ARROW};
use crate::types::basename;

/// Rendered entry blocks keyed by file basename
pub type EntryMap = BTreeMap<String, String>;

fn header_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^#{2,3}\s+`?(?P<file>[^`]+?)`?\s*(?:→|->)\s*(?P<name>.*?)\s*$")
            .expect("valid regex")
    })
}

/// File and test name from an entry header line
pub fn parse_header(line: &str) -> Option<(String, String)> {
    let caps = header_re().captures(line.trim())?;
    Some((caps["file"].to_string(), caps["name"].to_string()))
}

/// Split a consolidated document into entry blocks keyed by basename.
///
/// The footer and any preamble before the first delimiter are discarded.
/// Blocks without a recognizable header are dropped. If two blocks share a
/// key the later one wins.
pub fn parse_document(content: &str) -> EntryMap {
    let body = match content.find(FOOTER_MARKER) {
        Some(pos) => &content[..pos],
        None => content,
    };

    let mut entries = EntryMap::new();
    for block in body.split(ENTRY_DELIMITER).skip(1) {
        let block = block.trim();
        let Some(first_line) = block.lines().find(|l| !l.trim().is_empty()) else {
            continue;
        };
        match parse_header(first_line) {
            Some((file, _)) => {
                entries.insert(basename(&file).to_string(), block.to_string());
            }
            None => warn!("Dropping entry without a header: {:?}", first_line),
        }
    }
    entries
}

/// Render one entry as a block whose first line is its header.
///
/// Markdown that already opens with a header for the same file is kept as-is.
pub fn render_entry(entry: &DocumentationEntry) -> String {
    let key = entry.key();
    let markdown = entry.markdown.trim();

    let has_header = markdown
        .lines()
        .find(|l| !l.trim().is_empty())
        .and_then(parse_header)
        .is_some_and(|(file, _)| basename(&file) == key);
    if has_header {
        return markdown.to_string();
    }

    let name = entry
        .test_name
        .as_deref()
        .map(str::trim)
        .filter(|n| !n.is_empty())
        .unwrap_or(key);
    let header = format!("## {} {} {}", key, HEADER_ARROW, name);
    if markdown.is_empty() {
        header
    } else {
        format!("{}\n\n{}", header, markdown)
    }
}

/// Render the full document with entries in ascending key order
pub fn render_document(title: &str, entries: &EntryMap, generated_at: DateTime<Utc>) -> String {
    let mut out = format!("# {}\n\n", title);
    for block in entries.values() {
        out.push_str(ENTRY_DELIMITER);
        out.push('\n');
        out.push_str(block.trim());
        out.push_str("\n\n");
    }
    out.push_str(FOOTER_MARKER);
    out.push('\n');
    out.push_str(&format!(
        "_Generated {} · {} test files_\n",
        generated_at.to_rfc3339_opts(SecondsFormat::Secs, true),
        entries.len()
    ));
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use proptest::prelude::*;

    fn at() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap()
    }

    #[test]
    fn test_parse_header() {
        assert_eq!(
            parse_header("## tests/auth/login.spec.js → Login flow"),
            Some(("tests/auth/login.spec.js".into(), "Login flow".into()))
        );
        assert_eq!(
            parse_header("### `a.spec.ts` -> A"),
            Some(("a.spec.ts".into(), "A".into()))
        );
        assert_eq!(parse_header("## Overview"), None);
        assert_eq!(parse_header("# a.spec.js → x"), None);
    }

    #[test]
    fn test_render_entry_adds_header() {
        let entry = DocumentationEntry::new("tests/a.spec.js", "Body").with_test_name("A");
        assert_eq!(render_entry(&entry), "## a.spec.js → A\n\nBody");

        let bare = DocumentationEntry::new("b.spec.js", "");
        assert_eq!(render_entry(&bare), "## b.spec.js → b.spec.js");
    }

    #[test]
    fn test_render_entry_keeps_existing_header() {
        let entry = DocumentationEntry::new("a.spec.js", "## dir/a.spec.js → Mine\n\nBody\n");
        assert_eq!(render_entry(&entry), "## dir/a.spec.js → Mine\n\nBody");
    }

    #[test]
    fn test_render_then_parse() {
        let mut entries = EntryMap::new();
        entries.insert("b.spec.js".into(), "## b.spec.js → B\n\nbee".into());
        entries.insert("a.spec.js".into(), "## x/a.spec.js → A\n\nay".into());

        let doc = render_document("Docs", &entries, at());
        assert!(doc.starts_with("# Docs\n"));
        assert!(doc.find("a.spec.js → A").unwrap() < doc.find("b.spec.js → B").unwrap());
        assert!(doc.contains("2 test files"));
        assert_eq!(parse_document(&doc), entries);
    }

    #[test]
    fn test_file_names_with_spaces_survive_reparse() {
        assert_eq!(
            parse_header("## user profile.spec.js → Profile → edit"),
            Some(("user profile.spec.js".into(), "Profile → edit".into()))
        );

        let entry = DocumentationEntry::new("tests/user profile.spec.js", "Edits the profile")
            .with_test_name("Profile");
        let mut entries = EntryMap::new();
        entries.insert(entry.key().to_string(), render_entry(&entry));

        let doc = render_document("Docs", &entries, at());
        let reparsed = parse_document(&doc);
        assert_eq!(reparsed, entries);
        assert_eq!(render_document("Docs", &reparsed, at()), doc);
    }

    #[test]
    fn test_parse_ignores_preamble_footer_and_headerless_blocks() {
        let doc = format!(
            "# T\n\nintro\n\n{d}\nno header here\n\n{d}\n## a.spec.js → A\n\ntext\n\n{f}\n{d}\n## ghost.spec.js → G\n",
            d = ENTRY_DELIMITER,
            f = FOOTER_MARKER
        );
        let entries = parse_document(&doc);
        assert_eq!(entries.len(), 1);
        assert_eq!(entries["a.spec.js"], "## a.spec.js → A\n\ntext");
    }

    #[test]
    fn test_parse_empty() {
        assert!(parse_document("").is_empty());
        assert!(parse_document("# Title only\n").is_empty());
    }

    proptest! {
        #[test]
        fn prop_render_is_stable(
            items in proptest::collection::btree_map("[a-z]{1,8}", "[a-zA-Z ]{0,40}", 0..8)
        ) {
            let entries: EntryMap = items
                .into_iter()
                .map(|(name, body)| {
                    let key = format!("{}.spec.js", name);
                    let block = render_entry(&DocumentationEntry::new(key.clone(), body));
                    (key, block)
                })
                .collect();
            let first = render_document("Docs", &entries, at());
            let second = render_document("Docs", &parse_document(&first), at());
            prop_assert_eq!(first, second);
        }
    }
}
