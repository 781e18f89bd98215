//! Human-facing console output
//!
//! Everything here goes to stderr so stdout carries only machine-readable
//! `key=value` lines that pipeline steps can parse.

use console::style;

pub struct Output;

impl Output {
    pub fn new() -> Self {
        Self
    }

    pub fn success(&self, message: &str) {
        eprintln!("{} {}", style("✓").green(), message);
    }

    pub fn warning(&self, message: &str) {
        eprintln!("{} {}", style("⚠").yellow(), message);
    }

    pub fn info(&self, message: &str) {
        eprintln!("{} {}", style("ℹ").blue(), message);
    }

    pub fn header(&self, message: &str) {
        eprintln!("\n{}", style(message).bold().underlined());
    }

    pub fn section(&self, message: &str) {
        eprintln!("\n{}", style(message).bold());
        eprintln!("{}", "─".repeat(40));
    }

    /// Aligned `label: value` row
    pub fn row(&self, label: &str, value: impl std::fmt::Display) {
        eprintln!("  {:<14} {}", format!("{}:", label), value);
    }

    /// Indented list item, dimmed
    pub fn item(&self, text: &str) {
        eprintln!("    {}", style(text).dim());
    }
}

impl Default for Output {
    fn default() -> Self {
        Self::new()
    }
}
