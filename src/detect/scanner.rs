use glob::{MatchOptions, Pattern};
use ignore::WalkBuilder;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::config::DiscoveryConfig;
use crate::constants::discovery::MAX_FILE_SIZE;
use crate::types::{Result, path_key};

const MATCH_OPTIONS: MatchOptions = MatchOptions {
    case_sensitive: true,
    require_literal_separator: true,
    require_literal_leading_dot: false,
};

/// Walks the project tree and lists candidate test files
pub struct TestScanner {
    root: PathBuf,
    include: Vec<Pattern>,
    exclude: Vec<Pattern>,
    max_file_size: u64,
}

impl TestScanner {
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
            include: vec![],
            exclude: vec![],
            max_file_size: MAX_FILE_SIZE,
        }
    }

    pub fn from_config(config: &DiscoveryConfig) -> Result<Self> {
        Self::new(&config.root)
            .with_include(&config.include)?
            .with_exclude(&config.exclude)
            .map(|s| s.with_max_file_size(config.max_file_size))
    }

    pub fn with_include<S: AsRef<str>>(mut self, patterns: &[S]) -> Result<Self> {
        self.include = compile(patterns)?;
        Ok(self)
    }

    pub fn with_exclude<S: AsRef<str>>(mut self, patterns: &[S]) -> Result<Self> {
        self.exclude = compile(patterns)?;
        Ok(self)
    }

    pub fn with_max_file_size(mut self, size: u64) -> Self {
        self.max_file_size = size;
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Relative, `/`-separated paths of every matching file, sorted
    /// lexicographically
    pub fn discover(&self) -> Result<Vec<String>> {
        let walker = WalkBuilder::new(&self.root)
            .hidden(false)
            .git_ignore(true)
            .git_global(true)
            .git_exclude(true)
            .follow_links(false) // Security: prevent symlink traversal attacks
            .build();

        let mut paths = Vec::new();

        for entry in walker.filter_map(|e| e.ok()) {
            let path = entry.path();

            if !entry.file_type().is_some_and(|t| t.is_file()) {
                continue;
            }

            let Ok(relative) = path.strip_prefix(&self.root) else {
                continue;
            };
            let key = path_key(relative);

            if !self.is_candidate(&key) {
                continue;
            }

            match path.metadata() {
                Ok(metadata) if metadata.len() <= self.max_file_size => paths.push(key),
                Ok(_) => debug!("Skipping oversized file: {}", key),
                Err(e) => debug!("Skipping unreadable file {}: {}", key, e),
            }
        }

        paths.sort();
        paths.dedup();
        debug!("Discovered {} test files under {}", paths.len(), self.root.display());
        Ok(paths)
    }

    /// Whether a relative path passes the include/exclude filters
    pub fn is_candidate(&self, relative: &str) -> bool {
        let included = self
            .include
            .iter()
            .any(|p| p.matches_with(relative, MATCH_OPTIONS));
        let excluded = self
            .exclude
            .iter()
            .any(|p| p.matches_with(relative, MATCH_OPTIONS));
        included && !excluded
    }
}

fn compile<S: AsRef<str>>(patterns: &[S]) -> Result<Vec<Pattern>> {
    patterns
        .iter()
        .map(|p| Pattern::new(p.as_ref()).map_err(Into::into))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn touch(root: &Path, relative: &str) {
        let path = root.join(relative);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, relative).unwrap();
    }

    fn scanner(root: &Path) -> TestScanner {
        TestScanner::new(root)
            .with_include(&["tests/**/*.spec.js", "tests/**/*.spec.ts"])
            .unwrap()
            .with_exclude(&["node_modules/**", "tests/fixtures/**"])
            .unwrap()
    }

    #[test]
    fn test_discover_sorted_and_filtered() {
        let temp = TempDir::new().unwrap();
        touch(temp.path(), "tests/b.spec.js");
        touch(temp.path(), "tests/auth/a.spec.ts");
        touch(temp.path(), "tests/helpers.js");
        touch(temp.path(), "tests/fixtures/skip.spec.js");
        touch(temp.path(), "node_modules/pkg/tests/x.spec.js");
        touch(temp.path(), "src/app.spec.js");

        let found = scanner(temp.path()).discover().unwrap();
        assert_eq!(found, vec!["tests/auth/a.spec.ts", "tests/b.spec.js"]);
    }

    #[test]
    fn test_star_does_not_cross_directories() {
        let s = TestScanner::new(".").with_include(&["tests/*.spec.js"]).unwrap();
        assert!(s.is_candidate("tests/a.spec.js"));
        assert!(!s.is_candidate("tests/nested/a.spec.js"));
    }

    #[test]
    fn test_max_file_size() {
        let temp = TempDir::new().unwrap();
        touch(temp.path(), "tests/big.spec.js");
        let found = scanner(temp.path())
            .with_max_file_size(3)
            .discover()
            .unwrap();
        assert!(found.is_empty());
    }

    #[test]
    fn test_invalid_pattern() {
        assert!(TestScanner::new(".").with_include(&["tests/["]).is_err());
    }
}
