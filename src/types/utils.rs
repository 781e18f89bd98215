//! Shared helpers for path keys, timestamps and newline lists.

use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};

use chrono::{DateTime, Utc};

/// Filename portion of a path-like key.
///
/// Accepts both `/` and `\` separators since batch entries may come from
/// workers on either platform.
pub fn basename(path: &str) -> &str {
    path.rsplit(['/', '\\']).next().unwrap_or(path)
}

/// Normalize a relative path into the `/`-separated form used as a store key.
pub fn path_key(path: &Path) -> String {
    path.components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

/// Milliseconds since the Unix epoch for a `SystemTime`.
pub fn system_time_millis(time: SystemTime) -> i64 {
    time.duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as i64)
        .unwrap_or(0)
}

/// Milliseconds since the Unix epoch for a chrono timestamp.
#[inline]
pub fn millis(time: DateTime<Utc>) -> i64 {
    time.timestamp_millis()
}

/// Parse a newline-separated list, dropping blank lines and surrounding
/// whitespace.
pub fn parse_lines(content: &str) -> Vec<String> {
    content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(String::from)
        .collect()
}

/// Render a list as newline-separated text with a trailing newline.
pub fn render_lines<S: AsRef<str>>(items: &[S]) -> String {
    let mut out = String::new();
    for item in items {
        out.push_str(item.as_ref());
        out.push('\n');
    }
    out
}

/// Natural sort key: stems ending in digits order numerically (`batch-2`
/// before `batch-10`), everything else lexicographically after.
pub fn natural_key(name: &str) -> (String, u64, String) {
    let stem = name.split('.').next().unwrap_or(name);
    let digits: String = stem
        .chars()
        .rev()
        .take_while(|c| c.is_ascii_digit())
        .collect::<Vec<_>>()
        .into_iter()
        .rev()
        .collect();
    let prefix = stem[..stem.len() - digits.len()].to_string();
    let number = digits.parse().unwrap_or(u64::MAX);
    (prefix, number, name.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_basename() {
        assert_eq!(basename("tests/auth/login.spec.js"), "login.spec.js");
        assert_eq!(basename("login.spec.js"), "login.spec.js");
        assert_eq!(basename("tests\\win\\a.spec.ts"), "a.spec.ts");
    }

    #[test]
    fn test_path_key() {
        let path = PathBuf::from("tests").join("auth").join("login.spec.js");
        assert_eq!(path_key(&path), "tests/auth/login.spec.js");
    }

    #[test]
    fn test_parse_lines() {
        let lines = parse_lines("a.spec.js\n\n  b.spec.js  \n");
        assert_eq!(lines, vec!["a.spec.js", "b.spec.js"]);
        assert_eq!(render_lines(&lines), "a.spec.js\nb.spec.js\n");
        assert!(parse_lines("").is_empty());
    }

    #[test]
    fn test_natural_key_ordering() {
        let mut names = vec!["batch-10.json", "batch-2.json", "batch-1.json"];
        names.sort_by_key(|n| natural_key(n));
        assert_eq!(names, vec!["batch-1.json", "batch-2.json", "batch-10.json"]);
    }
}
