//! Architectural Enforcement Integration Tests
//!
//! This package contains integration tests that enforce architectural principles:
//! - No sleep() calls in production code (timers are deadlines, not naps)
//! - No blocking I/O inside async functions
//! - The Conductor core stays free of UI dependencies
//!
//! The helpers below walk the workspace sources and hand the tests only the
//! production part of each file: comments are stripped and everything from
//! the first `#[cfg(test)]` on is ignored.

use std::fs;
use std::path::{Path, PathBuf};

/// Production source trees checked by every rule
pub const PRODUCTION_DIRS: [&str; 2] = ["conductor/core/src", "tui/src"];

/// One line of production code
#[derive(Debug)]
pub struct SourceLine {
    /// File the line came from
    pub path: PathBuf,
    /// 1-based line number
    pub number: usize,
    /// The line with any `//` comment removed
    pub code: String,
    /// Whether the nearest enclosing `fn` is `async`
    pub in_async_fn: bool,
}

impl SourceLine {
    /// `path:line - code` for violation reports
    pub fn describe(&self) -> String {
        format!(
            "{}:{} - {}",
            self.path.display(),
            self.number,
            self.code.trim()
        )
    }
}

/// Workspace root (two levels above this package)
pub fn workspace_root() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("../..")
}

/// All `.rs` files under `dir` (relative to the workspace root)
pub fn rust_files(dir: &str) -> Vec<PathBuf> {
    let root = workspace_root().join(dir);
    walkdir::WalkDir::new(root)
        .into_iter()
        .filter_map(Result::ok)
        .filter(|e| e.path().extension().and_then(|s| s.to_str()) == Some("rs"))
        .map(|e| e.into_path())
        .collect()
}

/// Production lines of one file
pub fn production_lines(path: &Path) -> Vec<SourceLine> {
    let Ok(content) = fs::read_to_string(path) else {
        return Vec::new();
    };

    let mut lines = Vec::new();
    let mut in_async_fn = false;

    for (idx, line) in content.lines().enumerate() {
        let trimmed = line.trim_start();
        if trimmed.starts_with("#[cfg(test)]") {
            break;
        }

        let code = line.split("//").next().unwrap_or(line).to_string();
        if let Some(is_async) = fn_header(&code) {
            in_async_fn = is_async;
        }

        lines.push(SourceLine {
            path: path.to_path_buf(),
            number: idx + 1,
            code,
            in_async_fn,
        });
    }

    lines
}

/// Production lines of every file under [`PRODUCTION_DIRS`]
pub fn all_production_lines() -> Vec<SourceLine> {
    PRODUCTION_DIRS
        .iter()
        .flat_map(|dir| rust_files(dir))
        .flat_map(|path| production_lines(&path))
        .collect()
}

/// `Some(true)` for an `async fn` header, `Some(false)` for a plain `fn`
fn fn_header(code: &str) -> Option<bool> {
    let words: Vec<&str> = code.split_whitespace().collect();
    let fn_pos = words.iter().position(|w| *w == "fn")?;
    let qualifiers = &words[..fn_pos];
    if !qualifiers
        .iter()
        .all(|w| matches!(*w, "pub" | "pub(crate)" | "async" | "const" | "unsafe"))
    {
        return None;
    }
    Some(qualifiers.contains(&"async"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fn_header_detection() {
        assert_eq!(fn_header("    pub async fn start(&mut self) {"), Some(true));
        assert_eq!(fn_header("fn log_dir() -> PathBuf {"), Some(false));
        assert_eq!(fn_header("    pub(crate) fn helper<T>(t: T) {"), Some(false));
        assert_eq!(fn_header("    let f = async move {"), None);
        assert_eq!(fn_header("    where F: Fn(&str) -> bool,"), None);
    }

    #[test]
    fn test_workspace_sources_found() {
        assert!(!rust_files("conductor/core/src").is_empty());
        assert!(!rust_files("tui/src").is_empty());
    }
}
