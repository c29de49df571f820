//! Integration Test: Headless Core
//!
//! **Policy**: the Conductor core knows nothing about terminals. It must not
//! depend on ratatui or crossterm, in its manifest or its code.

use std::fs;

use architectural_enforcement::{production_lines, rust_files, workspace_root};

const UI_CRATES: [&str; 2] = ["ratatui", "crossterm"];

#[test]
fn test_core_manifest_has_no_ui_dependencies() {
    let manifest = fs::read_to_string(workspace_root().join("conductor/core/Cargo.toml"))
        .expect("core manifest should be readable");

    let offending: Vec<&str> = manifest
        .lines()
        .map(str::trim)
        .filter(|line| !line.starts_with('#'))
        .filter(|line| UI_CRATES.iter().any(|c| line.starts_with(c)))
        .collect();

    assert!(offending.is_empty(), "UI crates in core manifest: {offending:?}");
}

#[test]
fn test_core_code_has_no_ui_imports() {
    let violations: Vec<String> = rust_files("conductor/core/src")
        .iter()
        .flat_map(|path| production_lines(path))
        .filter(|line| {
            UI_CRATES
                .iter()
                .any(|c| line.code.contains(&format!("{c}::")))
        })
        .map(|line| line.describe())
        .collect();

    assert!(violations.is_empty(), "UI imports in core: {violations:#?}");
}
