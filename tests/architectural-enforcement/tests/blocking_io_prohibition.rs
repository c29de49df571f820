//! Integration Test: Blocking I/O Prohibition
//!
//! **Policy**: async functions in the TUI and the Conductor MUST NOT block.
//! Config loading and log setup run in plain functions before or beside the
//! runtime and may use `std::fs`.

use architectural_enforcement::all_production_lines;

const FORBIDDEN: [&str; 5] = [
    "std::fs::",
    "std::net::",
    "std::process::Command",
    "reqwest::blocking",
    "std::thread::sleep",
];

#[test]
fn test_no_blocking_io_in_async_code() {
    let violations: Vec<String> = all_production_lines()
        .into_iter()
        .filter(|line| line.in_async_fn)
        .filter(|line| FORBIDDEN.iter().any(|pattern| line.code.contains(pattern)))
        .map(|line| line.describe())
        .collect();

    if !violations.is_empty() {
        eprintln!("\n❌ Blocking I/O found inside async functions!\n");
        for violation in &violations {
            eprintln!("  ❌ {violation}");
        }
        eprintln!("\n✅ Use tokio::fs / tokio::net, or the async reqwest client");

        panic!(
            "\nFound {} blocking I/O violation(s) in async code.",
            violations.len()
        );
    }
}

#[test]
fn test_no_blocking_http_client_anywhere() {
    let violations: Vec<String> = all_production_lines()
        .into_iter()
        .filter(|line| line.code.contains("reqwest::blocking"))
        .map(|line| line.describe())
        .collect();

    assert!(violations.is_empty(), "blocking reqwest used: {violations:#?}");
}
