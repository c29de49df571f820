//! Integration Test: Sleep Prohibition
//!
//! **Policy**: Production code in the TUI and the Conductor MUST NOT sleep.
//! Placeholder, minimum-display and voice timers are deadlines the Conductor
//! waits on with `sleep_until`; the TUI redraws on a `tokio::time::interval`.
//! **Exceptions**: test code (everything after `#[cfg(test)]`, and `tests/`).

use architectural_enforcement::all_production_lines;

#[test]
fn test_no_sleep_in_production_code() {
    let violations: Vec<String> = all_production_lines()
        .into_iter()
        .filter(|line| {
            line.code.contains("::sleep(")
                || line.code.contains(".sleep(")
                || line.code.contains("thread::sleep")
        })
        .map(|line| line.describe())
        .collect();

    if !violations.is_empty() {
        eprintln!("\n❌ Sleep calls found in production code!\n");
        for violation in &violations {
            eprintln!("  ❌ {violation}");
        }
        eprintln!("\n✅ Use a deadline (tokio::time::sleep_until) or tokio::time::interval");

        panic!(
            "\nFound {} sleep violation(s) in production code.",
            violations.len()
        );
    }
}
