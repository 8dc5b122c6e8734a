//! Terminal output for envelope-check.

use colored::Colorize;

/// Print a passing envelope.
pub fn print_ok(source: &str, message_type: &str, id: &str) {
    println!("{} {} ({} {})", "ok".green().bold(), source, message_type, id);
}

/// Print a failing envelope.
pub fn print_failure(source: &str, reason: &str) {
    println!("{} {}: {}", "FAIL".red().bold(), source, reason);
}

/// Print the summary line.
pub fn print_summary(passed: usize, failed: usize) {
    let line = format!("{} passed, {} failed", passed, failed);
    if failed == 0 {
        println!("{}", line.green());
    } else {
        println!("{}", line.red());
    }
}

/// Print an error in a user-friendly format.
pub fn print_error(err: &anyhow::Error) {
    eprintln!("{} {}", "Error:".red().bold(), err);
    for cause in err.chain().skip(1) {
        eprintln!("  {} {}", "caused by:".dimmed(), cause);
    }
}
