// Output formatting helpers for CLI commands

use verify_service::{JobResult, JobStatus};

/// Print a status message: "  Status message"
pub fn status(action: &str, message: &str) {
    eprintln!("\x1b[1;36m{:>12}\x1b[0m {}", action, message);
}

/// Print a success message with checkmark
pub fn success(message: &str) {
    eprintln!("\x1b[1;32m  \u{2713}\x1b[0m {}", message);
}

/// Print a failure message with X
pub fn failure(message: &str) {
    eprintln!("\x1b[1;31m  \u{2717}\x1b[0m {}", message);
}

/// Print a warning message
pub fn warning(message: &str) {
    eprintln!("\x1b[33m  !\x1b[0m {}", message);
}

/// Print an info message
pub fn info(message: &str) {
    eprintln!("\x1b[36m  i\x1b[0m {}", message);
}

/// Print a dim/muted message
pub fn dim(message: &str) {
    eprintln!("\x1b[2m{}\x1b[0m", message);
}

/// Print a header line
pub fn header(message: &str) {
    eprintln!("\x1b[1m==> {}\x1b[0m", message);
}

/// Print the progress line for a finished job
///
/// `[PASS] [instructions] verify_add           - PASS     (0.12s) [3/51]`
pub fn job_line(result: &JobResult, completed: usize, total: usize) {
    let line = format!(
        "{:9} [{:12}] {:20} - {:8} ({:.2}s) [{}/{}]",
        format!("[{}]", result.status.label()),
        result.category.key(),
        result.name,
        result.status.label(),
        result.duration.as_secs_f64(),
        completed,
        total
    );
    match result.status {
        JobStatus::Passed => println!("\x1b[32m{}\x1b[0m", line),
        JobStatus::TimedOut => println!("\x1b[33m{}\x1b[0m", line),
        _ => println!("\x1b[31m{}\x1b[0m", line),
    }
}
