// Job Results
// Status lifecycle and outcome classification for one verification job

use crate::catalog::Category;
use crate::generator::TestUnit;

use std::fmt;
use std::io;
use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Status of a verification job
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    Pending,
    Running,
    Passed,
    /// Backend exited non-zero: the design violates the check
    Failed,
    TimedOut,
    /// The job could not be launched or monitored
    Errored,
}

impl JobStatus {
    /// Statuses a finished job can have, in report order
    pub const TERMINAL: [JobStatus; 4] = [
        JobStatus::Passed,
        JobStatus::Failed,
        JobStatus::TimedOut,
        JobStatus::Errored,
    ];

    pub fn is_terminal(&self) -> bool {
        !matches!(self, JobStatus::Pending | JobStatus::Running)
    }

    /// Short tag used in progress lines and summaries
    pub fn label(&self) -> &'static str {
        match self {
            JobStatus::Pending => "PENDING",
            JobStatus::Running => "RUNNING",
            JobStatus::Passed => "PASS",
            JobStatus::Failed => "FAIL",
            JobStatus::TimedOut => "TIMEOUT",
            JobStatus::Errored => "ERROR",
        }
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// The process could not be started or watched to completion
#[derive(Debug, Error)]
pub enum LaunchError {
    #[error("backend tool '{program}' not found: {reason}")]
    ProgramNotFound { program: String, reason: String },

    #[error("failed to spawn '{program}': {source}")]
    Spawn {
        program: String,
        #[source]
        source: io::Error,
    },

    #[error("failed to wait for process: {0}")]
    Wait(#[source] io::Error),

    #[error("process terminated without an exit code ({0})")]
    Terminated(String),

    #[error("worker stopped before reporting: {0}")]
    WorkerLost(String),
}

/// Raw outcome of running one job, before classification
#[derive(Debug)]
pub enum JobOutcome {
    Exited {
        code: i32,
        stdout: String,
        stderr: String,
        /// Spawn-to-exit time, when the launcher measured it
        elapsed: Option<Duration>,
    },
    TimedOut {
        after: Duration,
        /// Whether the process was confirmed reaped after the kill
        terminated: bool,
    },
    LaunchFailed(LaunchError),
}

impl JobOutcome {
    /// Map a raw outcome onto (status, exit code, diagnostic)
    pub fn classify(self) -> (JobStatus, Option<i32>, Option<String>) {
        match self {
            JobOutcome::Exited { code: 0, .. } => (JobStatus::Passed, Some(0), None),
            JobOutcome::Exited {
                code,
                stdout,
                stderr,
                ..
            } => {
                let text = if stderr.trim().is_empty() { stdout } else { stderr };
                let diagnostic = if text.trim().is_empty() {
                    format!("exited with code {}", code)
                } else {
                    text
                };
                (JobStatus::Failed, Some(code), Some(diagnostic))
            }
            JobOutcome::TimedOut { after, terminated } => {
                let mut message = format!("timed out after {}s", after.as_secs());
                if !terminated {
                    message.push_str(" (process could not be confirmed terminated)");
                }
                (JobStatus::TimedOut, None, Some(message))
            }
            JobOutcome::LaunchFailed(e) => (JobStatus::Errored, None, Some(e.to_string())),
        }
    }
}

/// Execution record for one test unit
#[derive(Debug, Clone, PartialEq)]
pub struct JobResult {
    pub name: String,
    pub category: Category,
    pub status: JobStatus,
    pub duration: Duration,
    pub exit_code: Option<i32>,
    pub log_file: Option<PathBuf>,
    pub diagnostic: Option<String>,
}

impl JobResult {
    /// A result for a unit that has been scheduled but not started
    pub fn pending(unit: &TestUnit) -> Self {
        Self {
            name: unit.name.clone(),
            category: unit.category,
            status: JobStatus::Pending,
            duration: Duration::ZERO,
            exit_code: None,
            log_file: None,
            diagnostic: None,
        }
    }

    pub fn start(&mut self) {
        if self.status == JobStatus::Pending {
            self.status = JobStatus::Running;
        }
    }

    /// Finalize the result from a job outcome
    ///
    /// A result is finalized once; finishing an already terminal result
    /// leaves it untouched.
    pub fn finish(mut self, outcome: JobOutcome, duration: Duration, log_file: Option<PathBuf>) -> Self {
        if self.status.is_terminal() {
            tracing::warn!(job = %self.name, "ignoring second completion of a finished job");
            return self;
        }

        let (status, exit_code, diagnostic) = outcome.classify();
        self.status = status;
        self.exit_code = exit_code;
        self.diagnostic = diagnostic;
        self.duration = duration;
        self.log_file = log_file;
        self
    }

    pub fn passed(&self) -> bool {
        self.status == JobStatus::Passed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unit() -> TestUnit {
        TestUnit {
            name: "verify_add".to_string(),
            check_id: "add".to_string(),
            category: Category::Instruction,
            artifact_path: PathBuf::from("/formal/instructions/verify_add.sby"),
            depth: 20,
            engine: "smtbmc boolector".to_string(),
            sources: vec![],
        }
    }

    fn exited(code: i32, stdout: &str, stderr: &str) -> JobOutcome {
        JobOutcome::Exited {
            code,
            stdout: stdout.to_string(),
            stderr: stderr.to_string(),
            elapsed: None,
        }
    }

    #[test]
    fn test_exit_zero_passes() {
        let (status, code, diag) = exited(0, "SBY DONE", "").classify();
        assert_eq!(status, JobStatus::Passed);
        assert_eq!(code, Some(0));
        assert_eq!(diag, None);
    }

    #[test]
    fn test_nonzero_prefers_stderr() {
        let (status, code, diag) = exited(2, "summary", "assert failed").classify();
        assert_eq!(status, JobStatus::Failed);
        assert_eq!(code, Some(2));
        assert_eq!(diag.as_deref(), Some("assert failed"));
    }

    #[test]
    fn test_nonzero_falls_back_to_stdout() {
        let (_, _, diag) = exited(1, "ERROR: step 7 assert", "  ").classify();
        assert_eq!(diag.as_deref(), Some("ERROR: step 7 assert"));

        let (_, _, diag) = exited(1, "", "").classify();
        assert_eq!(diag.as_deref(), Some("exited with code 1"));
    }

    #[test]
    fn test_timeout_is_never_failed() {
        let (status, code, diag) = JobOutcome::TimedOut {
            after: Duration::from_secs(300),
            terminated: true,
        }
        .classify();
        assert_eq!(status, JobStatus::TimedOut);
        assert_eq!(code, None);
        assert_eq!(diag.as_deref(), Some("timed out after 300s"));
    }

    #[test]
    fn test_launch_failure_is_errored() {
        let outcome = JobOutcome::LaunchFailed(LaunchError::ProgramNotFound {
            program: "sby".to_string(),
            reason: "cannot find binary path".to_string(),
        });
        let (status, _, diag) = outcome.classify();
        assert_eq!(status, JobStatus::Errored);
        assert!(diag.unwrap().contains("'sby' not found"));
    }

    #[test]
    fn test_lifecycle() {
        let mut result = JobResult::pending(&unit());
        assert_eq!(result.status, JobStatus::Pending);
        result.start();
        assert_eq!(result.status, JobStatus::Running);

        let result = result.finish(exited(0, "", ""), Duration::from_millis(40), None);
        assert!(result.passed());
        assert_eq!(result.duration, Duration::from_millis(40));
    }

    #[test]
    fn test_finish_happens_once() {
        let result = JobResult::pending(&unit()).finish(exited(1, "", "bad"), Duration::from_secs(1), None);
        let again = result.clone().finish(exited(0, "", ""), Duration::from_secs(9), None);
        assert_eq!(again, result);
    }
}
