// Execution Events
// Progress reporting for suite execution

use crate::catalog::Category;
use crate::execution::job::JobResult;

use std::time::Duration;
use tokio::sync::mpsc;

/// Sender for execution progress events
pub type ProgressSender = mpsc::UnboundedSender<ExecutionEvent>;

/// Receiver for execution progress events
pub type ProgressReceiver = mpsc::UnboundedReceiver<ExecutionEvent>;

/// Create a new progress channel
pub fn progress_channel() -> (ProgressSender, ProgressReceiver) {
    mpsc::unbounded_channel()
}

/// Events emitted while a suite runs
///
/// Job events arrive in completion order, which differs between runs.
#[derive(Debug, Clone)]
pub enum ExecutionEvent {
    /// Suite execution started
    SuiteStarted {
        total_jobs: usize,
        workers: usize,
        timeout: Duration,
    },

    /// A worker picked up a job
    JobStarted { name: String, category: Category },

    /// A job reached its terminal status
    JobCompleted {
        result: JobResult,
        /// Jobs finished so far, including this one
        completed: usize,
        total: usize,
    },

    /// Every scheduled job has a terminal result
    SuiteCompleted {
        total_jobs: usize,
        passed: usize,
        wall_time: Duration,
    },
}

impl ExecutionEvent {
    pub fn suite_started(total_jobs: usize, workers: usize, timeout: Duration) -> Self {
        Self::SuiteStarted {
            total_jobs,
            workers,
            timeout,
        }
    }

    pub fn job_started(name: impl Into<String>, category: Category) -> Self {
        Self::JobStarted {
            name: name.into(),
            category,
        }
    }

    pub fn job_completed(result: JobResult, completed: usize, total: usize) -> Self {
        Self::JobCompleted {
            result,
            completed,
            total,
        }
    }

    pub fn suite_completed(total_jobs: usize, passed: usize, wall_time: Duration) -> Self {
        Self::SuiteCompleted {
            total_jobs,
            passed,
            wall_time,
        }
    }
}

/// Helper trait for sending events, ignoring errors (fire-and-forget)
pub trait EventSender {
    fn send_event(&self, event: ExecutionEvent);
}

impl EventSender for ProgressSender {
    fn send_event(&self, event: ExecutionEvent) {
        let _ = self.send(event);
    }
}

impl EventSender for Option<ProgressSender> {
    fn send_event(&self, event: ExecutionEvent) {
        if let Some(sender) = self {
            let _ = sender.send(event);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_progress_channel() {
        let (tx, mut rx) = progress_channel();

        tx.send_event(ExecutionEvent::suite_started(3, 2, Duration::from_secs(1)));
        tx.send_event(ExecutionEvent::job_started("verify_add", Category::Instruction));

        let first = rx.recv().await.unwrap();
        assert!(matches!(first, ExecutionEvent::SuiteStarted { total_jobs: 3, .. }));

        let second = rx.recv().await.unwrap();
        assert!(matches!(second, ExecutionEvent::JobStarted { .. }));
    }

    #[test]
    fn test_optional_sender() {
        let sender: Option<ProgressSender> = None;
        // Should not panic
        sender.send_event(ExecutionEvent::suite_completed(0, 0, Duration::ZERO));
    }

    #[test]
    fn test_closed_receiver_is_ignored() {
        let (tx, rx) = progress_channel();
        drop(rx);
        tx.send_event(ExecutionEvent::job_started("verify_sub", Category::Instruction));
    }
}
