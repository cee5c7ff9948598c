// Suite Executor
// Runs test units under a bounded worker pool with a per-job deadline

use crate::execution::discovery::find_log_file;
use crate::execution::events::{EventSender, ExecutionEvent, ProgressSender};
use crate::execution::job::{JobOutcome, JobResult, LaunchError};
use crate::execution::launcher::JobLauncher;
use crate::generator::TestUnit;

use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::{mpsc, Semaphore};

/// Result of running a set of units
#[derive(Debug, Clone)]
pub struct ExecutionResult {
    /// One terminal result per scheduled unit, in scheduling order
    pub results: Vec<JobResult>,
    /// Wall-clock time from first launch to last completion
    pub wall_time: Duration,
}

/// Configuration for suite execution
#[derive(Debug, Clone)]
pub struct ExecutorConfig {
    /// Jobs allowed to run at the same time
    pub workers: usize,
    /// Deadline for each job
    pub timeout: Duration,
    /// Extension of log files picked up after each job
    pub log_extension: String,
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        Self {
            workers: crate::config::default_workers(),
            timeout: Duration::from_secs(crate::config::DEFAULT_TIMEOUT_SECS),
            log_extension: "log".to_string(),
        }
    }
}

/// Executes verification jobs concurrently
///
/// Jobs never share a worker slot: a hung job holds only its own slot until
/// its deadline. Failures and timeouts never stop sibling jobs.
pub struct SuiteExecutor {
    launcher: Arc<dyn JobLauncher>,
    config: ExecutorConfig,
    event_tx: Option<ProgressSender>,
}

impl SuiteExecutor {
    pub fn new(launcher: Arc<dyn JobLauncher>, config: ExecutorConfig) -> Self {
        Self {
            launcher,
            config,
            event_tx: None,
        }
    }

    /// Set progress event sender
    pub fn with_progress(mut self, tx: ProgressSender) -> Self {
        self.event_tx = Some(tx);
        self
    }

    pub fn config(&self) -> &ExecutorConfig {
        &self.config
    }

    /// Run every unit and collect exactly one terminal result per unit
    pub async fn execute(&self, units: Vec<TestUnit>) -> ExecutionResult {
        let start = Instant::now();
        let total = units.len();
        let workers = self.config.workers.max(1);

        self.event_tx
            .send_event(ExecutionEvent::suite_started(total, workers, self.config.timeout));
        tracing::info!(jobs = total, workers, timeout_secs = self.config.timeout.as_secs(), "suite started");

        let semaphore = Arc::new(Semaphore::new(workers));
        let (result_tx, mut result_rx) = mpsc::unbounded_channel::<(usize, JobResult)>();

        let mut handles = Vec::with_capacity(total);
        for (index, unit) in units.iter().cloned().enumerate() {
            let semaphore = Arc::clone(&semaphore);
            let launcher = Arc::clone(&self.launcher);
            let result_tx = result_tx.clone();
            let event_tx = self.event_tx.clone();
            let timeout = self.config.timeout;
            let log_extension = self.config.log_extension.clone();

            handles.push(tokio::spawn(async move {
                // The semaphore is never closed, so acquisition only waits for a free slot
                let Ok(_permit) = semaphore.acquire_owned().await else {
                    return;
                };
                let result =
                    run_job(launcher.as_ref(), &unit, timeout, &log_extension, &event_tx).await;
                let _ = result_tx.send((index, result));
            }));
        }
        // Only workers hold senders now; the loop below ends when the last one finishes
        drop(result_tx);

        let mut slots: Vec<Option<JobResult>> = (0..total).map(|_| None).collect();
        let mut completed = 0;
        while let Some((index, result)) = result_rx.recv().await {
            completed += 1;
            self.event_tx
                .send_event(ExecutionEvent::job_completed(result.clone(), completed, total));
            slots[index] = Some(result);
        }

        // A worker that died before reporting still owes its unit a result
        for (index, handle) in handles.into_iter().enumerate() {
            let join_error = handle.await.err();
            if slots[index].is_some() {
                continue;
            }

            let reason = join_error
                .map(|e| e.to_string())
                .unwrap_or_else(|| "no result reported".to_string());
            tracing::error!(job = %units[index].name, %reason, "worker lost");

            let result = JobResult::pending(&units[index]).finish(
                JobOutcome::LaunchFailed(LaunchError::WorkerLost(reason)),
                Duration::ZERO,
                None,
            );
            completed += 1;
            self.event_tx
                .send_event(ExecutionEvent::job_completed(result.clone(), completed, total));
            slots[index] = Some(result);
        }

        let results: Vec<JobResult> = slots.into_iter().flatten().collect();
        let wall_time = start.elapsed();
        let passed = results.iter().filter(|r| r.passed()).count();

        self.event_tx
            .send_event(ExecutionEvent::suite_completed(total, passed, wall_time));
        tracing::info!(jobs = total, passed, wall_secs = wall_time.as_secs_f64(), "suite finished");

        ExecutionResult { results, wall_time }
    }
}

/// Run one job from start to its terminal result
async fn run_job(
    launcher: &dyn JobLauncher,
    unit: &TestUnit,
    timeout: Duration,
    log_extension: &str,
    event_tx: &Option<ProgressSender>,
) -> JobResult {
    let mut result = JobResult::pending(unit);
    result.start();
    event_tx.send_event(ExecutionEvent::job_started(&unit.name, unit.category));

    let started = Instant::now();
    let outcome = launcher.launch(unit, timeout).await;
    let duration = match &outcome {
        JobOutcome::Exited {
            elapsed: Some(elapsed),
            ..
        } => *elapsed,
        _ => started.elapsed(),
    };

    let log_file = find_log_file(&unit.output_dir(), log_extension);
    let result = result.finish(outcome, duration, log_file);
    tracing::debug!(job = %result.name, status = %result.status, secs = duration.as_secs_f64(), "job finished");
    result
}
