// Execution Module
// Discovers generated units and runs them through the backend

pub mod discovery;
pub mod events;
pub mod executor;
pub mod job;
pub mod launcher;

pub use discovery::{discover_units, find_artifacts, find_log_file, has_artifacts};
pub use events::{progress_channel, EventSender, ExecutionEvent, ProgressReceiver, ProgressSender};
pub use executor::{ExecutionResult, ExecutorConfig, SuiteExecutor};
pub use job::{JobOutcome, JobResult, JobStatus, LaunchError};
pub use launcher::{JobLauncher, ProcessLauncher};
