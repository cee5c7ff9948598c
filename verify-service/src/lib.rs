// Verify Service Library
// Formal verification suite: matrix generation, parallel execution and reporting

pub mod catalog;
pub mod config;
pub mod error;
pub mod execution;
pub mod generator;
pub mod orchestrator;
pub mod reporting;

// Re-export commonly used types
pub use error::{AggregationError, VerifyError, VerifyResult};

// Re-export catalog and configuration types
pub use catalog::{CatalogError, Category, CheckCatalog, CheckDefinition};
pub use config::{ConfigError, SuiteConfig, CONFIG_FILE_NAME};

// Re-export generator types
pub use generator::{
    Artifact, GenerationError, GenerationReport, MatrixGenerator, TestUnit, WriteState,
};

// Re-export execution types
pub use execution::{
    progress_channel, ExecutionEvent, ExecutorConfig, JobLauncher, JobOutcome, JobResult,
    JobStatus, LaunchError, ProcessLauncher, ProgressReceiver, ProgressSender, SuiteExecutor,
};

// Re-export reporting types
pub use reporting::{ReportFormat, SuiteReport, SuiteReporter, SuiteStatistics};

// Re-export orchestration types
pub use orchestrator::{Orchestrator, SuiteOptions, SuiteOutcome};
