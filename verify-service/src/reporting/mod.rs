// Reporting Module
// Aggregation of job results and report rendering

pub mod reporter;
pub mod summary;

pub use reporter::{ReportFormat, SuiteReporter, DIAGNOSTIC_PREVIEW_CHARS, REPORT_FILE_NAME};
pub use summary::{CategoryStats, JobTiming, SuiteReport, SuiteStatistics};
