// Error Types
// Suite-level error taxonomy; per-job failures live on JobResult instead

use crate::catalog::{CatalogError, Category};
use crate::config::ConfigError;
use crate::generator::GenerationError;

use std::io;
use std::path::PathBuf;
use thiserror::Error;

pub type VerifyResult<T> = Result<T, VerifyError>;

/// Raised when the collected results cannot form a meaningful report
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AggregationError {
    #[error("no verification jobs discovered across {searched} selected categories")]
    NoJobs { searched: usize },
}

/// Errors that abort a whole invocation
#[derive(Debug, Error)]
pub enum VerifyError {
    #[error("Catalog error: {0}")]
    Catalog(#[from] CatalogError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Formal directory not found: {}", .0.display())]
    FormalDirNotFound(PathBuf),

    #[error("{failed} of {total} artifacts failed to generate")]
    Generation {
        failed: usize,
        total: usize,
        errors: Vec<GenerationError>,
    },

    #[error("Test location for category '{category}' not found: {}", .path.display())]
    MissingTestLocation { category: Category, path: PathBuf },

    #[error(transparent)]
    Aggregation(#[from] AggregationError),

    #[error("Failed to write report {}: {source}", .path.display())]
    ReportWrite {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Failed to serialize report: {0}")]
    ReportSerialize(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}
