// Matrix Generator Module
// Renders one verification artifact per catalog entry

pub mod artifact;
pub mod matrix;

pub use artifact::{Artifact, ArtifactOptions, ArtifactParseError, ScriptLine, ARTIFACT_EXTENSION};
pub use matrix::{GeneratedUnit, GenerationOutcome, GenerationReport, MatrixGenerator, WriteState};

use crate::catalog::Category;

use std::io;
use std::path::{Path, PathBuf};

use serde::Serialize;
use thiserror::Error;

/// A generated, discoverable verification job
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TestUnit {
    /// Artifact stem, `verify_<check-id>`
    pub name: String,
    pub check_id: String,
    pub category: Category,
    pub artifact_path: PathBuf,
    pub depth: u32,
    pub engine: String,
    pub sources: Vec<PathBuf>,
}

impl TestUnit {
    /// Directory the backend runs in
    pub fn artifact_dir(&self) -> &Path {
        self.artifact_path.parent().unwrap_or_else(|| Path::new("."))
    }

    /// Directory the backend writes its work products to
    pub fn output_dir(&self) -> PathBuf {
        self.artifact_dir().join(&self.name)
    }
}

/// Failure to produce the artifact for one catalog entry
#[derive(Debug, Error)]
pub enum GenerationError {
    #[error("cannot render '{check_id}' ({category}): {reason}")]
    Render {
        check_id: String,
        category: Category,
        reason: String,
    },

    #[error("cannot create {} for '{check_id}': {source}", .path.display())]
    CreateDir {
        check_id: String,
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("cannot write {} for '{check_id}': {source}", .path.display())]
    Write {
        check_id: String,
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl GenerationError {
    /// The catalog entry this error is scoped to
    pub fn check_id(&self) -> &str {
        match self {
            GenerationError::Render { check_id, .. }
            | GenerationError::CreateDir { check_id, .. }
            | GenerationError::Write { check_id, .. } => check_id,
        }
    }
}
