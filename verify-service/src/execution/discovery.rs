// Unit Discovery
// Finds generated artifacts on disk and the logs the backend leaves behind

use crate::catalog::Category;
use crate::config::SuiteConfig;
use crate::error::{VerifyError, VerifyResult};
use crate::generator::{Artifact, TestUnit, ARTIFACT_EXTENSION};

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use walkdir::WalkDir;

/// Artifact files directly inside `dir`, sorted by file name
pub fn find_artifacts(dir: &Path) -> io::Result<Vec<PathBuf>> {
    let mut artifacts: Vec<PathBuf> = fs::read_dir(dir)?
        .flatten()
        .map(|entry| entry.path())
        .filter(|path| {
            path.is_file() && path.extension().and_then(|e| e.to_str()) == Some(ARTIFACT_EXTENSION)
        })
        .collect();
    artifacts.sort();
    Ok(artifacts)
}

/// Whether a category directory holds at least one artifact
pub fn has_artifacts(formal_dir: &Path, category: Category) -> bool {
    find_artifacts(&formal_dir.join(category.dir_name()))
        .map(|found| !found.is_empty())
        .unwrap_or(false)
}

/// Rebuild a test unit from an artifact file
///
/// Unreadable or malformed artifacts are still returned as units (with the
/// category's configured depth and engine) since the backend decides
/// whether the artifact is valid.
pub fn unit_from_artifact(path: &Path, category: Category, config: &SuiteConfig) -> TestUnit {
    let name = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let check_id = name.strip_prefix("verify_").unwrap_or(&name).to_string();

    let mut unit = TestUnit {
        name,
        check_id,
        category,
        artifact_path: path.to_path_buf(),
        depth: config.proof.depth.for_category(category),
        engine: config.tool.engine.clone(),
        sources: Vec::new(),
    };

    match fs::read_to_string(path)
        .map_err(|e| e.to_string())
        .and_then(|text| Artifact::parse(&text).map_err(|e| e.to_string()))
    {
        Ok(artifact) => {
            unit.depth = artifact.options.depth;
            unit.engine = artifact.engines.join(" ");
            unit.sources = artifact.files.iter().map(PathBuf::from).collect();
        }
        Err(reason) => {
            tracing::warn!(artifact = %path.display(), %reason, "artifact not readable as a job file, scheduling as-is");
        }
    }

    unit
}

/// Discover every unit of the selected categories
///
/// Units come out grouped by category (in the order given) and sorted by
/// name within a category. A missing category directory is an error.
pub fn discover_units(
    formal_dir: &Path,
    categories: &[Category],
    config: &SuiteConfig,
) -> VerifyResult<Vec<TestUnit>> {
    let mut units = Vec::new();

    for &category in categories {
        let dir = formal_dir.join(category.dir_name());
        if !dir.is_dir() {
            return Err(VerifyError::MissingTestLocation {
                category,
                path: dir,
            });
        }

        let artifacts = find_artifacts(&dir)?;
        tracing::info!(%category, count = artifacts.len(), "discovered artifacts");
        units.extend(
            artifacts
                .iter()
                .map(|path| unit_from_artifact(path, category, config)),
        );
    }

    Ok(units)
}

/// Pick the job's log file under its output directory
///
/// When several logs exist the lexicographically smallest path wins, so the
/// choice does not depend on directory enumeration order.
pub fn find_log_file(output_dir: &Path, extension: &str) -> Option<PathBuf> {
    if !output_dir.is_dir() {
        return None;
    }

    WalkDir::new(output_dir)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .map(|e| e.into_path())
        .filter(|p| p.extension().and_then(|e| e.to_str()) == Some(extension))
        .min()
}
