// Suite Orchestrator
// Wires catalog, generator, execution and reporting into one invocation

use crate::catalog::{Category, CheckCatalog};
use crate::config::{ConfigError, SuiteConfig};
use crate::error::{AggregationError, VerifyError, VerifyResult};
use crate::execution::{
    discover_units, has_artifacts, ExecutorConfig, JobLauncher, ProcessLauncher, ProgressSender,
    SuiteExecutor,
};
use crate::generator::{GenerationReport, MatrixGenerator};
use crate::reporting::{ReportFormat, SuiteReport, SuiteReporter, REPORT_FILE_NAME};

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

// =============================================================================
// Options
// =============================================================================

/// What a single invocation should do
#[derive(Debug, Clone, Default)]
pub struct SuiteOptions {
    /// Directory holding the category subdirectories
    pub formal_dir: PathBuf,
    /// Categories to generate and run (empty = all)
    pub categories: Vec<Category>,
    /// Worker-slot override
    pub workers: Option<usize>,
    /// Per-job deadline override
    pub timeout: Option<Duration>,
    /// Stop after generating artifacts
    pub generate_only: bool,
    /// Regenerate artifacts even when they already exist
    pub regenerate: bool,
    /// Explicit configuration file
    pub config_path: Option<PathBuf>,
    /// Persisted report location override
    pub report_path: Option<PathBuf>,
    /// Also write a JUnit XML report here
    pub junit_path: Option<PathBuf>,
}

impl SuiteOptions {
    pub fn new(formal_dir: impl Into<PathBuf>) -> Self {
        Self {
            formal_dir: formal_dir.into(),
            ..Self::default()
        }
    }

    /// Selected categories in category order, without duplicates
    pub fn selected_categories(&self) -> Vec<Category> {
        if self.categories.is_empty() {
            return Category::ALL.to_vec();
        }
        let mut selected = self.categories.clone();
        selected.sort();
        selected.dedup();
        selected
    }
}

/// What an invocation produced
#[derive(Debug)]
pub enum SuiteOutcome {
    /// Generate-only run
    Generated(GenerationReport),
    /// Full run
    Completed(SuiteReport),
}

impl SuiteOutcome {
    pub fn success(&self) -> bool {
        match self {
            SuiteOutcome::Generated(report) => report.all_succeeded(),
            SuiteOutcome::Completed(report) => report.success(),
        }
    }
}

// =============================================================================
// Orchestrator
// =============================================================================

/// Runs one verification invocation end to end
pub struct Orchestrator {
    options: SuiteOptions,
    formal_dir: PathBuf,
    categories: Vec<Category>,
    config: SuiteConfig,
    catalog: CheckCatalog,
}

impl Orchestrator {
    /// Resolve the formal directory, configuration and catalog
    pub fn new(options: SuiteOptions) -> VerifyResult<Self> {
        let formal_dir = fs::canonicalize(&options.formal_dir)
            .ok()
            .filter(|dir| dir.is_dir())
            .ok_or_else(|| VerifyError::FormalDirNotFound(options.formal_dir.clone()))?;

        let mut config = SuiteConfig::load(&formal_dir, options.config_path.as_deref())?;
        apply_overrides(&mut config, &options)?;

        let categories = options.selected_categories();
        let catalog = match &config.catalog {
            Some(path) => CheckCatalog::from_file(path)?,
            None => CheckCatalog::builtin(),
        }
        .filtered(&categories);

        tracing::debug!(
            formal_dir = %formal_dir.display(),
            checks = catalog.len(),
            workers = config.execution.worker_count(),
            timeout_secs = config.execution.timeout_secs,
            "orchestrator ready"
        );

        Ok(Self {
            options,
            formal_dir,
            categories,
            config,
            catalog,
        })
    }

    pub fn formal_dir(&self) -> &Path {
        &self.formal_dir
    }

    pub fn config(&self) -> &SuiteConfig {
        &self.config
    }

    pub fn catalog(&self) -> &CheckCatalog {
        &self.catalog
    }

    pub fn categories(&self) -> &[Category] {
        &self.categories
    }

    /// Where the JSON report is written
    pub fn report_path(&self) -> PathBuf {
        self.options
            .report_path
            .clone()
            .unwrap_or_else(|| self.formal_dir.join(REPORT_FILE_NAME))
    }

    /// Whether artifacts must be (re)generated before running
    pub fn needs_generation(&self) -> bool {
        self.options.regenerate
            || self.options.generate_only
            || self
                .categories
                .iter()
                .any(|category| !has_artifacts(&self.formal_dir, *category))
    }

    /// Generate the artifact matrix for the selected categories
    ///
    /// Every entry is attempted; failures are recorded per entry.
    pub fn generate_matrix(&self) -> GenerationReport {
        MatrixGenerator::new(&self.config, &self.formal_dir).generate(&self.catalog)
    }

    /// Generate the matrix, failing if any entry could not be written
    pub fn generate(&self) -> VerifyResult<GenerationReport> {
        let report = self.generate_matrix();

        if report.all_succeeded() {
            return Ok(report);
        }

        let total = report.len();
        let failed = report.failed_count();
        Err(VerifyError::Generation {
            failed,
            total,
            errors: report.into_errors(),
        })
    }

    /// Run the invocation with the configured backend tool
    pub async fn run(&self, progress: Option<ProgressSender>) -> VerifyResult<SuiteOutcome> {
        if self.options.generate_only {
            return self.generate().map(SuiteOutcome::Generated);
        }
        let launcher = Arc::new(ProcessLauncher::new(&self.config.tool));
        self.run_with_launcher(launcher, progress).await
    }

    /// Run the invocation with a given launcher
    ///
    /// Entries that fail to generate are reported with the suite; the
    /// artifacts that were written still run.
    pub async fn run_with_launcher(
        &self,
        launcher: Arc<dyn JobLauncher>,
        progress: Option<ProgressSender>,
    ) -> VerifyResult<SuiteOutcome> {
        if self.options.generate_only {
            return self.generate().map(SuiteOutcome::Generated);
        }

        let mut generation_failures = Vec::new();
        if self.needs_generation() {
            let generated = self.generate_matrix();
            for failure in generated.failures() {
                tracing::warn!(check = failure.check_id(), error = %failure, "artifact generation failed");
                generation_failures.push(failure.to_string());
            }
            tracing::info!(
                artifacts = generated.len(),
                failed = generation_failures.len(),
                "artifact matrix generated"
            );
        }

        let units = discover_units(&self.formal_dir, &self.categories, &self.config)?;
        if units.is_empty() {
            return Err(AggregationError::NoJobs {
                searched: self.categories.len(),
            }
            .into());
        }

        let executor_config = ExecutorConfig {
            workers: self.config.execution.worker_count(),
            timeout: self.config.execution.timeout(),
            log_extension: self.config.tool.log_extension.clone(),
        };
        let mut executor = SuiteExecutor::new(launcher, executor_config);
        if let Some(tx) = progress {
            executor = executor.with_progress(tx);
        }

        let execution = executor.execute(units).await;
        let report = SuiteReport::new(execution.results, execution.wall_time)
            .with_generation_failures(generation_failures);

        SuiteReporter::write(&report, ReportFormat::Json, &self.report_path())?;
        if let Some(junit) = &self.options.junit_path {
            SuiteReporter::write(&report, ReportFormat::JUnit, junit)?;
        }

        Ok(SuiteOutcome::Completed(report))
    }
}

/// Command-line values win over the configuration file
fn apply_overrides(config: &mut SuiteConfig, options: &SuiteOptions) -> Result<(), ConfigError> {
    if let Some(workers) = options.workers {
        if workers == 0 {
            return Err(ConfigError::InvalidValue {
                field: "workers",
                reason: "must be at least 1".to_string(),
            });
        }
        config.execution.workers = Some(workers);
    }

    if let Some(timeout) = options.timeout {
        if timeout.is_zero() {
            return Err(ConfigError::InvalidValue {
                field: "timeout",
                reason: "must be at least 1 second".to_string(),
            });
        }
        config.execution.timeout_secs = timeout.as_secs().max(1);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::execution::{JobOutcome, JobStatus};
    use crate::generator::TestUnit;
    use tempfile::TempDir;

    /// Passes every job except those whose name is listed
    struct ListLauncher {
        failing: Vec<&'static str>,
    }

    #[async_trait::async_trait]
    impl JobLauncher for ListLauncher {
        async fn launch(&self, unit: &TestUnit, _timeout: Duration) -> JobOutcome {
            let code = if self.failing.contains(&unit.name.as_str()) { 1 } else { 0 };
            JobOutcome::Exited {
                code,
                stdout: String::new(),
                stderr: String::new(),
                elapsed: None,
            }
        }
    }

    fn options(dir: &Path) -> SuiteOptions {
        SuiteOptions {
            workers: Some(4),
            ..SuiteOptions::new(dir)
        }
    }

    #[test]
    fn test_missing_formal_dir() {
        let dir = TempDir::new().unwrap();
        let err = Orchestrator::new(SuiteOptions::new(dir.path().join("missing"))).err().unwrap();
        assert!(matches!(err, VerifyError::FormalDirNotFound(_)));
    }

    #[test]
    fn test_zero_worker_override_rejected() {
        let dir = TempDir::new().unwrap();
        let opts = SuiteOptions {
            workers: Some(0),
            ..SuiteOptions::new(dir.path())
        };
        let err = Orchestrator::new(opts).err().unwrap();
        assert!(matches!(err, VerifyError::Config(ConfigError::InvalidValue { .. })));
    }

    #[test]
    fn test_overrides_and_category_selection() {
        let dir = TempDir::new().unwrap();
        let opts = SuiteOptions {
            categories: vec![Category::Integration, Category::SystemProperty, Category::Integration],
            timeout: Some(Duration::from_secs(12)),
            ..options(dir.path())
        };
        let orchestrator = Orchestrator::new(opts).unwrap();

        assert_eq!(
            orchestrator.categories(),
            &[Category::SystemProperty, Category::Integration]
        );
        assert_eq!(orchestrator.catalog().len(), 14);
        assert_eq!(orchestrator.config().execution.timeout_secs, 12);
        assert_eq!(orchestrator.config().execution.worker_count(), 4);
        assert_eq!(
            orchestrator.report_path(),
            orchestrator.formal_dir().join("verification_report.json")
        );
    }

    #[tokio::test]
    async fn test_generate_only() {
        let dir = TempDir::new().unwrap();
        let opts = SuiteOptions {
            generate_only: true,
            ..options(dir.path())
        };
        let orchestrator = Orchestrator::new(opts).unwrap();
        let outcome = orchestrator
            .run_with_launcher(Arc::new(ListLauncher { failing: vec![] }), None)
            .await
            .unwrap();

        let SuiteOutcome::Generated(report) = &outcome else {
            panic!("expected generate-only outcome");
        };
        assert_eq!(report.len(), 51);
        assert!(outcome.success());
        assert!(dir.path().join("instructions/verify_add.sby").is_file());
        assert!(!orchestrator.report_path().exists());
    }

    #[tokio::test]
    async fn test_full_run_writes_reports() {
        let dir = TempDir::new().unwrap();
        let junit = dir.path().join("junit.xml");
        let opts = SuiteOptions {
            categories: vec![Category::Integration],
            junit_path: Some(junit.clone()),
            ..options(dir.path())
        };
        let orchestrator = Orchestrator::new(opts).unwrap();
        assert!(orchestrator.needs_generation());

        let outcome = orchestrator
            .run_with_launcher(Arc::new(ListLauncher { failing: vec!["verify_fault"] }), None)
            .await
            .unwrap();

        let SuiteOutcome::Completed(report) = &outcome else {
            panic!("expected completed outcome");
        };
        assert_eq!(report.results.len(), 3);
        assert_eq!(report.stats.count(JobStatus::Failed), 1);
        assert!(!outcome.success());

        let json: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(orchestrator.report_path()).unwrap()).unwrap();
        assert_eq!(json["summary"]["total_tests"], 3);
        assert!(fs::read_to_string(junit).unwrap().contains("verify_fault"));

        // artifacts exist now, so a second run goes straight to execution
        assert!(!orchestrator.needs_generation());
    }

    #[tokio::test]
    async fn test_empty_category_is_no_jobs() {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join("integration")).unwrap();
        fs::write(
            dir.path().join("catalog.yml"),
            "instructions:\n  add: \"Addition\"\n",
        )
        .unwrap();
        fs::write(dir.path().join("verify.yml"), "catalog: catalog.yml\n").unwrap();

        let orchestrator = Orchestrator::new(SuiteOptions {
            categories: vec![Category::Integration],
            ..options(dir.path())
        })
        .unwrap();
        assert!(orchestrator.catalog().is_empty());

        let err = orchestrator
            .run_with_launcher(Arc::new(ListLauncher { failing: vec![] }), None)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            VerifyError::Aggregation(AggregationError::NoJobs { searched: 1 })
        ));
        assert!(!orchestrator.report_path().exists());
    }

    #[tokio::test]
    async fn test_blocked_artifact_does_not_stop_the_run() {
        let dir = TempDir::new().unwrap();
        // a directory where the ADD artifact should be written
        fs::create_dir_all(dir.path().join("instructions/verify_add.sby")).unwrap();

        let orchestrator = Orchestrator::new(SuiteOptions {
            categories: vec![Category::Instruction],
            regenerate: true,
            ..options(dir.path())
        })
        .unwrap();

        let outcome = orchestrator
            .run_with_launcher(Arc::new(ListLauncher { failing: vec![] }), None)
            .await
            .unwrap();

        let SuiteOutcome::Completed(report) = &outcome else {
            panic!("expected completed outcome");
        };
        assert_eq!(report.results.len(), 36);
        assert_eq!(report.stats.count(JobStatus::Passed), 36);
        assert!(report.results.iter().all(|r| r.name != "verify_add"));
        assert_eq!(report.generation_failures.len(), 1);
        assert!(report.generation_failures[0].contains("'add'"));
        assert!(!outcome.success());

        let json: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(orchestrator.report_path()).unwrap()).unwrap();
        assert_eq!(json["summary"]["success"], false);
        assert_eq!(json["summary"]["generation_failures"].as_array().unwrap().len(), 1);
    }
}
