// End-to-end suite runs with `sh` standing in for the backend tool
#![cfg(unix)]

use std::fs;
use std::path::Path;
use std::time::Duration;

use tempfile::TempDir;
use verify_service::{
    AggregationError, Category, JobStatus, Orchestrator, SuiteOptions, SuiteOutcome, VerifyError,
};

fn write(path: &Path, content: &str) {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(path, content).unwrap();
}

fn completed(outcome: SuiteOutcome) -> verify_service::SuiteReport {
    match outcome {
        SuiteOutcome::Completed(report) => report,
        SuiteOutcome::Generated(_) => panic!("expected a completed run"),
    }
}

#[tokio::test]
async fn pass_fail_and_timeout_are_reported_separately() {
    let dir = TempDir::new().unwrap();
    let formal = dir.path();
    write(&formal.join("verify.yml"), "tool:\n  program: sh\n");
    write(&formal.join("instructions/verify_a.sby"), "exit 0\n");
    write(
        &formal.join("instructions/verify_b.sby"),
        "echo 'assertion failed at step 4' >&2\nexit 1\n",
    );
    write(
        &formal.join("instructions/verify_c.sby"),
        "echo $$ > verify_c.pid\nexec sleep 30\n",
    );

    let orchestrator = Orchestrator::new(SuiteOptions {
        categories: vec![Category::Instruction],
        workers: Some(2),
        timeout: Some(Duration::from_secs(1)),
        ..SuiteOptions::new(formal)
    })
    .unwrap();
    assert!(!orchestrator.needs_generation());

    let started = std::time::Instant::now();
    let report = completed(orchestrator.run(None).await.unwrap());
    assert!(started.elapsed() < Duration::from_secs(20));

    let stats = &report.stats;
    assert_eq!(stats.total, 3);
    assert_eq!(stats.count(JobStatus::Passed), 1);
    assert_eq!(stats.count(JobStatus::Failed), 1);
    assert_eq!(stats.count(JobStatus::TimedOut), 1);
    let insns = stats.categories[&Category::Instruction];
    assert!((insns.pass_rate() - 1.0 / 3.0).abs() < 1e-9);
    assert!(!report.success());

    let b = report.results.iter().find(|r| r.name == "verify_b").unwrap();
    assert_eq!(b.exit_code, Some(1));
    assert!(b.diagnostic.as_deref().unwrap().contains("assertion failed"));

    let c = report.results.iter().find(|r| r.name == "verify_c").unwrap();
    assert_eq!(c.status, JobStatus::TimedOut);
    assert_eq!(c.exit_code, None);

    let json: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(formal.join("verification_report.json")).unwrap())
            .unwrap();
    assert_eq!(json["summary"]["total_tests"], 3);
    assert_eq!(json["summary"]["success"], false);

    // the timed out process is gone, not merely abandoned
    #[cfg(target_os = "linux")]
    {
        let pid = fs::read_to_string(formal.join("instructions/verify_c.pid")).unwrap();
        let proc_dir = Path::new("/proc").join(pid.trim());
        assert!(!proc_dir.exists(), "process {} still running", pid.trim());
    }
}

#[tokio::test]
async fn generated_matrix_runs_end_to_end() {
    let dir = TempDir::new().unwrap();
    let formal = dir.path();

    // Fails the SUB check and leaves a log in each job's output directory
    let backend = formal.join("fake-backend.sh");
    write(
        &backend,
        "out=$(basename \"$1\" .sby)\n\
         mkdir -p \"$out/engine_0\"\n\
         echo done > \"$out/engine_0/trace.log\"\n\
         echo done > \"$out/logfile.log\"\n\
         grep -q 'insns/insn_sub.v' \"$1\" && exit 1\n\
         exit 0\n",
    );
    write(
        &formal.join("verify.yml"),
        &format!(
            "tool:\n  program: sh\n  args: ['{}']\nexecution:\n  workers: 4\n",
            backend.display()
        ),
    );

    let orchestrator = Orchestrator::new(SuiteOptions {
        categories: vec![Category::Instruction],
        regenerate: true,
        ..SuiteOptions::new(formal)
    })
    .unwrap();

    let report = completed(orchestrator.run(None).await.unwrap());
    assert_eq!(report.results.len(), 37);
    assert_eq!(report.stats.count(JobStatus::Passed), 36);

    let sub = report.results.iter().find(|r| r.name == "verify_sub").unwrap();
    assert_eq!(sub.status, JobStatus::Failed);

    let add = report.results.iter().find(|r| r.name == "verify_add").unwrap();
    let log = add.log_file.as_ref().unwrap();
    assert!(log.ends_with("verify_add/engine_0/trace.log"));
}

#[tokio::test]
async fn empty_discovery_is_an_error() {
    let dir = TempDir::new().unwrap();
    let formal = dir.path();
    fs::create_dir_all(formal.join("instructions")).unwrap();
    write(&formal.join("empty.yml"), "{}\n");
    write(
        &formal.join("verify.yml"),
        "catalog: empty.yml\ntool:\n  program: sh\n",
    );

    let orchestrator = Orchestrator::new(SuiteOptions {
        categories: vec![Category::Instruction],
        ..SuiteOptions::new(formal)
    })
    .unwrap();

    let err = orchestrator.run(None).await.unwrap_err();
    assert!(matches!(
        err,
        VerifyError::Aggregation(AggregationError::NoJobs { .. })
    ));
    assert!(!formal.join("verification_report.json").exists());
}

#[tokio::test]
async fn missing_backend_marks_every_job_errored() {
    let dir = TempDir::new().unwrap();
    let formal = dir.path();
    write(
        &formal.join("verify.yml"),
        "tool:\n  program: no-such-verifier-on-path\n",
    );

    let orchestrator = Orchestrator::new(SuiteOptions {
        categories: vec![Category::Integration],
        ..SuiteOptions::new(formal)
    })
    .unwrap();

    let report = completed(orchestrator.run(None).await.unwrap());
    assert_eq!(report.results.len(), 3);
    assert_eq!(report.stats.count(JobStatus::Errored), 3);
    assert!(report.results[0]
        .diagnostic
        .as_deref()
        .unwrap()
        .contains("no-such-verifier-on-path"));
}
