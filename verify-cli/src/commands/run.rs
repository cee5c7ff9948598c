use crate::output;

use color_eyre::Result;

use verify_service::{
    progress_channel, ExecutionEvent, Orchestrator, SuiteOptions, SuiteOutcome, SuiteReporter,
};

/// Generate (when needed), run and report a full suite
///
/// Returns whether every artifact was generated and every job passed.
pub async fn execute(options: SuiteOptions, quiet: bool) -> Result<bool> {
    let orchestrator = Orchestrator::new(options)?;
    let report_path = orchestrator.report_path();

    output::header("RISC-V Formal Verification Suite");
    output::info(&format!(
        "Formal directory: {}",
        orchestrator.formal_dir().display()
    ));
    output::info(&format!(
        "Categories: {}",
        orchestrator
            .categories()
            .iter()
            .map(|c| c.key())
            .collect::<Vec<_>>()
            .join(", ")
    ));
    if orchestrator.needs_generation() {
        output::status(
            "Generating",
            &format!("{} artifacts", orchestrator.catalog().len()),
        );
    }

    let (tx, mut rx) = progress_channel();

    // Run in the background and print progress in the foreground
    let handle = tokio::spawn(async move { orchestrator.run(Some(tx)).await });

    while let Some(event) = rx.recv().await {
        match event {
            ExecutionEvent::SuiteStarted {
                total_jobs,
                workers,
                timeout,
            } => {
                output::status(
                    "Running",
                    &format!(
                        "{} jobs on {} workers (timeout {}s)",
                        total_jobs,
                        workers,
                        timeout.as_secs()
                    ),
                );
            }
            ExecutionEvent::JobStarted { name, category } => {
                tracing::debug!(job = %name, %category, "job started");
            }
            ExecutionEvent::JobCompleted {
                result,
                completed,
                total,
            } => {
                if !quiet {
                    output::job_line(&result, completed, total);
                }
            }
            ExecutionEvent::SuiteCompleted {
                total_jobs,
                passed,
                wall_time,
            } => {
                output::dim(&format!(
                    "  {}/{} jobs passed in {:.2}s",
                    passed,
                    total_jobs,
                    wall_time.as_secs_f64()
                ));
            }
        }
    }

    let outcome = handle.await??;
    let SuiteOutcome::Completed(report) = &outcome else {
        return Ok(outcome.success());
    };

    println!();
    print!("{}", SuiteReporter::to_text(report));
    println!();
    output::info(&format!("Detailed report saved to: {}", report_path.display()));

    if !report.generation_failures.is_empty() {
        output::warning(&format!(
            "{} artifacts failed to generate",
            report.generation_failures.len()
        ));
    }
    if report.success() {
        output::success(&format!("All {} checks passed", report.results.len()));
    } else {
        let failing = report.non_passing().count();
        output::failure(&format!(
            "{} of {} checks did not pass",
            failing,
            report.results.len()
        ));
    }

    Ok(report.success())
}
