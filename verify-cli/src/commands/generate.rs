use crate::output;

use color_eyre::Result;

use verify_service::{Category, Orchestrator, SuiteOptions, VerifyError, WriteState};

/// Generate the artifact matrix without running it
///
/// Returns whether every artifact was generated.
pub fn execute(options: SuiteOptions) -> Result<bool> {
    let orchestrator = Orchestrator::new(options)?;

    output::status(
        "Generating",
        &format!(
            "{} artifacts in {}",
            orchestrator.catalog().len(),
            orchestrator.formal_dir().display()
        ),
    );

    match orchestrator.generate() {
        Ok(report) => {
            for category in Category::ALL {
                let count = report.generated_in(category);
                if count > 0 {
                    output::dim(&format!("  {:12}: {:3} artifacts", category.key(), count));
                }
            }
            output::success(&format!(
                "{} artifacts ready ({} created, {} updated, {} unchanged)",
                report.len(),
                report.count_with_state(WriteState::Created),
                report.count_with_state(WriteState::Updated),
                report.count_with_state(WriteState::Unchanged)
            ));
            Ok(true)
        }
        Err(VerifyError::Generation {
            failed,
            total,
            errors,
        }) => {
            for error in &errors {
                output::warning(&error.to_string());
            }
            output::failure(&format!("{} of {} artifacts failed to generate", failed, total));
            Ok(false)
        }
        Err(e) => Err(e.into()),
    }
}
