// Suite Reporter
// Renders a suite report as a text summary, a JSON document, or JUnit XML

use crate::catalog::Category;
use crate::error::{VerifyError, VerifyResult};
use crate::execution::{JobResult, JobStatus};
use crate::reporting::summary::SuiteReport;

use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::path::Path;

use serde::Serialize;

/// Diagnostics longer than this are cut in the text summary
pub const DIAGNOSTIC_PREVIEW_CHARS: usize = 100;

/// Default file name of the persisted report inside the formal directory
pub const REPORT_FILE_NAME: &str = "verification_report.json";

/// Output format for suite reports
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportFormat {
    /// Human-readable summary
    Text,
    /// Persisted machine-readable document
    Json,
    /// JUnit XML (for CI systems)
    JUnit,
}

impl fmt::Display for ReportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReportFormat::Text => write!(f, "text"),
            ReportFormat::Json => write!(f, "json"),
            ReportFormat::JUnit => write!(f, "junit"),
        }
    }
}

impl std::str::FromStr for ReportFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" | "terminal" | "summary" => Ok(ReportFormat::Text),
            "json" => Ok(ReportFormat::Json),
            "junit" | "junit-xml" | "xml" => Ok(ReportFormat::JUnit),
            _ => Err(format!(
                "Unknown report format '{}'. Valid formats: text, json, junit",
                s
            )),
        }
    }
}

#[derive(Serialize)]
struct ReportDocument<'a> {
    summary: SummaryBlock<'a>,
    results: Vec<ResultEntry<'a>>,
}

#[derive(Serialize)]
struct SummaryBlock<'a> {
    total_tests: usize,
    passed: usize,
    failed: usize,
    timed_out: usize,
    errored: usize,
    wall_time: f64,
    cumulative_time: f64,
    speedup: Option<f64>,
    categories: BTreeMap<Category, CategoryBlock>,
    timestamp: String,
    success: bool,
    generation_failures: &'a [String],
}

#[derive(Serialize)]
struct CategoryBlock {
    total: usize,
    passed: usize,
    pass_rate: f64,
}

#[derive(Serialize)]
struct ResultEntry<'a> {
    test_name: &'a str,
    category: Category,
    status: JobStatus,
    duration: f64,
    exit_code: Option<i32>,
    log_file: Option<String>,
    error_message: Option<&'a str>,
}

impl<'a> From<&'a JobResult> for ResultEntry<'a> {
    fn from(result: &'a JobResult) -> Self {
        Self {
            test_name: &result.name,
            category: result.category,
            status: result.status,
            duration: result.duration.as_secs_f64(),
            exit_code: result.exit_code,
            log_file: result.log_file.as_ref().map(|p| p.display().to_string()),
            error_message: result.diagnostic.as_deref(),
        }
    }
}

/// Suite reporter that generates output in various formats
pub struct SuiteReporter;

impl SuiteReporter {
    /// Generate a report in the specified format
    pub fn report(report: &SuiteReport, format: ReportFormat) -> VerifyResult<String> {
        match format {
            ReportFormat::Text => Ok(Self::to_text(report)),
            ReportFormat::Json => Self::to_json(report),
            ReportFormat::JUnit => Ok(Self::to_junit_xml(report)),
        }
    }

    /// Render and write a report to `path`
    pub fn write(report: &SuiteReport, format: ReportFormat, path: &Path) -> VerifyResult<()> {
        let rendered = Self::report(report, format)?;
        fs::write(path, rendered).map_err(|source| VerifyError::ReportWrite {
            path: path.to_path_buf(),
            source,
        })?;
        tracing::info!(%format, path = %path.display(), "report written");
        Ok(())
    }

    /// Generate the persisted JSON document
    ///
    /// Diagnostics are kept in full here; only the text summary truncates.
    pub fn to_json(report: &SuiteReport) -> VerifyResult<String> {
        let stats = &report.stats;
        let document = ReportDocument {
            summary: SummaryBlock {
                total_tests: stats.total,
                passed: stats.count(JobStatus::Passed),
                failed: stats.count(JobStatus::Failed),
                timed_out: stats.count(JobStatus::TimedOut),
                errored: stats.count(JobStatus::Errored),
                wall_time: stats.wall_time.as_secs_f64(),
                cumulative_time: stats.cumulative_time.as_secs_f64(),
                speedup: stats.speedup(),
                categories: stats
                    .categories
                    .iter()
                    .map(|(category, c)| {
                        (
                            *category,
                            CategoryBlock {
                                total: c.total,
                                passed: c.passed,
                                pass_rate: c.pass_rate(),
                            },
                        )
                    })
                    .collect(),
                timestamp: report.timestamp.to_rfc3339(),
                success: report.success(),
                generation_failures: &report.generation_failures,
            },
            results: report.results.iter().map(ResultEntry::from).collect(),
        };

        Ok(serde_json::to_string_pretty(&document)?)
    }

    /// Generate the human-readable summary
    pub fn to_text(report: &SuiteReport) -> String {
        let stats = &report.stats;
        let mut out = String::new();

        out.push_str("RISC-V Formal Verification Summary\n");
        out.push_str(&"=".repeat(60));
        out.push('\n');
        out.push_str(&format!("Total Tests: {}\n", stats.total));
        out.push_str(&format!(
            "Wall Time: {:.2} seconds\n",
            stats.wall_time.as_secs_f64()
        ));
        out.push_str(&format!(
            "Cumulative Time: {:.2} seconds\n",
            stats.cumulative_time.as_secs_f64()
        ));
        match stats.speedup() {
            Some(speedup) => out.push_str(&format!("Speedup: {:.2}x\n", speedup)),
            None => out.push_str("Speedup: N/A\n"),
        }
        out.push('\n');

        out.push_str("Overall Results:\n");
        for status in JobStatus::TERMINAL {
            out.push_str(&format!(
                "  {:9} {:7}: {:3} tests ({:5.1}%)\n",
                format!("[{}]", status.label()),
                status.label(),
                stats.count(status),
                stats.percentage(status)
            ));
        }
        out.push('\n');

        out.push_str("Results by Category:\n");
        for (category, c) in &stats.categories {
            out.push_str(&format!(
                "  {:15}: {:2}/{:2} passed ({:5.1}%)\n",
                category.key(),
                c.passed,
                c.total,
                c.pass_rate() * 100.0
            ));
        }
        out.push('\n');

        let mut non_passing = report.non_passing().peekable();
        if non_passing.peek().is_some() {
            out.push_str("Non-Passing Tests:\n");
            for result in non_passing {
                out.push_str(&format!(
                    "  [{:12}] {:20} - {}\n",
                    result.category.key(),
                    result.name,
                    result.status.label()
                ));
                if let Some(diagnostic) = &result.diagnostic {
                    out.push_str(&format!("    Error: {}\n", preview(diagnostic)));
                }
            }
            out.push('\n');
        }

        if !report.generation_failures.is_empty() {
            out.push_str("Generation Failures:\n");
            for failure in &report.generation_failures {
                out.push_str(&format!("  {}\n", preview(failure)));
            }
            out.push('\n');
        }

        if let (Some(fastest), Some(slowest), Some(average)) =
            (&stats.fastest, &stats.slowest, stats.average())
        {
            out.push_str("Performance Statistics:\n");
            out.push_str(&format!(
                "  Fastest: {:20} ({:.2}s)\n",
                fastest.name,
                fastest.duration.as_secs_f64()
            ));
            out.push_str(&format!(
                "  Slowest: {:20} ({:.2}s)\n",
                slowest.name,
                slowest.duration.as_secs_f64()
            ));
            out.push_str(&format!(
                "  Average: {:.2}s per test\n",
                average.as_secs_f64()
            ));
            out.push('\n');
        }

        out.push_str(if report.success() {
            "Suite: PASSED\n"
        } else {
            "Suite: FAILED\n"
        });
        out
    }

    /// Generate JUnit XML output, one testsuite per category
    ///
    /// Failed jobs map to `<failure>`; timeouts and launch errors map to `<error>`.
    pub fn to_junit_xml(report: &SuiteReport) -> String {
        let stats = &report.stats;
        let mut xml = String::new();
        xml.push_str("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n");

        xml.push_str(&format!(
            "<testsuites name=\"rvverify\" tests=\"{}\" failures=\"{}\" errors=\"{}\" time=\"{:.3}\">\n",
            stats.total,
            stats.count(JobStatus::Failed),
            stats.count(JobStatus::TimedOut) + stats.count(JobStatus::Errored),
            stats.wall_time.as_secs_f64()
        ));

        for category in Category::ALL {
            let cases: Vec<&JobResult> = report
                .results
                .iter()
                .filter(|r| r.category == category)
                .collect();
            if cases.is_empty() {
                continue;
            }

            let failures = cases.iter().filter(|r| r.status == JobStatus::Failed).count();
            let errors = cases
                .iter()
                .filter(|r| !r.passed() && r.status != JobStatus::Failed)
                .count();
            let time: f64 = cases.iter().map(|r| r.duration.as_secs_f64()).sum();

            xml.push_str(&format!(
                "  <testsuite name=\"{}\" tests=\"{}\" failures=\"{}\" errors=\"{}\" time=\"{:.3}\">\n",
                category.key(),
                cases.len(),
                failures,
                errors,
                time
            ));

            for case in cases {
                xml.push_str(&format!(
                    "    <testcase name=\"{}\" classname=\"rvverify.{}\" time=\"{:.3}\"",
                    xml_escape(&case.name),
                    category.key(),
                    case.duration.as_secs_f64()
                ));

                if case.passed() {
                    xml.push_str(" />\n");
                    continue;
                }

                let element = if case.status == JobStatus::Failed {
                    "failure"
                } else {
                    "error"
                };
                let message = case.diagnostic.as_deref().unwrap_or(case.status.label());
                xml.push_str(">\n");
                xml.push_str(&format!(
                    "      <{} message=\"{}\" type=\"{}\">",
                    element,
                    xml_escape(&preview(message)),
                    case.status.label()
                ));
                xml.push_str(&xml_escape(message));
                if let Some(log) = &case.log_file {
                    xml.push_str(&format!("\nlog: {}", xml_escape(&log.display().to_string())));
                }
                xml.push_str(&format!("</{}>\n", element));
                xml.push_str("    </testcase>\n");
            }

            xml.push_str("  </testsuite>\n");
        }

        xml.push_str("</testsuites>\n");
        xml
    }
}

/// One-line diagnostic cut to the preview length on a char boundary
fn preview(diagnostic: &str) -> String {
    let flat = diagnostic.split_whitespace().collect::<Vec<_>>().join(" ");
    if flat.chars().count() > DIAGNOSTIC_PREVIEW_CHARS {
        let cut: String = flat.chars().take(DIAGNOSTIC_PREVIEW_CHARS).collect();
        format!("{}...", cut)
    } else {
        flat
    }
}

/// Escape special XML characters
fn xml_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}
