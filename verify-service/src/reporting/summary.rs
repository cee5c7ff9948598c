// Suite Summary
// Aggregates job results into the statistics a report is rendered from

use crate::catalog::Category;
use crate::execution::{JobResult, JobStatus};

use std::collections::BTreeMap;
use std::time::Duration;

use chrono::{DateTime, Utc};

/// Pass counts for one category
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct CategoryStats {
    pub total: usize,
    pub passed: usize,
}

impl CategoryStats {
    /// Fraction of passing jobs, 0.0 for an empty category
    pub fn pass_rate(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            self.passed as f64 / self.total as f64
        }
    }
}

/// A job singled out by the performance statistics
#[derive(Debug, Clone, PartialEq)]
pub struct JobTiming {
    pub name: String,
    pub category: Category,
    pub duration: Duration,
}

impl From<&JobResult> for JobTiming {
    fn from(result: &JobResult) -> Self {
        Self {
            name: result.name.clone(),
            category: result.category,
            duration: result.duration,
        }
    }
}

/// Statistics derived from a complete result set
///
/// Every figure is independent of the order results arrived in.
#[derive(Debug, Clone, PartialEq)]
pub struct SuiteStatistics {
    pub total: usize,
    pub status_counts: BTreeMap<JobStatus, usize>,
    pub categories: BTreeMap<Category, CategoryStats>,
    pub wall_time: Duration,
    pub cumulative_time: Duration,
    pub fastest: Option<JobTiming>,
    pub slowest: Option<JobTiming>,
}

impl SuiteStatistics {
    pub fn from_results(results: &[JobResult], wall_time: Duration) -> Self {
        let mut status_counts: BTreeMap<JobStatus, usize> =
            JobStatus::TERMINAL.iter().map(|s| (*s, 0)).collect();
        let mut categories: BTreeMap<Category, CategoryStats> = BTreeMap::new();

        for result in results {
            // A result that never finished counts against the suite
            let status = if result.status.is_terminal() {
                result.status
            } else {
                JobStatus::Errored
            };
            *status_counts.entry(status).or_default() += 1;

            let stats = categories.entry(result.category).or_default();
            stats.total += 1;
            if result.passed() {
                stats.passed += 1;
            }
        }

        let cumulative_time = results.iter().map(|r| r.duration).sum();

        let fastest = results
            .iter()
            .min_by(|a, b| {
                a.duration
                    .cmp(&b.duration)
                    .then(a.category.cmp(&b.category))
                    .then(a.name.cmp(&b.name))
            })
            .map(JobTiming::from);
        let slowest = results
            .iter()
            .min_by(|a, b| {
                b.duration
                    .cmp(&a.duration)
                    .then(a.category.cmp(&b.category))
                    .then(a.name.cmp(&b.name))
            })
            .map(JobTiming::from);

        Self {
            total: results.len(),
            status_counts,
            categories,
            wall_time,
            cumulative_time,
            fastest,
            slowest,
        }
    }

    pub fn count(&self, status: JobStatus) -> usize {
        self.status_counts.get(&status).copied().unwrap_or(0)
    }

    pub fn passed(&self) -> usize {
        self.count(JobStatus::Passed)
    }

    /// Share of all jobs with the given status, in percent
    pub fn percentage(&self, status: JobStatus) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            self.count(status) as f64 * 100.0 / self.total as f64
        }
    }

    /// Cumulative job time over wall time; absent when no wall time elapsed
    pub fn speedup(&self) -> Option<f64> {
        let wall = self.wall_time.as_secs_f64();
        if wall > 0.0 {
            Some(self.cumulative_time.as_secs_f64() / wall)
        } else {
            None
        }
    }

    pub fn average(&self) -> Option<Duration> {
        if self.total == 0 {
            None
        } else {
            Some(self.cumulative_time.div_f64(self.total as f64))
        }
    }
}

/// The outcome of one suite run
#[derive(Debug, Clone)]
pub struct SuiteReport {
    /// Results sorted by (category, name)
    pub results: Vec<JobResult>,
    pub stats: SuiteStatistics,
    pub timestamp: DateTime<Utc>,
    /// Catalog entries whose artifacts could not be generated
    pub generation_failures: Vec<String>,
}

impl SuiteReport {
    pub fn new(results: Vec<JobResult>, wall_time: Duration) -> Self {
        Self::with_timestamp(results, wall_time, Utc::now())
    }

    pub fn with_timestamp(
        mut results: Vec<JobResult>,
        wall_time: Duration,
        timestamp: DateTime<Utc>,
    ) -> Self {
        results.sort_by(|a, b| a.category.cmp(&b.category).then_with(|| a.name.cmp(&b.name)));
        let stats = SuiteStatistics::from_results(&results, wall_time);
        Self {
            results,
            stats,
            timestamp,
            generation_failures: Vec::new(),
        }
    }

    pub fn with_generation_failures(mut self, failures: Vec<String>) -> Self {
        self.generation_failures = failures;
        self
    }

    /// The suite passes iff every entry was generated, something ran, and everything passed
    pub fn success(&self) -> bool {
        self.generation_failures.is_empty()
            && !self.results.is_empty()
            && self.results.iter().all(|r| r.passed())
    }

    /// Results that did not pass, in report order
    pub fn non_passing(&self) -> impl Iterator<Item = &JobResult> {
        self.results.iter().filter(|r| !r.passed())
    }
}
