mod commands;
mod output;

use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use color_eyre::Result;

use verify_service::{Category, SuiteOptions};

/// Generate and run a RISC-V formal verification suite in parallel
#[derive(Parser, Debug)]
#[command(name = "rvverify", version, about)]
pub struct Cli {
    /// Directory holding the formal verification tree
    #[arg(long, value_name = "DIR", default_value = ".")]
    pub formal_dir: PathBuf,

    /// Categories to run: instructions, system, integration (default: all)
    #[arg(long, value_name = "CATEGORY", num_args = 1.., value_delimiter = ',')]
    pub categories: Vec<Category>,

    /// Number of jobs to run at once (default: available cores, at most 8)
    #[arg(long, short = 'j', value_name = "N")]
    pub workers: Option<usize>,

    /// Per-job timeout in seconds (default: 300)
    #[arg(long, value_name = "SECS")]
    pub timeout: Option<u64>,

    /// Only generate the artifact matrix, do not run it
    #[arg(long)]
    pub generate_only: bool,

    /// Regenerate artifacts even if they already exist
    #[arg(long)]
    pub regenerate: bool,

    /// Suite configuration file (default: <formal-dir>/verify.yml when present)
    #[arg(long, value_name = "FILE", env = "RVVERIFY_CONFIG")]
    pub config: Option<PathBuf>,

    /// Where to write the JSON report (default: <formal-dir>/verification_report.json)
    #[arg(long, value_name = "FILE")]
    pub report: Option<PathBuf>,

    /// Also write a JUnit XML report
    #[arg(long, value_name = "FILE")]
    pub junit: Option<PathBuf>,

    /// Enable debug logging
    #[arg(long, short = 'v', conflicts_with = "quiet")]
    pub verbose: bool,

    /// Only log errors and hide per-job progress
    #[arg(long, short = 'q')]
    pub quiet: bool,
}

impl Cli {
    fn suite_options(&self) -> SuiteOptions {
        SuiteOptions {
            formal_dir: self.formal_dir.clone(),
            categories: self.categories.clone(),
            workers: self.workers,
            timeout: self.timeout.map(Duration::from_secs),
            generate_only: self.generate_only,
            regenerate: self.regenerate,
            config_path: self.config.clone(),
            report_path: self.report.clone(),
            junit_path: self.junit.clone(),
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;

    let cli = Cli::parse();
    init_tracing(cli.quiet, cli.verbose)?;

    let options = cli.suite_options();
    let success = if cli.generate_only {
        commands::generate::execute(options)?
    } else {
        commands::run::execute(options, cli.quiet).await?
    };

    if !success {
        std::process::exit(1);
    }

    Ok(())
}

fn init_tracing(quiet: bool, verbose: bool) -> Result<()> {
    let level = if quiet {
        "error"
    } else if verbose {
        "debug"
    } else {
        "warn"
    };

    let filter = tracing_subscriber::EnvFilter::try_from_env("RVVERIFY_LOG")
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|e| color_eyre::eyre::eyre!("failed to initialize tracing subscriber: {}", e))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let cli = Cli::try_parse_from(["rvverify"]).unwrap();
        let options = cli.suite_options();
        assert_eq!(options.formal_dir, PathBuf::from("."));
        assert!(options.categories.is_empty());
        assert_eq!(options.workers, None);
        assert_eq!(options.timeout, None);
        assert!(!options.generate_only);
    }

    #[test]
    fn test_flags() {
        let cli = Cli::try_parse_from([
            "rvverify",
            "--formal-dir",
            "formal",
            "--categories",
            "instructions,system",
            "--workers",
            "2",
            "--timeout",
            "60",
            "--regenerate",
            "--junit",
            "out.xml",
        ])
        .unwrap();
        let options = cli.suite_options();
        assert_eq!(
            options.categories,
            vec![Category::Instruction, Category::SystemProperty]
        );
        assert_eq!(options.workers, Some(2));
        assert_eq!(options.timeout, Some(Duration::from_secs(60)));
        assert!(options.regenerate);
        assert_eq!(options.junit_path, Some(PathBuf::from("out.xml")));
    }

    #[test]
    fn test_rejects_unknown_category() {
        assert!(Cli::try_parse_from(["rvverify", "--categories", "alu"]).is_err());
        assert!(Cli::try_parse_from(["rvverify", "-v", "-q"]).is_err());
    }
}
