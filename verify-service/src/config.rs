// Suite Configuration
// Loads verify.yml: design sources, harness location, backend tool and proof budgets

use crate::catalog::Category;

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Name of the configuration file looked up in the formal directory
pub const CONFIG_FILE_NAME: &str = "verify.yml";

/// Upper bound for the default worker count
pub const MAX_DEFAULT_WORKERS: usize = 8;

pub const DEFAULT_TIMEOUT_SECS: u64 = 300;

/// Errors that can occur while loading configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Config file not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("Failed to read config {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("YAML parse error in config: {0}")]
    Parse(#[from] serde_yaml::Error),

    #[error(
        "proof depth must grow by category (instructions < system < integration), got {instruction} / {system} / {integration}"
    )]
    NonMonotonicDepth {
        instruction: u32,
        system: u32,
        integration: u32,
    },

    #[error("Invalid value for '{field}': {reason}")]
    InvalidValue { field: &'static str, reason: String },
}

/// Proof mode written to the `[options]` section
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProofMode {
    Prove,
    Bmc,
    Cover,
    Live,
}

impl fmt::Display for ProofMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProofMode::Prove => write!(f, "prove"),
            ProofMode::Bmc => write!(f, "bmc"),
            ProofMode::Cover => write!(f, "cover"),
            ProofMode::Live => write!(f, "live"),
        }
    }
}

impl std::str::FromStr for ProofMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "prove" => Ok(ProofMode::Prove),
            "bmc" => Ok(ProofMode::Bmc),
            "cover" => Ok(ProofMode::Cover),
            "live" => Ok(ProofMode::Live),
            _ => Err(format!("unknown proof mode '{}'", s)),
        }
    }
}

/// Result the backend is expected to reach
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Expectation {
    Pass,
    Fail,
    Unknown,
    Error,
}

impl fmt::Display for Expectation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expectation::Pass => write!(f, "pass"),
            Expectation::Fail => write!(f, "fail"),
            Expectation::Unknown => write!(f, "unknown"),
            Expectation::Error => write!(f, "error"),
        }
    }
}

impl std::str::FromStr for Expectation {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pass" => Ok(Expectation::Pass),
            "fail" => Ok(Expectation::Fail),
            "unknown" => Ok(Expectation::Unknown),
            "error" => Ok(Expectation::Error),
            _ => Err(format!("unknown expectation '{}'", s)),
        }
    }
}

/// A titled group of design sources, rendered under one comment header
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceGroup {
    pub name: String,
    pub files: Vec<PathBuf>,
}

impl SourceGroup {
    fn new(name: &str, files: &[&str]) -> Self {
        Self {
            name: name.to_string(),
            files: files.iter().map(PathBuf::from).collect(),
        }
    }
}

/// The design under test: consumed as opaque files
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DesignConfig {
    /// Directory the source paths are relative to
    pub root: PathBuf,
    /// Top-level module passed to `hierarchy -top`
    pub top: String,
    /// Preprocessor defines applied to every source load
    pub defines: Vec<String>,
    pub sources: Vec<SourceGroup>,
}

impl Default for DesignConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from("../rtl"),
            top: "top".to_string(),
            defines: vec![
                "FORMAL".to_string(),
                "RISCV_FORMAL_NRET=1".to_string(),
                "RISCV_FORMAL_ILEN=32".to_string(),
                "RISCV_FORMAL_XLEN=32".to_string(),
                "RISCV_FORMAL_CHANNEL_IDX=0".to_string(),
            ],
            sources: vec![
                SourceGroup::new(
                    "Design files",
                    &[
                        "top.v",
                        "riscv_cpu.v",
                        "data_mem.v",
                        "execution_unit.v",
                        "instr_mem.v",
                        "memory_unit.v",
                        "seven_seg.v",
                        "writeback.v",
                    ],
                ),
                SourceGroup::new(
                    "Core modules",
                    &[
                        "core_modules/alu.v",
                        "core_modules/csr_exec.v",
                        "core_modules/csr_file.v",
                        "core_modules/decoder.v",
                        "core_modules/interrupt_controller.v",
                        "core_modules/pc.v",
                        "core_modules/registerfile.v",
                        "core_modules/timer.v",
                        "core_modules/uart.v",
                    ],
                ),
                SourceGroup::new(
                    "Pipeline stages",
                    &[
                        "pipeline_stages/EX_MEM.v",
                        "pipeline_stages/forwarding_unit.v",
                        "pipeline_stages/ID_EX.v",
                        "pipeline_stages/IF_ID.v",
                        "pipeline_stages/load_use_detector.v",
                        "pipeline_stages/MEM_WB.v",
                        "pipeline_stages/store_load_detector.v",
                        "pipeline_stages/store_load_forward.v",
                    ],
                ),
                SourceGroup::new(
                    "Include files",
                    &["include/instr_defines.vh", "include/memory_map.vh"],
                ),
            ],
        }
    }
}

/// Location of the riscv-formal style check harness
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HarnessConfig {
    pub root: PathBuf,
}

impl Default for HarnessConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from("../riscv-formal"),
        }
    }
}

/// Backend verification tool
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolConfig {
    /// Program invoked once per artifact
    pub program: String,
    /// Flags placed before the artifact path
    pub args: Vec<String>,
    /// Engine line written to `[engines]`
    pub engine: String,
    /// Extension of log files searched for after a run
    pub log_extension: String,
}

impl Default for ToolConfig {
    fn default() -> Self {
        Self {
            program: "sby".to_string(),
            args: Vec::new(),
            engine: "smtbmc boolector".to_string(),
            log_extension: "log".to_string(),
        }
    }
}

/// Proof-depth budget per category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DepthBudget {
    pub instruction: u32,
    pub system: u32,
    pub integration: u32,
}

impl Default for DepthBudget {
    fn default() -> Self {
        Self {
            instruction: 20,
            system: 30,
            integration: 50,
        }
    }
}

impl DepthBudget {
    pub fn for_category(&self, category: Category) -> u32 {
        match category {
            Category::Instruction => self.instruction,
            Category::SystemProperty => self.system,
            Category::Integration => self.integration,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProofConfig {
    pub mode: ProofMode,
    pub expect: Expectation,
    pub depth: DepthBudget,
    /// Wait for every engine to finish instead of stopping at the first verdict
    pub wait: bool,
}

impl Default for ProofConfig {
    fn default() -> Self {
        Self {
            mode: ProofMode::Prove,
            expect: Expectation::Pass,
            depth: DepthBudget::default(),
            wait: true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExecutionConfig {
    /// Worker slots (None = derived from available parallelism)
    pub workers: Option<usize>,
    pub timeout_secs: u64,
}

impl Default for ExecutionConfig {
    fn default() -> Self {
        Self {
            workers: None,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

impl ExecutionConfig {
    /// Worker count to use, capped default when not configured
    pub fn worker_count(&self) -> usize {
        self.workers.unwrap_or_else(default_workers).max(1)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Default worker count: available parallelism, capped
pub fn default_workers() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
        .min(MAX_DEFAULT_WORKERS)
}

/// Complete suite configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SuiteConfig {
    pub design: DesignConfig,
    pub harness: HarnessConfig,
    pub tool: ToolConfig,
    pub proof: ProofConfig,
    pub execution: ExecutionConfig,
    /// Optional YAML catalog replacing the built-in RV32I checks
    pub catalog: Option<PathBuf>,
}

impl SuiteConfig {
    /// Parse configuration from YAML (paths left as written)
    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        let config: SuiteConfig = serde_yaml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load a configuration file, resolving relative paths against its directory
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Err(ConfigError::NotFound(path.to_path_buf()));
        }

        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::parse(&content)?;

        let base_dir = path.parent().unwrap_or_else(|| Path::new("."));
        Ok(config.resolved_against(base_dir))
    }

    /// Load the configuration for a formal directory
    ///
    /// An explicit path must exist. Otherwise `verify.yml` in the formal
    /// directory is used when present, falling back to defaults.
    pub fn load(formal_dir: &Path, explicit: Option<&Path>) -> Result<Self, ConfigError> {
        if let Some(path) = explicit {
            return Self::from_file(path);
        }

        let candidate = formal_dir.join(CONFIG_FILE_NAME);
        if candidate.is_file() {
            tracing::debug!(path = %candidate.display(), "loading suite configuration");
            return Self::from_file(&candidate);
        }

        tracing::debug!("no {} found, using defaults", CONFIG_FILE_NAME);
        Ok(Self::default().resolved_against(formal_dir))
    }

    /// Make relative roots absolute with respect to `base`
    pub fn resolved_against(mut self, base: &Path) -> Self {
        if self.design.root.is_relative() {
            self.design.root = base.join(&self.design.root);
        }
        if self.harness.root.is_relative() {
            self.harness.root = base.join(&self.harness.root);
        }
        if let Some(catalog) = &self.catalog {
            if catalog.is_relative() {
                self.catalog = Some(base.join(catalog));
            }
        }
        self
    }

    /// Check invariants that serde cannot express
    pub fn validate(&self) -> Result<(), ConfigError> {
        let depth = &self.proof.depth;
        if !(depth.instruction < depth.system && depth.system < depth.integration) {
            return Err(ConfigError::NonMonotonicDepth {
                instruction: depth.instruction,
                system: depth.system,
                integration: depth.integration,
            });
        }

        if self.execution.workers == Some(0) {
            return Err(ConfigError::InvalidValue {
                field: "execution.workers",
                reason: "must be at least 1".to_string(),
            });
        }

        if self.execution.timeout_secs == 0 {
            return Err(ConfigError::InvalidValue {
                field: "execution.timeout_secs",
                reason: "must be at least 1 second".to_string(),
            });
        }

        if self.tool.program.trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "tool.program",
                reason: "must not be empty".to_string(),
            });
        }

        Ok(())
    }
}
