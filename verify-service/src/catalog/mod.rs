// Check Catalog
// Immutable registry of the correctness checks a suite can generate

pub mod builtin;

use std::collections::HashSet;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Scope of a check, ordered by growing state-space size
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Category {
    /// One check per instruction of the ISA
    #[serde(rename = "instructions")]
    Instruction,
    /// Whole-core properties (register file, PC, memory consistency, liveness)
    #[serde(rename = "system")]
    SystemProperty,
    /// Complete-ISA, coverage and fault-injection runs
    #[serde(rename = "integration")]
    Integration,
}

impl Category {
    pub const ALL: [Category; 3] = [
        Category::Instruction,
        Category::SystemProperty,
        Category::Integration,
    ];

    /// Stable key used on the command line and in reports
    pub fn key(&self) -> &'static str {
        match self {
            Category::Instruction => "instructions",
            Category::SystemProperty => "system",
            Category::Integration => "integration",
        }
    }

    /// Directory (under the formal directory) holding this category's artifacts
    pub fn dir_name(&self) -> &'static str {
        match self {
            Category::Instruction => "instructions",
            Category::SystemProperty => "system_checks",
            Category::Integration => "integration",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

impl std::str::FromStr for Category {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "instructions" | "instruction" | "insn" => Ok(Category::Instruction),
            "system" | "system_checks" | "system-property" => Ok(Category::SystemProperty),
            "integration" => Ok(Category::Integration),
            _ => Err(format!(
                "Unknown category '{}'. Valid categories: instructions, system, integration",
                s
            )),
        }
    }
}

/// A single check in the catalog
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckDefinition {
    /// Identifier, substituted into artifact names and harness paths
    pub id: String,
    pub category: Category,
    /// Human description shown during generation
    pub description: String,
}

impl CheckDefinition {
    pub fn new(id: impl Into<String>, category: Category, description: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            category,
            description: description.into(),
        }
    }

    /// Name of the test unit generated for this check
    pub fn unit_name(&self) -> String {
        format!("verify_{}", self.id)
    }
}

/// Errors raised while building a catalog
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("duplicate check '{id}' in category '{category}'")]
    DuplicateCheck { id: String, category: Category },

    #[error("invalid check identifier '{0}' (expected lowercase letters, digits and '_')")]
    InvalidIdentifier(String),

    #[error("description of check '{id}' must be a single line without control characters")]
    InvalidDescription { id: String },

    #[error("invalid entry in catalog section '{section}': {reason}")]
    InvalidEntry { section: &'static str, reason: String },

    #[error("failed to read catalog {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse catalog: {0}")]
    Parse(#[from] serde_yaml::Error),
}

/// On-disk catalog layout: one id → description map per category
///
/// `Mapping` keeps entries in the order they were written.
#[derive(Debug, Default, Deserialize)]
struct CatalogFile {
    #[serde(default)]
    instructions: serde_yaml::Mapping,
    #[serde(default)]
    system: serde_yaml::Mapping,
    #[serde(default)]
    integration: serde_yaml::Mapping,
}

/// Turn one category section into check definitions, in written order
fn section_checks(
    category: Category,
    section: serde_yaml::Mapping,
) -> Result<Vec<CheckDefinition>, CatalogError> {
    section
        .into_iter()
        .map(|(key, value)| {
            let id = key.as_str().ok_or_else(|| CatalogError::InvalidEntry {
                section: category.key(),
                reason: format!("check identifier must be a string, got {:?}", key),
            })?;
            let description = value.as_str().ok_or_else(|| CatalogError::InvalidEntry {
                section: category.key(),
                reason: format!("description of '{}' must be a string", id),
            })?;
            Ok(CheckDefinition::new(id, category, description))
        })
        .collect()
}

/// Registry of check definitions, loaded once and then only read
#[derive(Debug, Clone)]
pub struct CheckCatalog {
    checks: Vec<CheckDefinition>,
}

impl CheckCatalog {
    /// Build a catalog, rejecting malformed or duplicate identifiers
    pub fn new(checks: Vec<CheckDefinition>) -> Result<Self, CatalogError> {
        let mut seen = HashSet::new();
        for check in &checks {
            if !is_valid_identifier(&check.id) {
                return Err(CatalogError::InvalidIdentifier(check.id.clone()));
            }
            // Descriptions land in single-line artifact comments
            if check.description.chars().any(char::is_control) {
                return Err(CatalogError::InvalidDescription {
                    id: check.id.clone(),
                });
            }
            if !seen.insert((check.category, check.id.as_str())) {
                return Err(CatalogError::DuplicateCheck {
                    id: check.id.clone(),
                    category: check.category,
                });
            }
        }
        Ok(Self { checks })
    }

    /// The RV32I catalog shipped with the runner
    pub fn builtin() -> Self {
        let checks = builtin::INSTRUCTIONS
            .iter()
            .map(|(id, desc)| CheckDefinition::new(*id, Category::Instruction, *desc))
            .chain(
                builtin::SYSTEM_CHECKS
                    .iter()
                    .map(|(id, desc)| CheckDefinition::new(*id, Category::SystemProperty, *desc)),
            )
            .chain(
                builtin::INTEGRATION_CHECKS
                    .iter()
                    .map(|(id, desc)| CheckDefinition::new(*id, Category::Integration, *desc)),
            )
            .collect();
        Self { checks }
    }

    /// Parse a catalog from YAML
    ///
    /// ```yaml
    /// instructions:
    ///   add: R-type arithmetic
    /// system:
    ///   reg: Register file verification
    /// ```
    ///
    /// Categories follow category order; entries keep the order they were written in.
    pub fn from_yaml(content: &str) -> Result<Self, CatalogError> {
        let file: CatalogFile = serde_yaml::from_str(content)?;

        let mut checks = section_checks(Category::Instruction, file.instructions)?;
        checks.extend(section_checks(Category::SystemProperty, file.system)?);
        checks.extend(section_checks(Category::Integration, file.integration)?);

        Self::new(checks)
    }

    /// Load a catalog from a YAML file
    pub fn from_file(path: &Path) -> Result<Self, CatalogError> {
        let content = fs::read_to_string(path).map_err(|source| CatalogError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_yaml(&content)
    }

    pub fn iter(&self) -> impl Iterator<Item = &CheckDefinition> {
        self.checks.iter()
    }

    pub fn in_category(&self, category: Category) -> impl Iterator<Item = &CheckDefinition> {
        self.checks.iter().filter(move |c| c.category == category)
    }

    pub fn len(&self) -> usize {
        self.checks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.checks.is_empty()
    }

    /// A catalog restricted to the given categories, keeping catalog order
    pub fn filtered(&self, categories: &[Category]) -> Self {
        Self {
            checks: self
                .checks
                .iter()
                .filter(|c| categories.contains(&c.category))
                .cloned()
                .collect(),
        }
    }
}

fn is_valid_identifier(id: &str) -> bool {
    !id.is_empty()
        && id
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_')
}
