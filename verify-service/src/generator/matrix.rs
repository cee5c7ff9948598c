// Matrix Generation
// Expands the check catalog into one artifact per (category, check) on disk

use crate::catalog::{Category, CheckCatalog, CheckDefinition};
use crate::config::SuiteConfig;
use crate::generator::artifact::{Artifact, ArtifactOptions, ScriptLine, ARTIFACT_EXTENSION};
use crate::generator::{GenerationError, TestUnit};

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Synthesis passes run after every source load, in order
const SYNTHESIS_PASSES: &[&str] = &[
    "proc",
    "opt",
    "memory -nomap",
    "flatten",
    "setundef -undriven -anyseq",
    "check",
    "stat",
];

/// What happened to an artifact file during generation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteState {
    Created,
    Updated,
    /// Existing file already had the rendered content
    Unchanged,
}

#[derive(Debug, Clone)]
pub struct GeneratedUnit {
    pub unit: TestUnit,
    pub write: WriteState,
}

/// Result of generating one catalog entry
#[derive(Debug)]
pub struct GenerationOutcome {
    pub check: CheckDefinition,
    pub result: Result<GeneratedUnit, GenerationError>,
}

/// Per-entry results of one generation pass, in catalog order
#[derive(Debug, Default)]
pub struct GenerationReport {
    pub outcomes: Vec<GenerationOutcome>,
}

impl GenerationReport {
    pub fn len(&self) -> usize {
        self.outcomes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.outcomes.is_empty()
    }

    /// Successfully generated units
    pub fn units(&self) -> impl Iterator<Item = &TestUnit> {
        self.outcomes
            .iter()
            .filter_map(|o| o.result.as_ref().ok().map(|g| &g.unit))
    }

    pub fn failures(&self) -> impl Iterator<Item = &GenerationError> {
        self.outcomes.iter().filter_map(|o| o.result.as_ref().err())
    }

    pub fn failed_count(&self) -> usize {
        self.failures().count()
    }

    pub fn all_succeeded(&self) -> bool {
        self.failed_count() == 0
    }

    /// Number of units generated for a category
    pub fn generated_in(&self, category: Category) -> usize {
        self.units().filter(|u| u.category == category).count()
    }

    pub fn count_with_state(&self, state: WriteState) -> usize {
        self.outcomes
            .iter()
            .filter(|o| matches!(&o.result, Ok(g) if g.write == state))
            .count()
    }

    /// Consume the report, keeping only the errors
    pub fn into_errors(self) -> Vec<GenerationError> {
        self.outcomes
            .into_iter()
            .filter_map(|o| o.result.err())
            .collect()
    }
}

/// Renders artifacts for a catalog into `<formal_dir>/<category dir>/`
pub struct MatrixGenerator<'a> {
    config: &'a SuiteConfig,
    formal_dir: PathBuf,
}

impl<'a> MatrixGenerator<'a> {
    pub fn new(config: &'a SuiteConfig, formal_dir: impl Into<PathBuf>) -> Self {
        Self {
            config,
            formal_dir: formal_dir.into(),
        }
    }

    /// Output directory for a category
    pub fn category_dir(&self, category: Category) -> PathBuf {
        self.formal_dir.join(category.dir_name())
    }

    /// Artifact location for a check
    pub fn artifact_path(&self, check: &CheckDefinition) -> PathBuf {
        self.category_dir(check.category)
            .join(format!("{}.{}", check.unit_name(), ARTIFACT_EXTENSION))
    }

    /// Generate every entry of the catalog
    ///
    /// A failing entry is recorded and the remaining entries are still generated.
    pub fn generate(&self, catalog: &CheckCatalog) -> GenerationReport {
        let _span = tracing::info_span!("generate", checks = catalog.len()).entered();

        let outcomes = catalog
            .iter()
            .map(|check| {
                let result = self.generate_entry(check);
                match &result {
                    Ok(generated) => tracing::debug!(
                        check = %check.id,
                        category = %check.category,
                        state = ?generated.write,
                        "artifact generated"
                    ),
                    Err(e) => tracing::warn!(check = %check.id, error = %e, "artifact generation failed"),
                }
                GenerationOutcome {
                    check: check.clone(),
                    result,
                }
            })
            .collect();

        GenerationReport { outcomes }
    }

    /// Generate a single entry, creating its category directory if needed
    pub fn generate_entry(&self, check: &CheckDefinition) -> Result<GeneratedUnit, GenerationError> {
        let artifact = self.artifact_for(check)?;
        let unit = self.unit_for(check, &artifact);
        let content = artifact.render();

        let dir = self.category_dir(check.category);
        fs::create_dir_all(&dir).map_err(|source| GenerationError::CreateDir {
            check_id: check.id.clone(),
            path: dir.clone(),
            source,
        })?;

        let write = write_if_changed(&unit.artifact_path, &content).map_err(|source| {
            GenerationError::Write {
                check_id: check.id.clone(),
                path: unit.artifact_path.clone(),
                source,
            }
        })?;

        Ok(GeneratedUnit { unit, write })
    }

    /// Build the structured artifact for a check
    ///
    /// Pure function of (check, configuration): the same inputs always
    /// render to the same bytes.
    pub fn artifact_for(&self, check: &CheckDefinition) -> Result<Artifact, GenerationError> {
        let design = &self.config.design;
        let design_files: Vec<PathBuf> = design
            .sources
            .iter()
            .flat_map(|group| group.files.iter().map(|f| design.root.join(f)))
            .collect();

        if design_files.is_empty() {
            return Err(GenerationError::Render {
                check_id: check.id.clone(),
                category: check.category,
                reason: "no design sources configured".to_string(),
            });
        }

        let harness_files = self.harness_files(check);
        let defines = self.define_flags(check);

        let mut script = vec![
            ScriptLine::Comment(format!(
                "--- {} {}: {} ---",
                category_title(check.category),
                check.id.to_uppercase(),
                check.description
            )),
            ScriptLine::Blank,
        ];

        for (idx, group) in design.sources.iter().enumerate() {
            if idx > 0 {
                script.push(ScriptLine::Blank);
            }
            script.push(ScriptLine::Comment(group.name.clone()));
            for file in &group.files {
                script.push(ScriptLine::Command(read_command(
                    "read_verilog",
                    &defines,
                    &design.root.join(file),
                )));
            }
        }

        script.push(ScriptLine::Blank);
        script.push(ScriptLine::Comment(format!(
            "Check harness for {}",
            check.id.to_uppercase()
        )));
        for file in &harness_files {
            script.push(ScriptLine::Command(read_command(
                "read_verilog -sv -formal",
                &defines,
                file,
            )));
        }

        script.push(ScriptLine::Blank);
        script.push(ScriptLine::Comment("Synthesis passes".to_string()));
        script.push(ScriptLine::Command(format!("hierarchy -top {}", design.top)));
        script.extend(
            SYNTHESIS_PASSES
                .iter()
                .map(|pass| ScriptLine::Command(pass.to_string())),
        );

        let files = design_files
            .iter()
            .chain(harness_files.iter())
            .map(|p| p.display().to_string())
            .collect();

        let proof = &self.config.proof;
        Ok(Artifact {
            options: ArtifactOptions {
                mode: proof.mode,
                expect: proof.expect,
                depth: proof.depth.for_category(check.category),
                wait: proof.wait,
            },
            engines: vec![self.config.tool.engine.clone()],
            script,
            files,
        })
    }

    fn unit_for(&self, check: &CheckDefinition, artifact: &Artifact) -> TestUnit {
        TestUnit {
            name: check.unit_name(),
            check_id: check.id.clone(),
            category: check.category,
            artifact_path: self.artifact_path(check),
            depth: artifact.options.depth,
            engine: artifact.engines.join(" "),
            sources: artifact.files.iter().map(PathBuf::from).collect(),
        }
    }

    /// Harness files loaded after the design, parameterized by check id
    fn harness_files(&self, check: &CheckDefinition) -> Vec<PathBuf> {
        let root = &self.config.harness.root;
        let id = &check.id;
        let mut files = vec![root.join("checks").join("rvfi_macros.vh")];
        match check.category {
            Category::Instruction => {
                files.push(root.join("insns").join(format!("insn_{}.v", id)));
                files.push(root.join("checks").join("rvfi_insn_check.sv"));
            }
            Category::SystemProperty => {
                files.push(root.join("checks").join(format!("rvfi_{}_check.sv", id)));
            }
            Category::Integration => {
                files.push(root.join("insns").join(format!("isa_{}.v", id)));
            }
        }
        files
    }

    /// `-D` flags: common defines plus the per-check instruction model
    fn define_flags(&self, check: &CheckDefinition) -> String {
        let mut flags: Vec<String> = self
            .config
            .design
            .defines
            .iter()
            .map(|d| format!("-D{}", d))
            .collect();
        if check.category == Category::Instruction {
            flags.push(format!("-DRISCV_FORMAL_INSN_MODEL=rvfi_insn_{}", check.id));
        }
        flags.join(" ")
    }
}

fn read_command(command: &str, defines: &str, path: &Path) -> String {
    if defines.is_empty() {
        format!("{} {}", command, path.display())
    } else {
        format!("{} {} {}", command, defines, path.display())
    }
}

fn category_title(category: Category) -> &'static str {
    match category {
        Category::Instruction => "Instruction check",
        Category::SystemProperty => "System check",
        Category::Integration => "Integration check",
    }
}

/// Write `content` unless the file already holds exactly that
fn write_if_changed(path: &Path, content: &str) -> io::Result<WriteState> {
    let state = match fs::read(path) {
        Ok(existing) if existing == content.as_bytes() => return Ok(WriteState::Unchanged),
        Ok(_) => WriteState::Updated,
        Err(e) if e.kind() == io::ErrorKind::NotFound => WriteState::Created,
        Err(e) => return Err(e),
    };
    fs::write(path, content)?;
    Ok(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SourceGroup;
    use std::collections::HashSet;
    use tempfile::TempDir;

    fn config_in(dir: &Path) -> SuiteConfig {
        SuiteConfig::default().resolved_against(dir)
    }

    fn read_all(dir: &Path) -> Vec<(PathBuf, Vec<u8>)> {
        let mut files: Vec<_> = Category::ALL
            .iter()
            .filter_map(|c| fs::read_dir(dir.join(c.dir_name())).ok())
            .flat_map(|entries| entries.flatten())
            .map(|e| (e.path(), fs::read(e.path()).unwrap()))
            .collect();
        files.sort();
        files
    }

    #[test]
    fn test_generates_one_unit_per_entry() {
        let dir = TempDir::new().unwrap();
        let config = config_in(dir.path());
        let catalog = CheckCatalog::builtin();

        let report = MatrixGenerator::new(&config, dir.path()).generate(&catalog);

        assert_eq!(report.len(), catalog.len());
        assert!(report.all_succeeded());
        assert_eq!(report.generated_in(Category::Instruction), 37);
        assert_eq!(report.generated_in(Category::SystemProperty), 11);
        assert_eq!(report.generated_in(Category::Integration), 3);

        let mut names = HashSet::new();
        for unit in report.units() {
            assert!(names.insert((unit.category, unit.name.clone())));
            assert!(unit.artifact_path.is_file());
        }
    }

    #[test]
    fn test_artifact_names_and_locations() {
        let dir = TempDir::new().unwrap();
        let config = config_in(dir.path());
        let generator = MatrixGenerator::new(&config, dir.path());

        let add = CheckDefinition::new("add", Category::Instruction, "R-type arithmetic");
        let reg = CheckDefinition::new("reg", Category::SystemProperty, "Register file");
        assert_eq!(
            generator.artifact_path(&add),
            dir.path().join("instructions/verify_add.sby")
        );
        assert_eq!(
            generator.artifact_path(&reg),
            dir.path().join("system_checks/verify_reg.sby")
        );
    }

    #[test]
    fn test_regeneration_is_byte_identical() {
        let dir = TempDir::new().unwrap();
        let config = config_in(dir.path());
        let catalog = CheckCatalog::builtin();
        let generator = MatrixGenerator::new(&config, dir.path());

        generator.generate(&catalog);
        let first = read_all(dir.path());

        let second_report = generator.generate(&catalog);
        let second = read_all(dir.path());

        assert_eq!(first, second);
        assert_eq!(second_report.count_with_state(WriteState::Unchanged), catalog.len());
    }

    #[test]
    fn test_deleted_artifact_is_restored_alone() {
        let dir = TempDir::new().unwrap();
        let config = config_in(dir.path());
        let catalog = CheckCatalog::builtin();
        let generator = MatrixGenerator::new(&config, dir.path());

        generator.generate(&catalog);
        let before = read_all(dir.path());

        let victim = dir.path().join("instructions/verify_beq.sby");
        fs::remove_file(&victim).unwrap();

        let report = generator.generate(&catalog);
        assert_eq!(report.count_with_state(WriteState::Created), 1);
        assert_eq!(report.count_with_state(WriteState::Unchanged), catalog.len() - 1);
        assert_eq!(read_all(dir.path()), before);
    }

    #[test]
    fn test_depth_grows_with_category() {
        let dir = TempDir::new().unwrap();
        let config = config_in(dir.path());
        let generator = MatrixGenerator::new(&config, dir.path());

        let depth = |c: Category| {
            let check = CheckDefinition::new("x", c, "x");
            generator.artifact_for(&check).unwrap().options.depth
        };
        assert!(depth(Category::Instruction) < depth(Category::SystemProperty));
        assert!(depth(Category::SystemProperty) < depth(Category::Integration));
    }

    #[test]
    fn test_instruction_script_is_parameterized() {
        let dir = TempDir::new().unwrap();
        let config = config_in(dir.path());
        let generator = MatrixGenerator::new(&config, dir.path());
        let check = CheckDefinition::new("sltu", Category::Instruction, "R-type set less than unsigned");

        let text = generator.artifact_for(&check).unwrap().render();

        assert!(text.contains("-DRISCV_FORMAL_INSN_MODEL=rvfi_insn_sltu"));
        assert!(text.contains("insns/insn_sltu.v"));
        assert!(text.contains("rvfi_insn_check.sv"));
        assert!(text.contains("hierarchy -top top\nproc\nopt\nmemory -nomap\nflatten\nsetundef -undriven -anyseq\ncheck\nstat\n"));

        // every loaded file is enumerated in [files]
        let files_section = text.split("[files]\n").nth(1).unwrap();
        assert_eq!(files_section.lines().count(), 27 + 3);
        assert!(files_section.contains("core_modules/alu.v"));
    }

    #[test]
    fn test_system_and_integration_harness() {
        let dir = TempDir::new().unwrap();
        let config = config_in(dir.path());
        let generator = MatrixGenerator::new(&config, dir.path());

        let sys = CheckDefinition::new("liveness", Category::SystemProperty, "Liveness");
        let text = generator.artifact_for(&sys).unwrap().render();
        assert!(text.contains("checks/rvfi_liveness_check.sv"));
        assert!(!text.contains("RISCV_FORMAL_INSN_MODEL"));

        let isa = CheckDefinition::new("rv32i", Category::Integration, "Complete ISA");
        let text = generator.artifact_for(&isa).unwrap().render();
        assert!(text.contains("insns/isa_rv32i.v"));
        assert!(text.contains("depth 50\n"));
    }

    #[test]
    fn test_failure_is_isolated_to_entry() {
        let dir = TempDir::new().unwrap();
        let config = config_in(dir.path());
        let catalog = CheckCatalog::builtin().filtered(&[Category::Instruction, Category::SystemProperty]);

        // A regular file where the system directory should be breaks only that category
        fs::write(dir.path().join("system_checks"), "not a directory").unwrap();

        let report = MatrixGenerator::new(&config, dir.path()).generate(&catalog);

        assert_eq!(report.len(), catalog.len());
        assert_eq!(report.failed_count(), 11);
        assert_eq!(report.generated_in(Category::Instruction), 37);
        for err in report.failures() {
            assert!(matches!(err, GenerationError::CreateDir { .. }));
        }
    }

    #[test]
    fn test_empty_design_is_render_error() {
        let dir = TempDir::new().unwrap();
        let mut config = config_in(dir.path());
        config.design.sources = vec![SourceGroup {
            name: "Nothing".to_string(),
            files: vec![],
        }];
        let generator = MatrixGenerator::new(&config, dir.path());
        let check = CheckDefinition::new("add", Category::Instruction, "add");

        let err = generator.generate_entry(&check).unwrap_err();
        assert!(matches!(err, GenerationError::Render { .. }));
        assert_eq!(err.check_id(), "add");
    }

    #[test]
    fn test_generated_unit_reads_back() {
        let dir = TempDir::new().unwrap();
        let config = config_in(dir.path());
        let generator = MatrixGenerator::new(&config, dir.path());
        let check = CheckDefinition::new("jal", Category::Instruction, "J-type jump and link");

        let generated = generator.generate_entry(&check).unwrap();
        let text = fs::read_to_string(&generated.unit.artifact_path).unwrap();
        let parsed = Artifact::parse(&text).unwrap();

        assert_eq!(parsed.options.depth, generated.unit.depth);
        assert_eq!(parsed.files.len(), generated.unit.sources.len());
    }
}
