// Verification Artifact
// Structured form of an sby-style job file and its one text serialization

use crate::config::{Expectation, ProofMode};

use std::fmt;

use thiserror::Error;

/// Extension of generated artifacts
pub const ARTIFACT_EXTENSION: &str = "sby";

/// The `[options]` section
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactOptions {
    pub mode: ProofMode,
    pub expect: Expectation,
    /// Proof-depth budget (state-transition steps)
    pub depth: u32,
    pub wait: bool,
}

/// One line of the `[script]` section
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScriptLine {
    Blank,
    Comment(String),
    Command(String),
}

impl fmt::Display for ScriptLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScriptLine::Blank => Ok(()),
            ScriptLine::Comment(text) => write!(f, "# {}", text),
            ScriptLine::Command(cmd) => f.write_str(cmd),
        }
    }
}

/// A complete verification job description
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifact {
    pub options: ArtifactOptions,
    pub engines: Vec<String>,
    pub script: Vec<ScriptLine>,
    pub files: Vec<String>,
}

/// Errors from reading an artifact back
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ArtifactParseError {
    #[error("line {line}: content outside of any section")]
    OutsideSection { line: usize },

    #[error("line {line}: unknown section [{name}]")]
    UnknownSection { line: usize, name: String },

    #[error("missing [{0}] section")]
    MissingSection(&'static str),

    #[error("line {line}: invalid option: {reason}")]
    InvalidOption { line: usize, reason: String },
}

impl Artifact {
    /// Serialize to the on-disk text format
    pub fn render(&self) -> String {
        let mut out = String::new();

        out.push_str("[options]\n");
        out.push_str(&format!("mode {}\n", self.options.mode));
        out.push_str(&format!("expect {}\n", self.options.expect));
        out.push_str(&format!("depth {}\n", self.options.depth));
        out.push_str(&format!(
            "wait {}\n",
            if self.options.wait { "on" } else { "off" }
        ));

        out.push_str("\n[engines]\n");
        for engine in &self.engines {
            out.push_str(engine);
            out.push('\n');
        }

        out.push_str("\n[script]\n");
        for line in &self.script {
            out.push_str(&line.to_string());
            out.push('\n');
        }

        out.push_str("\n[files]\n");
        for file in &self.files {
            out.push_str(file);
            out.push('\n');
        }

        out
    }

    /// Parse an artifact produced by [`Artifact::render`]
    ///
    /// Options missing from the file fall back to `prove`/`pass`/depth 0/`wait off`.
    pub fn parse(content: &str) -> Result<Self, ArtifactParseError> {
        #[derive(Clone, Copy, PartialEq)]
        enum Section {
            Options,
            Engines,
            Script,
            Files,
        }

        let mut section = None;
        let mut seen = [false; 4];
        let mut options = ArtifactOptions {
            mode: ProofMode::Prove,
            expect: Expectation::Pass,
            depth: 0,
            wait: false,
        };
        let mut engines = Vec::new();
        let mut script = Vec::new();
        let mut files = Vec::new();

        for (idx, raw) in content.lines().enumerate() {
            let line_no = idx + 1;
            let line = raw.trim_end();

            if let Some(name) = line.strip_prefix('[').and_then(|l| l.strip_suffix(']')) {
                let next = match name {
                    "options" => Section::Options,
                    "engines" => Section::Engines,
                    "script" => Section::Script,
                    "files" => Section::Files,
                    other => {
                        return Err(ArtifactParseError::UnknownSection {
                            line: line_no,
                            name: other.to_string(),
                        })
                    }
                };
                seen[next as usize] = true;
                section = Some(next);
                continue;
            }

            match section {
                None if line.is_empty() => {}
                None => return Err(ArtifactParseError::OutsideSection { line: line_no }),
                Some(Section::Options) => {
                    if line.is_empty() {
                        continue;
                    }
                    parse_option(line, line_no, &mut options)?;
                }
                Some(Section::Engines) => {
                    if !line.is_empty() {
                        engines.push(line.to_string());
                    }
                }
                Some(Section::Script) => {
                    let entry = if line.is_empty() {
                        ScriptLine::Blank
                    } else if let Some(comment) = line.strip_prefix('#') {
                        ScriptLine::Comment(comment.trim_start().to_string())
                    } else {
                        ScriptLine::Command(line.to_string())
                    };
                    script.push(entry);
                }
                Some(Section::Files) => {
                    if !line.is_empty() {
                        files.push(line.to_string());
                    }
                }
            }
        }

        let names = ["options", "engines", "script", "files"];
        for (present, name) in seen.iter().zip(names) {
            if !present {
                return Err(ArtifactParseError::MissingSection(name));
            }
        }

        // The blank separator before the next section belongs to no section
        while script.last() == Some(&ScriptLine::Blank) {
            script.pop();
        }

        Ok(Artifact {
            options,
            engines,
            script,
            files,
        })
    }
}

fn parse_option(
    line: &str,
    line_no: usize,
    options: &mut ArtifactOptions,
) -> Result<(), ArtifactParseError> {
    let invalid = |reason: String| ArtifactParseError::InvalidOption {
        line: line_no,
        reason,
    };

    let (key, value) = line
        .split_once(char::is_whitespace)
        .map(|(k, v)| (k, v.trim()))
        .ok_or_else(|| invalid(format!("'{}' has no value", line)))?;

    match key {
        "mode" => options.mode = value.parse().map_err(invalid)?,
        "expect" => options.expect = value.parse().map_err(invalid)?,
        "depth" => {
            options.depth = value
                .parse()
                .map_err(|_| invalid(format!("depth '{}' is not a number", value)))?
        }
        "wait" => {
            options.wait = match value {
                "on" => true,
                "off" => false,
                _ => return Err(invalid(format!("wait must be on/off, got '{}'", value))),
            }
        }
        // Backend-specific options are carried by the tool, not by us
        _ => {}
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Artifact {
        Artifact {
            options: ArtifactOptions {
                mode: ProofMode::Prove,
                expect: Expectation::Pass,
                depth: 20,
                wait: true,
            },
            engines: vec!["smtbmc boolector".to_string()],
            script: vec![
                ScriptLine::Comment("Design files".to_string()),
                ScriptLine::Command("read_verilog -DFORMAL /rtl/top.v".to_string()),
                ScriptLine::Blank,
                ScriptLine::Comment("Synthesis passes".to_string()),
                ScriptLine::Command("hierarchy -top top".to_string()),
                ScriptLine::Command("proc".to_string()),
            ],
            files: vec!["/rtl/top.v".to_string()],
        }
    }

    #[test]
    fn test_render_layout() {
        let text = sample().render();
        let expected = "[options]\n\
mode prove\n\
expect pass\n\
depth 20\n\
wait on\n\
\n\
[engines]\n\
smtbmc boolector\n\
\n\
[script]\n\
# Design files\n\
read_verilog -DFORMAL /rtl/top.v\n\
\n\
# Synthesis passes\n\
hierarchy -top top\n\
proc\n\
\n\
[files]\n\
/rtl/top.v\n";
        assert_eq!(text, expected);
    }

    #[test]
    fn test_parse_reads_back_render() {
        let artifact = sample();
        let parsed = Artifact::parse(&artifact.render()).unwrap();
        assert_eq!(parsed, artifact);
    }

    #[test]
    fn test_parse_ignores_unknown_options() {
        let text = "[options]\nmode bmc\nmulticlock on\ndepth 7\n[engines]\nabc pdr\n[script]\nprep\n[files]\na.v\n";
        let parsed = Artifact::parse(text).unwrap();
        assert_eq!(parsed.options.mode, ProofMode::Bmc);
        assert_eq!(parsed.options.depth, 7);
        assert!(!parsed.options.wait);
        assert_eq!(parsed.engines, vec!["abc pdr".to_string()]);
    }

    #[test]
    fn test_parse_missing_section() {
        let err = Artifact::parse("[options]\nmode prove\n[engines]\nsmtbmc\n[script]\nprep\n")
            .unwrap_err();
        assert_eq!(err, ArtifactParseError::MissingSection("files"));
    }

    #[test]
    fn test_parse_rejects_bad_depth() {
        let err = Artifact::parse("[options]\ndepth deep\n").unwrap_err();
        assert!(matches!(err, ArtifactParseError::InvalidOption { line: 2, .. }));
    }

    #[test]
    fn test_parse_rejects_stray_content() {
        let err = Artifact::parse("exit 0\n").unwrap_err();
        assert_eq!(err, ArtifactParseError::OutsideSection { line: 1 });
    }
}
