//! Library of known failure signatures.
//!
//! Known failure modes of the supported programs are collected as pattern
//! files (`*.err`) under a configurable root directory and matched against
//! output text to classify failed jobs. A pattern file is a `key: value`
//! block:
//!
//! ```text
//! # SCF did not converge within the iteration limit
//! name: scf-no-convergence
//! program: nwchem
//! trigger: Calculation failed to converge
//! category: convergence
//! remedy:$START
//! Raise the iteration limit in the scf block or start
//! from a better initial guess.
//! $END
//! ```
//!
//! `trigger` is a literal substring; `regex` (mutually exclusive with
//! `trigger`) is a pattern compiled in multi-line mode so `^`/`$` anchor
//! per output line. `$START`/`$END` delimit multi-line values. Lines
//! starting with `#` are comments.
//!
//! Loading walks the whole tree below the root and sorts the collected
//! files by file name ascending, so diagnosis order is deterministic. A
//! malformed pattern file is logged and skipped; it never aborts the
//! batch. The loaded library is immutable and can be shared across
//! concurrent diagnostic passes.

use crate::program::Program;
use log::{debug, warn};
use regex::{Regex, RegexBuilder};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// File suffix of pattern files.
pub const PATTERN_SUFFIX: &str = "err";

const MULTILINE_START: &str = "$START";
const MULTILINE_END: &str = "$END";

/// Error type for pattern loading.
#[derive(Error, Debug)]
pub enum PatternError {
    /// The pattern root (or a directory below it) could not be read
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    /// A single pattern file is malformed
    #[error("malformed pattern file {path}: {reason}")]
    Malformed {
        /// The offending file
        path: PathBuf,
        /// What is wrong with it
        reason: String,
    },
}

/// What makes a pattern fire against output text.
#[derive(Debug, Clone)]
pub enum Trigger {
    /// Literal substring of the output
    Literal(String),
    /// Regex matched in multi-line mode against the whole output
    Pattern(Regex),
}

impl Trigger {
    fn fires(&self, output: &str) -> bool {
        match self {
            Trigger::Literal(token) => output.contains(token),
            Trigger::Pattern(re) => re.is_match(output),
        }
    }
}

/// One known failure descriptor loaded from a pattern file.
#[derive(Debug, Clone)]
pub struct ErrorMessage {
    /// Short identifier of the failure mode
    pub name: String,
    /// Program the pattern applies to, if restricted
    pub program: Option<Program>,
    /// What makes this pattern fire
    pub trigger: Trigger,
    /// Failure category tag (e.g. "convergence", "resources")
    pub category: Option<String>,
    /// Remediation text shown to the user
    pub remedy: Option<String>,
    /// File the pattern was loaded from
    pub source: PathBuf,
}

/// Immutable collection of loaded patterns, in diagnosis order.
#[derive(Debug, Default)]
pub struct ErrorPatternLibrary {
    patterns: Vec<ErrorMessage>,
}

impl ErrorPatternLibrary {
    /// Loads every `*.err` file beneath `root`, sorted by file name
    /// ascending. Malformed files are logged and skipped.
    pub fn load(root: &Path) -> Result<Self, PatternError> {
        let mut files = Vec::new();
        collect_pattern_files(root, &mut files)?;
        files.sort_by(|a, b| {
            let name_a = a.file_name().map(|n| n.to_owned()).unwrap_or_default();
            let name_b = b.file_name().map(|n| n.to_owned()).unwrap_or_default();
            name_a.cmp(&name_b).then_with(|| a.cmp(b))
        });

        let mut patterns = Vec::new();
        for file in files {
            match parse_pattern_file(&file) {
                Ok(message) => patterns.push(message),
                Err(e) => warn!("skipping pattern file: {}", e),
            }
        }
        debug!("loaded {} error patterns from {}", patterns.len(), root.display());
        Ok(Self { patterns })
    }

    /// Builds a library from already-constructed patterns (mainly tests).
    pub fn from_patterns(patterns: Vec<ErrorMessage>) -> Self {
        Self { patterns }
    }

    /// All loaded patterns in diagnosis order.
    pub fn patterns(&self) -> &[ErrorMessage] {
        &self.patterns
    }

    /// Matches `output` against every pattern, in load order, returning
    /// all that fire. Independent failure modes can co-occur, so this
    /// never stops at the first match.
    pub fn diagnose(&self, output: &str) -> Vec<&ErrorMessage> {
        self.patterns
            .iter()
            .filter(|p| p.trigger.fires(output))
            .collect()
    }

    /// Like [`diagnose`](Self::diagnose), restricted to patterns that
    /// apply to `program` (patterns without a program restriction always
    /// apply).
    pub fn diagnose_for(&self, program: Program, output: &str) -> Vec<&ErrorMessage> {
        self.patterns
            .iter()
            .filter(|p| p.program.map_or(true, |pp| pp == program))
            .filter(|p| p.trigger.fires(output))
            .collect()
    }
}

fn collect_pattern_files(dir: &Path, out: &mut Vec<PathBuf>) -> Result<(), PatternError> {
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_dir() {
            collect_pattern_files(&path, out)?;
        } else if path
            .extension()
            .map_or(false, |ext| ext == PATTERN_SUFFIX)
        {
            out.push(path);
        }
    }
    Ok(())
}

fn parse_pattern_file(path: &Path) -> Result<ErrorMessage, PatternError> {
    let content = fs::read_to_string(path)?;
    let malformed = |reason: &str| PatternError::Malformed {
        path: path.to_path_buf(),
        reason: reason.to_string(),
    };

    let mut name = None;
    let mut program = None;
    let mut literal = None;
    let mut pattern = None;
    let mut category = None;
    let mut remedy = None;

    let mut lines = content.lines();
    while let Some(line) = lines.next() {
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }
        let (key, value) = trimmed
            .split_once(':')
            .ok_or_else(|| malformed(&format!("line without `key: value` form: `{}`", trimmed)))?;
        let key = key.trim().to_ascii_lowercase();
        let mut value = value.trim().to_string();

        if value == MULTILINE_START {
            let mut block = Vec::new();
            let mut closed = false;
            for body_line in lines.by_ref() {
                if body_line.trim() == MULTILINE_END {
                    closed = true;
                    break;
                }
                block.push(body_line);
            }
            if !closed {
                return Err(malformed(&format!("`{}` block without {}", key, MULTILINE_END)));
            }
            value = block.join("\n");
        }

        match key.as_str() {
            "name" => name = Some(value),
            "program" => {
                program = Some(
                    Program::from_name(&value)
                        .ok_or_else(|| malformed(&format!("unknown program `{}`", value)))?,
                );
            }
            "trigger" => literal = Some(value),
            "regex" => {
                let compiled = RegexBuilder::new(&value)
                    .multi_line(true)
                    .build()
                    .map_err(|e| malformed(&format!("bad regex: {}", e)))?;
                pattern = Some(compiled);
            }
            "category" => category = Some(value),
            "remedy" => remedy = Some(value),
            other => return Err(malformed(&format!("unknown key `{}`", other))),
        }
    }

    let name = name.ok_or_else(|| malformed("missing `name`"))?;
    let trigger = match (literal, pattern) {
        (Some(_), Some(_)) => {
            return Err(malformed("both `trigger` and `regex` given"));
        }
        (Some(token), None) => Trigger::Literal(token),
        (None, Some(re)) => Trigger::Pattern(re),
        (None, None) => return Err(malformed("missing `trigger` or `regex`")),
    };

    Ok(ErrorMessage {
        name,
        program,
        trigger,
        category,
        remedy,
        source: path.to_path_buf(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;

    fn pattern_dir(name: &str) -> PathBuf {
        let dir = env::temp_dir().join(name);
        let _ = fs::remove_dir_all(&dir);
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn test_parse_multiline_remedy() {
        let dir = pattern_dir("qcbridge_patterns_multiline");
        let file = dir.join("010_scf.err");
        fs::write(
            &file,
            "# convergence failure\nname: scf-no-convergence\ntrigger: failed to converge\nremedy:$START\nRaise the iteration limit.\nLoosen the threshold.\n$END\n",
        )
        .unwrap();
        let message = parse_pattern_file(&file).unwrap();
        fs::remove_dir_all(&dir).unwrap();
        assert_eq!(message.name, "scf-no-convergence");
        assert_eq!(
            message.remedy.as_deref(),
            Some("Raise the iteration limit.\nLoosen the threshold.")
        );
    }

    #[test]
    fn test_unterminated_multiline_is_malformed() {
        let dir = pattern_dir("qcbridge_patterns_bad_block");
        let file = dir.join("bad.err");
        fs::write(&file, "name: x\ntrigger: y\nremedy:$START\nno end\n").unwrap();
        let err = parse_pattern_file(&file).unwrap_err();
        fs::remove_dir_all(&dir).unwrap();
        assert!(matches!(err, PatternError::Malformed { .. }));
    }

    #[test]
    fn test_regex_trigger_anchors_per_line() {
        let dir = pattern_dir("qcbridge_patterns_regex");
        fs::write(
            dir.join("020_seg.err"),
            "name: segfault\nregex: ^\\s*segmentation fault\ncategory: crash\n",
        )
        .unwrap();
        let library = ErrorPatternLibrary::load(&dir).unwrap();
        fs::remove_dir_all(&dir).unwrap();
        assert_eq!(library.patterns().len(), 1);
        assert_eq!(library.diagnose("line one\n  segmentation fault\n").len(), 1);
        assert!(library.diagnose("no fault here\n").is_empty());
    }

    #[test]
    fn test_program_filter() {
        let dir = pattern_dir("qcbridge_patterns_filter");
        fs::write(
            dir.join("030_nw.err"),
            "name: nw-only\nprogram: nwchem\ntrigger: boom\n",
        )
        .unwrap();
        fs::write(dir.join("040_any.err"), "name: any\ntrigger: boom\n").unwrap();
        let library = ErrorPatternLibrary::load(&dir).unwrap();
        fs::remove_dir_all(&dir).unwrap();
        let matched = library.diagnose_for(Program::Orca, "boom");
        assert_eq!(matched.len(), 1);
        assert_eq!(matched[0].name, "any");
        let matched = library.diagnose_for(Program::Nwchem, "boom");
        assert_eq!(matched.len(), 2);
    }
}
