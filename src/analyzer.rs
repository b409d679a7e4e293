//! Shared output-analysis capability and result model.
//!
//! Every supported program has an [`OutputAnalyzer`]: it can tell whether an
//! artifact (file or directory) was produced by its program
//! (fingerprinting) and, if so, parse the artifact into a structured
//! [`Analysis`]. Program detection is re-derived from content on every read;
//! no metadata is persisted next to the artifact.
//!
//! This module also carries the pieces the per-program analyzers share:
//!
//! - the property model: scalar properties keep their **first** occurrence
//!   in artifact order, repeatable series keep **every** occurrence;
//! - the block-capture state machine (SCANNING → CAPTURING → SCANNING) over
//!   literal, regex or implicit open/close [`Marker`]s, where an
//!   unterminated block is a hard [`AnalyzeError::IncompleteBlock`], never a
//!   silent truncation;
//! - locale-agnostic numeric parsing tolerating `E`/`e` and Fortran
//!   `D`/`d` exponents, where a malformed number in an optional field
//!   becomes a [`ParseNote`] on the analysis instead of aborting the parse.

use crate::program::Program;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::{BufRead, BufReader};
use std::num::ParseFloatError;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Error type for output analysis.
#[derive(Error, Debug)]
pub enum AnalyzeError {
    /// File system or I/O operation failed
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    /// A block was opened but never closed before end of artifact
    #[error("{program}: unterminated `{label}` block opened at line {opened_at} in {path}")]
    IncompleteBlock {
        /// Program whose analyzer detected the unterminated block
        program: Program,
        /// Artifact that was being parsed
        path: PathBuf,
        /// Label of the block rule that stayed open
        label: String,
        /// 1-based line number of the open marker
        opened_at: usize,
    },
    /// A mandatory numeric field could not be parsed
    #[error("{program}: bad number in field `{field}` at line {line} of {path}")]
    NumberFormat {
        /// Program whose analyzer hit the bad field
        program: Program,
        /// Artifact that was being parsed
        path: PathBuf,
        /// 1-based line number of the offending field
        line: usize,
        /// Name of the field that failed to parse
        field: String,
    },
    /// The artifact is structurally unusable for this program
    #[error("{program}: unusable artifact {path}: {reason}")]
    Artifact {
        /// Program whose analyzer rejected the artifact
        program: Program,
        /// Artifact path
        path: PathBuf,
        /// Human-readable reason
        reason: String,
    },
}

/// How the program run ended, as recovered from the artifact.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Termination {
    /// The program reported normal completion
    Normal,
    /// The program reported a failure
    Abnormal,
    /// Neither completion nor failure markers were found
    Incomplete,
}

/// One extracted scalar value, tagged with its provenance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Property {
    /// Property name (e.g. "total_dft_energy")
    pub name: String,
    /// Parsed numeric value
    pub value: f64,
    /// Method/basis tag when the artifact provides one
    pub tag: Option<String>,
    /// 1-based line number of the first token of the value
    pub line: usize,
}

/// A captured text block (geometry, Hessian, archive section, ...).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextBlock {
    /// Label of the rule that captured the block
    pub label: String,
    /// 1-based line number of the first captured line
    pub start_line: usize,
    /// Captured lines, verbatim, open/close markers excluded
    pub lines: Vec<String>,
    /// Trailing text captured from a regex close marker, if any
    pub trailing: Option<String>,
}

/// A recovered per-line parse problem that did not abort the analysis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParseNote {
    /// 1-based line number
    pub line: usize,
    /// What went wrong
    pub message: String,
}

/// Structured result of analyzing one output artifact.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Analysis {
    /// Program that produced the artifact
    pub program: Program,
    /// Path of the analyzed artifact
    pub artifact: PathBuf,
    /// Recovered termination status
    pub termination: Termination,
    scalars: Vec<Property>,
    series: Vec<Property>,
    /// Captured blocks in artifact order
    pub blocks: Vec<TextBlock>,
    /// Recovered per-line parse problems
    pub notes: Vec<ParseNote>,
}

impl Analysis {
    /// Creates an empty analysis for `program` over `artifact`.
    pub fn new(program: Program, artifact: &Path) -> Self {
        Self {
            program,
            artifact: artifact.to_path_buf(),
            termination: Termination::Incomplete,
            scalars: Vec::new(),
            series: Vec::new(),
            blocks: Vec::new(),
            notes: Vec::new(),
        }
    }

    /// Records a single-valued property. The first occurrence in artifact
    /// order wins; later occurrences of the same name are ignored.
    pub fn set_scalar(&mut self, name: &str, value: f64, tag: Option<&str>, line: usize) {
        if self.scalars.iter().any(|p| p.name == name) {
            return;
        }
        self.scalars.push(Property {
            name: name.to_string(),
            value,
            tag: tag.map(|t| t.to_string()),
            line,
        });
    }

    /// Appends one occurrence of a repeatable property; every occurrence is
    /// retained in artifact order.
    pub fn push_series(&mut self, name: &str, value: f64, tag: Option<&str>, line: usize) {
        self.series.push(Property {
            name: name.to_string(),
            value,
            tag: tag.map(|t| t.to_string()),
            line,
        });
    }

    /// Parses `raw` and records it as a scalar, or degrades to a
    /// [`ParseNote`] when the number is malformed.
    pub fn try_scalar(&mut self, name: &str, raw: &str, tag: Option<&str>, line: usize) {
        match parse_float(raw) {
            Ok(value) => self.set_scalar(name, value, tag, line),
            Err(_) => self.note(line, &format!("unparseable value `{}` for {}", raw, name)),
        }
    }

    /// Parses `raw` and records it in a series, or degrades to a
    /// [`ParseNote`] when the number is malformed.
    pub fn try_series(&mut self, name: &str, raw: &str, tag: Option<&str>, line: usize) {
        match parse_float(raw) {
            Ok(value) => self.push_series(name, value, tag, line),
            Err(_) => self.note(line, &format!("unparseable value `{}` for {}", raw, name)),
        }
    }

    /// Records a recovered parse problem.
    pub fn note(&mut self, line: usize, message: &str) {
        self.notes.push(ParseNote {
            line,
            message: message.to_string(),
        });
    }

    /// Looks up a scalar property by name.
    pub fn scalar(&self, name: &str) -> Option<&Property> {
        self.scalars.iter().find(|p| p.name == name)
    }

    /// All scalar properties in artifact order.
    pub fn scalars(&self) -> &[Property] {
        &self.scalars
    }

    /// All occurrences of a repeatable property, in artifact order.
    pub fn series(&self, name: &str) -> Vec<&Property> {
        self.series.iter().filter(|p| p.name == name).collect()
    }

    /// All series entries in artifact order.
    pub fn all_series(&self) -> &[Property] {
        &self.series
    }

    /// Captured blocks with the given label, in artifact order.
    pub fn blocks_labeled(&self, label: &str) -> Vec<&TextBlock> {
        self.blocks.iter().filter(|b| b.label == label).collect()
    }
}

/// Analyzer capability, one implementation per supported program.
pub trait OutputAnalyzer: std::fmt::Debug {
    /// The program this analyzer understands.
    fn program(&self) -> Program;

    /// Content-based check: does this artifact look like output of this
    /// program? Must not error; unreadable artifacts simply do not match.
    fn fingerprint(&self, artifact: &Path) -> bool;

    /// Parses the artifact into a structured analysis.
    fn parse(&self, artifact: &Path) -> Result<Analysis, AnalyzeError>;
}

/// A block or line marker in an output format.
#[derive(Debug, Clone)]
pub enum Marker {
    /// Block is implicitly open from the start of the scan (the artifact
    /// start, or the line following a preceding marker the caller split at)
    Empty,
    /// Line containing this literal substring
    Literal(&'static str),
    /// Line matching this anchored pattern; capture group 1, when present
    /// and non-empty, is kept as trailing text on the close line
    Regex(regex::Regex),
}

impl Marker {
    /// Builds a regex marker, panicking on an invalid pattern. Patterns are
    /// compile-time constants of each adapter, so a failure is a programming
    /// error.
    pub fn regex(pattern: &str) -> Marker {
        Marker::Regex(regex::Regex::new(pattern).unwrap_or_else(|e| {
            panic!("invalid marker pattern `{}`: {}", pattern, e);
        }))
    }

    fn matches(&self, line: &str) -> Option<Option<String>> {
        match self {
            Marker::Empty => None,
            Marker::Literal(token) => line.contains(token).then_some(None),
            Marker::Regex(re) => re.captures(line).map(|caps| {
                caps.get(1)
                    .map(|m| m.as_str().trim().to_string())
                    .filter(|s| !s.is_empty())
            }),
        }
    }
}

/// One block-capture rule: a labeled open/close marker pair.
#[derive(Debug, Clone)]
pub struct BlockRule {
    /// Label stamped onto captured [`TextBlock`]s
    pub label: &'static str,
    /// Open marker; [`Marker::Empty`] opens at the start of the scan
    pub open: Marker,
    /// Close marker; may be a regex with a trailing capture group
    pub close: Marker,
}

/// Runs the block-capture state machine over `lines`.
///
/// Scanning starts outside any block unless the rule's open marker is
/// [`Marker::Empty`], in which case capture is open from the first line and
/// the rule fires at most once. Marker lines themselves are not captured.
/// `first_line` is the 1-based artifact line number of `lines[0]`, so
/// captured blocks report artifact positions even when the caller scans a
/// tail slice.
pub fn capture_blocks(
    lines: &[&str],
    rule: &BlockRule,
    program: Program,
    path: &Path,
    first_line: usize,
) -> Result<Vec<TextBlock>, AnalyzeError> {
    let mut blocks = Vec::new();
    let mut capturing = matches!(rule.open, Marker::Empty);
    let mut current: Vec<String> = Vec::new();
    let mut opened_at = first_line;
    let mut start_line = first_line;

    for (offset, line) in lines.iter().enumerate() {
        let line_no = first_line + offset;
        if capturing {
            if let Some(trailing) = rule.close.matches(line) {
                blocks.push(TextBlock {
                    label: rule.label.to_string(),
                    start_line,
                    lines: std::mem::take(&mut current),
                    trailing,
                });
                capturing = false;
            } else {
                current.push((*line).to_string());
            }
        } else if rule.open.matches(line).is_some() {
            capturing = true;
            opened_at = line_no;
            start_line = line_no + 1;
        }
    }

    if capturing {
        return Err(AnalyzeError::IncompleteBlock {
            program,
            path: path.to_path_buf(),
            label: rule.label.to_string(),
            opened_at,
        });
    }
    Ok(blocks)
}

/// Parses a float tolerating `E`/`e` and Fortran `D`/`d` exponent markers.
pub fn parse_float(field: &str) -> Result<f64, ParseFloatError> {
    let trimmed = field.trim();
    if trimmed.contains(['D', 'd']) {
        trimmed.replace('D', "E").replace('d', "e").parse()
    } else {
        trimmed.parse()
    }
}

/// Reads up to `max_lines` lines from the head of a file for
/// fingerprinting. Unreadable files yield `None` (a non-match, not an
/// error).
pub fn read_head(path: &Path, max_lines: usize) -> Option<String> {
    let file = fs::File::open(path).ok()?;
    let reader = BufReader::new(file);
    let mut head = String::new();
    for line in reader.lines().take(max_lines) {
        head.push_str(&line.ok()?);
        head.push('\n');
    }
    Some(head)
}

#[cfg(test)]
mod tests {
    use super::*;

    const TEST_PATH: &str = "test.out";

    #[test]
    fn test_parse_float_exponents() {
        assert_eq!(parse_float(" -76.4 ").unwrap(), -76.4);
        assert_eq!(parse_float("1.5e-3").unwrap(), 0.0015);
        assert_eq!(parse_float("2.5D-02").unwrap(), 0.025);
        assert_eq!(parse_float("-1.0d+01").unwrap(), -10.0);
        assert!(parse_float("--").is_err());
    }

    #[test]
    fn test_scalar_first_occurrence_wins() {
        let mut analysis = Analysis::new(Program::Nwchem, Path::new(TEST_PATH));
        analysis.set_scalar("total_energy", -1.0, None, 10);
        analysis.set_scalar("total_energy", -2.0, None, 20);
        assert_eq!(analysis.scalar("total_energy").unwrap().value, -1.0);
    }

    #[test]
    fn test_series_retains_all_occurrences_in_order() {
        let mut analysis = Analysis::new(Program::Nwchem, Path::new(TEST_PATH));
        analysis.push_series("iteration_energy", -1.0, None, 5);
        analysis.push_series("iteration_energy", -1.5, None, 9);
        let values: Vec<f64> = analysis
            .series("iteration_energy")
            .iter()
            .map(|p| p.value)
            .collect();
        assert_eq!(values, [-1.0, -1.5]);
    }

    #[test]
    fn test_try_scalar_degrades_to_note() {
        let mut analysis = Analysis::new(Program::Nwchem, Path::new(TEST_PATH));
        analysis.try_scalar("total_energy", "*****", None, 7);
        assert!(analysis.scalar("total_energy").is_none());
        assert_eq!(analysis.notes.len(), 1);
        assert_eq!(analysis.notes[0].line, 7);
    }

    #[test]
    fn test_capture_literal_block() {
        let lines = vec!["noise", "OPEN", "a", "b", "CLOSE", "tail"];
        let rule = BlockRule {
            label: "demo",
            open: Marker::Literal("OPEN"),
            close: Marker::Literal("CLOSE"),
        };
        let blocks =
            capture_blocks(&lines, &rule, Program::QmMm, Path::new(TEST_PATH), 1).unwrap();
        assert_eq!(blocks.len(), 1);
        assert_eq!(blocks[0].lines, ["a", "b"]);
        assert_eq!(blocks[0].start_line, 3);
        assert!(blocks[0].trailing.is_none());
    }

    #[test]
    fn test_capture_regex_close_keeps_trailing() {
        let lines = vec!["HESSIAN", "0.1 0.2", "ENDHESS 12 atoms"];
        let rule = BlockRule {
            label: "hessian",
            open: Marker::Literal("HESSIAN"),
            close: Marker::regex(r"^ENDHESS(.*)"),
        };
        let blocks =
            capture_blocks(&lines, &rule, Program::QmMm, Path::new(TEST_PATH), 1).unwrap();
        assert_eq!(blocks[0].trailing.as_deref(), Some("12 atoms"));
    }

    #[test]
    fn test_capture_empty_open_is_implicit_from_start() {
        let lines = vec!["first", "second", "GEOMETRY", "rest"];
        let rule = BlockRule {
            label: "preamble",
            open: Marker::Empty,
            close: Marker::regex(r"^GEOMETRY(.*)"),
        };
        let blocks =
            capture_blocks(&lines, &rule, Program::Spartan, Path::new(TEST_PATH), 1).unwrap();
        assert_eq!(blocks.len(), 1);
        assert_eq!(blocks[0].lines, ["first", "second"]);
        assert_eq!(blocks[0].start_line, 1);
    }

    #[test]
    fn test_unterminated_block_is_an_error() {
        let lines = vec!["OPEN", "a", "b"];
        let rule = BlockRule {
            label: "demo",
            open: Marker::Literal("OPEN"),
            close: Marker::Literal("CLOSE"),
        };
        let err = capture_blocks(&lines, &rule, Program::QmMm, Path::new(TEST_PATH), 1)
            .unwrap_err();
        match err {
            AnalyzeError::IncompleteBlock {
                label, opened_at, ..
            } => {
                assert_eq!(label, "demo");
                assert_eq!(opened_at, 1);
            }
            other => panic!("expected IncompleteBlock, got {:?}", other),
        }
    }
}
