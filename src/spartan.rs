//! Spartan adapter: input dialect and directory-bundle output analyzer.
//!
//! Spartan jobs live in a directory bundle with a fixed set of well-known
//! file names: `input`, `output`, `status`, `archive` and `cell`. The
//! status file signals normal completion with the literal `COMPLETED`
//! token; the archive file is organized into tag-anchored sections
//! (`GEOMETRY`, `ENERGY`, `BASIS`, `MODEL`) plus an explicit `HESSIAN` ...
//! `ENDHESS` block whose close line may carry trailing data; the cell file
//! is delimited by the literal `BEGIN_CELL_DEFINITIONS` /
//! `END_CELL_DEFINITIONS` tokens. A bare archive file is accepted as an
//! artifact too, so file and directory inputs are handled uniformly.

use crate::analyzer::{
    capture_blocks, parse_float, read_head, Analysis, AnalyzeError, BlockRule, Marker,
    OutputAnalyzer, Termination, TextBlock,
};
use crate::directive::{Directive, Keyword};
use crate::ordering::{DirectiveOrderer, SpartanOrderer};
use crate::program::Program;
use crate::writer::{InputDialect, WriteError};
use lazy_static::lazy_static;
use log::debug;
use regex::Regex;
use std::fs;
use std::path::Path;

/// Well-known file names inside a Spartan bundle.
pub const INPUT_FILE: &str = "input";
/// Main text output of the run.
pub const OUTPUT_FILE: &str = "output";
/// Single-token completion marker file.
pub const STATUS_FILE: &str = "status";
/// Tag-sectioned results archive.
pub const ARCHIVE_FILE: &str = "archive";
/// Periodic cell definition file.
pub const CELL_FILE: &str = "cell";

/// Literal token a status file contains after a normal run.
pub const STATUS_COMPLETED: &str = "COMPLETED";
/// Cell block open token.
pub const CELL_OPEN: &str = "BEGIN_CELL_DEFINITIONS";
/// Cell block close token.
pub const CELL_CLOSE: &str = "END_CELL_DEFINITIONS";

const FLOAT: &str = r"[-+]?(?:\d+\.?\d*|\.\d+)(?:[eEdD][-+]?\d+)?";

lazy_static! {
    static ref GEOMETRY_TAG: Regex = Regex::new(r"^GEOMETRY\s*$").unwrap();
    static ref ENERGY_TAG: Regex = Regex::new(&format!(r"^ENERGY +({})", FLOAT)).unwrap();
    static ref BASIS_TAG: Regex = Regex::new(r"^BASIS +(\S+)").unwrap();
    static ref MODEL_TAG: Regex = Regex::new(r"^MODEL +(\S+)").unwrap();
    static ref SECTION_TAG: Regex =
        Regex::new(r"^(GEOMETRY|ENERGY|BASIS|MODEL|HESSIAN|ENDHESS)").unwrap();
}

/// Spartan input formatting rules.
///
/// The `keywords` directive renders as the bare keyword line that opens a
/// Spartan input; every other directive becomes a `BEGIN_<NAME>` /
/// `END_<NAME>` section, with the cell block using the literal cell
/// tokens. Spartan sections are not indented.
#[derive(Debug, Default)]
pub struct SpartanDialect {
    orderer: SpartanOrderer,
}

impl InputDialect for SpartanDialect {
    fn program(&self) -> Program {
        Program::Spartan
    }

    fn orderer(&self) -> &dyn DirectiveOrderer {
        &self.orderer
    }

    fn indent_unit(&self) -> &'static str {
        ""
    }

    fn renders_inline(&self, directive: &Directive) -> bool {
        directive.name().eq_ignore_ascii_case("keywords")
    }

    fn open_marker(&self, directive: &Directive, keywords: &[&Keyword]) -> String {
        if self.renders_inline(directive) {
            return keywords
                .iter()
                .flat_map(|k| k.values().iter().map(|v| v.as_str()))
                .collect::<Vec<&str>>()
                .join(" ");
        }
        format!("BEGIN_{}", directive.name().to_ascii_uppercase())
    }

    fn close_marker(&self, directive: &Directive) -> Option<String> {
        if self.renders_inline(directive) {
            None
        } else {
            Some(format!("END_{}", directive.name().to_ascii_uppercase()))
        }
    }

    fn keyword_line(&self, keyword: &Keyword) -> String {
        if keyword.values().is_empty() {
            keyword.name().to_ascii_uppercase()
        } else {
            format!(
                "{}={}",
                keyword.name().to_ascii_uppercase(),
                keyword.values().join(",")
            )
        }
    }

    fn validate(&self, root: &Directive) -> Result<(), WriteError> {
        if root.child("molecule").is_none() {
            return Err(WriteError::MissingDirective {
                program: Program::Spartan,
                name: "molecule".to_string(),
            });
        }
        Ok(())
    }
}

/// Spartan output analyzer over bundles and bare archive files.
#[derive(Debug, Default)]
pub struct SpartanAnalyzer;

impl SpartanAnalyzer {
    fn parse_archive(
        &self,
        archive: &Path,
        analysis: &mut Analysis,
    ) -> Result<(), AnalyzeError> {
        let content = fs::read_to_string(archive)?;
        let lines: Vec<&str> = content.lines().collect();

        // Job preamble: implicitly open from the first line, closed by the
        // GEOMETRY tag.
        let preamble_rule = BlockRule {
            label: "preamble",
            open: Marker::Empty,
            close: Marker::regex(r"^GEOMETRY(.*)"),
        };
        analysis.blocks.extend(capture_blocks(
            &lines,
            &preamble_rule,
            Program::Spartan,
            archive,
            1,
        )?);

        // Model and basis tags label the archived energy.
        let mut model: Option<String> = None;
        let mut basis: Option<String> = None;
        for line in &lines {
            if let Some(caps) = MODEL_TAG.captures(line) {
                model.get_or_insert_with(|| caps[1].to_string());
            } else if let Some(caps) = BASIS_TAG.captures(line) {
                basis.get_or_insert_with(|| caps[1].to_string());
            }
        }
        let tag = match (&model, &basis) {
            (Some(m), Some(b)) => Some(format!("{}/{}", m, b)),
            (Some(m), None) => Some(m.clone()),
            (None, Some(b)) => Some(b.clone()),
            (None, None) => None,
        };

        let mut in_geometry = false;
        let mut geometry: Vec<String> = Vec::new();
        let mut geometry_start = 0;
        for (idx, line) in lines.iter().enumerate() {
            let line_no = idx + 1;
            if GEOMETRY_TAG.is_match(line) {
                in_geometry = true;
                geometry_start = line_no + 1;
                continue;
            }
            if in_geometry && SECTION_TAG.is_match(line) {
                in_geometry = false;
                analysis.blocks.push(TextBlock {
                    label: "geometry".to_string(),
                    start_line: geometry_start,
                    lines: std::mem::take(&mut geometry),
                    trailing: None,
                });
            }
            if in_geometry {
                geometry.push((*line).to_string());
                continue;
            }
            if let Some(caps) = ENERGY_TAG.captures(line) {
                // The archived energy is the one mandatory numeric field.
                let value = parse_float(&caps[1]).map_err(|_| AnalyzeError::NumberFormat {
                    program: Program::Spartan,
                    path: archive.to_path_buf(),
                    line: line_no,
                    field: "ENERGY".to_string(),
                })?;
                analysis.set_scalar("total_energy", value, tag.as_deref(), line_no);
            }
        }
        // Geometry is tag-delimited; an archive ending inside it closes at
        // end of file.
        if in_geometry {
            analysis.blocks.push(TextBlock {
                label: "geometry".to_string(),
                start_line: geometry_start,
                lines: geometry,
                trailing: None,
            });
        }

        let hessian_rule = BlockRule {
            label: "hessian",
            open: Marker::Literal("HESSIAN"),
            close: Marker::regex(r"^ENDHESS(.*)"),
        };
        analysis.blocks.extend(capture_blocks(
            &lines,
            &hessian_rule,
            Program::Spartan,
            archive,
            1,
        )?);
        Ok(())
    }

    fn parse_cell(&self, cell: &Path, analysis: &mut Analysis) -> Result<(), AnalyzeError> {
        let content = fs::read_to_string(cell)?;
        let lines: Vec<&str> = content.lines().collect();
        let rule = BlockRule {
            label: "cell",
            open: Marker::Literal(CELL_OPEN),
            close: Marker::Literal(CELL_CLOSE),
        };
        analysis
            .blocks
            .extend(capture_blocks(&lines, &rule, Program::Spartan, cell, 1)?);
        Ok(())
    }
}

fn archive_fingerprint(head: &str) -> bool {
    head.lines().any(|l| GEOMETRY_TAG.is_match(l)) && head.lines().any(|l| ENERGY_TAG.is_match(l))
}

impl OutputAnalyzer for SpartanAnalyzer {
    fn program(&self) -> Program {
        Program::Spartan
    }

    fn fingerprint(&self, artifact: &Path) -> bool {
        if artifact.is_dir() {
            return artifact.join(STATUS_FILE).is_file()
                && (artifact.join(ARCHIVE_FILE).is_file() || artifact.join(INPUT_FILE).is_file());
        }
        match read_head(artifact, 200) {
            Some(head) => archive_fingerprint(&head),
            None => false,
        }
    }

    fn parse(&self, artifact: &Path) -> Result<Analysis, AnalyzeError> {
        let mut analysis = Analysis::new(Program::Spartan, artifact);

        if artifact.is_dir() {
            let status_path = artifact.join(STATUS_FILE);
            analysis.termination = match fs::read_to_string(&status_path) {
                Ok(status) if status.contains(STATUS_COMPLETED) => Termination::Normal,
                Ok(status) if !status.trim().is_empty() => Termination::Abnormal,
                _ => Termination::Incomplete,
            };

            let archive_path = artifact.join(ARCHIVE_FILE);
            if archive_path.is_file() {
                self.parse_archive(&archive_path, &mut analysis)?;
            }
            let cell_path = artifact.join(CELL_FILE);
            if cell_path.is_file() {
                self.parse_cell(&cell_path, &mut analysis)?;
            }
        } else {
            // Bare archive file: results without a status signal.
            self.parse_archive(artifact, &mut analysis)?;
            analysis.note(0, "no status file; termination unknown");
        }

        debug!(
            "spartan: termination {:?} for {}",
            analysis.termination,
            artifact.display()
        );
        Ok(analysis)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::writer::render;
    use std::env;
    use std::path::PathBuf;

    const ARCHIVE: &str = "\
water b3lyp single point
M0001
GEOMETRY
O 0.00000000 0.00000000 0.22143053
H 0.00000000 0.76323596 -0.44286106
H 0.00000000 -0.76323596 -0.44286106
ENERGY   -76.419699 HARTREE
BASIS 6-31G*
MODEL B3LYP
HESSIAN
0.612 -0.004 0.000
-0.004 0.588 0.000
ENDHESS 3 ATOMS
";

    fn make_bundle(name: &str, status: &str) -> PathBuf {
        let dir = env::temp_dir().join(name);
        let _ = fs::remove_dir_all(&dir);
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join(STATUS_FILE), status).unwrap();
        fs::write(dir.join(ARCHIVE_FILE), ARCHIVE).unwrap();
        fs::write(dir.join(INPUT_FILE), "B3LYP 6-31G*\n").unwrap();
        fs::write(
            dir.join(CELL_FILE),
            "BEGIN_CELL_DEFINITIONS\n10.0 10.0 10.0\nEND_CELL_DEFINITIONS\n",
        )
        .unwrap();
        dir
    }

    #[test]
    fn test_bundle_completed_status_is_normal() {
        let dir = make_bundle("qcbridge_spartan_ok", "COMPLETED\n");
        assert!(SpartanAnalyzer.fingerprint(&dir));
        let analysis = SpartanAnalyzer.parse(&dir).unwrap();
        fs::remove_dir_all(&dir).unwrap();

        assert_eq!(analysis.termination, Termination::Normal);
        let energy = analysis.scalar("total_energy").unwrap();
        assert!((energy.value - -76.419699).abs() < 1e-9);
        assert_eq!(energy.tag.as_deref(), Some("B3LYP/6-31G*"));
        assert_eq!(analysis.blocks_labeled("geometry").len(), 1);
        assert_eq!(analysis.blocks_labeled("cell").len(), 1);
        assert_eq!(analysis.blocks_labeled("preamble").len(), 1);
    }

    #[test]
    fn test_bundle_without_token_is_not_normal() {
        let dir = make_bundle("qcbridge_spartan_bad", "DIED IN SCF\n");
        let analysis = SpartanAnalyzer.parse(&dir).unwrap();
        fs::remove_dir_all(&dir).unwrap();
        assert_ne!(analysis.termination, Termination::Normal);
    }

    #[test]
    fn test_hessian_close_keeps_trailing_text() {
        let dir = make_bundle("qcbridge_spartan_hess", "COMPLETED\n");
        let analysis = SpartanAnalyzer.parse(&dir).unwrap();
        fs::remove_dir_all(&dir).unwrap();
        let hessian = analysis.blocks_labeled("hessian");
        assert_eq!(hessian.len(), 1);
        assert_eq!(hessian[0].trailing.as_deref(), Some("3 ATOMS"));
        assert_eq!(hessian[0].lines.len(), 2);
    }

    #[test]
    fn test_unclosed_hessian_is_incomplete_block() {
        let cut = ARCHIVE.find("ENDHESS").unwrap();
        let dir = env::temp_dir().join("qcbridge_spartan_trunc");
        let _ = fs::remove_dir_all(&dir);
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join(STATUS_FILE), "COMPLETED\n").unwrap();
        fs::write(dir.join(ARCHIVE_FILE), &ARCHIVE[..cut]).unwrap();
        let err = SpartanAnalyzer.parse(&dir).unwrap_err();
        fs::remove_dir_all(&dir).unwrap();
        assert!(matches!(err, AnalyzeError::IncompleteBlock { .. }));
    }

    #[test]
    fn test_bare_archive_file_is_accepted() {
        let path = env::temp_dir().join("qcbridge_spartan_archive");
        fs::write(&path, ARCHIVE).unwrap();
        assert!(SpartanAnalyzer.fingerprint(&path));
        let analysis = SpartanAnalyzer.parse(&path).unwrap();
        fs::remove_file(&path).unwrap();
        assert_eq!(analysis.termination, Termination::Incomplete);
        assert!(analysis.scalar("total_energy").is_some());
    }

    #[test]
    fn test_render_keywords_line_first_cell_markers() {
        let mut root = Directive::new("job");
        let mut molecule = Directive::new("molecule");
        molecule.set_body("O 0.0 0.0 0.2214");
        let mut cell = Directive::new("cell_definitions");
        cell.set_body("10.0 10.0 10.0");
        let mut keywords = Directive::new("keywords");
        keywords.add_keyword(Keyword::with_values("line", &["B3LYP", "6-31G*", "OPT"]));
        root.add_child(molecule);
        root.add_child(cell);
        root.add_child(keywords);

        let text = render(&root, &SpartanDialect::default()).unwrap();
        let expected = "\
B3LYP 6-31G* OPT
BEGIN_CELL_DEFINITIONS
10.0 10.0 10.0
END_CELL_DEFINITIONS
BEGIN_MOLECULE
O 0.0 0.0 0.2214
END_MOLECULE
";
        assert_eq!(text, expected);
    }
}
