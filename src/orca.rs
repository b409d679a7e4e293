//! ORCA adapter: input dialect and output analyzer.
//!
//! ORCA inputs open with the `!` simple-input line, continue with `%name
//! ... end` option blocks and close with the `* xyz <charge> <mult> ... *`
//! coordinate block. The analyzer fingerprints the boxed ORCA banner and
//! extracts the repeated `FINAL SINGLE POINT ENERGY` values, the SCF total
//! energy and the Cartesian coordinate blocks.

use crate::analyzer::{
    capture_blocks, read_head, Analysis, AnalyzeError, BlockRule, Marker, OutputAnalyzer,
    Termination,
};
use crate::directive::{Directive, Keyword};
use crate::ordering::{DirectiveOrderer, OrcaOrderer};
use crate::program::Program;
use crate::writer::{InputDialect, WriteError};
use lazy_static::lazy_static;
use log::debug;
use regex::Regex;
use std::fs;
use std::path::Path;

const FLOAT: &str = r"[-+]?(?:\d+\.?\d*|\.\d+)(?:[eE][-+]?\d+)?";

/// Boxed banner near the top of every ORCA output.
const BANNER: &str = "* O   R   C   A *";
/// Literal footer of a successful run.
const NORMAL_FOOTER: &str = "****ORCA TERMINATED NORMALLY****";
/// Literal footer of a failed run.
const ERROR_FOOTER: &str = "ORCA finished by error termination";

lazy_static! {
    // "FINAL SINGLE POINT ENERGY       -76.323456789012"
    static ref FINAL_ENERGY_RE: Regex =
        Regex::new(&format!(r"FINAL SINGLE POINT ENERGY\s+({})", FLOAT)).unwrap();

    // "Total Energy       :          -76.32345678 Eh"
    static ref TOTAL_ENERGY_RE: Regex =
        Regex::new(&format!(r"Total Energy\s+:\s+({})", FLOAT)).unwrap();
}

/// ORCA input formatting rules.
#[derive(Debug, Default)]
pub struct OrcaDialect {
    orderer: OrcaOrderer,
}

impl InputDialect for OrcaDialect {
    fn program(&self) -> Program {
        Program::Orca
    }

    fn orderer(&self) -> &dyn DirectiveOrderer {
        &self.orderer
    }

    fn indent_unit(&self) -> &'static str {
        "  "
    }

    fn renders_inline(&self, _directive: &Directive) -> bool {
        false
    }

    fn keywords_in_marker(&self, directive: &Directive) -> bool {
        directive.name().eq_ignore_ascii_case("xyz")
    }

    fn open_marker(&self, directive: &Directive, keywords: &[&Keyword]) -> String {
        if directive.name().eq_ignore_ascii_case("xyz") {
            let values: Vec<&str> = keywords
                .iter()
                .flat_map(|k| k.values().iter().map(|v| v.as_str()))
                .collect();
            return format!("* xyz {}", values.join(" "));
        }
        format!("%{}", directive.name().to_ascii_lowercase())
    }

    fn close_marker(&self, directive: &Directive) -> Option<String> {
        if directive.name().eq_ignore_ascii_case("xyz") {
            Some("*".to_string())
        } else {
            Some("end".to_string())
        }
    }

    fn keyword_line(&self, keyword: &Keyword) -> String {
        if keyword.name().eq_ignore_ascii_case("keywords") {
            return format!("! {}", keyword.values().join(" "));
        }
        format!(
            "{} {}",
            keyword.name().to_ascii_lowercase(),
            keyword.values().join(" ")
        )
    }

    fn validate(&self, root: &Directive) -> Result<(), WriteError> {
        if root.keyword("keywords").is_none() {
            return Err(WriteError::MissingKeyword {
                program: Program::Orca,
                directive: "input".to_string(),
                keyword: "keywords".to_string(),
            });
        }
        let xyz = root.child("xyz").ok_or_else(|| WriteError::MissingDirective {
            program: Program::Orca,
            name: "xyz".to_string(),
        })?;
        for required in ["charge", "mult"] {
            if xyz.keyword(required).is_none() {
                return Err(WriteError::MissingKeyword {
                    program: Program::Orca,
                    directive: "xyz".to_string(),
                    keyword: required.to_string(),
                });
            }
        }
        Ok(())
    }
}

/// ORCA output analyzer.
#[derive(Debug, Default)]
pub struct OrcaAnalyzer;

impl OutputAnalyzer for OrcaAnalyzer {
    fn program(&self) -> Program {
        Program::Orca
    }

    fn fingerprint(&self, artifact: &Path) -> bool {
        if !artifact.is_file() {
            return false;
        }
        match read_head(artifact, 120) {
            Some(head) => head.contains(BANNER),
            None => false,
        }
    }

    fn parse(&self, artifact: &Path) -> Result<Analysis, AnalyzeError> {
        let content = fs::read_to_string(artifact)?;
        let lines: Vec<&str> = content.lines().collect();
        let mut analysis = Analysis::new(Program::Orca, artifact);

        for (idx, line) in lines.iter().enumerate() {
            let line_no = idx + 1;
            if let Some(caps) = FINAL_ENERGY_RE.captures(line) {
                analysis.try_series("single_point_energy", &caps[1], None, line_no);
            } else if let Some(caps) = TOTAL_ENERGY_RE.captures(line) {
                analysis.try_scalar("total_energy", &caps[1], None, line_no);
            }
        }

        // Coordinate tables end at the first blank line after the header.
        let geometry_rule = BlockRule {
            label: "geometry",
            open: Marker::Literal("CARTESIAN COORDINATES (ANGSTROEM)"),
            close: Marker::regex(r"^(\s*)$"),
        };
        analysis.blocks.extend(capture_blocks(
            &lines,
            &geometry_rule,
            Program::Orca,
            artifact,
            1,
        )?);

        analysis.termination = if content.contains(NORMAL_FOOTER) {
            Termination::Normal
        } else if content.contains(ERROR_FOOTER) {
            Termination::Abnormal
        } else {
            Termination::Incomplete
        };
        debug!(
            "orca: {} single-point energies from {}",
            analysis.series("single_point_energy").len(),
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

    const SAMPLE: &str = "\
                                 *****************
                                 * O   R   C   A *
                                 *****************

---------------------------------
CARTESIAN COORDINATES (ANGSTROEM)
---------------------------------
  O      0.000000    0.000000    0.221431
  H      0.000000    0.763236   -0.442861
  H      0.000000   -0.763236   -0.442861

Total Energy       :          -76.32345678 Eh

FINAL SINGLE POINT ENERGY       -76.323456780000
FINAL SINGLE POINT ENERGY       -76.323501230000

                             ****ORCA TERMINATED NORMALLY****
";

    fn write_temp(name: &str, content: &str) -> PathBuf {
        let path = env::temp_dir().join(name);
        fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn test_parse_sample_output() {
        let path = write_temp("qcbridge_orca_parse.out", SAMPLE);
        assert!(OrcaAnalyzer.fingerprint(&path));
        let analysis = OrcaAnalyzer.parse(&path).unwrap();
        fs::remove_file(&path).unwrap();

        assert_eq!(analysis.termination, Termination::Normal);
        // Every occurrence of the repeatable energy is kept, in file order.
        let energies = analysis.series("single_point_energy");
        assert_eq!(energies.len(), 2);
        assert!((energies[1].value - -76.32350123).abs() < 1e-9);
        assert!(analysis.scalar("total_energy").is_some());
        assert_eq!(analysis.blocks_labeled("geometry").len(), 1);
    }

    #[test]
    fn test_error_footer_is_abnormal() {
        let bad = SAMPLE.replace(
            "****ORCA TERMINATED NORMALLY****",
            "ORCA finished by error termination",
        );
        let path = write_temp("qcbridge_orca_err.out", &bad);
        let analysis = OrcaAnalyzer.parse(&path).unwrap();
        fs::remove_file(&path).unwrap();
        assert_eq!(analysis.termination, Termination::Abnormal);
    }

    #[test]
    fn test_render_bang_line_first_xyz_last() {
        let mut root = Directive::new("input");
        root.add_keyword(Keyword::with_values("keywords", &["B3LYP", "def2-SVP"]));

        let mut xyz = Directive::new("xyz");
        xyz.add_keyword(Keyword::new("mult", "1"));
        xyz.add_keyword(Keyword::new("charge", "0"));
        xyz.set_body("O 0.0 0.0 0.2214");

        let mut scf = Directive::new("scf");
        scf.add_keyword(Keyword::new("maxiter", "200"));

        root.add_child(xyz);
        root.add_child(scf);

        let text = render(&root, &OrcaDialect::default()).unwrap();
        let expected = "\
! B3LYP def2-SVP
%scf
  maxiter 200
end
* xyz 0 1
  O 0.0 0.0 0.2214
*
";
        assert_eq!(text, expected);
    }

    #[test]
    fn test_missing_charge_is_format_error() {
        let mut root = Directive::new("input");
        root.add_keyword(Keyword::with_values("keywords", &["B3LYP"]));
        let mut xyz = Directive::new("xyz");
        xyz.add_keyword(Keyword::new("mult", "1"));
        root.add_child(xyz);
        let err = render(&root, &OrcaDialect::default()).unwrap_err();
        assert!(matches!(err, WriteError::MissingKeyword { .. }));
    }
}
