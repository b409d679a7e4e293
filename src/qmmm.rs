//! Generic QM/MM coupling driver adapter.
//!
//! The driver's input grammar uses bare uppercase section markers closed by
//! `END<NAME>`; the Hessian/topology block is the exception, delimited by
//! `HESSIAN` and a close line that may carry trailing data after the
//! `ENDHESS` token. Ordering puts `topology` first and `hessian` last.
//!
//! Driver logs report component energies as `ENERGY <COMPONENT> <value>`
//! lines. The optimized geometry is not opened by its own marker: it
//! begins on the line after `GEOMETRY OPTIMIZED` and runs to a close line
//! matched by `^ENDGEOM(.*)`.

use crate::analyzer::{
    capture_blocks, read_head, Analysis, AnalyzeError, BlockRule, Marker, OutputAnalyzer,
    Termination,
};
use crate::directive::{Directive, Keyword};
use crate::ordering::{DirectiveOrderer, QmmmOrderer};
use crate::program::Program;
use crate::writer::{InputDialect, WriteError};
use lazy_static::lazy_static;
use log::debug;
use regex::Regex;
use std::fs;
use std::path::Path;

const FLOAT: &str = r"[-+]?(?:\d+\.?\d*|\.\d+)(?:[eEdD][-+]?\d+)?";

/// Banner on the first line of every driver log.
const BANNER: &str = "QM/MM COUPLING DRIVER";
/// Success footer.
const NORMAL_FOOTER: &str = "DRIVER RUN FINISHED";
/// Failure footer.
const ERROR_FOOTER: &str = "DRIVER RUN ABORTED";
/// Marker line preceding the implicitly opened geometry block.
const GEOMETRY_MARKER: &str = "GEOMETRY OPTIMIZED";

lazy_static! {
    // "ENERGY QM      -76.102345"
    static ref ENERGY_RE: Regex =
        Regex::new(&format!(r"^ENERGY\s+([A-Z]+)\s+({})", FLOAT)).unwrap();
}

/// QM/MM driver input formatting rules.
#[derive(Debug, Default)]
pub struct QmmmDialect {
    orderer: QmmmOrderer,
}

impl InputDialect for QmmmDialect {
    fn program(&self) -> Program {
        Program::QmMm
    }

    fn orderer(&self) -> &dyn DirectiveOrderer {
        &self.orderer
    }

    fn indent_unit(&self) -> &'static str {
        "    "
    }

    fn renders_inline(&self, _directive: &Directive) -> bool {
        false
    }

    fn open_marker(&self, directive: &Directive, _keywords: &[&Keyword]) -> String {
        if directive.name().eq_ignore_ascii_case("hessian") {
            return "HESSIAN".to_string();
        }
        directive.name().to_ascii_uppercase()
    }

    fn close_marker(&self, directive: &Directive) -> Option<String> {
        if directive.name().eq_ignore_ascii_case("hessian") {
            return Some("ENDHESS".to_string());
        }
        Some(format!("END{}", directive.name().to_ascii_uppercase()))
    }

    fn keyword_line(&self, keyword: &Keyword) -> String {
        format!(
            "{} {}",
            keyword.name().to_ascii_uppercase(),
            keyword.values().join(" ")
        )
    }

    fn validate(&self, root: &Directive) -> Result<(), WriteError> {
        if root.child("topology").is_none() {
            return Err(WriteError::MissingDirective {
                program: Program::QmMm,
                name: "topology".to_string(),
            });
        }
        Ok(())
    }
}

/// QM/MM driver log analyzer.
#[derive(Debug, Default)]
pub struct QmmmAnalyzer;

impl OutputAnalyzer for QmmmAnalyzer {
    fn program(&self) -> Program {
        Program::QmMm
    }

    fn fingerprint(&self, artifact: &Path) -> bool {
        if !artifact.is_file() {
            return false;
        }
        match read_head(artifact, 40) {
            Some(head) => head.contains(BANNER),
            None => false,
        }
    }

    fn parse(&self, artifact: &Path) -> Result<Analysis, AnalyzeError> {
        let content = fs::read_to_string(artifact)?;
        let lines: Vec<&str> = content.lines().collect();
        let mut analysis = Analysis::new(Program::QmMm, artifact);

        for (idx, line) in lines.iter().enumerate() {
            let line_no = idx + 1;
            if let Some(caps) = ENERGY_RE.captures(line) {
                let component = caps[1].to_ascii_lowercase();
                let name = format!("energy_{}", component);
                analysis.try_scalar(&name, &caps[2], Some(&component), line_no);
            }
        }

        // The geometry block has no open marker of its own: it starts on
        // the line after GEOMETRY OPTIMIZED and closes at ^ENDGEOM(.*).
        if let Some(marker_idx) = lines.iter().position(|l| l.contains(GEOMETRY_MARKER)) {
            let tail = &lines[marker_idx + 1..];
            let rule = BlockRule {
                label: "geometry",
                open: Marker::Empty,
                close: Marker::regex(r"^ENDGEOM(.*)"),
            };
            analysis.blocks.extend(capture_blocks(
                tail,
                &rule,
                Program::QmMm,
                artifact,
                marker_idx + 2,
            )?);
        }

        let hessian_rule = BlockRule {
            label: "hessian",
            open: Marker::Literal("HESSIAN"),
            close: Marker::regex(r"^ENDHESS(.*)"),
        };
        analysis.blocks.extend(capture_blocks(
            &lines,
            &hessian_rule,
            Program::QmMm,
            artifact,
            1,
        )?);

        analysis.termination = if content.contains(ERROR_FOOTER) {
            Termination::Abnormal
        } else if content.contains(NORMAL_FOOTER) {
            Termination::Normal
        } else {
            Termination::Incomplete
        };
        debug!(
            "qmmm: {} component energies from {}",
            analysis.scalars().len(),
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
QM/MM COUPLING DRIVER v2.3
region partitioning: 12 QM atoms, 4180 MM atoms

ENERGY QM      -76.102345
ENERGY MM      -0.489120
ENERGY TOTAL   -76.591465

GEOMETRY OPTIMIZED
O 0.00000000 0.00000000 0.22143053
H 0.00000000 0.76323596 -0.44286106
ENDGEOM 2 shells

HESSIAN
0.612 -0.004
-0.004 0.588
ENDHESS packed

DRIVER RUN FINISHED
";

    fn write_temp(name: &str, content: &str) -> PathBuf {
        let path = env::temp_dir().join(name);
        fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn test_parse_sample_output() {
        let path = write_temp("qcbridge_qmmm_parse.log", SAMPLE);
        assert!(QmmmAnalyzer.fingerprint(&path));
        let analysis = QmmmAnalyzer.parse(&path).unwrap();
        fs::remove_file(&path).unwrap();

        assert_eq!(analysis.termination, Termination::Normal);
        assert!((analysis.scalar("energy_total").unwrap().value - -76.591465).abs() < 1e-9);
        assert_eq!(
            analysis.scalar("energy_qm").unwrap().tag.as_deref(),
            Some("qm")
        );

        let geometry = analysis.blocks_labeled("geometry");
        assert_eq!(geometry.len(), 1);
        assert_eq!(geometry[0].lines.len(), 2);
        assert_eq!(geometry[0].trailing.as_deref(), Some("2 shells"));
        assert_eq!(geometry[0].start_line, 9);

        let hessian = analysis.blocks_labeled("hessian");
        assert_eq!(hessian[0].trailing.as_deref(), Some("packed"));
    }

    #[test]
    fn test_unclosed_geometry_is_incomplete_block() {
        let cut = SAMPLE.find("ENDGEOM").unwrap();
        let path = write_temp("qcbridge_qmmm_trunc.log", &SAMPLE[..cut]);
        let err = QmmmAnalyzer.parse(&path).unwrap_err();
        fs::remove_file(&path).unwrap();
        assert!(matches!(
            err,
            AnalyzeError::IncompleteBlock { ref label, .. } if label == "geometry"
        ));
    }

    #[test]
    fn test_render_topology_first_hessian_last() {
        let mut root = Directive::new("job");
        let mut hessian = Directive::new("hessian");
        hessian.set_body("0.612 -0.004");
        let mut coupling = Directive::new("coupling");
        coupling.add_keyword(Keyword::new("scheme", "electrostatic"));
        let mut topology = Directive::new("topology");
        topology.set_body("O 1 qm");
        root.add_child(hessian);
        root.add_child(coupling);
        root.add_child(topology);

        let text = render(&root, &QmmmDialect::default()).unwrap();
        let expected = "\
TOPOLOGY
    O 1 qm
ENDTOPOLOGY
COUPLING
    SCHEME electrostatic
ENDCOUPLING
HESSIAN
    0.612 -0.004
ENDHESS
";
        assert_eq!(text, expected);
    }

    #[test]
    fn test_missing_topology_is_format_error() {
        let root = Directive::new("job");
        let err = render(&root, &QmmmDialect::default()).unwrap_err();
        assert!(matches!(err, WriteError::MissingDirective { .. }));
    }
}
