//! NWChem adapter: input dialect and output analyzer.
//!
//! # Input dialect
//!
//! NWChem inputs are lowercase `name ... end` blocks plus a family of
//! one-line directives (`task`, `start`, `title`, `charge` and the startup
//! directives) that carry their keyword values on the marker line itself.
//! Section ordering follows [`NwchemOrderer`](crate::ordering::NwchemOrderer):
//! `task` first, startup directives after the normal sections, `start`
//! pinned last.
//!
//! # Output analyzer
//!
//! Output files are fingerprinted on the package banner. The analyzer
//! extracts per-method total energies, the `@`-prefixed optimization rows
//! as a repeatable series, and `Output coordinates in angstroms` geometry
//! blocks; normal completion is recognized by the timing footer.

use crate::analyzer::{
    capture_blocks, read_head, Analysis, AnalyzeError, BlockRule, Marker, OutputAnalyzer,
    Termination,
};
use crate::directive::{Directive, Keyword};
use crate::ordering::{DirectiveOrderer, NwchemOrderer};
use crate::program::Program;
use crate::writer::{InputDialect, WriteError};
use lazy_static::lazy_static;
use log::debug;
use regex::Regex;
use std::fs;
use std::path::Path;

const FLOAT: &str = r"[-+]?(?:\d+\.?\d*|\.\d+)(?:[eEdD][-+]?\d+)?";

/// Banner printed at the top of every NWChem output.
const BANNER: &str = "Northwest Computational Chemistry Package";
/// Timing footer printed only on normal completion.
const NORMAL_FOOTER: &str = "Total times  cpu:";
/// Manual pointer printed inside NWChem error blocks.
const ERROR_FOOTER: &str = "For more information see the NWChem manual";

lazy_static! {
    // " Total DFT energy =     -76.419737" (also SCF, CCSD, MP2, ...)
    static ref ENERGY_RE: Regex =
        Regex::new(&format!(r"^\s*Total (\w+) energy\s*=\s*({})", FLOAT)).unwrap();

    // Driver rows: "@    3      -76.41969870  -1.2D-05 ..."
    static ref STEP_RE: Regex = Regex::new(&format!(r"^@\s+\d+\s+({})", FLOAT)).unwrap();
}

/// Directives that render as a single line with their keyword values.
const INLINE_DIRECTIVES: &[&str] = &[
    "task",
    "start",
    "restart",
    "title",
    "charge",
    "echo",
    "scratch_dir",
    "permanent_dir",
    "memory",
];

/// NWChem input formatting rules.
#[derive(Debug, Default)]
pub struct NwchemDialect {
    orderer: NwchemOrderer,
}

impl InputDialect for NwchemDialect {
    fn program(&self) -> Program {
        Program::Nwchem
    }

    fn orderer(&self) -> &dyn DirectiveOrderer {
        &self.orderer
    }

    fn indent_unit(&self) -> &'static str {
        "  "
    }

    fn renders_inline(&self, directive: &Directive) -> bool {
        INLINE_DIRECTIVES
            .iter()
            .any(|name| directive.name().eq_ignore_ascii_case(name))
            && directive.children().is_empty()
            && directive.body().is_none()
    }

    fn open_marker(&self, directive: &Directive, keywords: &[&Keyword]) -> String {
        let name = directive.name().to_ascii_lowercase();
        if self.renders_inline(directive) {
            let values: Vec<&str> = keywords
                .iter()
                .flat_map(|k| k.values().iter().map(|v| v.as_str()))
                .collect();
            if values.is_empty() {
                name
            } else {
                format!("{} {}", name, values.join(" "))
            }
        } else {
            name
        }
    }

    fn close_marker(&self, directive: &Directive) -> Option<String> {
        if self.renders_inline(directive) {
            None
        } else {
            Some("end".to_string())
        }
    }

    fn keyword_line(&self, keyword: &Keyword) -> String {
        let name = keyword.name().to_ascii_lowercase();
        if keyword.values().is_empty() {
            name
        } else {
            format!("{} {}", name, keyword.values().join(" "))
        }
    }

    fn validate(&self, root: &Directive) -> Result<(), WriteError> {
        let task = root
            .child("task")
            .ok_or_else(|| WriteError::MissingDirective {
                program: Program::Nwchem,
                name: "task".to_string(),
            })?;
        if task.keyword("theory").is_none() {
            return Err(WriteError::MissingKeyword {
                program: Program::Nwchem,
                directive: "task".to_string(),
                keyword: "theory".to_string(),
            });
        }
        Ok(())
    }
}

/// NWChem output analyzer.
#[derive(Debug, Default)]
pub struct NwchemAnalyzer;

impl OutputAnalyzer for NwchemAnalyzer {
    fn program(&self) -> Program {
        Program::Nwchem
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
        let mut analysis = Analysis::new(Program::Nwchem, artifact);

        for (idx, line) in lines.iter().enumerate() {
            let line_no = idx + 1;
            if let Some(caps) = ENERGY_RE.captures(line) {
                let method = caps[1].to_ascii_lowercase();
                let name = format!("total_{}_energy", method);
                analysis.try_scalar(&name, &caps[2], Some(&method), line_no);
            } else if let Some(caps) = STEP_RE.captures(line) {
                analysis.try_series("optimization_energy", &caps[1], None, line_no);
            }
        }

        // The geometry table runs from the coordinate header to the start
        // of the atomic-mass section that always follows it.
        let geometry_rule = BlockRule {
            label: "geometry",
            open: Marker::Literal("Output coordinates in angstroms"),
            close: Marker::Literal("Atomic Mass"),
        };
        analysis.blocks.extend(capture_blocks(
            &lines,
            &geometry_rule,
            Program::Nwchem,
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
            "nwchem: {} scalars, {} geometry blocks from {}",
            analysis.scalars().len(),
            analysis.blocks.len(),
            artifact.display()
        );
        Ok(analysis)
    }
}
