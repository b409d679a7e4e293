//! xtb adapter: xcontrol input dialect and output analyzer.
//!
//! xtb detailed input (`xcontrol`) is organized into `$`-prefixed groups:
//! one-line instructions like `$chrg 1` and blocks like `$scc ... $end`
//! holding `key=value` lines. The analyzer fingerprints the boxed `x T B`
//! banner, reads the summary-box `TOTAL ENERGY` / `GRADIENT NORM` values
//! and the `final structure:` geometry block, and keys termination off the
//! program's literal termination messages.

use crate::analyzer::{
    capture_blocks, read_head, Analysis, AnalyzeError, BlockRule, Marker, OutputAnalyzer,
    Termination,
};
use crate::directive::{Directive, Keyword};
use crate::ordering::{DirectiveOrderer, XtbOrderer};
use crate::program::Program;
use crate::writer::{InputDialect, WriteError};
use lazy_static::lazy_static;
use log::debug;
use regex::Regex;
use std::fs;
use std::path::Path;

const FLOAT: &str = r"[-+]?(?:\d+\.?\d*|\.\d+)(?:[eE][-+]?\d+)?";

/// Boxed program banner.
const BANNER: &str = "x T B";
/// Success message printed at the end of a run.
const NORMAL_FOOTER: &str = "normal termination of xtb";
/// Failure message printed at the end of a run.
const ERROR_FOOTER: &str = "abnormal termination of xtb";

lazy_static! {
    // "| TOTAL ENERGY              -5.070544445346 Eh   |"
    static ref TOTAL_ENERGY_RE: Regex =
        Regex::new(&format!(r"\|\s*TOTAL ENERGY\s+({})\s+Eh", FLOAT)).unwrap();

    // "| GRADIENT NORM              0.000012345678 Eh/α |"
    static ref GRADIENT_RE: Regex =
        Regex::new(&format!(r"\|\s*GRADIENT NORM\s+({})\s+Eh", FLOAT)).unwrap();
}

/// One-line `$` instructions that carry their value on the marker line.
const INLINE_GROUPS: &[&str] = &["chrg", "spin", "gfn"];

/// xcontrol formatting rules.
#[derive(Debug, Default)]
pub struct XtbDialect {
    orderer: XtbOrderer,
}

impl InputDialect for XtbDialect {
    fn program(&self) -> Program {
        Program::Xtb
    }

    fn orderer(&self) -> &dyn DirectiveOrderer {
        &self.orderer
    }

    fn indent_unit(&self) -> &'static str {
        "   "
    }

    fn renders_inline(&self, directive: &Directive) -> bool {
        INLINE_GROUPS
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
                format!("${}", name)
            } else {
                format!("${} {}", name, values.join(" "))
            }
        } else {
            format!("${}", name)
        }
    }

    fn close_marker(&self, directive: &Directive) -> Option<String> {
        if self.renders_inline(directive) {
            None
        } else {
            Some("$end".to_string())
        }
    }

    fn keyword_line(&self, keyword: &Keyword) -> String {
        format!(
            "{}={}",
            keyword.name().to_ascii_lowercase(),
            keyword.values().join(",")
        )
    }

    fn validate(&self, _root: &Directive) -> Result<(), WriteError> {
        // xcontrol has no mandatory groups; every instruction is optional.
        Ok(())
    }
}

/// xtb output analyzer.
#[derive(Debug, Default)]
pub struct XtbAnalyzer;

impl OutputAnalyzer for XtbAnalyzer {
    fn program(&self) -> Program {
        Program::Xtb
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
        let mut analysis = Analysis::new(Program::Xtb, artifact);

        for (idx, line) in lines.iter().enumerate() {
            let line_no = idx + 1;
            if let Some(caps) = TOTAL_ENERGY_RE.captures(line) {
                analysis.try_scalar("total_energy", &caps[1], None, line_no);
            } else if let Some(caps) = GRADIENT_RE.captures(line) {
                analysis.try_scalar("gradient_norm", &caps[1], None, line_no);
            }
        }

        let geometry_rule = BlockRule {
            label: "geometry",
            open: Marker::Literal("final structure:"),
            close: Marker::regex(r"^(\s*)$"),
        };
        analysis.blocks.extend(capture_blocks(
            &lines,
            &geometry_rule,
            Program::Xtb,
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
            "xtb: termination {:?} for {}",
            analysis.termination,
            artifact.display()
        );
        Ok(analysis)
    }
}
