//! Runtime selection of program adapters.
//!
//! Writers are selected by explicit program identity; analyzers are
//! selected by probing artifact content. Probing walks the registered
//! analyzers in a fixed registration order and returns the first whose
//! fingerprint matches, so detection is deterministic for artifacts that
//! could conceivably match more than one program. Files and directories
//! are probed uniformly; directory-based bundles are recognized by the
//! well-known files inside them.

use crate::analyzer::OutputAnalyzer;
use crate::nwchem::{NwchemAnalyzer, NwchemDialect};
use crate::orca::{OrcaAnalyzer, OrcaDialect};
use crate::ordering::{
    DirectiveOrderer, NwchemOrderer, OrcaOrderer, QmmmOrderer, SpartanOrderer, XtbOrderer,
};
use crate::program::Program;
use crate::qmmm::{QmmmAnalyzer, QmmmDialect};
use crate::spartan::{SpartanAnalyzer, SpartanDialect};
use crate::writer::InputDialect;
use crate::xtb::{XtbAnalyzer, XtbDialect};
use log::debug;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Error type for adapter selection.
#[derive(Error, Debug)]
pub enum FactoryError {
    /// No registered analyzer fingerprinted the artifact
    #[error("no registered analyzer matches artifact {path}")]
    NoMatchingAnalyzer {
        /// The artifact that failed every fingerprint probe
        path: PathBuf,
    },
}

/// All registered analyzers, in fixed registration order.
pub fn registered_analyzers() -> Vec<Box<dyn OutputAnalyzer>> {
    vec![
        Box::new(NwchemAnalyzer),
        Box::new(OrcaAnalyzer),
        Box::new(XtbAnalyzer),
        Box::new(QmmmAnalyzer),
        Box::new(SpartanAnalyzer),
    ]
}

/// Probes an artifact and returns the first analyzer whose fingerprint
/// matches, in registration order.
pub fn analyzer_for(artifact: &Path) -> Result<Box<dyn OutputAnalyzer>, FactoryError> {
    for analyzer in registered_analyzers() {
        if analyzer.fingerprint(artifact) {
            debug!(
                "artifact {} fingerprinted as {}",
                artifact.display(),
                analyzer.program()
            );
            return Ok(analyzer);
        }
    }
    Err(FactoryError::NoMatchingAnalyzer {
        path: artifact.to_path_buf(),
    })
}

/// Returns the analyzer for an explicitly named program.
pub fn analyzer_for_program(program: Program) -> Box<dyn OutputAnalyzer> {
    match program {
        Program::Nwchem => Box::new(NwchemAnalyzer),
        Program::Spartan => Box::new(SpartanAnalyzer),
        Program::Orca => Box::new(OrcaAnalyzer),
        Program::Xtb => Box::new(XtbAnalyzer),
        Program::QmMm => Box::new(QmmmAnalyzer),
    }
}

/// Returns the input dialect for an explicitly named program.
pub fn dialect_for(program: Program) -> Box<dyn InputDialect> {
    match program {
        Program::Nwchem => Box::new(NwchemDialect::default()),
        Program::Spartan => Box::new(SpartanDialect::default()),
        Program::Orca => Box::new(OrcaDialect::default()),
        Program::Xtb => Box::new(XtbDialect::default()),
        Program::QmMm => Box::new(QmmmDialect::default()),
    }
}

/// Returns the standalone orderer for an explicitly named program, with
/// the adapter's default case-sensitivity. `case_sensitive` overrides the
/// default when set (see the settings file's `[adapters]` section).
pub fn orderer_for(program: Program, case_sensitive: Option<bool>) -> Box<dyn DirectiveOrderer> {
    match program {
        Program::Nwchem => {
            let mut orderer = NwchemOrderer::default();
            if let Some(flag) = case_sensitive {
                orderer.case_sensitive = flag;
            }
            Box::new(orderer)
        }
        Program::Spartan => {
            let mut orderer = SpartanOrderer::default();
            if let Some(flag) = case_sensitive {
                orderer.case_sensitive = flag;
            }
            Box::new(orderer)
        }
        Program::Orca => {
            let mut orderer = OrcaOrderer::default();
            if let Some(flag) = case_sensitive {
                orderer.case_sensitive = flag;
            }
            Box::new(orderer)
        }
        Program::Xtb => {
            let mut orderer = XtbOrderer::default();
            if let Some(flag) = case_sensitive {
                orderer.case_sensitive = flag;
            }
            Box::new(orderer)
        }
        Program::QmMm => {
            let mut orderer = QmmmOrderer::default();
            if let Some(flag) = case_sensitive {
                orderer.case_sensitive = flag;
            }
            Box::new(orderer)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;
    use std::fs;

    #[test]
    fn test_no_matching_analyzer() {
        let path = env::temp_dir().join("qcbridge_factory_nomatch.txt");
        fs::write(&path, "just some text\n").unwrap();
        let err = analyzer_for(&path).unwrap_err();
        fs::remove_file(&path).unwrap();
        assert!(matches!(err, FactoryError::NoMatchingAnalyzer { .. }));
    }

    #[test]
    fn test_dialect_program_identities() {
        for program in Program::ALL {
            assert_eq!(dialect_for(program).program(), program);
            assert_eq!(analyzer_for_program(program).program(), program);
        }
    }

    #[test]
    fn test_case_sensitivity_override() {
        use crate::directive::Directive;
        use std::cmp::Ordering;

        let task = Directive::new("TASK");
        let basis = Directive::new("basis");
        // By default NWChem matches its special names case-insensitively,
        // so "TASK" is still the pinned-first directive.
        let lax = orderer_for(Program::Nwchem, None);
        assert_eq!(lax.compare_directives(&task, &basis), Ordering::Less);
        // With the override (settings key nwchem_case_sensitive) it is not.
        let strict = orderer_for(Program::Nwchem, Some(true));
        assert_eq!(strict.compare_directives(&task, &basis), Ordering::Greater);
    }
}
