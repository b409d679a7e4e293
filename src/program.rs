//! Identities of the supported chemistry programs.
//!
//! Every adapter in this crate (orderer, input dialect, output analyzer) is
//! keyed by a [`Program`] value. The identity also carries the conventional
//! file extensions used when writing inputs or locating outputs; these can be
//! overridden through the settings file.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A supported chemistry program.
///
/// The variants cover the program families this toolkit can write inputs for
/// and analyze outputs from. Selection happens either explicitly (input
/// writing) or by content fingerprinting (output analysis, see
/// [`factory`](crate::factory)).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Program {
    /// NWChem electronic structure package
    Nwchem,
    /// Spartan molecular modeling suite (directory-bundle outputs)
    Spartan,
    /// ORCA electronic structure package
    Orca,
    /// xtb semi-empirical tight-binding program
    Xtb,
    /// Generic QM/MM coupling driver
    QmMm,
}

impl Program {
    /// All supported programs, in factory registration order.
    pub const ALL: [Program; 5] = [
        Program::Nwchem,
        Program::Orca,
        Program::Xtb,
        Program::QmMm,
        Program::Spartan,
    ];

    /// Short lowercase identifier used on the command line and in settings.
    pub fn name(&self) -> &'static str {
        match self {
            Program::Nwchem => "nwchem",
            Program::Spartan => "spartan",
            Program::Orca => "orca",
            Program::Xtb => "xtb",
            Program::QmMm => "qmmm",
        }
    }

    /// Conventional extension for generated input files.
    pub fn input_extension(&self) -> &'static str {
        match self {
            Program::Nwchem => "nw",
            Program::Spartan => "spinput",
            Program::Orca => "inp",
            Program::Xtb => "xcontrol",
            Program::QmMm => "qmmm",
        }
    }

    /// Conventional extension for output/log files.
    ///
    /// Spartan outputs are directories, not files; the value here names the
    /// well-known output file inside the bundle.
    pub fn output_extension(&self) -> &'static str {
        match self {
            Program::Nwchem => "out",
            Program::Spartan => "output",
            Program::Orca => "out",
            Program::Xtb => "out",
            Program::QmMm => "log",
        }
    }

    /// Resolves a program from its short identifier, case-insensitively.
    pub fn from_name(name: &str) -> Option<Program> {
        let lowered = name.trim().to_ascii_lowercase();
        match lowered.as_str() {
            "nwchem" => Some(Program::Nwchem),
            "spartan" => Some(Program::Spartan),
            "orca" => Some(Program::Orca),
            "xtb" => Some(Program::Xtb),
            "qmmm" | "qm/mm" => Some(Program::QmMm),
            _ => None,
        }
    }
}

impl fmt::Display for Program {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_name_roundtrip() {
        for program in Program::ALL {
            assert_eq!(Program::from_name(program.name()), Some(program));
        }
        assert_eq!(Program::from_name("QM/MM"), Some(Program::QmMm));
        assert_eq!(Program::from_name("gaussian"), None);
    }
}
