//! INI-backed configuration.
//!
//! Behavior that varies between sites lives in an INI file rather than in
//! code: where the error-pattern library lives, per-adapter
//! case-sensitivity overrides for the ordering rules, and output file
//! extension overrides. Lookup precedence: explicit path → local
//! `./qcbridge.cfg` → built-in defaults.
//!
//! ```ini
//! [patterns]
//! root = /opt/qcbridge/patterns
//!
//! [adapters]
//! nwchem_case_sensitive = false
//! spartan_extension = output
//! ```

use crate::program::Program;
use configparser::ini::Ini;
use log::debug;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Name of the local configuration file.
pub const LOCAL_CONFIG: &str = "qcbridge.cfg";

/// Errors that can occur while loading configuration.
#[derive(Error, Debug)]
pub enum SettingsError {
    /// I/O error when reading the configuration file
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    /// INI parsing error
    #[error("INI parsing error: {0}")]
    IniParse(String),
    /// A key holds a value of the wrong shape
    #[error("invalid configuration value: {0}")]
    InvalidValue(String),
}

/// Loaded configuration with built-in defaults.
#[derive(Debug, Clone, Default)]
pub struct Settings {
    /// Root directory of the error-pattern library, if configured
    pub pattern_root: Option<PathBuf>,
    case_sensitive: HashMap<Program, bool>,
    extensions: HashMap<Program, String>,
}

impl Settings {
    /// Loads `./qcbridge.cfg` when present, defaults otherwise.
    pub fn load() -> Result<Self, SettingsError> {
        let local = Path::new(LOCAL_CONFIG);
        if local.is_file() {
            Self::from_file(local)
        } else {
            debug!("no {} found, using defaults", LOCAL_CONFIG);
            Ok(Self::default())
        }
    }

    /// Loads configuration from an explicit INI file.
    pub fn from_file(path: &Path) -> Result<Self, SettingsError> {
        let mut ini = Ini::new();
        ini.load(path).map_err(SettingsError::IniParse)?;

        let mut settings = Settings {
            pattern_root: ini.get("patterns", "root").map(PathBuf::from),
            ..Settings::default()
        };

        for program in Program::ALL {
            let flag_key = format!("{}_case_sensitive", program.name());
            let flag = ini
                .getboolcoerce("adapters", &flag_key)
                .map_err(SettingsError::InvalidValue)?;
            if let Some(flag) = flag {
                settings.case_sensitive.insert(program, flag);
            }
            let ext_key = format!("{}_extension", program.name());
            if let Some(ext) = ini.get("adapters", &ext_key) {
                settings.extensions.insert(program, ext);
            }
        }
        debug!("settings loaded from {}", path.display());
        Ok(settings)
    }

    /// Configured case-sensitivity override for an adapter's ordering
    /// rules, if any.
    pub fn case_sensitive(&self, program: Program) -> Option<bool> {
        self.case_sensitive.get(&program).copied()
    }

    /// Output extension for a program, honoring overrides.
    pub fn output_extension(&self, program: Program) -> &str {
        self.extensions
            .get(&program)
            .map(|e| e.as_str())
            .unwrap_or_else(|| program.output_extension())
    }
}
