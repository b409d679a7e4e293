//! Named-capability façade over the core.
//!
//! External callers (a service layer, a batch driver) address the toolkit
//! through named capabilities with string parameters and get back a status
//! plus a mapping of exposed output values. This module is a thin
//! pass-through: capability discovery, scheduling and transport are the
//! caller's business.

use crate::analyzer::{AnalyzeError, Termination};
use crate::error_patterns::{ErrorPatternLibrary, PatternError};
use crate::factory::{self, FactoryError};
use crate::help;
use crate::program::Program;
use crate::settings::Settings;
use crate::template;
use crate::writer::WriteError;
use log::info;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::Path;
use thiserror::Error;

/// Error type for the task surface.
#[derive(Error, Debug)]
pub enum TaskError {
    /// The capability name is not registered
    #[error("unknown capability `{0}`")]
    UnknownCapability(String),
    /// A required parameter is absent
    #[error("capability `{capability}` requires parameter `{parameter}`")]
    MissingParameter {
        /// The capability that was invoked
        capability: String,
        /// The absent parameter name
        parameter: String,
    },
    /// A parameter value could not be interpreted
    #[error("invalid value `{value}` for parameter `{parameter}`")]
    InvalidParameter {
        /// The parameter name
        parameter: String,
        /// The rejected value
        value: String,
    },
    /// No analyzer fingerprinted the artifact
    #[error(transparent)]
    Factory(#[from] FactoryError),
    /// Output analysis failed
    #[error(transparent)]
    Analyze(#[from] AnalyzeError),
    /// Input rendering failed
    #[error(transparent)]
    Write(#[from] WriteError),
    /// The pattern library could not be loaded
    #[error(transparent)]
    Pattern(#[from] PatternError),
    /// File system error while reading artifact text
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Completion status of a capability run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TaskStatus {
    /// The capability ran and produced its outputs
    Completed,
    /// The capability ran but the underlying job was not successful
    Failed,
}

/// Status plus exposed output values of one capability run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskOutcome {
    /// Completion status
    pub status: TaskStatus,
    /// Named output values
    pub outputs: HashMap<String, String>,
}

/// Runs a named capability with string parameters.
///
/// Registered capabilities: `analyze`, `diagnose`, `template`.
pub fn run_capability(
    name: &str,
    params: &HashMap<String, String>,
    settings: &Settings,
) -> Result<TaskOutcome, TaskError> {
    info!("running capability `{}`", name);
    match name {
        "analyze" => run_analyze(params),
        "diagnose" => run_diagnose(params, settings),
        "template" => run_template(params),
        other => Err(TaskError::UnknownCapability(other.to_string())),
    }
}

/// Returns descriptive text for a named capability.
pub fn capability_help(name: &str) -> Result<&'static str, TaskError> {
    help::capability_help(name).ok_or_else(|| TaskError::UnknownCapability(name.to_string()))
}

fn required<'a>(
    params: &'a HashMap<String, String>,
    capability: &str,
    parameter: &str,
) -> Result<&'a str, TaskError> {
    params
        .get(parameter)
        .map(|v| v.as_str())
        .ok_or_else(|| TaskError::MissingParameter {
            capability: capability.to_string(),
            parameter: parameter.to_string(),
        })
}

fn run_analyze(params: &HashMap<String, String>) -> Result<TaskOutcome, TaskError> {
    let artifact = Path::new(required(params, "analyze", "artifact")?);
    let analyzer = factory::analyzer_for(artifact)?;
    let analysis = analyzer.parse(artifact)?;

    let mut outputs = HashMap::new();
    outputs.insert("program".to_string(), analysis.program.to_string());
    outputs.insert(
        "termination".to_string(),
        format!("{:?}", analysis.termination).to_ascii_lowercase(),
    );
    for property in analysis.scalars() {
        outputs.insert(property.name.clone(), property.value.to_string());
    }
    outputs.insert(
        "geometry_blocks".to_string(),
        analysis.blocks_labeled("geometry").len().to_string(),
    );

    let status = match analysis.termination {
        Termination::Normal => TaskStatus::Completed,
        _ => TaskStatus::Failed,
    };
    Ok(TaskOutcome { status, outputs })
}

fn run_diagnose(
    params: &HashMap<String, String>,
    settings: &Settings,
) -> Result<TaskOutcome, TaskError> {
    let artifact = Path::new(required(params, "diagnose", "artifact")?);
    let root = params
        .get("patterns")
        .map(|r| Path::new(r).to_path_buf())
        .or_else(|| settings.pattern_root.clone())
        .ok_or_else(|| TaskError::MissingParameter {
            capability: "diagnose".to_string(),
            parameter: "patterns".to_string(),
        })?;

    let library = ErrorPatternLibrary::load(&root)?;
    let text = artifact_text(artifact)?;
    let matched = match factory::analyzer_for(artifact) {
        Ok(analyzer) => library.diagnose_for(analyzer.program(), &text),
        Err(_) => library.diagnose(&text),
    };

    let mut outputs = HashMap::new();
    outputs.insert("matched".to_string(), matched.len().to_string());
    for (idx, message) in matched.iter().enumerate() {
        outputs.insert(format!("match_{}", idx), message.name.clone());
        if let Some(category) = &message.category {
            outputs.insert(format!("match_{}_category", idx), category.clone());
        }
    }
    let status = if matched.is_empty() {
        TaskStatus::Failed
    } else {
        TaskStatus::Completed
    };
    Ok(TaskOutcome { status, outputs })
}

fn run_template(params: &HashMap<String, String>) -> Result<TaskOutcome, TaskError> {
    let name = required(params, "template", "program")?;
    let program = Program::from_name(name).ok_or_else(|| TaskError::InvalidParameter {
        parameter: "program".to_string(),
        value: name.to_string(),
    })?;
    let text = template::render_starter(program)?;
    let mut outputs = HashMap::new();
    outputs.insert("program".to_string(), program.to_string());
    outputs.insert("input".to_string(), text);
    Ok(TaskOutcome {
        status: TaskStatus::Completed,
        outputs,
    })
}

/// Collects the diagnosable text of an artifact: the file itself, or the
/// well-known output file of a directory bundle.
fn artifact_text(artifact: &Path) -> Result<String, TaskError> {
    if artifact.is_dir() {
        let output = artifact.join(crate::spartan::OUTPUT_FILE);
        if output.is_file() {
            return Ok(fs::read_to_string(output)?);
        }
        let archive = artifact.join(crate::spartan::ARCHIVE_FILE);
        if archive.is_file() {
            return Ok(fs::read_to_string(archive)?);
        }
        return Ok(String::new());
    }
    Ok(fs::read_to_string(artifact)?)
}
