//! Build errors.
//!
//! Every failure is fatal for the run and names the unit it happened in,
//! plus the command or path that failed.

use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

use crate::util::process::{describe_code, ProcessError};

/// A lifecycle stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    Fetch,
    Compile,
    Stage,
    Verify,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Stage::Fetch => "fetch",
            Stage::Compile => "compile",
            Stage::Stage => "stage",
            Stage::Verify => "verify",
        };
        f.write_str(s)
    }
}

/// Error raised while getting a unit.
#[derive(Debug, Error)]
pub enum BuildError {
    #[error("failed to fetch sources for `{unit}`: {message}")]
    SourceFetch { unit: String, message: String },

    #[error("`{unit}` {stage} step failed: `{command}` exited with {}{}", describe_code(.code), stderr_suffix(.stderr))]
    BuildTool {
        unit: String,
        stage: Stage,
        command: String,
        code: Option<i32>,
        stderr: String,
    },

    #[error("`{unit}` did not produce required artifact {}", .path.display())]
    Staging { unit: String, path: PathBuf },

    #[error("smoke test for `{unit}` failed: `{command}` exited with {}", describe_code(.code))]
    Verify {
        unit: String,
        command: String,
        code: Option<i32>,
    },

    #[error("`{unit}` needs elevated privileges to run `{operation}`; rerun with --allow-elevated or set `build.allow_elevated = true`")]
    Permission { unit: String, operation: String },

    #[error("unknown unit `{name}`{}", required_by_suffix(.required_by))]
    UnknownUnit {
        name: String,
        required_by: Option<String>,
    },

    #[error("`{unit}` looked up `{dependency}`, which is not among its dependencies")]
    MissingDependency { unit: String, dependency: String },

    #[error("dependency cycle: {}", .cycle.join(" -> "))]
    DependencyCycle { cycle: Vec<String> },

    #[error("`{unit}` {stage} step failed")]
    Internal {
        unit: String,
        stage: Stage,
        #[source]
        source: anyhow::Error,
    },
}

fn stderr_suffix(stderr: &str) -> String {
    if stderr.trim().is_empty() {
        String::new()
    } else {
        format!("\n--- stderr ---\n{}", stderr.trim_end())
    }
}

fn required_by_suffix(required_by: &Option<String>) -> String {
    match required_by {
        Some(parent) => format!(" (required by `{}`)", parent),
        None => String::new(),
    }
}

impl BuildError {
    /// Map a failed command onto the error kind of the stage it ran in.
    pub fn from_process(unit: &str, stage: Stage, err: ProcessError) -> Self {
        match stage {
            Stage::Fetch => BuildError::SourceFetch {
                unit: unit.to_string(),
                message: err.to_string(),
            },
            Stage::Compile | Stage::Stage => BuildError::BuildTool {
                unit: unit.to_string(),
                stage,
                command: err.command().to_string(),
                code: err.code(),
                stderr: err.stderr().to_string(),
            },
            Stage::Verify => BuildError::Verify {
                unit: unit.to_string(),
                command: err.command().to_string(),
                code: err.code(),
            },
        }
    }

    /// The unit the failure belongs to, if any.
    pub fn unit(&self) -> Option<&str> {
        match self {
            BuildError::SourceFetch { unit, .. }
            | BuildError::BuildTool { unit, .. }
            | BuildError::Staging { unit, .. }
            | BuildError::Verify { unit, .. }
            | BuildError::Permission { unit, .. }
            | BuildError::MissingDependency { unit, .. }
            | BuildError::Internal { unit, .. } => Some(unit),
            BuildError::UnknownUnit { .. } | BuildError::DependencyCycle { .. } => None,
        }
    }
}

pub type BuildResult<T> = std::result::Result<T, BuildError>;
