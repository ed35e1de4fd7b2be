//! Wrappers around the command-line tools the desktop widgets talk to.
//!
//! Every call is synchronous and runs on the caller's thread.  Output
//! parsing lives in plain functions next to each wrapper so it can be
//! tested without the tools installed.

pub mod audio;
pub mod battery;
pub mod brightness;
pub mod launcher;
pub mod menu;
pub mod network;

use log::debug;
use std::process::{Command, ExitStatus};

/// Errors from running an external tool.
#[derive(Debug, thiserror::Error)]
pub enum ToolError {
    /// The binary is missing or could not be started.
    #[error("failed to run {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },
    /// The tool ran but reported failure.
    #[error("{program} exited with {status}: {stderr}")]
    Failed {
        program: String,
        status: ExitStatus,
        stderr: String,
    },
    /// The tool succeeded but printed something we could not make sense of.
    #[error("unexpected output from {program}: {output:?}")]
    Parse { program: String, output: String },
}

impl ToolError {
    pub(crate) fn parse(program: &str, output: impl Into<String>) -> Self {
        ToolError::Parse {
            program: program.to_string(),
            output: output.into(),
        }
    }
}

/// Run `program args…`, wait for it, and return its stdout.
///
/// A non-zero exit status is an error carrying the trimmed stderr.
pub fn run(program: &str, args: &[&str]) -> Result<String, ToolError> {
    debug!("running {} {}", program, args.join(" "));
    let output = Command::new(program)
        .args(args)
        .output()
        .map_err(|source| ToolError::Spawn {
            program: program.to_string(),
            source,
        })?;

    if !output.status.success() {
        return Err(ToolError::Failed {
            program: program.to_string(),
            status: output.status,
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        });
    }
    Ok(String::from_utf8_lossy(&output.stdout).into_owned())
}
