//! Runner output and error types

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Error types for runner operations
///
/// A command that runs to completion with a non-zero exit is NOT a
/// `RunnerError`; it comes back as a `CommandOutput` and the executor
/// decides what the exit code means for the job.
#[derive(Debug, Error)]
pub enum RunnerError {
    #[error("failed to provision environment '{image}': {reason}")]
    Provision { image: String, reason: String },

    #[error("workspace error: {0}")]
    Workspace(String),

    #[error("failed to spawn command: {0}")]
    Spawn(String),

    #[error("timed out after {0} seconds")]
    Timeout(u64),

    #[error("coverage report not found at {0}")]
    MissingArtifact(String),

    #[error("coverage upload failed: {0}")]
    Upload(String),

    #[error("internal error: {0}")]
    Internal(String),
}

/// Captured result of a completed shell command
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommandOutput {
    /// Exit code, if the process exited normally
    pub exit_code: Option<i32>,

    /// Captured stdout
    pub stdout: String,

    /// Captured stderr
    pub stderr: String,
}

impl CommandOutput {
    pub fn success(&self) -> bool {
        self.exit_code == Some(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_output_success() {
        let output = CommandOutput {
            exit_code: Some(0),
            stdout: "ok".to_string(),
            stderr: String::new(),
        };
        assert!(output.success());

        let output = CommandOutput {
            exit_code: Some(1),
            stdout: String::new(),
            stderr: "boom".to_string(),
        };
        assert!(!output.success());

        // Killed by signal: no exit code, not a success
        let output = CommandOutput {
            exit_code: None,
            stdout: String::new(),
            stderr: String::new(),
        };
        assert!(!output.success());
    }
}
