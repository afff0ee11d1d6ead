//! Local shell runner - executes steps as subprocesses on the host

use async_trait::async_trait;
use std::path::Path;
use std::time::Duration;
use tokio::process::Command;
use tokio::time::timeout;
use tracing::{debug, info, warn};

use crate::runner::{CommandOutput, CommandRunner, RunnerError};

/// Runs job steps in the host shell.
///
/// The image descriptor is a declared contract, not something the local
/// runner can pull; `provision` validates and records it, and steps run
/// directly on the host. This mirrors running a CI definition locally
/// against an already-prepared machine.
#[derive(Debug, Clone)]
pub struct LocalShellRunner {
    /// Shell used to interpret commands (e.g. "sh", "/bin/bash")
    shell: String,
}

impl LocalShellRunner {
    pub fn new(shell: impl Into<String>) -> Self {
        Self {
            shell: shell.into(),
        }
    }

    #[cfg(test)]
    pub fn shell(&self) -> &str {
        &self.shell
    }
}

impl Default for LocalShellRunner {
    fn default() -> Self {
        Self::new("sh")
    }
}

#[async_trait]
impl CommandRunner for LocalShellRunner {
    async fn provision(&self, image: &str) -> Result<(), RunnerError> {
        if image.trim().is_empty() {
            return Err(RunnerError::Provision {
                image: image.to_string(),
                reason: "empty image reference".to_string(),
            });
        }
        info!("Provisioned environment (local shell), declared image: {}", image);
        Ok(())
    }

    async fn checkout(&self, workspace: &Path) -> Result<(), RunnerError> {
        // The source tree is the job's implicit read-only input; the local
        // checkout just verifies it is there.
        if !workspace.is_dir() {
            return Err(RunnerError::Workspace(format!(
                "workspace directory does not exist: {}",
                workspace.display()
            )));
        }
        debug!("Checkout: using workspace {}", workspace.display());
        Ok(())
    }

    async fn run(
        &self,
        command: &str,
        workspace: &Path,
        timeout_secs: u64,
    ) -> Result<CommandOutput, RunnerError> {
        debug!("Spawning `{} -c` for command: {}", self.shell, command);

        let result = timeout(
            Duration::from_secs(timeout_secs),
            Command::new(&self.shell)
                .arg("-c")
                .arg(command)
                .current_dir(workspace)
                .kill_on_drop(true)
                .output(),
        )
        .await
        .map_err(|_| RunnerError::Timeout(timeout_secs))?;

        let output = result.map_err(|e| RunnerError::Spawn(e.to_string()))?;

        let exit_code = output.status.code();
        if !output.status.success() {
            warn!(
                "Command exited with code {:?}: {}",
                exit_code,
                String::from_utf8_lossy(&output.stderr).trim()
            );
        }

        Ok(CommandOutput {
            exit_code,
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }

    async fn upload_coverage(
        &self,
        report: &Path,
        config: Option<&Path>,
        workspace: &Path,
    ) -> Result<(), RunnerError> {
        let report_path = workspace.join(report);
        if !report_path.is_file() {
            return Err(RunnerError::MissingArtifact(
                report_path.display().to_string(),
            ));
        }

        if let Some(config) = config {
            let config_path = workspace.join(config);
            if !config_path.is_file() {
                return Err(RunnerError::Upload(format!(
                    "uploader config not found at {}",
                    config_path.display()
                )));
            }
            info!(
                "Handing coverage report {} to uploader (config: {})",
                report_path.display(),
                config_path.display()
            );
        } else {
            info!("Handing coverage report {} to uploader", report_path.display());
        }

        Ok(())
    }
}
