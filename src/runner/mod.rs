//! Command runner - the seam between the engine and the job environment

pub mod output;
pub mod shell;

use async_trait::async_trait;
use std::path::Path;

pub use output::{CommandOutput, RunnerError};
pub use shell::LocalShellRunner;

/// Trait for executing job steps - allows for different environments
/// (local shell, containers, mocks in tests)
#[async_trait]
pub trait CommandRunner: Send + Sync {
    /// Provision the declared execution environment for a job.
    ///
    /// Called once per job before any step runs. A provisioning failure
    /// fails the whole job without running a single step.
    async fn provision(&self, image: &str) -> Result<(), RunnerError>;

    /// Make the source checkout available in the workspace.
    async fn checkout(&self, workspace: &Path) -> Result<(), RunnerError>;

    /// Run a shell command in the workspace, bounded by `timeout_secs`.
    ///
    /// Returns the captured output even when the command exits non-zero;
    /// only spawn/timeout problems are errors.
    async fn run(
        &self,
        command: &str,
        workspace: &Path,
        timeout_secs: u64,
    ) -> Result<CommandOutput, RunnerError>;

    /// Hand a coverage report (plus optional uploader config) to the
    /// upload collaborator. Auth and endpoint are the collaborator's
    /// contract, not ours.
    async fn upload_coverage(
        &self,
        report: &Path,
        config: Option<&Path>,
        workspace: &Path,
    ) -> Result<(), RunnerError>;
}
