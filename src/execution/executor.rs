//! Job executor - runs one job's steps strictly in order

use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::Instant;
use tracing::{debug, error, info, warn};

use crate::core::{Job, Step, StepRecord, StepStatus};
use crate::execution::engine::{EventHandler, ExecutionEvent};
use crate::runner::CommandRunner;

/// Result of running one job
#[derive(Debug, Clone)]
pub struct JobReport {
    pub job_id: String,

    /// AND of all step exit codes being zero
    pub success: bool,

    /// One record per declared step, including skipped ones
    pub steps: Vec<StepRecord>,

    /// Concatenated stdout/stderr of the commands that ran
    pub logs: String,

    /// The first failure, if any
    pub error: Option<String>,
}

struct StepFailure {
    error: String,
    exit_code: Option<i32>,
}

/// Executes a single job against a `CommandRunner`
pub struct JobExecutor<R> {
    runner: Arc<R>,
    workspace: PathBuf,
    event_handlers: Arc<Mutex<Vec<EventHandler>>>,
}

impl<R: CommandRunner> JobExecutor<R> {
    pub fn new(
        runner: Arc<R>,
        workspace: PathBuf,
        event_handlers: Arc<Mutex<Vec<EventHandler>>>,
    ) -> Self {
        Self {
            runner,
            workspace,
            event_handlers,
        }
    }

    fn emit(&self, event: ExecutionEvent) {
        if let Ok(handlers) = self.event_handlers.lock() {
            for handler in handlers.iter() {
                handler(event.clone());
            }
        }
    }

    /// Execute the job's steps in declaration order.
    ///
    /// The first failing step fails the job; the remaining steps are
    /// recorded as skipped and never run. A provisioning failure skips
    /// every step. Sibling jobs are unaffected either way.
    pub async fn execute(&self, job: &Job) -> JobReport {
        info!("Running job: {} (image: {})", job.id, job.image);

        let mut steps = Vec::with_capacity(job.steps.len());
        let mut logs = String::new();

        if let Err(e) = self.runner.provision(&job.image).await {
            error!("Provisioning failed for job {}: {}", job.id, e);
            for step in &job.steps {
                let record = StepRecord::skipped(step.label());
                self.emit(ExecutionEvent::StepSkipped {
                    job_id: job.id.clone(),
                    step: record.label.clone(),
                });
                steps.push(record);
            }
            return JobReport {
                job_id: job.id.clone(),
                success: false,
                steps,
                logs,
                error: Some(e.to_string()),
            };
        }

        let mut failure: Option<String> = None;
        for (index, step) in job.steps.iter().enumerate() {
            let label = step.label();
            self.emit(ExecutionEvent::StepStarted {
                job_id: job.id.clone(),
                step: label.clone(),
            });

            let started = Instant::now();
            let outcome = self.run_step(job, step, &mut logs).await;
            let duration = started.elapsed();

            match outcome {
                Ok(()) => {
                    debug!("Step '{}' of job {} succeeded", label, job.id);
                    self.emit(ExecutionEvent::StepCompleted {
                        job_id: job.id.clone(),
                        step: label.clone(),
                    });
                    steps.push(StepRecord {
                        label,
                        status: StepStatus::Succeeded,
                        duration,
                    });
                }
                Err(step_failure) => {
                    warn!(
                        "Step '{}' of job {} failed: {}",
                        label, job.id, step_failure.error
                    );
                    self.emit(ExecutionEvent::StepFailed {
                        job_id: job.id.clone(),
                        step: label.clone(),
                        error: step_failure.error.clone(),
                    });
                    steps.push(StepRecord {
                        label,
                        status: StepStatus::Failed {
                            error: step_failure.error.clone(),
                            exit_code: step_failure.exit_code,
                        },
                        duration,
                    });

                    // Remaining steps in this job do not run
                    for later in &job.steps[index + 1..] {
                        let record = StepRecord::skipped(later.label());
                        self.emit(ExecutionEvent::StepSkipped {
                            job_id: job.id.clone(),
                            step: record.label.clone(),
                        });
                        steps.push(record);
                    }

                    failure = Some(step_failure.error);
                    break;
                }
            }
        }

        let success = failure.is_none();
        JobReport {
            job_id: job.id.clone(),
            success,
            steps,
            logs,
            error: failure,
        }
    }

    async fn run_step(
        &self,
        job: &Job,
        step: &Step,
        logs: &mut String,
    ) -> Result<(), StepFailure> {
        match step {
            Step::Checkout => self
                .runner
                .checkout(&self.workspace)
                .await
                .map_err(|e| StepFailure {
                    error: e.to_string(),
                    exit_code: None,
                }),
            Step::Run { name, command } => {
                let output = self
                    .runner
                    .run(command, &self.workspace, job.timeout_secs)
                    .await
                    .map_err(|e| StepFailure {
                        error: e.to_string(),
                        exit_code: None,
                    })?;

                if !output.stdout.is_empty() {
                    logs.push_str(&format!("[{}] {}\n", name, output.stdout.trim_end()));
                }
                if !output.stderr.is_empty() {
                    logs.push_str(&format!("[{}!] {}\n", name, output.stderr.trim_end()));
                }

                if output.success() {
                    Ok(())
                } else {
                    Err(StepFailure {
                        error: match output.exit_code {
                            Some(code) => format!("command exited with code {}", code),
                            None => "command was terminated by a signal".to_string(),
                        },
                        exit_code: output.exit_code,
                    })
                }
            }
            Step::UploadCoverage { path, config } => self
                .runner
                .upload_coverage(path, config.as_deref(), &self.workspace)
                .await
                .map_err(|e| StepFailure {
                    error: e.to_string(),
                    exit_code: None,
                }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::JobState;
    use crate::runner::{CommandOutput, RunnerError};
    use async_trait::async_trait;
    use std::collections::HashSet;
    use std::path::Path;

    /// Runner that fails commands by substring match and never touches
    /// the real filesystem
    struct MockRunner {
        failing: HashSet<String>,
        fail_provision: bool,
    }

    impl MockRunner {
        fn new() -> Self {
            Self {
                failing: HashSet::new(),
                fail_provision: false,
            }
        }

        fn failing_command(mut self, command: &str) -> Self {
            self.failing.insert(command.to_string());
            self
        }
    }

    #[async_trait]
    impl CommandRunner for MockRunner {
        async fn provision(&self, image: &str) -> Result<(), RunnerError> {
            if self.fail_provision {
                Err(RunnerError::Provision {
                    image: image.to_string(),
                    reason: "image unavailable".to_string(),
                })
            } else {
                Ok(())
            }
        }

        async fn checkout(&self, _workspace: &Path) -> Result<(), RunnerError> {
            Ok(())
        }

        async fn run(
            &self,
            command: &str,
            _workspace: &Path,
            _timeout_secs: u64,
        ) -> Result<CommandOutput, RunnerError> {
            let code = if self.failing.contains(command) { 1 } else { 0 };
            Ok(CommandOutput {
                exit_code: Some(code),
                stdout: format!("ran: {}", command),
                stderr: String::new(),
            })
        }

        async fn upload_coverage(
            &self,
            _report: &Path,
            _config: Option<&Path>,
            _workspace: &Path,
        ) -> Result<(), RunnerError> {
            Ok(())
        }
    }

    fn test_job(commands: &[&str]) -> Job {
        Job {
            id: "job".to_string(),
            image: "alpine:3.19".to_string(),
            steps: commands
                .iter()
                .map(|c| Step::Run {
                    name: c.to_string(),
                    command: c.to_string(),
                })
                .collect(),
            timeout_secs: 30,
            state: JobState::Pending,
        }
    }

    fn executor(runner: MockRunner) -> JobExecutor<MockRunner> {
        JobExecutor::new(
            Arc::new(runner),
            PathBuf::from("."),
            Arc::new(Mutex::new(Vec::new())),
        )
    }

    #[tokio::test]
    async fn test_all_steps_succeed() {
        let job = test_job(&["install deps", "run tests"]);
        let report = executor(MockRunner::new()).execute(&job).await;

        assert!(report.success);
        assert!(report.error.is_none());
        assert_eq!(report.steps.len(), 2);
        assert!(report
            .steps
            .iter()
            .all(|s| s.status == StepStatus::Succeeded));
        assert!(report.logs.contains("ran: run tests"));
    }

    #[tokio::test]
    async fn test_failure_skips_remaining_steps() {
        let job = test_job(&["install deps", "run tests", "upload"]);
        let runner = MockRunner::new().failing_command("run tests");
        let report = executor(runner).execute(&job).await;

        assert!(!report.success);
        assert_eq!(report.steps.len(), 3);
        assert_eq!(report.steps[0].status, StepStatus::Succeeded);
        assert!(matches!(
            report.steps[1].status,
            StepStatus::Failed {
                exit_code: Some(1),
                ..
            }
        ));
        assert_eq!(report.steps[2].status, StepStatus::Skipped);
        assert_eq!(
            report.error.as_deref(),
            Some("command exited with code 1")
        );
    }

    #[tokio::test]
    async fn test_provisioning_failure_skips_all_steps() {
        let job = test_job(&["install deps", "run tests"]);
        let runner = MockRunner {
            failing: HashSet::new(),
            fail_provision: true,
        };
        let report = executor(runner).execute(&job).await;

        assert!(!report.success);
        assert!(report
            .steps
            .iter()
            .all(|s| s.status == StepStatus::Skipped));
        assert!(report.error.unwrap().contains("failed to provision"));
    }
}
