//! Workflow engine - fans selected jobs out and collects their results

use anyhow::{anyhow, Result};
use chrono::Utc;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use tokio::task::JoinSet;
use tracing::{info, warn};
use uuid::Uuid;

use crate::core::{ExecutionStatus, JobState, Pipeline};
use crate::execution::{JobExecutor, JobReport, JobScheduler, SchedulingStrategy};
use crate::runner::CommandRunner;

/// Events that occur during a workflow run
#[derive(Debug, Clone)]
pub enum ExecutionEvent {
    WorkflowStarted {
        execution_id: Uuid,
        pipeline_name: String,
        total_jobs: usize,
    },
    JobStarted {
        job_id: String,
        image: String,
    },
    StepStarted {
        job_id: String,
        step: String,
    },
    StepCompleted {
        job_id: String,
        step: String,
    },
    StepFailed {
        job_id: String,
        step: String,
        error: String,
    },
    StepSkipped {
        job_id: String,
        step: String,
    },
    JobSucceeded {
        job_id: String,
    },
    JobFailed {
        job_id: String,
        error: String,
    },
    WorkflowCompleted {
        execution_id: Uuid,
        status: ExecutionStatus,
    },
}

/// Type for event handlers
pub type EventHandler = Arc<dyn Fn(ExecutionEvent) + Send + Sync>;

/// Runs a pipeline's workflow for a trigger.
///
/// Jobs are independent failure domains: a failed job never stops its
/// siblings, and the run's overall status is the AND of all job results.
pub struct WorkflowEngine<R> {
    runner: Arc<R>,
    scheduler: JobScheduler,
    workspace: PathBuf,
    event_handlers: Arc<Mutex<Vec<EventHandler>>>,
}

impl<R: CommandRunner + 'static> WorkflowEngine<R> {
    pub fn new(runner: R, strategy: SchedulingStrategy, workspace: PathBuf) -> Self {
        Self {
            runner: Arc::new(runner),
            scheduler: JobScheduler::new(strategy),
            workspace,
            event_handlers: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Add an event handler
    pub fn add_event_handler<F>(&self, handler: F)
    where
        F: Fn(ExecutionEvent) + Send + Sync + 'static,
    {
        if let Ok(mut handlers) = self.event_handlers.lock() {
            handlers.push(Arc::new(handler));
        }
    }

    /// Emit an event to all handlers
    fn emit(&self, event: ExecutionEvent) {
        if let Ok(handlers) = self.event_handlers.lock() {
            for handler in handlers.iter() {
                handler(event.clone());
            }
        }
    }

    /// Execute the jobs a trigger selects.
    ///
    /// Returns the final status; `Err` is reserved for orchestration
    /// problems (no matching workflow, a panicked job task), never for an
    /// ordinary failed job.
    pub async fn execute(&self, pipeline: &mut Pipeline, trigger: &str) -> Result<ExecutionStatus> {
        let execution_id = pipeline.state.execution_id;
        let selected = pipeline.select_workflow_jobs(trigger);
        if selected.is_empty() {
            anyhow::bail!("no workflow matches trigger '{}'", trigger);
        }

        info!(
            "Starting workflow run: {} ({}) - trigger '{}', {} jobs",
            pipeline.name,
            execution_id,
            trigger,
            selected.len()
        );
        pipeline.state.start(selected.len());
        self.emit(ExecutionEvent::WorkflowStarted {
            execution_id,
            pipeline_name: pipeline.name.clone(),
            total_jobs: selected.len(),
        });

        let mut remaining = selected;
        while !remaining.is_empty() {
            let batch = self.scheduler.next_batch(&remaining);
            remaining.retain(|id| !batch.contains(id));

            let mut tasks: JoinSet<JobReport> = JoinSet::new();
            for job_id in batch {
                let job = {
                    let job = pipeline
                        .job_mut(&job_id)
                        .ok_or_else(|| anyhow!("job '{}' not found", job_id))?;
                    job.state = JobState::Running {
                        started_at: Utc::now(),
                    };
                    job.clone()
                };

                self.emit(ExecutionEvent::JobStarted {
                    job_id: job.id.clone(),
                    image: job.image.clone(),
                });

                let executor = JobExecutor::new(
                    self.runner.clone(),
                    self.workspace.clone(),
                    self.event_handlers.clone(),
                );
                tasks.spawn(async move { executor.execute(&job).await });
            }

            // A failed job only marks itself; the rest of the batch (and
            // the remaining jobs) still run to completion.
            while let Some(joined) = tasks.join_next().await {
                let report = joined.map_err(|e| anyhow!("job task panicked: {}", e))?;
                self.apply_report(pipeline, report);
            }
        }

        let status = pipeline.state.finish();
        info!(
            "Workflow run finished: {} - {:?} ({} succeeded, {} failed)",
            pipeline.name, status, pipeline.state.succeeded_jobs, pipeline.state.failed_jobs
        );
        self.emit(ExecutionEvent::WorkflowCompleted {
            execution_id,
            status,
        });

        Ok(status)
    }

    /// Fold a finished job's report back into the pipeline state
    fn apply_report(&self, pipeline: &mut Pipeline, report: JobReport) {
        let now = Utc::now();
        if let Some(job) = pipeline.job_mut(&report.job_id) {
            let started_at = match &job.state {
                JobState::Running { started_at } => *started_at,
                _ => now,
            };
            job.state = if report.success {
                JobState::Succeeded {
                    steps: report.steps.clone(),
                    started_at,
                    finished_at: now,
                }
            } else {
                JobState::Failed {
                    error: report.error.clone().unwrap_or_default(),
                    steps: report.steps.clone(),
                    started_at,
                    finished_at: now,
                }
            };
        } else {
            warn!("Report for unknown job '{}'", report.job_id);
        }

        pipeline.state.record_job(report.success);
        if report.success {
            self.emit(ExecutionEvent::JobSucceeded {
                job_id: report.job_id,
            });
        } else {
            self.emit(ExecutionEvent::JobFailed {
                job_id: report.job_id,
                error: report.error.unwrap_or_default(),
            });
        }
    }
}
