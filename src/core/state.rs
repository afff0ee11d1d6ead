//! Execution state models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use uuid::Uuid;

/// Overall workflow execution status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExecutionStatus {
    /// Run has not started
    Pending,
    /// Run is currently executing jobs
    Running,
    /// All selected jobs succeeded
    Succeeded,
    /// At least one job failed
    Failed,
}

/// Outcome of a single step within a job
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum StepStatus {
    /// Step exited zero (or built-in action completed)
    Succeeded,
    /// Step exited non-zero or the runner reported an error
    Failed { error: String, exit_code: Option<i32> },
    /// Step never ran because an earlier step in the job failed
    Skipped,
}

/// Record of one executed (or skipped) step
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StepRecord {
    /// Display label (built-in name or the step's `name`)
    pub label: String,

    /// How the step ended
    pub status: StepStatus,

    /// Wall-clock time spent in the step (zero for skipped steps)
    pub duration: Duration,
}

impl StepRecord {
    pub fn skipped(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            status: StepStatus::Skipped,
            duration: Duration::ZERO,
        }
    }
}

/// State of a single job run
///
/// Jobs move `Pending -> Running -> {Succeeded, Failed}` and both final
/// states are terminal. There is no retry state: a failed job stays failed
/// and the failure is surfaced to the caller.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum JobState {
    /// Job has not been scheduled yet
    Pending,
    /// Job is currently running its steps
    Running { started_at: DateTime<Utc> },
    /// Every step exited zero
    Succeeded {
        steps: Vec<StepRecord>,
        started_at: DateTime<Utc>,
        finished_at: DateTime<Utc>,
    },
    /// A step failed; later steps were skipped
    Failed {
        error: String,
        steps: Vec<StepRecord>,
        started_at: DateTime<Utc>,
        finished_at: DateTime<Utc>,
    },
}

impl JobState {
    /// Check if the job is in a final state
    pub fn is_terminal(&self) -> bool {
        matches!(self, JobState::Succeeded { .. } | JobState::Failed { .. })
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, JobState::Failed { .. })
    }
}

/// Overall state of a workflow run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkflowState {
    /// Unique execution ID
    pub execution_id: Uuid,

    /// Current execution status
    pub status: ExecutionStatus,

    /// When the run started
    pub started_at: Option<DateTime<Utc>>,

    /// When the run finished
    pub completed_at: Option<DateTime<Utc>>,

    /// Number of jobs selected for this run
    pub total_jobs: usize,

    /// Number of jobs that succeeded
    pub succeeded_jobs: usize,

    /// Number of jobs that failed
    pub failed_jobs: usize,
}

impl WorkflowState {
    pub fn new() -> Self {
        Self {
            execution_id: Uuid::new_v4(),
            status: ExecutionStatus::Pending,
            started_at: None,
            completed_at: None,
            total_jobs: 0,
            succeeded_jobs: 0,
            failed_jobs: 0,
        }
    }

    /// Mark the run as started
    pub fn start(&mut self, total_jobs: usize) {
        self.status = ExecutionStatus::Running;
        self.started_at = Some(Utc::now());
        self.total_jobs = total_jobs;
    }

    /// Record one finished job
    pub fn record_job(&mut self, success: bool) {
        if success {
            self.succeeded_jobs += 1;
        } else {
            self.failed_jobs += 1;
        }
    }

    /// Mark the run as finished; success is the AND of all job results
    pub fn finish(&mut self) -> ExecutionStatus {
        self.status = if self.failed_jobs == 0 {
            ExecutionStatus::Succeeded
        } else {
            ExecutionStatus::Failed
        };
        self.completed_at = Some(Utc::now());
        self.status
    }

    /// Calculate progress as a fraction of finished jobs (0.0 to 1.0)
    pub fn progress(&self) -> f64 {
        if self.total_jobs == 0 {
            return 0.0;
        }
        (self.succeeded_jobs + self.failed_jobs) as f64 / self.total_jobs as f64
    }
}

impl Default for WorkflowState {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_job_state_is_terminal() {
        assert!(!JobState::Pending.is_terminal());
        assert!(!JobState::Running {
            started_at: Utc::now()
        }
        .is_terminal());
        assert!(JobState::Succeeded {
            steps: vec![],
            started_at: Utc::now(),
            finished_at: Utc::now(),
        }
        .is_terminal());
        assert!(JobState::Failed {
            error: "exit 1".to_string(),
            steps: vec![],
            started_at: Utc::now(),
            finished_at: Utc::now(),
        }
        .is_terminal());
    }

    #[test]
    fn test_workflow_progress() {
        let mut state = WorkflowState::new();
        state.start(5);
        assert_eq!(state.progress(), 0.0);

        state.record_job(true);
        state.record_job(true);
        assert_eq!(state.progress(), 0.4);

        state.record_job(false);
        state.record_job(true);
        state.record_job(true);
        assert_eq!(state.progress(), 1.0);
    }

    #[test]
    fn test_finish_is_and_of_job_results() {
        let mut state = WorkflowState::new();
        state.start(2);
        state.record_job(true);
        state.record_job(true);
        assert_eq!(state.finish(), ExecutionStatus::Succeeded);

        let mut state = WorkflowState::new();
        state.start(2);
        state.record_job(true);
        state.record_job(false);
        assert_eq!(state.finish(), ExecutionStatus::Failed);
        assert!(state.completed_at.is_some());
    }
}
