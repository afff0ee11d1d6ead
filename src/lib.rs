//! conveyor - a local CI workflow runner for declarative multi-job pipelines

pub mod cli;
pub mod core;
pub mod execution;
pub mod persistence;
pub mod runner;

// Re-export commonly used types
pub use core::{ExecutionStatus, Job, JobState, Pipeline, Step, StepRecord, StepStatus};
pub use execution::{ExecutionEvent, JobReport, SchedulingStrategy, WorkflowEngine};
pub use runner::{CommandOutput, CommandRunner, LocalShellRunner, RunnerError};
