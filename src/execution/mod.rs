//! Workflow execution engine

pub mod engine;
pub mod executor;
pub mod scheduler;

pub use engine::{EventHandler, ExecutionEvent, WorkflowEngine};
pub use executor::{JobExecutor, JobReport};
pub use scheduler::{JobScheduler, SchedulingStrategy};
