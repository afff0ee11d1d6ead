//! Pipeline domain model

use std::collections::HashSet;

use crate::core::config::PipelineConfig;
use crate::core::job::{Job, JobDefaults};
use crate::core::state::{ExecutionStatus, WorkflowState};

/// A workflow as scheduled: a name, a job-id list, and trigger filters
#[derive(Debug, Clone)]
pub struct WorkflowDef {
    pub name: String,
    pub jobs: Vec<String>,
    /// Empty means the workflow responds to every trigger
    pub triggers: Vec<String>,
}

impl WorkflowDef {
    pub fn matches_trigger(&self, trigger: &str) -> bool {
        self.triggers.is_empty() || self.triggers.iter().any(|t| t == trigger)
    }
}

/// A pipeline: all declared jobs (templates expanded) plus the workflows
/// that schedule them, and the state of the current run
#[derive(Debug, Clone)]
pub struct Pipeline {
    /// Pipeline name
    pub name: String,

    /// All declared jobs in declaration order (templates first)
    jobs: Vec<Job>,

    /// Declared workflows
    workflows: Vec<WorkflowDef>,

    /// Execution state of the current run
    pub state: WorkflowState,
}

impl Pipeline {
    /// Build the domain model from a validated config
    pub fn from_config(config: &PipelineConfig) -> Self {
        let defaults = JobDefaults {
            timeout_secs: config
                .default_timeout_secs
                .unwrap_or_else(|| JobDefaults::default().timeout_secs),
        };

        let mut jobs = Vec::new();
        for template in &config.templates {
            for params in &template.params {
                jobs.push(Job::from_template(template, params, &defaults));
            }
        }
        for job_config in &config.jobs {
            jobs.push(Job::from_config(job_config, &defaults));
        }

        let workflows = config
            .workflows
            .iter()
            .map(|w| WorkflowDef {
                name: w.name.clone(),
                jobs: w.jobs.clone(),
                triggers: w.triggers.clone(),
            })
            .collect();

        Pipeline {
            name: config.name.clone(),
            jobs,
            workflows,
            state: WorkflowState::new(),
        }
    }

    /// All declared jobs in deterministic declaration order
    pub fn enumerate_jobs(&self) -> &[Job] {
        &self.jobs
    }

    /// Declared workflows
    pub fn workflows(&self) -> &[WorkflowDef] {
        &self.workflows
    }

    /// Get a job by id
    pub fn job(&self, id: &str) -> Option<&Job> {
        self.jobs.iter().find(|j| j.id == id)
    }

    /// Get a mutable job by id
    pub fn job_mut(&mut self, id: &str) -> Option<&mut Job> {
        self.jobs.iter_mut().find(|j| j.id == id)
    }

    /// Job ids selected for a trigger: the union of all matching workflows'
    /// job lists, deduplicated, in enumeration order
    pub fn select_workflow_jobs(&self, trigger: &str) -> Vec<String> {
        let selected: HashSet<&String> = self
            .workflows
            .iter()
            .filter(|w| w.matches_trigger(trigger))
            .flat_map(|w| w.jobs.iter())
            .collect();

        self.jobs
            .iter()
            .filter(|j| selected.contains(&j.id))
            .map(|j| j.id.clone())
            .collect()
    }

    /// Check if every selected job reached a terminal state
    pub fn is_complete(&self) -> bool {
        self.state.succeeded_jobs + self.state.failed_jobs >= self.state.total_jobs
            && self.state.total_jobs > 0
    }

    /// Check if any job failed
    pub fn has_failed(&self) -> bool {
        self.state.failed_jobs > 0 || self.state.status == ExecutionStatus::Failed
    }
}
