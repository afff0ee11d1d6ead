//! Job and step domain models

use std::collections::BTreeMap;
use std::path::PathBuf;

use crate::core::config::{JobConfig, JobTemplateConfig, StepConfig};
use crate::core::state::JobState;

/// Substitute `{{ name }}` placeholders in a template string
pub fn render_placeholders(template: &str, params: &BTreeMap<String, String>) -> String {
    let mut rendered = template.to_string();
    for (key, value) in params {
        let placeholder = format!("{{{{ {} }}}}", key);
        rendered = rendered.replace(&placeholder, value);
    }
    rendered
}

/// A single step of a job
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Step {
    /// Make the source checkout available in the workspace
    Checkout,

    /// Named shell command
    Run { name: String, command: String },

    /// Hand a coverage report to the upload collaborator
    UploadCoverage {
        path: PathBuf,
        config: Option<PathBuf>,
    },
}

impl Step {
    /// Display label for logs and events
    pub fn label(&self) -> String {
        match self {
            Step::Checkout => "checkout".to_string(),
            Step::Run { name, .. } => name.clone(),
            Step::UploadCoverage { .. } => "upload coverage".to_string(),
        }
    }

    fn from_config(config: &StepConfig, params: &BTreeMap<String, String>) -> Self {
        match config {
            StepConfig::Checkout => Step::Checkout,
            StepConfig::Run { name, command } => Step::Run {
                name: render_placeholders(name, params),
                command: render_placeholders(command, params),
            },
            StepConfig::UploadCoverage { path, config } => Step::UploadCoverage {
                path: PathBuf::from(render_placeholders(path, params)),
                config: config
                    .as_ref()
                    .map(|c| PathBuf::from(render_placeholders(c, params))),
            },
        }
    }
}

/// Defaults applied to jobs that do not override them
#[derive(Debug, Clone)]
pub struct JobDefaults {
    /// Per-step timeout in seconds
    pub timeout_secs: u64,
}

impl Default for JobDefaults {
    fn default() -> Self {
        Self {
            timeout_secs: 3600, // 1 hour per step
        }
    }
}

/// A concrete job: an independently scheduled unit with its own environment
#[derive(Debug, Clone)]
pub struct Job {
    /// Unique job identifier
    pub id: String,

    /// Execution environment descriptor (container image reference)
    pub image: String,

    /// Ordered steps
    pub steps: Vec<Step>,

    /// Per-step timeout in seconds
    pub timeout_secs: u64,

    /// Runtime state
    pub state: JobState,
}

impl Job {
    /// Create a job from a literal job config
    pub fn from_config(config: &JobConfig, defaults: &JobDefaults) -> Self {
        let no_params = BTreeMap::new();
        Job {
            id: config.id.clone(),
            image: config.image.clone(),
            steps: config
                .steps
                .iter()
                .map(|s| Step::from_config(s, &no_params))
                .collect(),
            timeout_secs: config.timeout_secs.unwrap_or(defaults.timeout_secs),
            state: JobState::Pending,
        }
    }

    /// Instantiate one job from a template and a params entry
    pub fn from_template(
        template: &JobTemplateConfig,
        params: &BTreeMap<String, String>,
        defaults: &JobDefaults,
    ) -> Self {
        Job {
            id: render_placeholders(&template.id, params),
            image: render_placeholders(&template.image, params),
            steps: template
                .steps
                .iter()
                .map(|s| Step::from_config(s, params))
                .collect(),
            timeout_secs: template.timeout_secs.unwrap_or(defaults.timeout_secs),
            state: JobState::Pending,
        }
    }
}
