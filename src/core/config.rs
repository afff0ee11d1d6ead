//! Pipeline definition loaded from YAML

use anyhow::Result;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::path::Path;
use std::sync::OnceLock;

use crate::core::job::render_placeholders;
use crate::core::Pipeline;

/// Container image references look like `name[:tag]`, e.g.
/// `circleci/python:3.7`. The local runner does not pull images, but the
/// descriptor is the job's declared environment contract and must be
/// well-formed.
fn image_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^[A-Za-z0-9][A-Za-z0-9._/-]*(:[A-Za-z0-9._-]+)?$")
            .expect("image reference pattern is valid")
    })
}

/// Top-level pipeline definition loaded from YAML
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Pipeline name
    pub name: String,

    /// Definition version (optional, informational)
    #[serde(default)]
    pub version: Option<String>,

    /// Parameterized job templates (e.g. an interpreter-version matrix)
    #[serde(default)]
    pub templates: Vec<JobTemplateConfig>,

    /// Literal job definitions
    #[serde(default)]
    pub jobs: Vec<JobConfig>,

    /// Workflows: which jobs run together for a trigger
    pub workflows: Vec<WorkflowConfig>,

    /// Default timeout for a single step (in seconds)
    #[serde(default)]
    pub default_timeout_secs: Option<u64>,
}

/// A single job as defined in YAML
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobConfig {
    /// Unique job identifier
    pub id: String,

    /// Execution environment descriptor (container image reference)
    pub image: String,

    /// Ordered steps; must be non-empty
    #[serde(with = "serde_yaml::with::singleton_map_recursive")]
    pub steps: Vec<StepConfig>,

    /// Per-step timeout for this job (overrides the global default)
    #[serde(default)]
    pub timeout_secs: Option<u64>,
}

/// One step of a job: a built-in action or a named shell command
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepConfig {
    /// Built-in: make the source checkout available in the workspace
    Checkout,

    /// Shell command with a human-readable name
    Run { name: String, command: String },

    /// Built-in: hand a coverage report to the upload collaborator
    UploadCoverage {
        path: String,
        #[serde(default)]
        config: Option<String>,
    },
}

/// A parameterized job template
///
/// `id`, `image`, and step strings may contain `{{ param }}` placeholders.
/// Each entry in `params` instantiates one concrete job, so near-identical
/// jobs (an interpreter-version test matrix) are declared once and the
/// "same steps, different parameter" invariant holds by construction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobTemplateConfig {
    /// Job id template, e.g. `test-{{ version }}`
    pub id: String,

    /// Image template, e.g. `circleci/python:{{ version }}`
    pub image: String,

    /// One map of placeholder values per instantiated job
    pub params: Vec<BTreeMap<String, String>>,

    /// Shared step list (placeholders allowed in names and commands)
    #[serde(with = "serde_yaml::with::singleton_map_recursive")]
    pub steps: Vec<StepConfig>,

    /// Per-step timeout for instantiated jobs
    #[serde(default)]
    pub timeout_secs: Option<u64>,
}

/// A named workflow listing the jobs it schedules
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkflowConfig {
    /// Workflow name
    pub name: String,

    /// Job ids to run; all are mutually independent
    pub jobs: Vec<String>,

    /// Triggers this workflow responds to (empty = every trigger)
    #[serde(default, rename = "on")]
    pub triggers: Vec<String>,
}

impl PipelineConfig {
    /// Load a pipeline definition from a YAML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    /// Parse a pipeline definition from a YAML string
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let config: PipelineConfig = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// All job ids the definition declares, templates expanded, in
    /// declaration order (templates first, then literal jobs)
    pub fn declared_job_ids(&self) -> Vec<String> {
        let mut ids = Vec::new();
        for template in &self.templates {
            for params in &template.params {
                ids.push(render_placeholders(&template.id, params));
            }
        }
        for job in &self.jobs {
            ids.push(job.id.clone());
        }
        ids
    }

    /// Validate the pipeline definition
    pub fn validate(&self) -> Result<()> {
        // Expanded job ids must be unique
        let declared = self.declared_job_ids();
        let mut seen_ids = HashSet::new();
        for id in &declared {
            if !seen_ids.insert(id) {
                anyhow::bail!("Duplicate job id: {}", id);
            }
        }

        for template in &self.templates {
            self.validate_template(template)?;
        }

        for job in &self.jobs {
            if job.id.contains("{{") {
                anyhow::bail!("Job '{}' has an unbound placeholder in its id", job.id);
            }
            Self::validate_image(&job.id, &job.image)?;
            Self::validate_steps(&job.id, &job.steps)?;
        }

        // Workflow names must be unique and there must be at least one
        if self.workflows.is_empty() {
            anyhow::bail!("Pipeline defines no workflows");
        }
        let mut seen_workflows = HashSet::new();
        for workflow in &self.workflows {
            if !seen_workflows.insert(&workflow.name) {
                anyhow::bail!("Duplicate workflow name: {}", workflow.name);
            }
        }

        // Every workflow job must reference a defined job, at most once
        let declared_set: HashSet<&String> = declared.iter().collect();
        for workflow in &self.workflows {
            if workflow.jobs.is_empty() {
                anyhow::bail!("Workflow '{}' lists no jobs", workflow.name);
            }
            let mut listed = HashSet::new();
            for job_id in &workflow.jobs {
                if !declared_set.contains(job_id) {
                    anyhow::bail!(
                        "Workflow '{}' lists undefined job '{}'",
                        workflow.name,
                        job_id
                    );
                }
                if !listed.insert(job_id) {
                    anyhow::bail!(
                        "Workflow '{}' lists job '{}' more than once",
                        workflow.name,
                        job_id
                    );
                }
            }
        }

        // No job definition may be orphaned (declared but never scheduled)
        let scheduled: HashSet<&String> = self
            .workflows
            .iter()
            .flat_map(|w| w.jobs.iter())
            .collect();
        for id in &declared {
            if !scheduled.contains(id) {
                anyhow::bail!("Job '{}' is defined but not listed in any workflow", id);
            }
        }

        Ok(())
    }

    fn validate_template(&self, template: &JobTemplateConfig) -> Result<()> {
        if template.params.is_empty() {
            anyhow::bail!("Template '{}' has no params entries", template.id);
        }

        for params in &template.params {
            let id = render_placeholders(&template.id, params);
            if id.contains("{{") {
                anyhow::bail!(
                    "Template '{}' leaves an unbound placeholder in job id '{}'",
                    template.id,
                    id
                );
            }

            let image = render_placeholders(&template.image, params);
            if image.contains("{{") {
                anyhow::bail!(
                    "Template '{}' leaves an unbound placeholder in image '{}'",
                    template.id,
                    image
                );
            }
            Self::validate_image(&id, &image)?;

            for step in &template.steps {
                if let StepConfig::Run { name, command } = step {
                    let rendered = render_placeholders(command, params);
                    if rendered.contains("{{") {
                        anyhow::bail!(
                            "Template '{}' step '{}' leaves an unbound placeholder",
                            template.id,
                            name
                        );
                    }
                }
            }
            Self::validate_steps(&id, &template.steps)?;
        }

        Ok(())
    }

    fn validate_image(job_id: &str, image: &str) -> Result<()> {
        if !image_regex().is_match(image) {
            anyhow::bail!(
                "Job '{}' has a malformed image reference '{}'",
                job_id,
                image
            );
        }
        Ok(())
    }

    fn validate_steps(job_id: &str, steps: &[StepConfig]) -> Result<()> {
        if steps.is_empty() {
            anyhow::bail!("Job '{}' has an empty step list", job_id);
        }
        for step in steps {
            match step {
                StepConfig::Run { name, command } => {
                    if name.trim().is_empty() {
                        anyhow::bail!("Job '{}' has a run step with an empty name", job_id);
                    }
                    if command.trim().is_empty() {
                        anyhow::bail!(
                            "Job '{}' step '{}' has an empty command",
                            job_id,
                            name
                        );
                    }
                }
                StepConfig::UploadCoverage { path, .. } => {
                    if path.trim().is_empty() {
                        anyhow::bail!(
                            "Job '{}' has an upload_coverage step with an empty path",
                            job_id
                        );
                    }
                }
                StepConfig::Checkout => {}
            }
        }
        Ok(())
    }

    /// Convert the definition to a Pipeline domain model
    pub fn to_pipeline(&self) -> Pipeline {
        Pipeline::from_config(self)
    }
}
