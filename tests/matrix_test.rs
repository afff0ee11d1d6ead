//! End-to-end run of the full demo catalog: a three-version test matrix
//! from one template, plus literal formatting and type-check jobs.

use async_trait::async_trait;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use conveyor::core::config::PipelineConfig;
use conveyor::core::{ExecutionStatus, JobState, Step, StepStatus};
use conveyor::execution::{SchedulingStrategy, WorkflowEngine};
use conveyor::runner::{CommandOutput, CommandRunner, RunnerError};

/// Runner that succeeds at everything except a configured set of
/// commands, recording every command it sees.
struct RecordingRunner {
    failing: HashSet<String>,
    seen: Arc<Mutex<Vec<String>>>,
}

impl RecordingRunner {
    fn new(failing: &[&str]) -> Self {
        Self {
            failing: failing.iter().map(|s| s.to_string()).collect(),
            seen: Arc::new(Mutex::new(Vec::new())),
        }
    }
}

#[async_trait]
impl CommandRunner for RecordingRunner {
    async fn provision(&self, _image: &str) -> Result<(), RunnerError> {
        Ok(())
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
        self.seen.lock().unwrap().push(command.to_string());
        let code = if self.failing.contains(command) { 1 } else { 0 };
        Ok(CommandOutput {
            exit_code: Some(code),
            stdout: String::new(),
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

fn demo_pipeline() -> conveyor::core::Pipeline {
    let path = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("demos/audio-ci.yml");
    PipelineConfig::from_file(&path)
        .expect("demo pipeline should load")
        .to_pipeline()
}

#[test]
fn demo_catalog_expands_to_five_jobs() {
    let pipeline = demo_pipeline();
    let ids: Vec<&str> = pipeline
        .enumerate_jobs()
        .iter()
        .map(|j| j.id.as_str())
        .collect();
    assert_eq!(
        ids,
        vec!["test-3.6", "test-3.7", "test-3.8", "format", "typecheck"]
    );
}

/// The matrix jobs must be identical except where a param reaches.
#[test]
fn matrix_jobs_differ_only_in_version_derived_fields() {
    let pipeline = demo_pipeline();
    let versions = [("3.6", "py36"), ("3.7", "py37"), ("3.8", "py38")];

    for (version, target) in versions {
        let job = pipeline
            .job(&format!("test-{}", version))
            .expect("matrix job should exist");
        assert_eq!(job.image, format!("circleci/python:{}", version));
        assert_eq!(job.steps.len(), 5);
        assert_eq!(job.steps[0], Step::Checkout);

        match &job.steps[3] {
            Step::Run { name, command } => {
                assert_eq!(name, "run tests");
                assert_eq!(command, &format!("tox -e {}", target));
            }
            other => panic!("Expected a run step, got {:?}", other),
        }

        match &job.steps[4] {
            Step::UploadCoverage { path, config } => {
                assert_eq!(path, &PathBuf::from("coverage.xml"));
                assert_eq!(config.as_deref(), Some(Path::new(".codecov.yml")));
            }
            other => panic!("Expected an upload step, got {:?}", other),
        }
    }

    // The non-version steps are byte-identical across the matrix
    let a = &pipeline.job("test-3.6").unwrap().steps[1..3];
    let b = &pipeline.job("test-3.7").unwrap().steps[1..3];
    let c = &pipeline.job("test-3.8").unwrap().steps[1..3];
    assert_eq!(a, b);
    assert_eq!(b, c);
}

#[tokio::test]
async fn full_catalog_run_succeeds() {
    let mut pipeline = demo_pipeline();
    let engine = WorkflowEngine::new(
        RecordingRunner::new(&[]),
        SchedulingStrategy::Parallel,
        PathBuf::from("."),
    );

    let status = engine.execute(&mut pipeline, "push").await.unwrap();
    assert_eq!(status, ExecutionStatus::Succeeded);
    assert_eq!(pipeline.state.succeeded_jobs, 5);
    assert_eq!(pipeline.state.failed_jobs, 0);
    assert_eq!(pipeline.state.progress(), 1.0);
}

#[tokio::test]
async fn one_broken_interpreter_version_fails_only_its_own_job() {
    let mut pipeline = demo_pipeline();
    let engine = WorkflowEngine::new(
        RecordingRunner::new(&["tox -e py37"]),
        SchedulingStrategy::Parallel,
        PathBuf::from("."),
    );

    let status = engine.execute(&mut pipeline, "push").await.unwrap();
    assert_eq!(status, ExecutionStatus::Failed);
    assert_eq!(pipeline.state.succeeded_jobs, 4);
    assert_eq!(pipeline.state.failed_jobs, 1);

    for id in ["test-3.6", "test-3.8", "format", "typecheck"] {
        assert!(
            matches!(pipeline.job(id).unwrap().state, JobState::Succeeded { .. }),
            "{} should be unaffected",
            id
        );
    }

    // The broken job skipped its coverage upload
    match &pipeline.job("test-3.7").unwrap().state {
        JobState::Failed { steps, .. } => {
            assert!(matches!(steps[3].status, StepStatus::Failed { .. }));
            assert_eq!(steps[4].status, StepStatus::Skipped);
        }
        other => panic!("Expected test-3.7 to fail, got {:?}", other),
    }
}

#[tokio::test]
async fn sequential_run_executes_each_jobs_commands_in_order() {
    let mut pipeline = demo_pipeline();
    let runner = RecordingRunner::new(&[]);
    let seen = runner.seen.clone();
    let engine = WorkflowEngine::new(runner, SchedulingStrategy::Sequential, PathBuf::from("."));

    engine.execute(&mut pipeline, "push").await.unwrap();

    let seen = seen.lock().unwrap();
    // Three matrix jobs, three run steps each; two literal jobs, two each
    assert_eq!(seen.len(), 3 * 3 + 2 * 2);

    // Within a job the commands keep their declared order
    let py36_install = seen.iter().position(|c| c == "sudo pip install tox");
    let py36_tox = seen.iter().position(|c| c == "tox -e py36");
    assert!(py36_install.unwrap() < py36_tox.unwrap());
}
