use anyhow::{Context, Result};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{error, Level};
use tracing_subscriber::FmtSubscriber;

use conveyor::cli::commands::{HistoryCommand, JobsCommand, RunCommand, ValidateCommand};
use conveyor::cli::output::*;
use conveyor::cli::{Cli, Command};
use conveyor::core::config::PipelineConfig;
use conveyor::core::ExecutionStatus;
use conveyor::execution::{ExecutionEvent, WorkflowEngine};
use conveyor::persistence::{create_summary, ExecutionSummary, PersistenceBackend};
use conveyor::runner::LocalShellRunner;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::from_args();

    // Initialize logging
    let log_level = if cli.verbose { Level::DEBUG } else { Level::INFO };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .finish();
    tracing::subscriber::set_global_default(subscriber)
        .context("Failed to set logging subscriber")?;

    // Execute command
    match &cli.command {
        Command::Run(cmd) => run_workflow(cmd).await?,
        Command::Validate(cmd) => validate_pipeline(cmd)?,
        Command::Jobs(cmd) => list_jobs(cmd)?,
        Command::History(cmd) => show_history(cmd).await?,
    }

    Ok(())
}

#[cfg(feature = "sqlite")]
async fn open_store() -> Result<Arc<dyn PersistenceBackend>> {
    use conveyor::persistence::SqliteExecutionStore;
    Ok(Arc::new(SqliteExecutionStore::with_default_path().await?))
}

#[cfg(not(feature = "sqlite"))]
async fn open_store() -> Result<Arc<dyn PersistenceBackend>> {
    use conveyor::persistence::InMemoryPersistence;
    Ok(Arc::new(InMemoryPersistence::new()))
}

async fn run_workflow(cmd: &RunCommand) -> Result<()> {
    // Load pipeline definition
    let config = PipelineConfig::from_file(&cmd.file)
        .context("Failed to load pipeline definition")?;

    println!("{} Loaded pipeline: {}", INFO, style(&config.name).bold());

    let mut pipeline = config.to_pipeline();
    let selected = pipeline.select_workflow_jobs(&cmd.trigger);
    println!(
        "{} Trigger {} selects {} job(s)",
        INFO,
        style(&cmd.trigger).cyan(),
        style(selected.len()).cyan()
    );

    let store = if cmd.no_history {
        None
    } else {
        Some(open_store().await?)
    };

    // Create the engine over the local shell runner
    let runner = LocalShellRunner::default();
    let strategy = cmd.strategy.to_strategy(cmd.max_jobs);
    let workspace = PathBuf::from(&cmd.workspace);
    let engine = WorkflowEngine::new(runner, strategy, workspace);

    // Render events above a job progress bar
    let progress = create_progress_bar(selected.len());
    let bar = progress.clone();
    engine.add_event_handler(move |event| {
        bar.println(format_execution_event(&event));
        if matches!(
            event,
            ExecutionEvent::JobSucceeded { .. } | ExecutionEvent::JobFailed { .. }
        ) {
            bar.inc(1);
        }
    });

    // Execute
    println!();
    let result = engine.execute(&mut pipeline, &cmd.trigger).await;
    progress.finish_and_clear();

    // Save to history
    if let Some(store) = &store {
        let summary = create_summary(&pipeline, &cmd.trigger);
        store.save_execution(&summary).await?;
        println!(
            "\n{} Run saved to history (ID: {})",
            INFO,
            style(&summary.execution_id.to_string()[..8]).dim()
        );
    }

    // Print final status
    match result {
        Ok(ExecutionStatus::Succeeded) => {
            println!(
                "\n{} {} {}",
                CHECK,
                style(&pipeline.name).bold(),
                style("succeeded").green()
            );
            Ok(())
        }
        Ok(_) => {
            println!(
                "\n{} {} {} ({} of {} jobs failed)",
                CROSS,
                style(&pipeline.name).bold(),
                style("failed").red(),
                pipeline.state.failed_jobs,
                pipeline.state.total_jobs
            );
            std::process::exit(1);
        }
        Err(e) => {
            println!(
                "\n{} {} {}",
                CROSS,
                style(&pipeline.name).bold(),
                style("failed").red()
            );
            error!("{}", e);
            std::process::exit(1);
        }
    }
}

fn validate_pipeline(cmd: &ValidateCommand) -> Result<()> {
    println!("{} Validating pipeline...", INFO);

    let result = PipelineConfig::from_file(&cmd.file);

    match result {
        Ok(config) => {
            println!("{} Pipeline definition is valid!", CHECK);
            println!("  Name: {}", style(&config.name).bold());
            println!(
                "  Jobs: {} ({} from templates)",
                style(config.declared_job_ids().len()).cyan(),
                style(
                    config
                        .templates
                        .iter()
                        .map(|t| t.params.len())
                        .sum::<usize>()
                )
                .cyan()
            );
            println!("  Workflows: {}", style(config.workflows.len()).cyan());

            if cmd.json {
                let json = serde_json::to_string_pretty(&config)?;
                println!("\n{}", json);
            }
            Ok(())
        }
        Err(e) => {
            println!("{} Validation failed:", CROSS);
            println!("  {}", style(e).red());
            std::process::exit(1);
        }
    }
}

fn list_jobs(cmd: &JobsCommand) -> Result<()> {
    let config = PipelineConfig::from_file(&cmd.file)
        .context("Failed to load pipeline definition")?;
    let pipeline = config.to_pipeline();

    let selected: Vec<String> = match &cmd.trigger {
        Some(trigger) => pipeline.select_workflow_jobs(trigger),
        None => pipeline
            .enumerate_jobs()
            .iter()
            .map(|j| j.id.clone())
            .collect(),
    };

    if selected.is_empty() {
        println!("{} No jobs selected", WARN);
        return Ok(());
    }

    if cmd.json {
        let jobs: Vec<_> = selected
            .iter()
            .filter_map(|id| pipeline.job(id))
            .map(|job| {
                serde_json::json!({
                    "id": job.id,
                    "image": job.image,
                    "steps": job.steps.iter().map(|s| s.label()).collect::<Vec<_>>(),
                })
            })
            .collect();
        let data = serde_json::json!({ "pipeline": pipeline.name, "jobs": jobs });
        println!("{}", serde_json::to_string_pretty(&data)?);
        return Ok(());
    }

    println!("{} Jobs in {}:", INFO, style(&pipeline.name).bold());
    for id in &selected {
        if let Some(job) = pipeline.job(id) {
            println!(
                "  {} [{}] - {} step(s)",
                style(&job.id).bold(),
                style(&job.image).dim(),
                style(job.steps.len()).cyan()
            );
        }
    }

    Ok(())
}

async fn show_history(cmd: &HistoryCommand) -> Result<()> {
    let store = open_store().await?;

    // If a specific run is requested
    if let Some(exec_id_str) = &cmd.execution_id {
        let exec_id = uuid::Uuid::parse_str(exec_id_str)
            .context("Invalid execution ID format")?;
        let summary = store.load_execution(exec_id).await?;

        match summary {
            Some(summary) => {
                print_execution_details(&summary, cmd.verbose)?;
            }
            None => {
                println!("{} Run not found", WARN);
            }
        }
        return Ok(());
    }

    // List runs for a pipeline or across all pipelines
    let executions = if let Some(pipeline_name) = &cmd.pipeline {
        store.list_executions(pipeline_name).await?
    } else {
        let pipelines = store.list_pipelines().await?;
        let mut all_execs = Vec::new();
        for pipeline in &pipelines {
            all_execs.extend(store.list_executions(pipeline).await?);
        }
        // Sort by started_at descending
        all_execs.sort_by(|a, b| b.started_at.cmp(&a.started_at));
        all_execs.into_iter().take(cmd.limit).collect()
    };

    if executions.is_empty() {
        println!("{} No runs found", INFO);
        return Ok(());
    }

    println!("{} Run history (showing latest {}):", INFO, cmd.limit);

    if cmd.json {
        let data = serde_json::json!({ "executions": executions });
        println!("{}", serde_json::to_string_pretty(&data)?);
    } else {
        for summary in executions.iter().take(cmd.limit) {
            println!("  {}", format_execution_summary(summary));
        }
    }

    Ok(())
}

fn print_execution_details(summary: &ExecutionSummary, verbose: bool) -> Result<()> {
    println!("{} Run Details", INFO);
    println!("  ID: {}", style(summary.execution_id).cyan());
    println!("  Pipeline: {}", style(&summary.pipeline_name).bold());
    println!("  Trigger: {}", style(&summary.trigger).cyan());
    println!("  Status: {}", format_status(summary.status));
    println!("  Started: {}", style(summary.started_at.to_rfc3339()).dim());
    if let Some(completed) = summary.completed_at {
        println!("  Completed: {}", style(completed.to_rfc3339()).dim());
        if let Ok(duration) = completed.signed_duration_since(summary.started_at).to_std() {
            println!("  Duration: {}", style(format_duration(duration)).dim());
        }
    }
    println!(
        "  Jobs: {} succeeded, {} failed ({} total)",
        style(summary.succeeded_jobs).green(),
        style(summary.failed_jobs).red(),
        summary.total_jobs
    );

    if verbose {
        println!("\n  {}", style("Full details:").bold());
        let json = serde_json::to_string_pretty(summary)?;
        for line in json.lines() {
            println!("    {}", line);
        }
    }

    Ok(())
}
