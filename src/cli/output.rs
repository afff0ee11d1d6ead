//! CLI output formatting

use console::Emoji;
use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

use crate::core::{ExecutionStatus, JobState};
use crate::execution::ExecutionEvent;
use crate::persistence::ExecutionSummary;

// Re-export style
pub use console::style;

// Emojis for output
pub static CHECK: Emoji<'_, '_> = Emoji("✅ ", "✓ ");
pub static CROSS: Emoji<'_, '_> = Emoji("❌ ", "✗ ");
pub static SPINNER: Emoji<'_, '_> = Emoji("⏳ ", "~ ");
pub static INFO: Emoji<'_, '_> = Emoji("ℹ️  ", "i ");
pub static WARN: Emoji<'_, '_> = Emoji("⚠️  ", "!");
pub static ROCKET: Emoji<'_, '_> = Emoji("🚀 ", "> ");
pub static SKIP: Emoji<'_, '_> = Emoji("⏭️  ", "- ");

/// Create a progress bar over the selected jobs
pub fn create_progress_bar(total: usize) -> ProgressBar {
    let progress = ProgressBar::new(total as u64);
    progress.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} jobs {msg}")
            .unwrap()
            .progress_chars("#>-"),
    );
    progress.enable_steady_tick(Duration::from_millis(100));
    progress
}

/// Format a job state for display
pub fn format_job_state(state: &JobState) -> String {
    match state {
        JobState::Pending => style("PENDING").dim().to_string(),
        JobState::Running { .. } => style("RUNNING").yellow().to_string(),
        JobState::Succeeded { .. } => style("SUCCEEDED").green().to_string(),
        JobState::Failed { .. } => style("FAILED").red().to_string(),
    }
}

/// Format an execution status for display
pub fn format_status(status: ExecutionStatus) -> String {
    match status {
        ExecutionStatus::Pending => style("PENDING").dim().to_string(),
        ExecutionStatus::Running => style("RUNNING").yellow().to_string(),
        ExecutionStatus::Succeeded => style("SUCCEEDED").green().to_string(),
        ExecutionStatus::Failed => style("FAILED").red().to_string(),
    }
}

/// Format a run summary for display
pub fn format_execution_summary(summary: &ExecutionSummary) -> String {
    let status_icon = match summary.status {
        ExecutionStatus::Succeeded => CHECK,
        ExecutionStatus::Failed => CROSS,
        ExecutionStatus::Running => SPINNER,
        _ => INFO,
    };

    format!(
        "{} {} - {} [{}] - {} ({}/{} jobs)",
        status_icon,
        style(&summary.execution_id.to_string()[..8]).dim(),
        style(&summary.pipeline_name).bold(),
        style(&summary.trigger).cyan(),
        format_status(summary.status),
        summary.succeeded_jobs + summary.failed_jobs,
        summary.total_jobs,
    )
}

/// Format an execution event for display
pub fn format_execution_event(event: &ExecutionEvent) -> String {
    match event {
        ExecutionEvent::WorkflowStarted {
            execution_id,
            pipeline_name,
            total_jobs,
        } => format!(
            "{} Starting {} ({}) - {} jobs",
            ROCKET,
            style(pipeline_name).bold(),
            style(&execution_id.to_string()[..8]).dim(),
            style(total_jobs).cyan()
        ),
        ExecutionEvent::JobStarted { job_id, image } => format!(
            "{} {} [{}]",
            SPINNER,
            style(job_id).cyan(),
            style(image).dim()
        ),
        ExecutionEvent::StepStarted { job_id, step } => format!(
            "   {} {}: {}",
            SPINNER,
            style(job_id).dim(),
            step
        ),
        ExecutionEvent::StepCompleted { job_id, step } => format!(
            "   {} {}: {}",
            CHECK,
            style(job_id).dim(),
            style(step).green()
        ),
        ExecutionEvent::StepFailed {
            job_id,
            step,
            error,
        } => format!(
            "   {} {}: {} ({})",
            CROSS,
            style(job_id).dim(),
            style(step).red(),
            style(error).dim()
        ),
        ExecutionEvent::StepSkipped { job_id, step } => format!(
            "   {} {}: {}",
            SKIP,
            style(job_id).dim(),
            style(step).dim()
        ),
        ExecutionEvent::JobSucceeded { job_id } => {
            format!("{} {}", CHECK, style(job_id).green())
        }
        ExecutionEvent::JobFailed { job_id, error } => {
            format!("{} {}: {}", CROSS, style(job_id).red(), style(error).dim())
        }
        ExecutionEvent::WorkflowCompleted {
            execution_id,
            status,
        } => {
            let status_str = match status {
                ExecutionStatus::Succeeded => style("succeeded").green().to_string(),
                ExecutionStatus::Failed => style("failed").red().to_string(),
                other => format!("{:?}", other),
            };
            format!(
                "{} Workflow ({}) {}",
                INFO,
                style(&execution_id.to_string()[..8]).dim(),
                status_str
            )
        }
    }
}

/// Format a duration for display
pub fn format_duration(duration: std::time::Duration) -> String {
    let secs = duration.as_secs();
    if secs < 60 {
        format!("{}s", secs)
    } else if secs < 3600 {
        format!("{}m {}s", secs / 60, secs % 60)
    } else {
        format!("{}h {}m {}s", secs / 3600, (secs % 3600) / 60, secs % 60)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(Duration::from_secs(42)), "42s");
        assert_eq!(format_duration(Duration::from_secs(90)), "1m 30s");
        assert_eq!(format_duration(Duration::from_secs(3725)), "1h 2m 5s");
    }
}
