//! CLI command definitions

use clap::Args;

use crate::execution::SchedulingStrategy;

/// Run a pipeline's workflow for a trigger
#[derive(Debug, Args, Clone)]
pub struct RunCommand {
    /// Path to pipeline YAML file
    #[arg(short, long)]
    pub file: String,

    /// Trigger event selecting the workflow(s) to run
    #[arg(short, long, default_value = "push")]
    pub trigger: String,

    /// Workspace directory shared (read-only) by all jobs
    #[arg(short, long, default_value = ".")]
    pub workspace: String,

    /// Scheduling strategy
    #[arg(long, value_enum, default_value_t = SchedulingStrategyArg::Parallel)]
    pub strategy: SchedulingStrategyArg,

    /// Maximum concurrent jobs (only with --strategy parallel-limited)
    #[arg(long, default_value_t = 4)]
    pub max_jobs: usize,

    /// Don't save the run to history
    #[arg(long)]
    pub no_history: bool,
}

/// Validate a pipeline definition
#[derive(Debug, Args, Clone)]
pub struct ValidateCommand {
    /// Path to pipeline YAML file
    #[arg(short, long)]
    pub file: String,

    /// Output in JSON format
    #[arg(long)]
    pub json: bool,
}

/// List the jobs a pipeline declares
#[derive(Debug, Args, Clone)]
pub struct JobsCommand {
    /// Path to pipeline YAML file
    #[arg(short, long)]
    pub file: String,

    /// Only show jobs a trigger would select
    #[arg(short, long)]
    pub trigger: Option<String>,

    /// Output in JSON format
    #[arg(long)]
    pub json: bool,
}

/// Show run history
#[derive(Debug, Args, Clone)]
pub struct HistoryCommand {
    /// Pipeline name to filter by
    #[arg(short, long)]
    pub pipeline: Option<String>,

    /// Number of recent runs to show
    #[arg(short, long, default_value_t = 10)]
    pub limit: usize,

    /// Show full details
    #[arg(long)]
    pub verbose: bool,

    /// Output in JSON format
    #[arg(long)]
    pub json: bool,

    /// Show a specific run by execution ID
    #[arg(long)]
    pub execution_id: Option<String>,
}

/// Scheduling strategy argument
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum SchedulingStrategyArg {
    Parallel,
    Sequential,
    #[clap(name = "parallel-limited")]
    ParallelLimited,
}

impl SchedulingStrategyArg {
    /// Convert to the engine's strategy, applying the job cap
    pub fn to_strategy(self, max_jobs: usize) -> SchedulingStrategy {
        match self {
            SchedulingStrategyArg::Parallel => SchedulingStrategy::Parallel,
            SchedulingStrategyArg::Sequential => SchedulingStrategy::Sequential,
            SchedulingStrategyArg::ParallelLimited => SchedulingStrategy::LimitedParallel(max_jobs),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strategy_conversion() {
        assert_eq!(
            SchedulingStrategyArg::Parallel.to_strategy(4),
            SchedulingStrategy::Parallel
        );
        assert_eq!(
            SchedulingStrategyArg::Sequential.to_strategy(4),
            SchedulingStrategy::Sequential
        );
        assert_eq!(
            SchedulingStrategyArg::ParallelLimited.to_strategy(2),
            SchedulingStrategy::LimitedParallel(2)
        );
    }
}
