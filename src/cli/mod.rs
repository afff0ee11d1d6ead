//! Command-line interface

pub mod commands;
pub mod output;

use clap::{Parser, Subcommand};
use commands::{HistoryCommand, JobsCommand, RunCommand, ValidateCommand};
use std::ffi::OsString;

/// Local CI workflow runner
#[derive(Debug, Parser, Clone)]
#[command(name = "conveyor")]
#[command(author = "Conveyor Contributors")]
#[command(version = "0.1.0")]
#[command(about = "Run declarative multi-job CI pipelines locally", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

/// Available commands
#[derive(Debug, Subcommand, Clone)]
pub enum Command {
    /// Run a pipeline's workflow for a trigger
    Run(RunCommand),

    /// Validate a pipeline definition
    Validate(ValidateCommand),

    /// List the jobs a pipeline declares
    Jobs(JobsCommand),

    /// Show run history
    History(HistoryCommand),
}

impl Cli {
    /// Parse CLI arguments from the environment
    pub fn from_args() -> Self {
        Self::parse()
    }

    /// Parse CLI arguments from a slice
    pub fn try_parse_from<I, T>(itr: I) -> Result<Self, clap::Error>
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString> + Clone,
    {
        <Self as Parser>::try_parse_from(itr)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_run_command() {
        let cli = Cli::try_parse_from([
            "conveyor",
            "run",
            "--file",
            "demos/audio-ci.yml",
            "--trigger",
            "pull_request",
            "--strategy",
            "sequential",
        ])
        .unwrap();

        match cli.command {
            Command::Run(cmd) => {
                assert_eq!(cmd.file, "demos/audio-ci.yml");
                assert_eq!(cmd.trigger, "pull_request");
            }
            other => panic!("Expected run command, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_jobs_command_defaults() {
        let cli = Cli::try_parse_from(["conveyor", "jobs", "-f", "ci.yml"]).unwrap();
        match cli.command {
            Command::Jobs(cmd) => {
                assert_eq!(cmd.file, "ci.yml");
                assert!(cmd.trigger.is_none());
                assert!(!cmd.json);
            }
            other => panic!("Expected jobs command, got {:?}", other),
        }
    }
}
