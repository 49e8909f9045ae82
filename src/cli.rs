// src/cli.rs

use clap::{Args as ClapArgs, Parser, Subcommand};
use git_burst::config::{ChurnNormalization, MinerConfig, ScoringMode};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(author, version, about = "Score source lines and blocks by git age and churn", long_about = None)]
pub struct Args {
    #[command(subcommand)]
    pub command: Command,

    /// Log level for the mining engine (error, warn, info, debug, trace)
    #[arg(long, global = true, default_value = "warn")]
    pub log_level: String,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Score every block of the compilation units described in a JSON file
    Score {
        /// JSON array of units: `[{"name": .., "blocks": [[{"file", "dir", "line"}, ..], ..]}]`
        #[arg(short, long)]
        input: PathBuf,

        #[command(flatten)]
        mining: MiningArgs,
    },
    /// Print the per-line scores of a single file
    Lines {
        /// Source file inside a git repository
        path: PathBuf,

        #[command(flatten)]
        mining: MiningArgs,
    },
}

#[derive(ClapArgs, Debug, Clone)]
pub struct MiningArgs {
    /// Which history signals to use
    #[arg(long, value_enum, default_value_t = ScoringMode::AgeChurn)]
    pub mode: ScoringMode,

    /// How raw edit counts become churn scores
    #[arg(long, value_enum, default_value_t = ChurnNormalization::Log)]
    pub churn_fn: ChurnNormalization,

    /// Only count revisions from the last N months towards churn
    #[arg(long)]
    pub since_months: Option<u32>,

    /// Percentage of unremarkable blocks selected at random
    #[arg(long, default_value_t = 10, value_parser = clap::value_parser!(u8).range(1..=100))]
    pub baseline: u8,

    /// Seed for the random selection, for reproducible runs
    #[arg(long)]
    pub seed: Option<u64>,

    /// How history is queried
    #[arg(long, value_enum, default_value_t = Backend::Command)]
    pub backend: Backend,
}

#[derive(clap::ValueEnum, Clone, Debug, Copy, PartialEq, Eq)]
pub enum Backend {
    /// Spawn the `git` binary for every query
    Command,
    /// Read the object database in-process through libgit2
    Libgit,
}

impl MiningArgs {
    pub fn config(&self) -> MinerConfig {
        MinerConfig {
            mode: self.mode,
            churn_fn: self.churn_fn,
            since_months: self.since_months,
            baseline_percent: self.baseline,
            seed: self.seed,
        }
    }
}
