// src/main.rs

mod cli;

use clap::Parser;
use cli::{Args, Backend, Command, MiningArgs};
use git_burst::error::{Error, Result};
use git_burst::{GitCommand, History, LibGit, MiningSession, SessionReport, SourceLocation};
use indicatif::{ParallelProgressIterator, ProgressBar};
use rayon::prelude::*;
use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;

/// One compilation unit as supplied by the instrumentation layer.
#[derive(serde::Deserialize, Debug)]
struct Unit {
    name: String,
    blocks: Vec<Vec<SourceLocation>>,
}

#[derive(serde::Serialize, Debug)]
struct BlockLine<'a> {
    unit: &'a str,
    block: usize,
    selected: bool,
    fitness: f64,
}

type SharedHistory = Box<dyn History + Send + Sync>;

fn backend(kind: Backend) -> SharedHistory {
    match kind {
        Backend::Command => Box::new(GitCommand::default()),
        Backend::Libgit => Box::new(LibGit),
    }
}

fn score_unit(
    unit: &Unit,
    mining: &MiningArgs,
    history: &(dyn History + Send + Sync),
) -> Result<(Vec<(bool, f64)>, SessionReport)> {
    let mut session = MiningSession::new(mining.config(), history)?;
    let scores = unit
        .blocks
        .iter()
        .map(|block| {
            let score = session.score_block(block.iter().cloned());
            (score.selected, score.fitness)
        })
        .collect();
    Ok((scores, session.finish()))
}

fn score(input: &Path, mining: &MiningArgs) -> Result<()> {
    mining.config().validate()?;
    let units: Vec<Unit> = serde_json::from_str(&fs::read_to_string(input)?)?;
    let history = backend(mining.backend);

    let bar = ProgressBar::new(units.len() as u64);
    bar.set_message("Mining compilation units");

    let results = units
        .par_iter()
        .progress_with(bar)
        .map(|unit| score_unit(unit, mining, history.as_ref()))
        .collect::<Result<Vec<_>>>()?;

    for (unit, (scores, report)) in units.iter().zip(&results) {
        for (block, &(selected, fitness)) in scores.iter().enumerate() {
            let line = BlockLine {
                unit: &unit.name,
                block,
                selected,
                fitness,
            };
            println!("{}", serde_json::to_string(&line)?);
        }
        eprintln!(
            "{}: {} blocks, {} scored, {} selected (mean age {:.4}, mean churn {:.4}){}",
            unit.name,
            report.blocks,
            report.scored_blocks,
            report.selected_blocks,
            report.mean_age_best,
            report.mean_churn_best,
            if report.mining_disabled { ", mining disabled" } else { "" },
        );
    }
    Ok(())
}

fn lines(path: &Path, mining: &MiningArgs) -> Result<()> {
    let history = backend(mining.backend);
    let mut session = MiningSession::new(mining.config(), history.as_ref())?;
    let abs: PathBuf = fs::canonicalize(path)?;

    let Some(scores) = session.scores_for(&abs).cloned() else {
        let name = path.display().to_string();
        return Err(match session.disabled_reason() {
            Some(reason) => Error::mining_disabled(reason, name),
            None => Error::NoRepository(name),
        });
    };
    if !scores.exists {
        eprintln!("{} is not tracked at HEAD", path.display());
        return Ok(());
    }

    let numbers: BTreeSet<_> = scores
        .age
        .keys()
        .chain(scores.rank.keys())
        .chain(scores.churn.keys())
        .copied()
        .collect();
    println!("{:>6} {:>12} {:>12} {:>12}", "line", "age", "rank", "churn");
    for line in numbers {
        let cell = |v: Option<&f64>| v.map_or_else(|| "-".to_string(), |v| format!("{v:.6}"));
        println!(
            "{:>6} {:>12} {:>12} {:>12}",
            line,
            cell(scores.age.get(&line)),
            cell(scores.rank.get(&line)),
            cell(scores.churn.get(&line)),
        );
    }
    Ok(())
}

fn run(args: Args) -> Result<()> {
    match &args.command {
        Command::Score { input, mining } => score(input, mining),
        Command::Lines { path, mining } => lines(path, mining),
    }
}

fn main() {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(format!("git_burst={}", args.log_level))
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let start_time = Instant::now();
    if let Err(e) = run(args) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
    tracing::info!("Total time: {:.2?}", start_time.elapsed());
}
