// src/session.rs

use crate::aggregate::{self, BlockAggregate, Thresholds};
use crate::config::{AgeSignal, MinerConfig};
use crate::error::ConfigError;
use crate::history::History;
use crate::model::{BlockScore, LineNo, LineScores, SourceLocation};
use crate::rank::CommitRanks;
use crate::repo::{self, RepoHandle, Resolution};
use crate::{age, churn};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Cached scores of one file, keyed by HEAD line number.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FileScores {
    /// False when the file is not tracked at HEAD; the maps then stay empty
    pub exists: bool,
    pub churn: LineScores,
    pub age: LineScores,
    pub rank: LineScores,
}

/// Why history mining was switched off for a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DisabledReason {
    NoRepository,
    /// The clone holds a single revision
    ShallowHistory,
}

#[derive(Debug)]
enum RepoState {
    Unresolved,
    Disabled(DisabledReason),
    Ready {
        repo: RepoHandle,
        thresholds: Thresholds,
    },
}

/// Summary of a finished session.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SessionReport {
    pub blocks: usize,
    pub scored_blocks: usize,
    pub selected_blocks: usize,
    /// Mean best age (or rank) score over scored blocks
    pub mean_age_best: f64,
    /// Mean best churn score over scored blocks
    pub mean_churn_best: f64,
    pub files_mined: usize,
    pub files_missing: usize,
    pub revisions_ranked: usize,
    pub mining_disabled: bool,
}

/// All mining state for one compilation unit.
///
/// Files are mined lazily, the first time one of their lines is looked up, and
/// every result is kept until the session ends. Sessions share nothing, so
/// independent units can be mined concurrently with one session each.
pub struct MiningSession<H> {
    config: MinerConfig,
    history: H,
    state: RepoState,
    files: HashMap<PathBuf, FileScores>,
    ranks: CommitRanks,
    rng: StdRng,
    report: SessionReport,
    age_total: f64,
    churn_total: f64,
}

impl<H: History> MiningSession<H> {
    pub fn new(config: MinerConfig, history: H) -> Result<Self, ConfigError> {
        config.validate()?;
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Ok(Self {
            config,
            history,
            state: RepoState::Unresolved,
            files: HashMap::new(),
            ranks: CommitRanks::new(),
            rng,
            report: SessionReport::default(),
            age_total: 0.0,
            churn_total: 0.0,
        })
    }

    pub fn config(&self) -> &MinerConfig {
        &self.config
    }

    /// The resolved repository, once one has been found.
    pub fn repository(&self) -> Option<&RepoHandle> {
        match &self.state {
            RepoState::Ready { repo, .. } => Some(repo),
            _ => None,
        }
    }

    pub fn thresholds(&self) -> Option<&Thresholds> {
        match &self.state {
            RepoState::Ready { thresholds, .. } => Some(thresholds),
            _ => None,
        }
    }

    pub fn is_disabled(&self) -> bool {
        self.disabled_reason().is_some()
    }

    pub fn disabled_reason(&self) -> Option<DisabledReason> {
        match self.state {
            RepoState::Disabled(reason) => Some(reason),
            _ => None,
        }
    }

    /// Try to resolve the repository from `path`. Only the first conclusive
    /// attempt counts; afterwards this is a no-op.
    fn ensure_repository(&mut self, path: &Path) {
        if !matches!(self.state, RepoState::Unresolved) {
            return;
        }
        match repo::resolve(&self.history, path) {
            Resolution::Unreadable => {}
            Resolution::NotFound => {
                warn!(
                    path = %path.display(),
                    "no git repository found; history mining disabled"
                );
                self.state = RepoState::Disabled(DisabledReason::NoRepository);
            }
            Resolution::Shallow(handle) => {
                warn!(
                    root = %handle.root.display(),
                    "shallow repository clone with a single revision; history mining disabled"
                );
                self.state = RepoState::Disabled(DisabledReason::ShallowHistory);
            }
            Resolution::Found(handle) => {
                let thresholds = Thresholds::for_repository(&handle, self.config.churn_fn);
                debug!(?thresholds, "computed thresholds");
                self.state = RepoState::Ready {
                    repo: handle,
                    thresholds,
                };
            }
        }
    }

    /// Scores of the file at `rel` (relative to the repository root), mining
    /// it on first use.
    fn file_scores(&mut self, rel: &Path) -> Option<&FileScores> {
        let RepoState::Ready { repo, .. } = &self.state else {
            return None;
        };
        if !self.files.contains_key(rel) {
            let scores = mine_file(&self.history, repo, rel, &self.config, &mut self.ranks);
            if scores.exists {
                self.report.files_mined += 1;
            } else {
                debug!(file = %rel.display(), "not tracked at HEAD; skipping");
                self.report.files_missing += 1;
            }
            self.files.insert(rel.to_path_buf(), scores);
        }
        self.files.get(rel)
    }

    /// Canonical path of a location relative to the repository root.
    fn relative_path(&self, path: &Path) -> Option<PathBuf> {
        let repo = self.repository()?;
        let canonical = path.canonicalize().ok()?;
        repo.relative(&canonical)
    }

    /// Scores of the file behind an absolute or repository-relative path.
    pub fn scores_for(&mut self, path: &Path) -> Option<&FileScores> {
        if path.is_absolute() {
            self.ensure_repository(path);
            let rel = self.relative_path(path)?;
            self.file_scores(&rel)
        } else {
            self.file_scores(path)
        }
    }

    /// Fold one block's source locations into its fitness and selection decision.
    pub fn score_block<I>(&mut self, locations: I) -> BlockScore
    where
        I: IntoIterator<Item = SourceLocation>,
    {
        self.report.blocks += 1;
        if !self.config.mode.is_enabled() || self.is_disabled() {
            return BlockScore::UNSELECTED;
        }

        let age_signal = self.config.mode.age_signal();
        let uses_churn = self.config.mode.uses_churn();
        let mut seen: HashSet<(PathBuf, LineNo)> = HashSet::new();
        let mut rel_paths: HashMap<PathBuf, Option<PathBuf>> = HashMap::new();
        let mut agg = BlockAggregate::default();

        for loc in locations {
            let path = loc.joined_path();
            if !seen.insert((path.clone(), loc.line)) || loc.line == 0 {
                continue;
            }

            self.ensure_repository(&path);
            if self.is_disabled() {
                return BlockScore::UNSELECTED;
            }

            let rel = match rel_paths.get(&path) {
                Some(rel) => rel.clone(),
                None => {
                    let rel = self.relative_path(&path);
                    rel_paths.insert(path.clone(), rel.clone());
                    rel
                }
            };
            let Some(rel) = rel else { continue };
            let Some(scores) = self.file_scores(&rel) else {
                continue;
            };
            if !scores.exists {
                continue;
            }

            let age = age_signal.and_then(|signal| match signal {
                AgeSignal::Days => scores.age.get(&loc.line).copied(),
                AgeSignal::Rank => scores.rank.get(&loc.line).copied(),
            });
            let churn = if uses_churn {
                scores.churn.get(&loc.line).copied()
            } else {
                None
            };
            agg.observe(age, churn);
        }

        let Some(thresholds) = self.thresholds().copied() else {
            return BlockScore::UNSELECTED;
        };
        let baseline = self.config.baseline_percent as u32;
        let rng = &mut self.rng;
        let score = aggregate::gate(self.config.mode, &agg, &thresholds, || {
            rng.gen_range(0..100u32) < baseline
        });

        if agg.scored {
            self.report.scored_blocks += 1;
            self.age_total += agg.age_best;
            self.churn_total += agg.churn_best;
        }
        if score.selected {
            self.report.selected_blocks += 1;
        }
        score
    }

    /// Close the session and summarize it.
    pub fn finish(self) -> SessionReport {
        let mut report = self.report;
        if report.scored_blocks > 0 {
            report.mean_age_best = self.age_total / report.scored_blocks as f64;
            report.mean_churn_best = self.churn_total / report.scored_blocks as f64;
        }
        report.revisions_ranked = self.ranks.len();
        report.mining_disabled = matches!(self.state, RepoState::Disabled(_));

        info!(
            mode = %self.config.mode,
            blocks = report.blocks,
            scored = report.scored_blocks,
            selected = report.selected_blocks,
            mean_age = report.mean_age_best,
            mean_churn = report.mean_churn_best,
            "mining session finished"
        );
        report
    }
}

/// Populate every map the configured mode needs for one file.
fn mine_file<H: History>(
    history: &H,
    repo: &RepoHandle,
    rel: &Path,
    config: &MinerConfig,
    ranks: &mut CommitRanks,
) -> FileScores {
    if !history.exists_at_head(&repo.root, rel) {
        return FileScores::default();
    }
    let mut scores = FileScores {
        exists: true,
        ..Default::default()
    };
    match config.mode.age_signal() {
        Some(AgeSignal::Days) => scores.age = age::mine(history, repo, rel),
        Some(AgeSignal::Rank) => scores.rank = crate::rank::mine(history, repo, rel, ranks),
        None => {}
    }
    if config.mode.uses_churn() {
        scores.churn = churn::mine(history, repo, rel, config.since_months, config.churn_fn);
    }
    scores
}
