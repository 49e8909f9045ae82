// src/aggregate.rs
//
// Folding line scores into one fitness per block, and the selection gate.

use crate::age::age_score;
use crate::config::{AgeSignal, ChurnNormalization, ScoringMode};
use crate::model::BlockScore;
use crate::rank::rank_score;
use crate::repo::RepoHandle;

/// Lines last changed this many days before HEAD are considered recent.
pub const REFERENCE_AGE_DAYS: i64 = 180;
/// Revisions this many steps behind HEAD are considered recent.
pub const REFERENCE_RANK: i64 = 200;
/// Lines edited this many times are considered hot.
pub const REFERENCE_CHURN: u32 = 4;

/// Per-repository cut-offs, normalized exactly like live scores.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Thresholds {
    pub age: f64,
    pub rank: f64,
    pub churn: f64,
}

impl Thresholds {
    pub fn for_repository(repo: &RepoHandle, churn_fn: ChurnNormalization) -> Self {
        Self {
            age: age_score(REFERENCE_AGE_DAYS, repo.age_span_days),
            rank: rank_score(REFERENCE_RANK),
            churn: churn_fn.apply(REFERENCE_CHURN),
        }
    }

    pub fn age_slot(&self, signal: AgeSignal) -> f64 {
        match signal {
            AgeSignal::Days => self.age,
            AgeSignal::Rank => self.rank,
        }
    }
}

/// Best line scores seen so far in one block.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct BlockAggregate {
    /// Best age or rank score, whichever the mode mines
    pub age_best: f64,
    pub churn_best: f64,
    /// Whether any line contributed a score at all
    pub scored: bool,
}

impl BlockAggregate {
    pub fn observe(&mut self, age: Option<f64>, churn: Option<f64>) {
        if let Some(age) = age {
            self.age_best = self.age_best.max(age);
            self.scored = true;
        }
        if let Some(churn) = churn {
            self.churn_best = self.churn_best.max(churn);
            self.scored = true;
        }
    }
}

/// How the two best-of-block components become one raw fitness.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Combination {
    AgeOnly,
    ChurnOnly,
    /// `churn × age`, with a zero component standing in as 1
    Product,
}

/// Combination per scoring mode. `None` leaves blocks unscored.
pub const RULES: [(ScoringMode, Option<Combination>); 6] = [
    (ScoringMode::Age, Some(Combination::AgeOnly)),
    (ScoringMode::Rank, Some(Combination::AgeOnly)),
    (ScoringMode::Churn, Some(Combination::ChurnOnly)),
    (ScoringMode::AgeChurn, Some(Combination::Product)),
    (ScoringMode::RankChurn, Some(Combination::Product)),
    (ScoringMode::None, None),
];

fn neutral_if_zero(value: f64) -> f64 {
    if value == 0.0 {
        1.0
    } else {
        value
    }
}

impl Combination {
    pub fn for_mode(mode: ScoringMode) -> Option<Combination> {
        RULES
            .iter()
            .find(|(m, _)| *m == mode)
            .and_then(|(_, rule)| *rule)
    }

    pub fn combine(self, agg: &BlockAggregate) -> f64 {
        match self {
            Combination::AgeOnly => agg.age_best,
            Combination::ChurnOnly => agg.churn_best,
            Combination::Product => neutral_if_zero(agg.churn_best) * neutral_if_zero(agg.age_best),
        }
    }
}

/// Decide whether a block gets weighted instrumentation.
///
/// `draw_under_baseline` is consulted only when neither threshold is exceeded.
pub fn gate(
    mode: ScoringMode,
    agg: &BlockAggregate,
    thresholds: &Thresholds,
    draw_under_baseline: impl FnOnce() -> bool,
) -> BlockScore {
    let Some(rule) = Combination::for_mode(mode) else {
        return BlockScore::UNSELECTED;
    };
    if !agg.scored {
        return BlockScore::UNSELECTED;
    }
    let fitness = rule.combine(agg);
    if fitness <= 0.0 {
        return BlockScore::UNSELECTED;
    }

    let hot_churn = mode.uses_churn() && agg.churn_best > thresholds.churn;
    let recent = mode
        .age_signal()
        .is_some_and(|signal| agg.age_best > thresholds.age_slot(signal));

    if hot_churn || recent || draw_under_baseline() {
        BlockScore {
            selected: true,
            fitness,
        }
    } else {
        BlockScore::UNSELECTED
    }
}
