// src/config.rs

use crate::error::ConfigError;
use std::fmt;
use std::str::FromStr;

/// Which line signals feed the block fitness.
#[derive(clap::ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum ScoringMode {
    /// Recency of each line's last edit
    Age,
    /// Revision distance between each line's origin and HEAD
    Rank,
    /// Number of historical edits projected onto each line
    Churn,
    #[value(name = "age+churn")]
    AgeChurn,
    #[value(name = "rank+churn")]
    RankChurn,
    /// Mining disabled; no block is scored
    None,
}

/// Which miner fills the age slot of a block aggregate.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AgeSignal {
    Days,
    Rank,
}

impl ScoringMode {
    pub fn age_signal(self) -> Option<AgeSignal> {
        match self {
            ScoringMode::Age | ScoringMode::AgeChurn => Some(AgeSignal::Days),
            ScoringMode::Rank | ScoringMode::RankChurn => Some(AgeSignal::Rank),
            ScoringMode::Churn | ScoringMode::None => None,
        }
    }

    pub fn uses_churn(self) -> bool {
        matches!(
            self,
            ScoringMode::Churn | ScoringMode::AgeChurn | ScoringMode::RankChurn
        )
    }

    pub fn is_enabled(self) -> bool {
        self != ScoringMode::None
    }
}

impl FromStr for ScoringMode {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "age" => Ok(ScoringMode::Age),
            "rank" => Ok(ScoringMode::Rank),
            "churn" => Ok(ScoringMode::Churn),
            "age+churn" => Ok(ScoringMode::AgeChurn),
            "rank+churn" => Ok(ScoringMode::RankChurn),
            "none" | "" => Ok(ScoringMode::None),
            other => Err(ConfigError::InvalidScoringMode(other.to_string())),
        }
    }
}

impl fmt::Display for ScoringMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ScoringMode::Age => "age",
            ScoringMode::Rank => "rank",
            ScoringMode::Churn => "churn",
            ScoringMode::AgeChurn => "age+churn",
            ScoringMode::RankChurn => "rank+churn",
            ScoringMode::None => "none",
        };
        f.write_str(name)
    }
}

/// How a raw per-line edit count becomes a churn score.
#[derive(clap::ValueEnum, Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum ChurnNormalization {
    /// log2(count + 1)
    #[default]
    Log,
    /// count
    Linear,
    /// count²
    Square,
    /// (count + 1) * log2(count + 1)
    Xlog,
}

impl ChurnNormalization {
    pub fn apply(self, count: u32) -> f64 {
        if count == 0 {
            return 0.0;
        }
        let c = count as f64;
        match self {
            ChurnNormalization::Log => (c + 1.0).log2(),
            ChurnNormalization::Linear => c,
            ChurnNormalization::Square => c * c,
            ChurnNormalization::Xlog => (c + 1.0) * (c + 1.0).log2(),
        }
    }
}

impl FromStr for ChurnNormalization {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "log" => Ok(ChurnNormalization::Log),
            "linear" => Ok(ChurnNormalization::Linear),
            "square" => Ok(ChurnNormalization::Square),
            "xlog" => Ok(ChurnNormalization::Xlog),
            other => Err(ConfigError::InvalidNormalization(other.to_string())),
        }
    }
}

impl fmt::Display for ChurnNormalization {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ChurnNormalization::Log => "log",
            ChurnNormalization::Linear => "linear",
            ChurnNormalization::Square => "square",
            ChurnNormalization::Xlog => "xlog",
        };
        f.write_str(name)
    }
}

/// Settings for one mining session.
#[derive(Debug, Clone, PartialEq)]
pub struct MinerConfig {
    pub mode: ScoringMode,
    pub churn_fn: ChurnNormalization,
    /// Only revisions from the last N months count towards churn
    pub since_months: Option<u32>,
    /// Chance, in percent, that an unremarkable block is still selected
    pub baseline_percent: u8,
    /// Fixed seed for the selection draw; `None` seeds from entropy
    pub seed: Option<u64>,
}

impl Default for MinerConfig {
    fn default() -> Self {
        Self {
            mode: ScoringMode::AgeChurn,
            churn_fn: ChurnNormalization::Log,
            since_months: None,
            baseline_percent: 10,
            seed: None,
        }
    }
}

impl MinerConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.baseline_percent > 100 {
            return Err(ConfigError::BaselineOutOfRange(self.baseline_percent as u32));
        }
        Ok(())
    }
}
