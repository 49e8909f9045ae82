//! Git history mining for line-level risk scores.
//!
//! Every source line gets an age (or rank) score from when it last changed and a
//! churn score from how often history touched it. A [`MiningSession`] folds the
//! scores of a block's lines into one fitness value and decides whether the
//! block deserves weighted instrumentation.

pub mod age;
pub mod aggregate;
pub mod churn;
pub mod config;
pub mod error;
pub mod history;
pub mod model;
pub mod parse;
pub mod rank;
pub mod repo;
pub mod session;

pub use config::{ChurnNormalization, MinerConfig, ScoringMode};
pub use error::{ConfigError, Error};
pub use history::{GitCommand, History, LibGit};
pub use model::{BlockScore, SourceLocation};
pub use session::{DisabledReason, FileScores, MiningSession, SessionReport};
