// src/error.rs

use crate::session::DisabledReason;
use thiserror::Error;

/// Misconfiguration detected when a session is set up. These are fatal.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Unknown scoring mode `{0}` (expected age, rank, churn, age+churn, rank+churn or none)")]
    InvalidScoringMode(String),

    #[error("Unknown churn function `{0}` (expected log, linear, square or xlog)")]
    InvalidNormalization(String),

    #[error("Baseline percentage {0} is out of range (must be between 0 and 100)")]
    BaselineOutOfRange(u32),
}

/// Errors surfaced by the command-line front end.
#[derive(Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Malformed input: {0}")]
    Json(#[from] serde_json::Error),

    #[error("No git repository found for {0}")]
    NoRepository(String),

    #[error("Repository for {0} is a shallow clone with a single revision")]
    ShallowHistory(String),
}

impl Error {
    /// The error reported when a session turned mining off while scoring `path`.
    pub fn mining_disabled(reason: DisabledReason, path: impl Into<String>) -> Self {
        match reason {
            DisabledReason::NoRepository => Error::NoRepository(path.into()),
            DisabledReason::ShallowHistory => Error::ShallowHistory(path.into()),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
