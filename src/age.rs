// src/age.rs

use crate::history::History;
use crate::model::LineScores;
use crate::repo::RepoHandle;
use std::path::Path;
use tracing::debug;

/// Freshness of a line last changed `days` before HEAD, in a repository whose
/// history spans `max_days`.
///
/// Recent lines score higher. A line changed on HEAD's day, or any line of a
/// repository younger than two days, scores 1. Lines as old as the repository
/// score 0.
pub fn age_score(days: i64, max_days: i64) -> f64 {
    if days <= 0 || max_days <= 1 {
        return 1.0;
    }
    let d = days as f64;
    let max = max_days as f64;
    ((max - d) / (d * (max - 1.0))).max(0.0)
}

/// Age score for every line of `file` at HEAD, from a single blame.
pub fn mine<H: History>(history: &H, repo: &RepoHandle, file: &Path) -> LineScores {
    let blame = history.blame(&repo.root, file);
    debug!(file = %file.display(), lines = blame.len(), "mining age");

    blame
        .iter()
        .filter_map(|line| {
            let ts = line.timestamp?;
            let days = repo.days_before_head(ts);
            Some((line.final_line, age_score(days, repo.age_span_days)))
        })
        .collect()
}
