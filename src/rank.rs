// src/rank.rs

use crate::history::History;
use crate::model::{LineScores, RevisionId};
use crate::repo::RepoHandle;
use std::collections::HashMap;
use std::path::Path;
use tracing::debug;

/// Score for a revision `rank` revisions behind HEAD: 1 at HEAD, `1/rank` below it.
pub fn rank_score(rank: i64) -> f64 {
    if rank <= 0 {
        1.0
    } else {
        1.0 / rank as f64
    }
}

/// Rank scores by revision, shared by every file of a session.
///
/// Each revision's depth is asked of the history at most once, including
/// revisions whose depth could not be determined.
#[derive(Debug, Default)]
pub struct CommitRanks {
    ranks: HashMap<RevisionId, Option<f64>>,
}

impl CommitRanks {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn score<H: History>(&mut self, history: &H, repo: &RepoHandle, rev: &str) -> Option<f64> {
        if let Some(&cached) = self.ranks.get(rev) {
            return cached;
        }
        let score = history
            .revision_count(&repo.root, rev)
            .map(|depth| rank_score(repo.head_revisions as i64 - depth as i64));
        self.ranks.insert(rev.to_string(), score);
        score
    }

    /// Number of distinct revisions looked up so far.
    pub fn len(&self) -> usize {
        self.ranks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ranks.is_empty()
    }
}

/// Rank score for every line of `file` at HEAD.
pub fn mine<H: History>(
    history: &H,
    repo: &RepoHandle,
    file: &Path,
    ranks: &mut CommitRanks,
) -> LineScores {
    let blame = history.blame(&repo.root, file);
    debug!(file = %file.display(), lines = blame.len(), "mining rank");

    let mut scores = LineScores::with_capacity(blame.len());
    for line in &blame {
        if let Some(score) = ranks.score(history, repo, &line.revision) {
            scores.insert(line.final_line, score);
        }
    }
    scores
}
