// src/churn.rs

use crate::config::ChurnNormalization;
use crate::history::History;
use crate::model::{ChangeCounts, Hunk, LineNo, LineScores};
use crate::repo::RepoHandle;
use std::collections::BTreeSet;
use std::path::Path;
use tracing::debug;

/// Lines a revision added or changed, in that revision's own numbering.
pub fn changed_lines(hunks: &[Hunk]) -> BTreeSet<LineNo> {
    hunks.iter().flat_map(|h| h.new.lines()).collect()
}

/// Whether `hunk` sits entirely before old line `line`.
///
/// A zero-count old side `s,0` marks an insertion after line `s`.
fn precedes(hunk: &Hunk, line: LineNo) -> bool {
    if hunk.old.count == 0 {
        hunk.old.start < line
    } else {
        hunk.old.end() < line
    }
}

/// Carry the lines a revision changed over to HEAD's numbering and bump their counts.
///
/// `to_head` are the hunks of that revision diffed against HEAD. A changed line
/// inside a hunk's old side credits every line of the hunk's new side. A changed
/// line outside every hunk survived untouched and only moves by the net
/// displacement of the hunks above it; with no hunks at all it keeps its number.
pub fn project_onto_head(changed: &BTreeSet<LineNo>, to_head: &[Hunk], counts: &mut ChangeCounts) {
    for hunk in to_head {
        if hunk.old.lines().any(|l| changed.contains(&l)) {
            for line in hunk.new.lines() {
                *counts.entry(line).or_default() += 1;
            }
        }
    }

    for &line in changed {
        if to_head.iter().any(|h| h.old.contains(line)) {
            continue;
        }
        let shift: i64 = to_head
            .iter()
            .filter(|h| precedes(h, line))
            .map(Hunk::delta)
            .sum();
        match LineNo::try_from(line as i64 + shift) {
            Ok(target) if target > 0 => *counts.entry(target).or_default() += 1,
            _ => {}
        }
    }
}

/// Raw per-line edit counts for `file`, in HEAD's numbering.
pub fn count_changes<H: History>(
    history: &H,
    repo: &RepoHandle,
    file: &Path,
    since_months: Option<u32>,
) -> ChangeCounts {
    let mut counts = ChangeCounts::new();
    let revisions = history.revisions_touching(&repo.root, file, since_months);
    debug!(file = %file.display(), revisions = revisions.len(), "mining churn");

    for rev in &revisions {
        let changed = changed_lines(&history.revision_hunks(&repo.root, rev, file));
        if changed.is_empty() {
            continue;
        }
        let to_head = history.hunks_to_head(&repo.root, rev, file);
        project_onto_head(&changed, &to_head, &mut counts);
    }
    counts
}

/// Normalized churn score for every line of `file` that history ever touched.
pub fn mine<H: History>(
    history: &H,
    repo: &RepoHandle,
    file: &Path,
    since_months: Option<u32>,
    churn_fn: ChurnNormalization,
) -> LineScores {
    count_changes(history, repo, file, since_months)
        .into_iter()
        .map(|(line, count)| (line, churn_fn.apply(count)))
        .collect()
}
