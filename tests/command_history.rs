//! The subprocess backend against real repositories. Skipped without a `git` binary.

mod common;

use common::{renamed, shallow, three_revisions, DAY, START};
use git_burst::history::HEAD;
use git_burst::{GitCommand, History, LibGit, MinerConfig, MiningSession, ScoringMode, SourceLocation};
use std::path::Path;

fn git() -> Option<GitCommand> {
    let git = GitCommand::default();
    if git.is_available() {
        Some(git)
    } else {
        eprintln!("git binary not found; skipping");
        None
    }
}

#[test]
fn gateway_returns_first_token_or_nothing() {
    let Some(git) = git() else { return };
    let h = three_revisions();
    let root = h.repo.root();

    assert_eq!(git.token(&root, &["rev-list", "--count", "HEAD"]).as_deref(), Some("3"));
    assert_eq!(git.token(&root, &["rev-parse", "--verify", "no-such-ref"]), None);
    assert_eq!(git.token(&root, &["log", "--format=", "-n", "1"]), None);
}

#[test]
fn backends_agree() {
    let Some(git) = git() else { return };
    let h = three_revisions();
    let root = h.repo.root();
    let file = Path::new("a.c");
    let first = h.first.to_string();

    assert_eq!(git.toplevel(&root).map(|p| p.canonicalize().unwrap()), Some(root.clone()));
    assert_eq!(git.revision_count(&root, HEAD), LibGit.revision_count(&root, HEAD));
    assert_eq!(git.commit_time(&root, HEAD), Some(START + 200 * DAY));
    assert_eq!(git.first_commit_time(&root), Some(START));
    assert!(git.exists_at_head(&root, file));
    assert!(!git.exists_at_head(&root, Path::new("missing.c")));
    assert_eq!(
        git.revisions_touching(&root, file, None),
        LibGit.revisions_touching(&root, file, None)
    );
    assert_eq!(
        git.revision_hunks(&root, &first, file),
        LibGit.revision_hunks(&root, &first, file)
    );
    assert_eq!(
        git.hunks_to_head(&root, &first, file),
        LibGit.hunks_to_head(&root, &first, file)
    );

    let mut blame = git.blame(&root, file);
    blame.sort_by_key(|l| l.final_line);
    assert_eq!(blame.len(), 6);
    assert_eq!(blame[2].revision, h.insert.to_string());
    assert_eq!(blame[2].timestamp, Some(START + 100 * DAY));
}

#[test]
fn backends_agree_across_renames() {
    let Some(git) = git() else { return };
    let r = renamed();
    let root = r.repo.root();
    let file = Path::new("c.c");

    let followed = git.revisions_touching(&root, file, None);
    assert_eq!(followed.len(), 3);
    assert_eq!(followed, LibGit.revisions_touching(&root, file, None));
}

#[test]
fn session_selects_recently_inserted_line() {
    let Some(git) = git() else { return };
    let h = three_revisions();
    let root = h.repo.root();
    let config = MinerConfig {
        mode: ScoringMode::AgeChurn,
        baseline_percent: 0,
        seed: Some(1),
        ..Default::default()
    };
    let mut session = MiningSession::new(config, &git).unwrap();

    let inserted = session.score_block([SourceLocation::new("a.c", &root, 3)]);
    assert!(inserted.selected);
    // age (200 - 100) / (100 * 199) times a single edit's log2(2)
    assert!((inserted.fitness - 100.0 / (100.0 * 199.0)).abs() < 1e-12);

    let oldest = session.score_block([SourceLocation::new("a.c", &root, 1)]);
    assert!(!oldest.selected);
    assert_eq!(oldest.fitness, 0.0);

    let report = session.finish();
    assert_eq!(report.blocks, 2);
    assert_eq!(report.selected_blocks, 1);
}

#[test]
fn shallow_repository_disables_mining() {
    let Some(git) = git() else { return };
    let repo = shallow();
    let root = repo.root();
    let config = MinerConfig {
        baseline_percent: 100,
        ..Default::default()
    };
    let mut session = MiningSession::new(config, &git).unwrap();
    let score = session.score_block([SourceLocation::new("a.c", &root, 1)]);
    assert!(!score.selected);
    assert!(session.is_disabled());
}
