// src/history/libgit.rs

use super::{History, HEAD};
use crate::model::{BlameLine, Hunk, LineRange, RevisionId};
use chrono::{Months, Utc};
use git2::{Commit, Delta, Diff, DiffFindOptions, DiffOptions, Oid, Repository, Tree};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Answers history queries in-process through libgit2.
///
/// The repository is reopened for every query, mirroring the one-process-per-query
/// behaviour of [`super::GitCommand`] so neither backend holds state between calls.
#[derive(Debug, Clone, Copy, Default)]
pub struct LibGit;

fn quiet<T>(query: &str, result: Result<T, git2::Error>) -> Option<T> {
    result
        .map_err(|e| debug!(query, error = %e, "libgit2 query failed"))
        .ok()
}

fn resolve<'r>(repo: &'r Repository, rev: &str) -> Result<Commit<'r>, git2::Error> {
    repo.revparse_single(rev)?.peel_to_commit()
}

fn entry_id(tree: &Tree, file: &Path) -> Option<Oid> {
    tree.get_path(file).ok().map(|entry| entry.id())
}

fn zero_context(file: &Path) -> DiffOptions {
    let mut opts = DiffOptions::new();
    opts.pathspec(file)
        .disable_pathspec_match(true)
        .context_lines(0)
        .ignore_filemode(true);
    opts
}

fn collect_hunks(diff: &Diff) -> Result<Vec<Hunk>, git2::Error> {
    let mut hunks = Vec::new();
    diff.foreach(
        &mut |_, _| true,
        None,
        Some(&mut |_, hunk| {
            hunks.push(Hunk::new(
                LineRange::new(hunk.old_start(), hunk.old_lines()),
                LineRange::new(hunk.new_start(), hunk.new_lines()),
            ));
            true
        }),
        None,
    )?;
    Ok(hunks)
}

/// The path `file` had in `old` when `new` introduced it by a rename.
fn renamed_from(
    repo: &Repository,
    old: &Tree,
    new: &Tree,
    file: &Path,
) -> Result<Option<PathBuf>, git2::Error> {
    let mut diff = repo.diff_tree_to_tree(Some(old), Some(new), None)?;
    diff.find_similar(Some(DiffFindOptions::new().renames(true)))?;
    Ok(diff
        .deltas()
        .find(|d| d.status() == Delta::Renamed && d.new_file().path() == Some(file))
        .and_then(|d| d.old_file().path().map(Path::to_path_buf)))
}

impl LibGit {
    fn depth(root: &Path, rev: &str) -> Result<u64, git2::Error> {
        let repo = Repository::open(root)?;
        let commit = resolve(&repo, rev)?;
        let mut revwalk = repo.revwalk()?;
        revwalk.push(commit.id())?;
        let mut count = 0;
        for oid in revwalk {
            oid?;
            count += 1;
        }
        Ok(count)
    }

    fn oldest_root(root: &Path) -> Result<Option<i64>, git2::Error> {
        let repo = Repository::open(root)?;
        let mut revwalk = repo.revwalk()?;
        revwalk.push_head()?;

        let mut oldest = None;
        for oid in revwalk {
            let commit = repo.find_commit(oid?)?;
            if commit.parent_count() == 0 {
                let ts = commit.time().seconds();
                oldest = Some(oldest.map_or(ts, |o: i64| o.min(ts)));
            }
        }
        Ok(oldest)
    }

    fn touching(
        root: &Path,
        file: &Path,
        since_months: Option<u32>,
    ) -> Result<Vec<RevisionId>, git2::Error> {
        let repo = Repository::open(root)?;
        let cutoff = since_months
            .and_then(|m| Utc::now().checked_sub_months(Months::new(m)))
            .map(|t| t.timestamp());

        let mut revwalk = repo.revwalk()?;
        revwalk.push_head()?;
        revwalk.set_sorting(git2::Sort::TIME)?;

        // Older revisions are matched against the name the file had before
        // the most recent rename seen so far, like `git log --follow`.
        let mut path = file.to_path_buf();
        let mut revisions = Vec::new();
        for oid in revwalk {
            let oid = oid?;
            let commit = repo.find_commit(oid)?;
            let tree = commit.tree()?;
            let parents = commit
                .parents()
                .map(|parent| parent.tree())
                .collect::<Result<Vec<_>, _>>()?;

            // A revision touches the file when it differs from every parent,
            // the same simplification `git log -- <path>` applies.
            let id = entry_id(&tree, &path);
            let touched = parents.iter().all(|parent| entry_id(parent, &path) != id);
            let first_parent = parents.first();

            let in_window = !cutoff.is_some_and(|c| commit.time().seconds() < c);
            if touched && in_window && (id.is_some() || first_parent.is_some()) {
                revisions.push(oid.to_string());
            }

            if let (Some(_), Some(parent)) = (id, first_parent) {
                if entry_id(parent, &path).is_none() {
                    if let Some(old) = renamed_from(&repo, parent, &tree, &path)? {
                        debug!(from = %old.display(), to = %path.display(), "following rename");
                        path = old;
                    }
                }
            }
        }
        Ok(revisions)
    }

    fn show(root: &Path, rev: &str, file: &Path) -> Result<Vec<Hunk>, git2::Error> {
        let repo = Repository::open(root)?;
        let commit = resolve(&repo, rev)?;
        let parent_tree = match commit.parent(0) {
            Ok(parent) => Some(parent.tree()?),
            Err(_) => None,
        };
        let current_tree = commit.tree()?;
        let diff = repo.diff_tree_to_tree(
            parent_tree.as_ref(),
            Some(&current_tree),
            Some(&mut zero_context(file)),
        )?;
        collect_hunks(&diff)
    }

    fn to_head(root: &Path, rev: &str, file: &Path) -> Result<Vec<Hunk>, git2::Error> {
        let repo = Repository::open(root)?;
        let old_tree = resolve(&repo, rev)?.tree()?;
        let head_tree = resolve(&repo, HEAD)?.tree()?;
        let diff = repo.diff_tree_to_tree(
            Some(&old_tree),
            Some(&head_tree),
            Some(&mut zero_context(file)),
        )?;
        collect_hunks(&diff)
    }

    fn blame_lines(root: &Path, file: &Path) -> Result<Vec<BlameLine>, git2::Error> {
        let repo = Repository::open(root)?;
        let blame = repo.blame_file(file, None)?;
        let mut lines = Vec::new();
        for hunk in blame.iter() {
            let revision = hunk.final_commit_id().to_string();
            let timestamp = hunk.final_signature().when().seconds();
            for offset in 0..hunk.lines_in_hunk() {
                lines.push(BlameLine {
                    revision: revision.clone(),
                    orig_line: (hunk.orig_start_line() + offset) as u32,
                    final_line: (hunk.final_start_line() + offset) as u32,
                    timestamp: Some(timestamp),
                });
            }
        }
        Ok(lines)
    }
}

impl History for LibGit {
    fn toplevel(&self, dir: &Path) -> Option<PathBuf> {
        let repo = quiet("toplevel", Repository::discover(dir))?;
        repo.workdir().map(Path::to_path_buf)
    }

    fn revision_count(&self, root: &Path, rev: &str) -> Option<u64> {
        quiet("revision_count", Self::depth(root, rev))
    }

    fn commit_time(&self, root: &Path, rev: &str) -> Option<i64> {
        let repo = quiet("commit_time", Repository::open(root))?;
        let commit = quiet("commit_time", resolve(&repo, rev))?;
        Some(commit.time().seconds())
    }

    fn first_commit_time(&self, root: &Path) -> Option<i64> {
        quiet("first_commit_time", Self::oldest_root(root)).flatten()
    }

    fn exists_at_head(&self, root: &Path, file: &Path) -> bool {
        let Some(repo) = quiet("exists_at_head", Repository::open(root)) else {
            return false;
        };
        resolve(&repo, HEAD)
            .and_then(|commit| commit.tree())
            .map(|tree| tree.get_path(file).is_ok())
            .unwrap_or(false)
    }

    fn revisions_touching(
        &self,
        root: &Path,
        file: &Path,
        since_months: Option<u32>,
    ) -> Vec<RevisionId> {
        quiet("revisions_touching", Self::touching(root, file, since_months)).unwrap_or_default()
    }

    fn revision_hunks(&self, root: &Path, rev: &str, file: &Path) -> Vec<Hunk> {
        quiet("revision_hunks", Self::show(root, rev, file)).unwrap_or_default()
    }

    fn hunks_to_head(&self, root: &Path, rev: &str, file: &Path) -> Vec<Hunk> {
        quiet("hunks_to_head", Self::to_head(root, rev, file)).unwrap_or_default()
    }

    fn blame(&self, root: &Path, file: &Path) -> Vec<BlameLine> {
        quiet("blame", Self::blame_lines(root, file)).unwrap_or_default()
    }
}
