//! Read-only history queries against a repository.
//!
//! Every mining algorithm talks to version control through [`History`], so
//! scoring can run against the `git` binary ([`GitCommand`]), against the
//! object database through libgit2 ([`LibGit`]), or against an in-memory fake
//! in tests. Queries never fail loudly: a query that cannot be answered yields
//! `None` or an empty collection and the caller treats the score as unknown.

mod command;
mod libgit;

pub use command::GitCommand;
pub use libgit::LibGit;

use crate::model::{BlameLine, Hunk, RevisionId};
use std::path::{Path, PathBuf};

/// Name of HEAD as understood by every backend.
pub const HEAD: &str = "HEAD";

pub trait History {
    /// Top-level working directory of the repository enclosing `dir`.
    fn toplevel(&self, dir: &Path) -> Option<PathBuf>;

    /// Number of revisions reachable from `rev`, i.e. its topological depth.
    fn revision_count(&self, root: &Path, rev: &str) -> Option<u64>;

    /// Commit timestamp of `rev`, in seconds since the epoch.
    fn commit_time(&self, root: &Path, rev: &str) -> Option<i64>;

    /// Timestamp of the oldest root revision reachable from HEAD.
    fn first_commit_time(&self, root: &Path) -> Option<i64>;

    /// Whether `file` (relative to `root`) is tracked at HEAD.
    fn exists_at_head(&self, root: &Path, file: &Path) -> bool;

    /// Revisions that touched `file`, most recent first.
    fn revisions_touching(
        &self,
        root: &Path,
        file: &Path,
        since_months: Option<u32>,
    ) -> Vec<RevisionId>;

    /// Hunks of `rev` against its parent, restricted to `file`.
    fn revision_hunks(&self, root: &Path, rev: &str, file: &Path) -> Vec<Hunk>;

    /// Hunks of `rev` against HEAD, restricted to `file`.
    fn hunks_to_head(&self, root: &Path, rev: &str, file: &Path) -> Vec<Hunk>;

    /// Per-line attribution of `file` at HEAD.
    fn blame(&self, root: &Path, file: &Path) -> Vec<BlameLine>;
}

impl<T: History + ?Sized> History for &T {
    fn toplevel(&self, dir: &Path) -> Option<PathBuf> {
        (**self).toplevel(dir)
    }

    fn revision_count(&self, root: &Path, rev: &str) -> Option<u64> {
        (**self).revision_count(root, rev)
    }

    fn commit_time(&self, root: &Path, rev: &str) -> Option<i64> {
        (**self).commit_time(root, rev)
    }

    fn first_commit_time(&self, root: &Path) -> Option<i64> {
        (**self).first_commit_time(root)
    }

    fn exists_at_head(&self, root: &Path, file: &Path) -> bool {
        (**self).exists_at_head(root, file)
    }

    fn revisions_touching(
        &self,
        root: &Path,
        file: &Path,
        since_months: Option<u32>,
    ) -> Vec<RevisionId> {
        (**self).revisions_touching(root, file, since_months)
    }

    fn revision_hunks(&self, root: &Path, rev: &str, file: &Path) -> Vec<Hunk> {
        (**self).revision_hunks(root, rev, file)
    }

    fn hunks_to_head(&self, root: &Path, rev: &str, file: &Path) -> Vec<Hunk> {
        (**self).hunks_to_head(root, rev, file)
    }

    fn blame(&self, root: &Path, file: &Path) -> Vec<BlameLine> {
        (**self).blame(root, file)
    }
}
