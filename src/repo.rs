// src/repo.rs

use crate::history::{History, HEAD};
use chrono::{TimeZone, Utc};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

pub const SECONDS_PER_DAY: i64 = 86_400;

/// A resolved repository, fixed for the lifetime of a mining session.
#[derive(Debug, Clone, PartialEq)]
pub struct RepoHandle {
    /// Canonical top-level working directory
    pub root: PathBuf,
    /// Commit time of HEAD, in seconds since the epoch
    pub head_time: i64,
    /// HEAD's commit time in whole days since the epoch
    pub head_day: i64,
    /// Number of revisions reachable from HEAD
    pub head_revisions: u64,
    /// Days between the oldest root revision and HEAD
    pub age_span_days: i64,
    /// False for single-revision (shallow) clones
    pub valid: bool,
}

impl RepoHandle {
    /// Days between `timestamp` and HEAD, rounded towards zero.
    pub fn days_before_head(&self, timestamp: i64) -> i64 {
        (self.head_time - timestamp) / SECONDS_PER_DAY
    }

    /// `abs` made relative to the repository root, if it lies inside it.
    pub fn relative(&self, abs: &Path) -> Option<PathBuf> {
        abs.strip_prefix(&self.root)
            .ok()
            .filter(|rel| !rel.as_os_str().is_empty())
            .map(Path::to_path_buf)
    }
}

/// Outcome of looking for the repository behind a source file.
#[derive(Debug, Clone, PartialEq)]
pub enum Resolution {
    /// The path itself could not be canonicalized; another location may fare better
    Unreadable,
    /// No enclosing repository
    NotFound,
    /// Exactly one revision: history carries no signal
    Shallow(RepoHandle),
    Found(RepoHandle),
}

/// Locate the repository enclosing `path` and take its HEAD measurements.
pub fn resolve<H: History>(history: &H, path: &Path) -> Resolution {
    let Ok(canonical) = path.canonicalize() else {
        debug!(path = %path.display(), "cannot canonicalize source path");
        return Resolution::Unreadable;
    };
    let dir = if canonical.is_dir() {
        canonical.as_path()
    } else {
        match canonical.parent() {
            Some(dir) => dir,
            None => return Resolution::Unreadable,
        }
    };

    let Some(top) = history.toplevel(dir) else {
        return Resolution::NotFound;
    };
    let root = top.canonicalize().unwrap_or(top);

    let Some(head_revisions) = history.revision_count(&root, HEAD) else {
        return Resolution::NotFound;
    };
    if head_revisions <= 1 {
        return Resolution::Shallow(RepoHandle {
            root,
            head_time: 0,
            head_day: 0,
            head_revisions,
            age_span_days: 0,
            valid: false,
        });
    }

    let head_time = history.commit_time(&root, HEAD).unwrap_or(0);
    let first_time = history.first_commit_time(&root).unwrap_or(head_time);
    let handle = RepoHandle {
        root,
        head_time,
        head_day: head_time.div_euclid(SECONDS_PER_DAY),
        head_revisions,
        age_span_days: head_time.div_euclid(SECONDS_PER_DAY)
            - first_time.div_euclid(SECONDS_PER_DAY),
        valid: true,
    };

    info!(
        root = %handle.root.display(),
        revisions = handle.head_revisions,
        head = %Utc
            .timestamp_opt(handle.head_time, 0)
            .single()
            .map(|t| t.to_rfc2822())
            .unwrap_or_default(),
        span_days = handle.age_span_days,
        "resolved repository"
    );
    Resolution::Found(handle)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::history::fake::FakeHistory;

    fn fake_with_root(root: &Path) -> FakeHistory {
        FakeHistory {
            root: Some(root.to_path_buf()),
            ..Default::default()
        }
    }

    #[test]
    fn unreadable_path() {
        let fake = FakeHistory::default();
        assert_eq!(
            resolve(&fake, Path::new("/definitely/not/here.c")),
            Resolution::Unreadable
        );
        assert_eq!(fake.total_calls(), 0);
    }

    #[test]
    fn no_toplevel_means_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("a.c");
        std::fs::write(&file, "int x;\n").unwrap();
        let fake = FakeHistory::default();
        assert_eq!(resolve(&fake, &file), Resolution::NotFound);
    }

    #[test]
    fn single_revision_is_shallow() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("a.c");
        std::fs::write(&file, "int x;\n").unwrap();
        let mut fake = fake_with_root(dir.path());
        fake.counts.insert("HEAD".into(), 1);

        match resolve(&fake, &file) {
            Resolution::Shallow(handle) => assert!(!handle.valid),
            other => panic!("expected shallow, got {other:?}"),
        }
        assert_eq!(fake.calls("time HEAD"), 0);
        assert_eq!(fake.calls("first-time"), 0);
    }

    #[test]
    fn found_measures_span() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("a.c");
        std::fs::write(&file, "int x;\n").unwrap();
        let mut fake = fake_with_root(dir.path());
        fake.counts.insert("HEAD".into(), 12);
        fake.times.insert("HEAD".into(), 100 * SECONDS_PER_DAY + 5);
        fake.first_time = Some(40 * SECONDS_PER_DAY);

        let Resolution::Found(handle) = resolve(&fake, &file) else {
            panic!("expected a repository");
        };
        assert!(handle.valid);
        assert_eq!(handle.head_day, 100);
        assert_eq!(handle.age_span_days, 60);
        assert_eq!(handle.head_revisions, 12);
        assert_eq!(handle.days_before_head(90 * SECONDS_PER_DAY), 10);
        assert_eq!(
            handle.relative(&handle.root.join("src/a.c")),
            Some(PathBuf::from("src/a.c"))
        );
        assert_eq!(handle.relative(Path::new("/elsewhere/a.c")), None);
    }
}
