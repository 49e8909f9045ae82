//! Shared fixtures for integration tests: small repositories with fixed timestamps.

#![allow(dead_code)]

use git2::{Commit, Oid, Repository, Signature, Time};
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

pub const DAY: i64 = 86_400;
pub const START: i64 = 1_600_000_000;

pub struct TestRepo {
    pub dir: TempDir,
    pub repo: Repository,
}

impl TestRepo {
    pub fn new() -> Self {
        let dir = tempfile::tempdir().expect("tempdir");
        let repo = Repository::init(dir.path()).expect("init repository");
        Self { dir, repo }
    }

    pub fn root(&self) -> PathBuf {
        self.dir.path().canonicalize().expect("canonical root")
    }

    /// Write `files` and commit them at `time` on top of HEAD.
    pub fn commit(&self, time: i64, message: &str, files: &[(&str, &str)]) -> Oid {
        let mut index = self.repo.index().expect("index");
        for (name, content) in files {
            let path = self.dir.path().join(name);
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent).expect("create dirs");
            }
            fs::write(&path, content).expect("write file");
            index.add_path(Path::new(name)).expect("stage file");
        }
        self.commit_index(&mut index, time, message)
    }

    /// Move `from` to `to` unchanged and commit the rename at `time`.
    pub fn rename(&self, time: i64, message: &str, from: &str, to: &str) -> Oid {
        let mut index = self.repo.index().expect("index");
        fs::rename(self.dir.path().join(from), self.dir.path().join(to)).expect("rename file");
        index.remove_path(Path::new(from)).expect("unstage old path");
        index.add_path(Path::new(to)).expect("stage new path");
        self.commit_index(&mut index, time, message)
    }

    fn commit_index(&self, index: &mut git2::Index, time: i64, message: &str) -> Oid {
        index.write().expect("write index");
        let tree_id = index.write_tree().expect("write tree");
        let tree = self.repo.find_tree(tree_id).expect("find tree");
        let sig = Signature::new("Test", "test@example.com", &Time::new(time, 0)).expect("signature");

        let parents: Vec<Commit> = match self.repo.head() {
            Ok(head) => vec![head.peel_to_commit().expect("head commit")],
            Err(_) => Vec::new(),
        };
        let parent_refs: Vec<&Commit> = parents.iter().collect();
        self.repo
            .commit(Some("HEAD"), &sig, &sig, message, &tree, &parent_refs)
            .expect("commit")
    }
}

/// Three revisions: `a.c` gets five lines, then a line inserted before line 3,
/// then HEAD only adds `b.c`.
pub struct History3 {
    pub repo: TestRepo,
    pub first: Oid,
    pub insert: Oid,
    pub head: Oid,
}

pub fn three_revisions() -> History3 {
    let repo = TestRepo::new();
    let first = repo.commit(START, "add a.c", &[("a.c", "1\n2\n3\n4\n5\n")]);
    let insert = repo.commit(
        START + 100 * DAY,
        "insert line",
        &[("a.c", "1\n2\nX\n3\n4\n5\n")],
    );
    let head = repo.commit(START + 200 * DAY, "add b.c", &[("b.c", "int b;\n")]);
    History3 {
        repo,
        first,
        insert,
        head,
    }
}

/// A repository with a single revision.
pub fn shallow() -> TestRepo {
    let repo = TestRepo::new();
    repo.commit(START, "only", &[("a.c", "1\n2\n")]);
    repo
}

/// `a.c` is committed, renamed to `c.c`, then edited under its new name.
pub struct Renamed {
    pub repo: TestRepo,
    pub first: Oid,
    pub moved: Oid,
    pub edit: Oid,
}

pub fn renamed() -> Renamed {
    let repo = TestRepo::new();
    let first = repo.commit(START, "add a.c", &[("a.c", "1\n2\n3\n4\n5\n")]);
    let moved = repo.rename(START + 100 * DAY, "rename to c.c", "a.c", "c.c");
    let edit = repo.commit(
        START + 200 * DAY,
        "append to c.c",
        &[("c.c", "1\n2\n3\n4\n5\n6\n")],
    );
    Renamed {
        repo,
        first,
        moved,
        edit,
    }
}
