// src/model.rs

use std::collections::HashMap;
use std::path::PathBuf;

/// A 1-based source line number. Line 0 means "no debug location".
pub type LineNo = u32;

/// Full or abbreviated revision identifier, as reported by the history backend
pub type RevisionId = String;

/// Maps a HEAD line number to its normalized score
pub type LineScores = HashMap<LineNo, f64>;

/// Maps a HEAD line number to the raw number of historical edits projected onto it
pub type ChangeCounts = HashMap<LineNo, u32>;

/// One side of a hunk header: `start[,count]`.
///
/// A missing count means one line. A count of zero marks a pure insertion or
/// deletion point and covers no lines on this side.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LineRange {
    pub start: LineNo,
    pub count: u32,
}

impl LineRange {
    pub fn new(start: LineNo, count: u32) -> Self {
        Self { start, count }
    }

    /// The explicit line numbers covered by this range.
    pub fn lines(&self) -> impl Iterator<Item = LineNo> {
        self.start..self.start.saturating_add(self.count)
    }

    pub fn contains(&self, line: LineNo) -> bool {
        line >= self.start && line - self.start < self.count
    }

    /// Last line covered, or `start` for an empty range.
    pub fn end(&self) -> LineNo {
        if self.count == 0 {
            self.start
        } else {
            self.start.saturating_add(self.count - 1)
        }
    }
}

/// A parsed `@@ -A,B +C,D @@` header
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Hunk {
    pub old: LineRange,
    pub new: LineRange,
}

impl Hunk {
    pub fn new(old: LineRange, new: LineRange) -> Self {
        Self { old, new }
    }

    /// Net line displacement this hunk applies to everything after it.
    pub fn delta(&self) -> i64 {
        self.new.count as i64 - self.old.count as i64
    }
}

/// One line of blame output, attributed to the revision that last touched it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlameLine {
    pub revision: RevisionId,
    pub orig_line: LineNo,
    pub final_line: LineNo,
    /// Unix timestamp of the attributed revision, when the backend reports one
    pub timestamp: Option<i64>,
}

/// Where a single instruction of a block came from, as seen by the compiler
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct SourceLocation {
    /// File name from debug metadata, absolute or relative to `dir`
    pub file: PathBuf,
    /// Compilation directory from debug metadata
    pub dir: PathBuf,
    pub line: LineNo,
}

impl SourceLocation {
    pub fn new(file: impl Into<PathBuf>, dir: impl Into<PathBuf>, line: LineNo) -> Self {
        Self {
            file: file.into(),
            dir: dir.into(),
            line,
        }
    }

    /// The file's path with `dir` applied, not yet canonicalized.
    pub fn joined_path(&self) -> PathBuf {
        if self.file.is_absolute() {
            self.file.clone()
        } else {
            self.dir.join(&self.file)
        }
    }
}

/// The decision returned to the instrumentation layer for one block
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BlockScore {
    pub selected: bool,
    pub fitness: f64,
}

impl BlockScore {
    pub const UNSELECTED: BlockScore = BlockScore {
        selected: false,
        fitness: 0.0,
    };
}
