// src/history/command.rs

use super::{History, HEAD};
use crate::model::{BlameLine, Hunk, RevisionId};
use crate::parse;
use std::path::{Path, PathBuf};
use std::process::Command;
use tracing::debug;

/// Answers history queries by spawning the `git` binary, one process per query.
#[derive(Debug, Clone)]
pub struct GitCommand {
    program: PathBuf,
}

impl Default for GitCommand {
    fn default() -> Self {
        Self {
            program: PathBuf::from("git"),
        }
    }
}

impl GitCommand {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }

    /// Whether the configured binary can be run at all.
    pub fn is_available(&self) -> bool {
        Command::new(&self.program)
            .arg("--version")
            .output()
            .map(|out| out.status.success())
            .unwrap_or(false)
    }

    /// Full stdout of `git <args>` run in `dir`, or `None` when the process
    /// could not be spawned or exited unsuccessfully.
    pub fn run(&self, dir: &Path, args: &[&str]) -> Option<String> {
        let output = match Command::new(&self.program)
            .args(args)
            .current_dir(dir)
            .output()
        {
            Ok(output) => output,
            Err(e) => {
                debug!(?args, error = %e, "failed to spawn git");
                return None;
            }
        };
        if !output.status.success() {
            debug!(
                ?args,
                dir = %dir.display(),
                stderr = %String::from_utf8_lossy(&output.stderr).trim(),
                "git exited unsuccessfully"
            );
            return None;
        }
        Some(String::from_utf8_lossy(&output.stdout).into_owned())
    }

    /// First whitespace-delimited token of `git <args>`, or `None` on failure.
    pub fn token(&self, dir: &Path, args: &[&str]) -> Option<String> {
        let out = self.run(dir, args)?;
        parse::first_token(&out).map(str::to_string)
    }

    fn path_arg(file: &Path) -> String {
        file.to_string_lossy().into_owned()
    }
}

impl History for GitCommand {
    fn toplevel(&self, dir: &Path) -> Option<PathBuf> {
        let out = self.run(dir, &["rev-parse", "--show-toplevel"])?;
        let line = out.lines().next()?.trim();
        if line.is_empty() || line.starts_with(parse::FAILURE_MARKER) {
            return None;
        }
        Some(PathBuf::from(line))
    }

    fn revision_count(&self, root: &Path, rev: &str) -> Option<u64> {
        self.token(root, &["rev-list", "--count", rev])?.parse().ok()
    }

    fn commit_time(&self, root: &Path, rev: &str) -> Option<i64> {
        self.token(root, &["show", "-s", "--format=%ct", rev])?
            .parse()
            .ok()
    }

    fn first_commit_time(&self, root: &Path) -> Option<i64> {
        let out = self.run(root, &["log", "--max-parents=0", "--format=%ct", HEAD])?;
        out.split_whitespace()
            .filter_map(|t| t.parse::<i64>().ok())
            .min()
    }

    fn exists_at_head(&self, root: &Path, file: &Path) -> bool {
        let spec = format!("{HEAD}:{}", Self::path_arg(file));
        Command::new(&self.program)
            .args(["cat-file", "-e", spec.as_str()])
            .current_dir(root)
            .output()
            .map(|out| out.status.success())
            .unwrap_or(false)
    }

    fn revisions_touching(
        &self,
        root: &Path,
        file: &Path,
        since_months: Option<u32>,
    ) -> Vec<RevisionId> {
        let path = Self::path_arg(file);
        let since = since_months.map(|m| format!("--since={m}.months"));
        let mut args = vec!["log"];
        if let Some(since) = &since {
            args.push(since.as_str());
        }
        args.extend(["--follow", "--format=%H", "--", path.as_str()]);

        self.run(root, &args)
            .map(|out| {
                out.lines()
                    .map(str::trim)
                    .filter(|l| !l.is_empty() && l.bytes().all(|b| b.is_ascii_hexdigit()))
                    .map(String::from)
                    .collect()
            })
            .unwrap_or_default()
    }

    fn revision_hunks(&self, root: &Path, rev: &str, file: &Path) -> Vec<Hunk> {
        let path = Self::path_arg(file);
        self.run(
            root,
            &["show", "--format=", "--no-color", "-U0", rev, "--", path.as_str()],
        )
        .map(|out| parse::parse_hunks(&out))
        .unwrap_or_default()
    }

    fn hunks_to_head(&self, root: &Path, rev: &str, file: &Path) -> Vec<Hunk> {
        let path = Self::path_arg(file);
        self.run(
            root,
            &["diff", "--no-color", "-U0", rev, HEAD, "--", path.as_str()],
        )
        .map(|out| parse::parse_hunks(&out))
        .unwrap_or_default()
    }

    fn blame(&self, root: &Path, file: &Path) -> Vec<BlameLine> {
        let path = Self::path_arg(file);
        self.run(root, &["blame", "--porcelain", HEAD, "--", path.as_str()])
            .map(|out| parse::parse_blame_porcelain(&out))
            .unwrap_or_default()
    }
}
