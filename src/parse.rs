// src/parse.rs
//
// Text-to-record parsers for git output. Malformed input yields nothing.

use crate::model::{BlameLine, Hunk, LineNo, LineRange};
use std::collections::HashMap;

/// Prefix git puts on every error message it writes.
pub const FAILURE_MARKER: &str = "fatal";

/// First whitespace-delimited token of a command's output, unless the output
/// is empty or is a git failure message.
pub fn first_token(output: &str) -> Option<&str> {
    let token = output.split_whitespace().next()?;
    if token.starts_with(FAILURE_MARKER) {
        return None;
    }
    Some(token)
}

/// Largest line count a single hunk side may claim.
pub const MAX_HUNK_LINES: u32 = 1 << 24;

/// Parse `start` or `start,count` (without the leading sign).
///
/// Ranges that run past the largest line number or claim more than
/// [`MAX_HUNK_LINES`] lines are rejected.
pub fn parse_range(text: &str) -> Option<LineRange> {
    let (start, count): (LineNo, u32) = match text.split_once(',') {
        Some((start, count)) => (start.parse().ok()?, count.parse().ok()?),
        None => (text.parse().ok()?, 1),
    };
    if count > MAX_HUNK_LINES {
        return None;
    }
    start.checked_add(count)?;
    Some(LineRange::new(start, count))
}

/// Parse a single unified hunk header like `@@ -8,0 +9,2 @@ fn main()`.
pub fn parse_hunk_header(line: &str) -> Option<Hunk> {
    let rest = line.strip_prefix("@@ ")?;
    let mut parts = rest.split(' ');
    let old = parts.next()?.strip_prefix('-')?;
    let new = parts.next()?.strip_prefix('+')?;
    if parts.next()? != "@@" {
        return None;
    }
    Some(Hunk::new(parse_range(old)?, parse_range(new)?))
}

/// All hunk headers in a unified diff, in output order.
pub fn parse_hunks(diff: &str) -> Vec<Hunk> {
    diff.lines().filter_map(parse_hunk_header).collect()
}

fn is_revision_token(token: &str) -> bool {
    token.len() >= 7 && token.bytes().all(|b| b.is_ascii_hexdigit())
}

/// Parse `git blame --porcelain` output.
///
/// Every line group starts with `<revision> <orig_line> <final_line> [<count>]`.
/// The first group of each revision carries its headers, of which only
/// `author-time` is kept.
pub fn parse_blame_porcelain(output: &str) -> Vec<BlameLine> {
    let mut lines = Vec::new();
    let mut times: HashMap<&str, i64> = HashMap::new();
    let mut current: Option<&str> = None;

    for line in output.lines() {
        if line.starts_with('\t') {
            continue;
        }
        let mut tokens = line.split_whitespace();
        let Some(first) = tokens.next() else { continue };

        if first == "author-time" {
            if let (Some(rev), Some(ts)) = (current, tokens.next().and_then(|t| t.parse().ok())) {
                times.insert(rev, ts);
            }
            continue;
        }

        if !is_revision_token(first) {
            continue;
        }
        let orig: Option<LineNo> = tokens.next().and_then(|t| t.parse().ok());
        let fin: Option<LineNo> = tokens.next().and_then(|t| t.parse().ok());
        if let (Some(orig_line), Some(final_line)) = (orig, fin) {
            current = Some(first);
            lines.push(BlameLine {
                revision: first.to_string(),
                orig_line,
                final_line,
                timestamp: None,
            });
        }
    }

    for line in &mut lines {
        line.timestamp = times.get(line.revision.as_str()).copied();
    }
    lines
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_token_contract() {
        assert_eq!(first_token("42\n"), Some("42"));
        assert_eq!(first_token("  /home/u/repo  \n"), Some("/home/u/repo"));
        assert_eq!(first_token(""), None);
        assert_eq!(first_token("   \n"), None);
        assert_eq!(first_token("fatal: not a git repository"), None);
    }

    #[test]
    fn hunk_header_forms() {
        assert_eq!(
            parse_hunk_header("@@ -8,0 +9,2 @@"),
            Some(Hunk::new(LineRange::new(8, 0), LineRange::new(9, 2)))
        );
        assert_eq!(
            parse_hunk_header("@@ -10 +11,0 @@ int f(void)"),
            Some(Hunk::new(LineRange::new(10, 1), LineRange::new(11, 0)))
        );
        assert_eq!(
            parse_hunk_header("@@ -466,8 +475 @@"),
            Some(Hunk::new(LineRange::new(466, 8), LineRange::new(475, 1)))
        );
        assert_eq!(
            parse_hunk_header("@@ -8 +9 @@"),
            Some(Hunk::new(LineRange::new(8, 1), LineRange::new(9, 1)))
        );
    }

    #[test]
    fn malformed_headers_are_ignored() {
        assert_eq!(parse_hunk_header("@@@ -1,2 -1,2 +1,3 @@@"), None);
        assert_eq!(parse_hunk_header("@@ -x,2 +1 @@"), None);
        assert_eq!(parse_hunk_header("+@@ -1 +1 @@"), None);
        assert_eq!(parse_hunk_header("@@ -1 +1"), None);
        assert_eq!(parse_hunk_header("@@ -1 +4294967295,2 @@"), None);
        assert_eq!(parse_hunk_header("@@ -1 +1,4000000000 @@"), None);
    }

    #[test]
    fn out_of_range_headers_yield_no_changed_lines() {
        let diff = "@@ -1 +4294967295,2 @@\n@@ -1 +1,4000000000 @@\n@@ -2,0 +3 @@\n";
        let hunks = parse_hunks(diff);
        assert_eq!(hunks.len(), 1);
        let changed = crate::churn::changed_lines(&hunks);
        assert_eq!(changed.into_iter().collect::<Vec<_>>(), vec![3]);
    }

    #[test]
    fn hunks_from_diff_text() {
        let diff = "\
diff --git a/a.c b/a.c
index 3b18e51..4c2d0a9 100644
--- a/a.c
+++ b/a.c
@@ -2,0 +3 @@ int main(void)
+    int x;
@@ -7 +8 @@ int main(void)
-    return 0;
+    return x;
";
        let hunks = parse_hunks(diff);
        assert_eq!(hunks.len(), 2);
        assert_eq!(hunks[0].new, LineRange::new(3, 1));
        assert_eq!(hunks[1].old, LineRange::new(7, 1));
    }

    #[test]
    fn blame_porcelain() {
        let out = "\
9f1a353f68d6586b898c47c71a7631cdc816215f 1 1 2
author A
author-mail <a@example.com>
author-time 1700000000
author-tz +0000
summary add file
filename a.c
\tint main(void)
9f1a353f68d6586b898c47c71a7631cdc816215f 2 2
\t{
0c6e2c1b5d2a4f1e8a3b7c9d0e1f2a3b4c5d6e7f 2 3 1
author B
author-time 1700086400
summary insert line
previous 9f1a353f68d6586b898c47c71a7631cdc816215f a.c
filename a.c
\t    int x;
";
        let lines = parse_blame_porcelain(out);
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0].final_line, 1);
        assert_eq!(lines[1].timestamp, Some(1_700_000_000));
        assert_eq!(lines[2].orig_line, 2);
        assert_eq!(lines[2].final_line, 3);
        assert_eq!(lines[2].timestamp, Some(1_700_086_400));
    }

    #[test]
    fn blame_garbage_is_empty() {
        assert!(parse_blame_porcelain("fatal: no such path 'x.c' in HEAD").is_empty());
        assert!(parse_blame_porcelain("").is_empty());
    }
}
