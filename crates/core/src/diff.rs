//! Line diffs between persisted and freshly rendered workflow files.

use similar::{ChangeTag, TextDiff};

/// Unchanged lines shown around each change
pub const CONTEXT_LINES: usize = 3;

/// Role of a line in a diff
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineKind {
    /// Present on both sides
    Context,
    /// Only in the new text
    Added,
    /// Only in the old text
    Removed,
}

/// One line of a diff hunk. Line numbers are 1-based.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiffLine {
    /// Context, added or removed
    pub kind: LineKind,
    /// Line number in the old text, absent for added lines
    pub old_line: Option<usize>,
    /// Line number in the new text, absent for removed lines
    pub new_line: Option<usize>,
    /// Line content without its terminator
    pub text: String,
}

/// A group of changes with surrounding context
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Hunk {
    /// First old line covered (1-based)
    pub old_start: usize,
    /// Number of old lines covered
    pub old_len: usize,
    /// First new line covered (1-based)
    pub new_start: usize,
    /// Number of new lines covered
    pub new_len: usize,
    /// Lines in order
    pub lines: Vec<DiffLine>,
}

/// Structured line diff between two texts
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineDiff {
    old: String,
    new: String,
    hunks: Vec<Hunk>,
}

impl LineDiff {
    /// True when both texts are identical
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.hunks.is_empty()
    }

    /// Hunks in order
    #[must_use]
    pub fn hunks(&self) -> &[Hunk] {
        &self.hunks
    }

    /// All hunk lines in order
    pub fn lines(&self) -> impl Iterator<Item = &DiffLine> {
        self.hunks.iter().flat_map(|hunk| hunk.lines.iter())
    }

    /// Lines that differ, skipping context
    pub fn changes(&self) -> impl Iterator<Item = &DiffLine> {
        self.lines().filter(|line| line.kind != LineKind::Context)
    }

    /// Unified diff text with `--- from` / `+++ to` headers
    #[must_use]
    pub fn unified(&self, from: &str, to: &str) -> String {
        TextDiff::from_lines(&self.old, &self.new)
            .unified_diff()
            .context_radius(CONTEXT_LINES)
            .header(from, to)
            .to_string()
    }
}

/// Compute the line diff turning `old` into `new`
#[must_use]
pub fn diff_lines(old: &str, new: &str) -> LineDiff {
    let diff = TextDiff::from_lines(old, new);
    let mut hunks = Vec::new();

    for group in diff.grouped_ops(CONTEXT_LINES) {
        let (Some(first), Some(last)) = (group.first(), group.last()) else {
            continue;
        };
        let old_range = first.old_range().start..last.old_range().end;
        let new_range = first.new_range().start..last.new_range().end;

        let lines = group
            .iter()
            .flat_map(|op| diff.iter_changes(op))
            .map(|change| DiffLine {
                kind: match change.tag() {
                    ChangeTag::Equal => LineKind::Context,
                    ChangeTag::Insert => LineKind::Added,
                    ChangeTag::Delete => LineKind::Removed,
                },
                old_line: change.old_index().map(|i| i + 1),
                new_line: change.new_index().map(|i| i + 1),
                text: change.value().trim_end_matches(['\n', '\r']).to_string(),
            })
            .collect();

        hunks.push(Hunk {
            old_start: old_range.start + 1,
            old_len: old_range.len(),
            new_start: new_range.start + 1,
            new_len: new_range.len(),
            lines,
        });
    }

    LineDiff {
        old: old.to_string(),
        new: new.to_string(),
        hunks,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identical_texts() {
        let diff = diff_lines("a\nb\n", "a\nb\n");
        assert!(diff.is_empty());
        assert_eq!(diff.unified("a/x", "b/x"), "");
    }

    #[test]
    fn test_added_line_numbers() {
        let old = "name: ci\non: [push]\njobs:\n";
        let new = "name: ci\non: [push]\npermissions:\njobs:\n";
        let diff = diff_lines(old, new);

        let changes: Vec<_> = diff.changes().collect();
        assert_eq!(changes.len(), 1);
        assert_eq!(changes[0].kind, LineKind::Added);
        assert_eq!(changes[0].new_line, Some(3));
        assert_eq!(changes[0].old_line, None);
        assert_eq!(changes[0].text, "permissions:");
    }

    #[test]
    fn test_context_is_limited() {
        let old: String = (1..=20).map(|i| format!("line {i}\n")).collect();
        let new = old.replace("line 10\n", "line ten\n");
        let diff = diff_lines(&old, &new);

        assert_eq!(diff.hunks().len(), 1);
        let hunk = &diff.hunks()[0];
        assert_eq!(hunk.old_start, 7);
        assert_eq!(hunk.old_len, 7);
        assert_eq!(
            hunk.lines.iter().filter(|l| l.kind == LineKind::Context).count(),
            6
        );
        assert_eq!(diff.changes().count(), 2);
    }

    #[test]
    fn test_distant_changes_split_hunks() {
        let old: String = (1..=30).map(|i| format!("line {i}\n")).collect();
        let new = old
            .replace("line 2\n", "line two\n")
            .replace("line 28\n", "line twenty-eight\n");
        let diff = diff_lines(&old, &new);
        assert_eq!(diff.hunks().len(), 2);
    }

    #[test]
    fn test_unified_output() {
        let diff = diff_lines("a\nb\n", "a\nc\n");
        let text = diff.unified("a/ci.yml", "b/ci.yml");
        assert!(text.starts_with("--- a/ci.yml\n+++ b/ci.yml\n@@ -1,2 +1,2 @@\n"));
        assert!(text.contains("\n-b\n+c\n"));
    }
}
