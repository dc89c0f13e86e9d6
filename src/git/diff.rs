//! Commit rendering and size-bounded diff extraction.

use std::fmt::Write as _;

use chrono::{DateTime, FixedOffset, Offset, Utc};
use git2::{Commit, DiffFormat, Repository};
use tracing::warn;

use crate::error::GitError;
use crate::git::history::History;

/// Maximum characters of diff text handed to the completion service per commit.
pub const MAX_DIFF_CHARS: usize = 50_000;

/// Render a commit the way `git show` does: header, indented message, patch.
pub fn render_commit(repo: &Repository, commit: &Commit<'_>) -> Result<String, GitError> {
    let mut text = String::new();

    let _ = writeln!(text, "commit {}", commit.id());
    if commit.parent_count() > 1 {
        let parents: Vec<String> = commit
            .parent_ids()
            .map(|id| id.to_string()[..7].to_string())
            .collect();
        let _ = writeln!(text, "Merge: {}", parents.join(" "));
    }

    let author = commit.author();
    let _ = writeln!(
        text,
        "Author: {} <{}>",
        author.name().unwrap_or(""),
        author.email().unwrap_or("")
    );
    let _ = writeln!(text, "Date:   {}", format_time(&author.when()));
    text.push('\n');

    for line in commit.message().unwrap_or("").lines() {
        let _ = writeln!(text, "    {}", line);
    }
    text.push('\n');

    let new_tree = commit.tree().map_err(GitError::DiffFailed)?;
    let old_tree = match commit.parent_count() {
        0 => None,
        _ => Some(
            commit
                .parent(0)
                .and_then(|p| p.tree())
                .map_err(GitError::DiffFailed)?,
        ),
    };

    let diff = repo
        .diff_tree_to_tree(old_tree.as_ref(), Some(&new_tree), None)
        .map_err(GitError::DiffFailed)?;

    diff.print(DiffFormat::Patch, |_delta, _hunk, line| {
        let origin = line.origin();
        if origin == '+' || origin == '-' || origin == ' ' {
            text.push(origin);
        }
        text.push_str(&String::from_utf8_lossy(line.content()));
        true
    })
    .map_err(GitError::DiffFailed)?;

    Ok(text)
}

/// Fetch the change text for `id`, truncated to `max_chars` characters.
///
/// Query failures are not fatal: they are logged and surface as an empty
/// string, which the caller treats as a skippable position.
pub fn extract_diff<H: History + ?Sized>(history: &H, id: &str, max_chars: usize) -> String {
    match history.show(id) {
        Ok(text) => truncate_chars(&text, max_chars).to_string(),
        Err(e) => {
            warn!("Could not read diff for {}: {}", short_id(id), e);
            String::new()
        }
    }
}

/// Prefix of `text` holding at most `max_chars` characters.
pub fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((byte_idx, _)) => &text[..byte_idx],
        None => text,
    }
}

/// Seven-character abbreviation used in progress output.
pub fn short_id(id: &str) -> &str {
    truncate_chars(id, 7)
}

fn format_time(time: &git2::Time) -> String {
    let offset = FixedOffset::east_opt(time.offset_minutes() * 60).unwrap_or_else(|| Utc.fix());
    match DateTime::from_timestamp(time.seconds(), 0) {
        Some(utc) => utc
            .with_timezone(&offset)
            .format("%a %b %-d %H:%M:%S %Y %z")
            .to_string(),
        None => time.seconds().to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::git::history::MockHistory;
    use git2::Signature;

    #[test]
    fn test_truncate_chars_takes_prefix() {
        let text = "a".repeat(80_000);
        let truncated = truncate_chars(&text, MAX_DIFF_CHARS);
        assert_eq!(truncated.chars().count(), 50_000);
        assert_eq!(truncated, &text[..50_000]);
    }

    #[test]
    fn test_truncate_chars_short_text_unchanged() {
        assert_eq!(truncate_chars("short", 100), "short");
    }

    #[test]
    fn test_truncate_chars_respects_char_boundaries() {
        let text = "héllo wörld";
        assert_eq!(truncate_chars(text, 2), "hé");
    }

    #[test]
    fn test_short_id() {
        assert_eq!(short_id("0123456789abcdef"), "0123456");
        assert_eq!(short_id("abc"), "abc");
    }

    #[test]
    fn test_extract_diff_truncates_large_output() {
        let mut history = MockHistory::new();
        history
            .expect_show()
            .returning(|_| Ok("x".repeat(80_000)));

        let diff = extract_diff(&history, "abc", MAX_DIFF_CHARS);
        assert_eq!(diff.chars().count(), MAX_DIFF_CHARS);
    }

    #[test]
    fn test_extract_diff_error_is_empty() {
        let mut history = MockHistory::new();
        history.expect_show().returning(|id| {
            Err(GitError::CommitNotFound(
                id.to_string(),
                git2::Error::from_str("missing"),
            ))
        });

        assert_eq!(extract_diff(&history, "abc", MAX_DIFF_CHARS), "");
    }

    #[test]
    fn test_render_commit_includes_metadata_and_patch() {
        let dir = tempfile::tempdir().unwrap();
        let repo = Repository::init(dir.path()).unwrap();
        let sig = Signature::now("Test User", "test@example.com").unwrap();

        std::fs::write(dir.path().join("lib.rs"), "pub fn bard() {}\n").unwrap();
        let mut index = repo.index().unwrap();
        index.add_path(std::path::Path::new("lib.rs")).unwrap();
        index.write().unwrap();
        let tree_id = index.write_tree().unwrap();
        let tree = repo.find_tree(tree_id).unwrap();
        let oid = repo
            .commit(Some("HEAD"), &sig, &sig, "wip stuff", &tree, &[])
            .unwrap();

        let commit = repo.find_commit(oid).unwrap();
        let text = render_commit(&repo, &commit).unwrap();

        assert!(text.starts_with(&format!("commit {}", oid)));
        assert!(text.contains("Author: Test User <test@example.com>"));
        assert!(text.contains("    wip stuff"));
        assert!(text.contains("lib.rs"));
        assert!(text.contains("+pub fn bard() {}"));
    }
}
