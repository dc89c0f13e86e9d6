//! Value types shared by the rewrite pipeline.

use std::collections::HashMap;
use std::fmt;

use crate::error::GitError;
use crate::git::diff::short_id;
use crate::git::history::History;

/// A volatile commit identifier and its 0-based position from the root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitRef {
    pub id: String,
    pub position: usize,
}

impl fmt::Display for CommitRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "position {} ({})", self.position, short_id(&self.id))
    }
}

/// Full oldest-first commit sequence captured once, before any mutation.
///
/// Only used to translate a range into positions. Identifiers in here go
/// stale as soon as the first rewrite lands.
#[derive(Debug, Clone, Default)]
pub struct BaselineSnapshot {
    commits: Vec<CommitRef>,
    positions: HashMap<String, usize>,
}

impl BaselineSnapshot {
    /// Capture the current sequence reachable from HEAD.
    pub fn capture<H: History + ?Sized>(history: &H) -> Result<Self, GitError> {
        Ok(Self::from_ids(history.list_commits(None)?))
    }

    pub fn from_ids(ids: Vec<String>) -> Self {
        let positions = ids
            .iter()
            .enumerate()
            .map(|(position, id)| (id.clone(), position))
            .collect();
        let commits = ids
            .into_iter()
            .enumerate()
            .map(|(position, id)| CommitRef { id, position })
            .collect();
        Self { commits, positions }
    }

    pub fn position_of(&self, id: &str) -> Option<usize> {
        self.positions.get(id).copied()
    }

    pub fn len(&self) -> usize {
        self.commits.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commits.is_empty()
    }

    /// Highest position, if any.
    pub fn tip(&self) -> Option<usize> {
        self.commits.len().checked_sub(1)
    }
}

/// One step of work: a position, resolved against the live sequence.
#[derive(Debug, Clone)]
pub struct RewriteTarget {
    pub commit: CommitRef,
    pub diff: String,
    pub message: Option<String>,
}

impl RewriteTarget {
    pub fn new(commit: CommitRef, diff: String) -> Self {
        Self {
            commit,
            diff,
            message: None,
        }
    }
}

/// Terminal result of applying one message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RewriteOutcome {
    Applied,
    /// Non-zero exit, or `None` when the mechanism was killed by a signal.
    Conflict { code: Option<i32> },
}

impl RewriteOutcome {
    pub fn from_exit_code(code: Option<i32>) -> Self {
        match code {
            Some(0) => RewriteOutcome::Applied,
            code => RewriteOutcome::Conflict { code },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::git::history::MockHistory;

    fn ids(n: usize) -> Vec<String> {
        (0..n).map(|i| format!("{:040x}", i + 1)).collect()
    }

    #[test]
    fn test_snapshot_positions_follow_order() {
        let snapshot = BaselineSnapshot::from_ids(ids(3));
        assert_eq!(snapshot.len(), 3);
        assert_eq!(snapshot.tip(), Some(2));
        assert_eq!(snapshot.position_of(&format!("{:040x}", 1)), Some(0));
        assert_eq!(snapshot.position_of(&format!("{:040x}", 3)), Some(2));
        assert_eq!(snapshot.position_of("deadbeef"), None);
    }

    #[test]
    fn test_empty_snapshot_has_no_tip() {
        let snapshot = BaselineSnapshot::from_ids(Vec::new());
        assert!(snapshot.is_empty());
        assert_eq!(snapshot.tip(), None);
    }

    #[test]
    fn test_capture_reads_full_history() {
        let mut history = MockHistory::new();
        history
            .expect_list_commits()
            .withf(|range| range.is_none())
            .times(1)
            .returning(|_| Ok(ids(4)));

        let snapshot = BaselineSnapshot::capture(&history).unwrap();
        assert_eq!(snapshot.len(), 4);
        assert_eq!(snapshot.position_of(&ids(4)[3]), Some(3));
    }

    #[test]
    fn test_outcome_from_exit_code() {
        assert_eq!(RewriteOutcome::from_exit_code(Some(0)), RewriteOutcome::Applied);
        assert_eq!(
            RewriteOutcome::from_exit_code(Some(1)),
            RewriteOutcome::Conflict { code: Some(1) }
        );
        assert_eq!(
            RewriteOutcome::from_exit_code(None),
            RewriteOutcome::Conflict { code: None }
        );
    }

    #[test]
    fn test_commit_ref_display_uses_short_id() {
        let commit = CommitRef {
            id: "abcdef0123456789".to_string(),
            position: 3,
        };
        assert_eq!(commit.to_string(), "position 3 (abcdef0)");
    }
}
