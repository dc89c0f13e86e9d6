//! Shared test utilities for integration tests.
//!
//! Not all functions are used by every test file, but they're shared across tests.
#![allow(dead_code)]

use std::path::Path;
use std::process::Command;

use git2::{Oid, Repository, Signature};

/// A test git repository builder for integration tests.
pub struct TestRepo {
    pub dir: tempfile::TempDir,
    pub repo: Repository,
}

impl TestRepo {
    /// Create a new empty git repository in a temp directory.
    pub fn new() -> Self {
        let dir = tempfile::tempdir().expect("Failed to create temp directory");
        let repo = Repository::init(dir.path()).expect("Failed to init git repo");
        Self { dir, repo }
    }

    /// Create a repository with `n` commits, each touching its own file.
    /// Returns the commit OIDs oldest-first.
    pub fn with_commits(n: usize) -> (Self, Vec<Oid>) {
        let repo = Self::new();
        let oids = (0..n)
            .map(|i| {
                repo.commit_file(
                    &format!("file{}.txt", i),
                    &format!("content {}\n", i),
                    &format!("wip {}", i),
                )
            })
            .collect();
        (repo, oids)
    }

    /// Get the test signature for commits.
    fn signature(&self) -> Signature<'_> {
        Signature::now("Test User", "test@example.com").expect("Failed to create signature")
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Write `content` to `name`, stage it and commit on HEAD. Returns the commit OID.
    pub fn commit_file(&self, name: &str, content: &str, message: &str) -> Oid {
        std::fs::write(self.dir.path().join(name), content).expect("Failed to write test file");

        let mut index = self.repo.index().expect("Failed to get index");
        index.add_path(Path::new(name)).expect("Failed to add file");
        index.write().expect("Failed to write index");
        let tree_id = index.write_tree().expect("Failed to write tree");
        let tree = self.repo.find_tree(tree_id).expect("Failed to find tree");

        let parent = self.repo.head().ok().and_then(|h| h.peel_to_commit().ok());
        let parents: Vec<&git2::Commit> = parent.iter().collect();

        let sig = self.signature();
        self.repo
            .commit(Some("HEAD"), &sig, &sig, message, &tree, &parents)
            .expect("Failed to create commit")
    }

    /// Create a commit with the given message, touching `test.txt`.
    pub fn commit(&self, message: &str) -> Oid {
        let content = format!(
            "{}\n{}",
            message,
            std::time::SystemTime::now()
                .duration_since(std::time::UNIX_EPOCH)
                .unwrap()
                .as_nanos()
        );
        self.commit_file("test.txt", &content, message)
    }

    /// Replace the message of the HEAD commit, as a reword of the tip would.
    pub fn amend_head(&self, message: &str) -> Oid {
        let head = self
            .repo
            .head()
            .and_then(|h| h.peel_to_commit())
            .expect("Failed to read HEAD");
        head.amend(Some("HEAD"), None, None, None, Some(message), None)
            .expect("Failed to amend HEAD")
    }

    /// Create a branch pointing to the given OID.
    pub fn branch(&self, name: &str, oid: Oid) {
        let commit = self.repo.find_commit(oid).expect("Failed to find commit");
        self.repo.branch(name, &commit, false).expect("Failed to create branch");
    }

    /// Current branch name.
    pub fn current_branch(&self) -> String {
        self.repo
            .head()
            .ok()
            .and_then(|h| h.shorthand().map(|s| s.to_string()))
            .unwrap_or_else(|| "master".to_string())
    }

    /// Message of the commit at HEAD.
    pub fn head_message(&self) -> String {
        self.repo
            .head()
            .and_then(|h| h.peel_to_commit())
            .map(|c| c.message().unwrap_or_default().to_string())
            .expect("Failed to read HEAD")
    }

    /// Run git in the repository directory and assert it succeeds.
    pub fn git(&self, args: &[&str]) {
        let status = Command::new("git")
            .args(args)
            .current_dir(self.dir.path())
            .status()
            .expect("Failed to run git");
        assert!(status.success(), "git {:?} failed in test setup", args);
    }
}
