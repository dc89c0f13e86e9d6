//! Git operations using git2-rs.

pub mod commits;
pub mod diff;
pub mod history;

pub use commits::{CommitType, conventional_type};
pub use diff::{MAX_DIFF_CHARS, extract_diff, short_id, truncate_chars};
pub use history::{GitRepo, History};
