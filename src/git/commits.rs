//! Conventional commit vocabulary.

use std::fmt;
use std::sync::OnceLock;

use regex_lite::Regex;

/// Conventional commit types accepted in generated messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommitType {
    Feat,
    Fix,
    Chore,
    Docs,
    Style,
    Refactor,
    Perf,
    Test,
    Ci,
    Build,
}

impl CommitType {
    /// Every type, in the order the prompt lists them.
    pub const ALL: [CommitType; 10] = [
        CommitType::Feat,
        CommitType::Fix,
        CommitType::Chore,
        CommitType::Docs,
        CommitType::Style,
        CommitType::Refactor,
        CommitType::Perf,
        CommitType::Test,
        CommitType::Ci,
        CommitType::Build,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            CommitType::Feat => "feat",
            CommitType::Fix => "fix",
            CommitType::Chore => "chore",
            CommitType::Docs => "docs",
            CommitType::Style => "style",
            CommitType::Refactor => "refactor",
            CommitType::Perf => "perf",
            CommitType::Test => "test",
            CommitType::Ci => "ci",
            CommitType::Build => "build",
        }
    }
}

impl fmt::Display for CommitType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for CommitType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.to_lowercase();
        CommitType::ALL
            .into_iter()
            .find(|t| t.as_str() == lower)
            .ok_or_else(|| format!("Unknown commit type: {}", s))
    }
}

fn subject_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    // type(scope)!: description, scope and bang optional
    RE.get_or_init(|| {
        Regex::new(r"^(\w+)(?:\([^)]+\))?!?\s*:\s*\S").expect("subject pattern is valid")
    })
}

/// The conventional type of a subject line, if it has a known one.
///
/// Used only for diagnostics: generated messages are never rejected for
/// failing this check.
pub fn conventional_type(subject: &str) -> Option<CommitType> {
    let first_line = subject.trim_start().lines().next().unwrap_or("");
    subject_regex()
        .captures(first_line)
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse().ok())
}
