//! Prompt construction for conventional commit messages.

use crate::git::commits::CommitType;

/// Subject length the model is asked to stay under. Not enforced locally.
pub const SUBJECT_BUDGET: usize = 72;

/// Reply tag prefix for batched requests (`COMMIT#<n>: <message>`).
pub const BATCH_TAG: &str = "COMMIT#";

fn allowed_types() -> String {
    CommitType::ALL
        .iter()
        .map(|t| t.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}

fn message_rules() -> String {
    format!(
        "Format: <type>: <description>\n\
         Allowed types: {types}.\n\
         Rules:\n\
         1. Keep the first line under {budget} characters.\n\
         2. Use lowercase for the description.\n\
         3. Do not end with a period.\n\
         4. No markdown, no quotes, no code fences.",
        types = allowed_types(),
        budget = SUBJECT_BUDGET,
    )
}

/// Build the prompt for a single commit.
pub fn build_commit_prompt(diff: &str) -> String {
    format!(
        "You are a strict code reviewer. Analyze the following git diff and commit metadata.\n\
         Write a single, professional 'Conventional Commit' message for this change.\n\
         {rules}\n\
         5. Return ONLY the commit message, as exactly one line.\n\n\
         DIFF:\n{diff}",
        rules = message_rules(),
    )
}

/// Build one composite prompt for several commits.
///
/// `items` are `(tag, diff)` pairs; tags are the 1-based sequence numbers the
/// reply lines must echo back.
pub fn build_batch_prompt(items: &[(usize, &str)]) -> String {
    let mut prompt = format!(
        "You are a strict code reviewer. Below are {count} git commits, each with its diff \
         and metadata, labelled {tag}1 to {tag}{count}.\n\
         Write one professional 'Conventional Commit' message for EACH commit.\n\
         {rules}\n\
         5. Reply with exactly {count} lines and nothing else, one per commit, in the form:\n\
         {tag}<n>: <type>: <description>\n\n",
        count = items.len(),
        tag = BATCH_TAG,
        rules = message_rules(),
    );

    for (tag, diff) in items {
        prompt.push_str(&format!("=== {BATCH_TAG}{tag} ===\n{diff}\n\n"));
    }

    prompt
}
