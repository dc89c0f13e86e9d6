//! The rewrite session: resolve a range, plan, then reword commits one by one.
//!
//! Positions are fixed at resolution time. Every step re-reads the live
//! sequence to find the identifier currently at its position, because each
//! apply rewrites identifiers above it.

use std::fmt;
use std::time::Duration;

use thiserror::Error;
use tracing::{debug, warn};

use crate::error::{GenerationError, GitError, ResolveError, RewriteError};
use crate::git::diff::{MAX_DIFF_CHARS, extract_diff};
use crate::git::history::History;
use crate::message::sanitize::sanitize;
use crate::message::source::{GeneratedMessage, GenerationMode, MessageSource};
use crate::rewrite::applier::{RewriteApplier, RewriteMechanism};
use crate::rewrite::index::{RangeSpec, processing_order, resolve_positions};
use crate::rewrite::model::{BaselineSnapshot, CommitRef, RewriteOutcome, RewriteTarget};

/// Pause between successful rewrites so the repository settles.
pub const DEFAULT_STEP_PAUSE: Duration = Duration::from_millis(500);

/// Where a session is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    Idle,
    Resolving,
    Planning,
    /// Working on the given position.
    Processing(usize),
    Done,
    Aborted,
}

/// Resolved work for one session.
#[derive(Debug, Clone)]
pub struct Plan {
    pub baseline_len: usize,
    /// Target positions, ascending.
    pub positions: Vec<usize>,
    /// Target positions in processing order, descending.
    pub order: Vec<usize>,
}

impl Plan {
    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}

/// How far a session got before stopping.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Progress {
    pub processed: usize,
    pub remaining: usize,
    pub failed_at: Option<CommitRef>,
}

impl fmt::Display for Progress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "processed {}, remaining {}",
            self.processed, self.remaining
        )?;
        if let Some(commit) = &self.failed_at {
            write!(f, ", failed at {}", commit)?;
        }
        Ok(())
    }
}

/// A session-ending failure.
#[derive(Error, Debug)]
pub enum RunError {
    #[error(transparent)]
    Resolve(#[from] ResolveError),

    #[error("Message generation failed ({progress}): {source}")]
    Generation {
        progress: Progress,
        #[source]
        source: GenerationError,
    },

    #[error("cmsg exited with {} ({progress})", describe_exit(.code))]
    Apply {
        progress: Progress,
        code: Option<i32>,
    },

    #[error("Could not run the rewrite ({progress}): {source}")]
    Rewriter {
        progress: Progress,
        #[source]
        source: RewriteError,
    },

    #[error("Could not re-read history ({progress}): {source}")]
    Refresh {
        progress: Progress,
        #[source]
        source: GitError,
    },
}

impl RunError {
    pub fn progress(&self) -> Option<&Progress> {
        match self {
            RunError::Resolve(_) => None,
            RunError::Generation { progress, .. }
            | RunError::Apply { progress, .. }
            | RunError::Rewriter { progress, .. }
            | RunError::Refresh { progress, .. } => Some(progress),
        }
    }

    /// Manual steps for leaving the repository in a sane state, if any.
    pub fn remediation(&self) -> Option<&'static str> {
        match self {
            RunError::Apply { .. } => Some(
                "The rebase stopped in a conflict. Resolve the conflicts and run \
                 `git rebase --continue`, or run `git rebase --abort` to restore the \
                 previous history.",
            ),
            _ => None,
        }
    }
}

fn describe_exit(code: &Option<i32>) -> String {
    match code {
        Some(code) => format!("status {}", code),
        None => "no status (terminated by signal)".to_string(),
    }
}

/// Session options from the command line.
#[derive(Debug, Clone)]
pub struct RunOptions {
    /// Generate and print messages without rewriting anything.
    pub dry_run: bool,
    pub step_pause: Duration,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            dry_run: false,
            step_pause: DEFAULT_STEP_PAUSE,
        }
    }
}

/// What a completed session did.
#[derive(Debug, Clone, Default)]
pub struct RunReport {
    pub planned: usize,
    /// Commits rewritten, with the identifier they had just before the apply.
    pub rewritten: Vec<CommitRef>,
    /// Positions skipped as out of bounds or without a diff.
    pub skipped: Vec<usize>,
    pub messages: Vec<GeneratedMessage>,
    pub dry_run: bool,
}

/// Drives one rewrite session.
pub struct Orchestrator<'a, H: ?Sized, M> {
    history: &'a H,
    source: &'a mut dyn MessageSource,
    applier: RewriteApplier<M>,
    options: RunOptions,
    state: RunState,
}

impl<'a, H, M> Orchestrator<'a, H, M>
where
    H: History + ?Sized,
    M: RewriteMechanism,
{
    pub fn new(
        history: &'a H,
        source: &'a mut dyn MessageSource,
        applier: RewriteApplier<M>,
        options: RunOptions,
    ) -> Self {
        Self {
            history,
            source,
            applier,
            options,
            state: RunState::Idle,
        }
    }

    pub fn state(&self) -> RunState {
        self.state
    }

    fn transition(&mut self, next: RunState) {
        debug!("Session state {:?} -> {:?}", self.state, next);
        self.state = next;
    }

    fn abort<E>(&mut self, error: E) -> RunError
    where
        E: Into<RunError>,
    {
        self.transition(RunState::Aborted);
        error.into()
    }

    /// Capture the baseline and map `spec` onto positions.
    pub fn resolve(&mut self, spec: &RangeSpec) -> Result<Plan, RunError> {
        self.transition(RunState::Resolving);

        let baseline = match BaselineSnapshot::capture(self.history) {
            Ok(baseline) => baseline,
            Err(e) => return Err(self.abort(ResolveError::Query(e))),
        };
        let positions = match resolve_positions(spec, &baseline, self.history) {
            Ok(positions) => positions,
            Err(e) => return Err(self.abort(e)),
        };

        self.transition(RunState::Planning);
        let order = processing_order(&positions);
        debug!("Processing order: {:?}", order);

        Ok(Plan {
            baseline_len: baseline.len(),
            positions,
            order,
        })
    }

    /// Rewrite every planned position, highest first. Stops at the first
    /// generation or apply failure; nothing already rewritten is undone.
    pub async fn execute(&mut self, plan: &Plan) -> Result<RunReport, RunError> {
        let mut report = RunReport {
            planned: plan.len(),
            dry_run: self.options.dry_run,
            ..RunReport::default()
        };

        if self.source.mode() == GenerationMode::Batch {
            self.prepare_batch(plan).await?;
        }

        for (step, &position) in plan.order.iter().enumerate() {
            self.transition(RunState::Processing(position));
            let progress = |failed_at: Option<CommitRef>| Progress {
                processed: step,
                remaining: plan.len() - step,
                failed_at,
            };

            let commit = match self.refresh(position) {
                Ok(Some(commit)) => commit,
                Ok(None) => {
                    warn!(
                        "Position {} is beyond the current history, skipping",
                        position
                    );
                    println!("  [SKIP] position {}", position);
                    report.skipped.push(position);
                    continue;
                }
                Err(source) => {
                    let progress = progress(None);
                    return Err(self.abort(RunError::Refresh { progress, source }));
                }
            };

            let diff = extract_diff(self.history, &commit.id, MAX_DIFF_CHARS);
            if diff.is_empty() {
                warn!("No diff for {}, skipping", commit);
                println!("  [SKIP] {}", commit);
                report.skipped.push(position);
                continue;
            }
            let mut target = RewriteTarget::new(commit, diff);

            let generated = match self.next_message(&target).await {
                Ok(generated) => generated,
                Err(source) => {
                    let progress = progress(Some(target.commit.clone()));
                    return Err(self.abort(RunError::Generation { progress, source }));
                }
            };
            let message: &str = target.message.insert(generated.text.clone());

            if self.options.dry_run {
                println!("  [DRY RUN] {}: {}", target.commit, message);
                report.messages.push(generated);
                continue;
            }

            println!("  [REWRITE] {}: {}", target.commit, message);
            let outcome = match self.applier.apply(&target.commit.id, message).await {
                Ok(outcome) => outcome,
                Err(source) => {
                    let progress = progress(Some(target.commit.clone()));
                    return Err(self.abort(RunError::Rewriter { progress, source }));
                }
            };

            match outcome {
                RewriteOutcome::Applied => {
                    report.messages.push(generated);
                    report.rewritten.push(target.commit);
                }
                RewriteOutcome::Conflict { code } => {
                    let progress = progress(Some(target.commit));
                    return Err(self.abort(RunError::Apply { progress, code }));
                }
            }

            if step + 1 < plan.len() && !self.options.step_pause.is_zero() {
                tokio::time::sleep(self.options.step_pause).await;
            }
        }

        self.transition(RunState::Done);
        Ok(report)
    }

    /// The commit currently at `position`, or `None` if the history is shorter.
    fn refresh(&self, position: usize) -> Result<Option<CommitRef>, GitError> {
        let live = self.history.list_commits(None)?;
        Ok(live
            .into_iter()
            .nth(position)
            .map(|id| CommitRef { id, position }))
    }

    async fn next_message(
        &mut self,
        target: &RewriteTarget,
    ) -> Result<GeneratedMessage, GenerationError> {
        let mut generated = self
            .source
            .message_for(target.commit.position, &target.diff)
            .await?;
        generated.text = sanitize(&generated.text).ok_or(GenerationError::EmptyMessage)?;
        Ok(generated)
    }

    /// Batch mode: gather every diff up front and request all messages at once.
    async fn prepare_batch(&mut self, plan: &Plan) -> Result<(), RunError> {
        let nothing_done = |failed_at| Progress {
            processed: 0,
            remaining: plan.len(),
            failed_at,
        };

        let live = match self.history.list_commits(None) {
            Ok(live) => live,
            Err(source) => {
                let progress = nothing_done(None);
                return Err(self.abort(RunError::Refresh { progress, source }));
            }
        };

        let diffs: Vec<(usize, String)> = plan
            .order
            .iter()
            .filter_map(|&position| {
                let id = live.get(position)?;
                let diff = extract_diff(self.history, id, MAX_DIFF_CHARS);
                (!diff.is_empty()).then_some((position, diff))
            })
            .collect();

        if let Err(source) = self.source.prepare(&diffs).await {
            let progress = nothing_done(None);
            return Err(self.abort(RunError::Generation { progress, source }));
        }
        Ok(())
    }
}
