//! History rewriting: range resolution, planning, application and publishing.

pub mod applier;
pub mod index;
pub mod model;
pub mod orchestrator;
pub mod preflight;
pub mod publish;

pub use applier::{Cmsg, RewriteApplier, RewriteMechanism, check_cmsg_installed, guard_option_marker};
pub use index::{RangeSpec, processing_order, resolve_positions};
pub use model::{BaselineSnapshot, CommitRef, RewriteOutcome, RewriteTarget};
pub use orchestrator::{Orchestrator, Plan, Progress, RunError, RunOptions, RunReport, RunState};
pub use preflight::{PreflightResult, run_checks};
pub use publish::{PublishGate, PublishPlan, Upstream};
