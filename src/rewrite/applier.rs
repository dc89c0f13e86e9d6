//! Message application through the external `cmsg` tool.

use async_trait::async_trait;
use tokio::process::Command;
use tracing::debug;

use crate::error::RewriteError;
use crate::rewrite::model::RewriteOutcome;

const CMSG_BIN: &str = "cmsg";

/// Mutation collaborator: replace the message of one commit.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RewriteMechanism: Send + Sync {
    /// Exit code of the mechanism, or `None` if it was killed by a signal.
    async fn reword(&self, id: &str, message: &str) -> Result<Option<i32>, RewriteError>;
}

/// Runs `cmsg -c <id> -m <message>` with the terminal attached, so any
/// conflict output goes straight to the user.
#[derive(Debug, Clone, Default)]
pub struct Cmsg;

#[async_trait]
impl RewriteMechanism for Cmsg {
    async fn reword(&self, id: &str, message: &str) -> Result<Option<i32>, RewriteError> {
        let status = Command::new(CMSG_BIN)
            .arg("-c")
            .arg(id)
            .arg("-m")
            .arg(message)
            .status()
            .await
            .map_err(RewriteError::SpawnFailed)?;
        Ok(status.code())
    }
}

/// Check that `cmsg` is on PATH.
pub fn check_cmsg_installed() -> Result<(), RewriteError> {
    which::which(CMSG_BIN)
        .map(|path| debug!("Found {} at {}", CMSG_BIN, path.display()))
        .map_err(|_| RewriteError::NotInstalled)
}

/// Prefix a space when the message would otherwise be read as an option.
pub fn guard_option_marker(message: &str) -> String {
    if message.starts_with('-') {
        format!(" {}", message)
    } else {
        message.to_string()
    }
}

/// Applies one message to one live identifier.
pub struct RewriteApplier<M> {
    mechanism: M,
}

impl<M: RewriteMechanism> RewriteApplier<M> {
    pub fn new(mechanism: M) -> Self {
        Self { mechanism }
    }

    /// Apply `message` to `id`. A spawn failure is an error; any exit is an outcome.
    pub async fn apply(&self, id: &str, message: &str) -> Result<RewriteOutcome, RewriteError> {
        let guarded = guard_option_marker(message);
        let code = self.mechanism.reword(id, &guarded).await?;
        debug!("cmsg exited with {:?} for {}", code, id);
        Ok(RewriteOutcome::from_exit_code(code))
    }
}
