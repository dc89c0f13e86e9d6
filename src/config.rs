//! Environment configuration for the completion service.

use std::env;
use std::time::Duration;

use tracing::warn;

use crate::error::ConfigError;

/// Environment variable holding the completion service credential.
pub const API_KEY_ENV_VAR: &str = "GEMINI_API_KEY";

/// Environment variable overriding the default model.
pub const MODEL_ENV_VAR: &str = "GIT_BARD_MODEL";

/// Environment variable overriding the HTTP timeout (seconds).
pub const TIMEOUT_ENV_VAR: &str = "GIT_BARD_TIMEOUT";

pub const DEFAULT_MODEL: &str = "gemini-3-flash-preview";

/// Default timeout for a single completion request (2 minutes).
const DEFAULT_TIMEOUT_SECS: u64 = 120;

/// Settings resolved from the environment and CLI overrides.
#[derive(Debug, Clone)]
pub struct Settings {
    pub api_key: String,
    pub model: String,
    pub timeout: Duration,
}

impl Settings {
    /// Read settings from the environment.
    ///
    /// `model_override` (from `--model`) wins over `GIT_BARD_MODEL`.
    /// A missing or blank `GEMINI_API_KEY` is a precondition failure.
    pub fn from_env(model_override: Option<&str>) -> Result<Self, ConfigError> {
        let api_key = match env::var(API_KEY_ENV_VAR) {
            Ok(v) if !v.trim().is_empty() => v.trim().to_string(),
            _ => return Err(ConfigError::MissingApiKey(API_KEY_ENV_VAR)),
        };

        let model = model_override
            .map(str::to_string)
            .or_else(|| env::var(MODEL_ENV_VAR).ok().filter(|m| !m.trim().is_empty()))
            .unwrap_or_else(|| DEFAULT_MODEL.to_string());

        Ok(Self {
            api_key,
            model,
            timeout: get_timeout(),
        })
    }
}

/// Get the configured request timeout.
///
/// Logs a warning if `GIT_BARD_TIMEOUT` is set but is not a whole number of seconds.
fn get_timeout() -> Duration {
    match env::var(TIMEOUT_ENV_VAR) {
        Ok(v) if !v.is_empty() => match v.parse::<u64>() {
            Ok(secs) => Duration::from_secs(secs),
            Err(_) => {
                warn!(
                    "Invalid {} value '{}', using default {}s",
                    TIMEOUT_ENV_VAR, v, DEFAULT_TIMEOUT_SECS
                );
                Duration::from_secs(DEFAULT_TIMEOUT_SECS)
            }
        },
        _ => Duration::from_secs(DEFAULT_TIMEOUT_SECS),
    }
}
