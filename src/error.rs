// Error types for the gloss engine.
// Distinguishes retryable network failures from hard auth, anchor, and storage errors.

use std::time::Duration;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum GlossError {
    #[error("login required: {url}")]
    LoginRequired { url: String },

    #[error("HTTP {status} from {url}")]
    UpstreamStatus {
        status: reqwest::StatusCode,
        url: String,
    },

    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("element {selector:?} did not appear within {waited:?}")]
    AnchorTimeout { selector: String, waited: Duration },

    #[error("storage error: {0}")]
    Storage(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid configuration: {0}")]
    Config(String),
}

impl GlossError {
    /// Whether another attempt at the same request could plausibly succeed.
    /// Login-required failures are permanent until the user authenticates.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            GlossError::UpstreamStatus { .. } | GlossError::Transport(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, GlossError>;
