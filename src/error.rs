use thiserror::Error;

#[derive(Debug, Error)]
pub enum InboxError {
    #[error("request failed: {0}")]
    Network(#[from] reqwest::Error),
    #[error("{endpoint} answered HTTP {status}")]
    Status { endpoint: &'static str, status: u16 },
    #[error("unexpected response body: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("message text is empty")]
    Validation,
    #[error("cancelled by user")]
    UserAborted,
}

impl InboxError {
    /// Failures of the transport or the payload. These are logged and
    /// swallowed by the refresh loop; the next tick is a fresh attempt.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            InboxError::Network(_) | InboxError::Status { .. } | InboxError::Parse(_)
        )
    }
}

pub type InboxResult<T> = Result<T, InboxError>;
