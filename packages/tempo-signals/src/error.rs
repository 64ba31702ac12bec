use thiserror::Error;

/// Error channel of a trigger source.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SignalError {
    #[error("upstream error: {0}")]
    Upstream(String),

    #[error("source is closed")]
    Closed,
}

impl SignalError {
    pub fn upstream(message: impl Into<String>) -> Self {
        SignalError::Upstream(message.into())
    }
}
