use thiserror::Error;

/// Errors produced by the scraping pipeline
#[derive(Debug, Error)]
pub enum ScoutError {
    /// Mutually exclusive configuration options were supplied together
    #[error("conflicting configuration: {0}")]
    ConfigConflict(String),

    /// Configuration is missing something a scenario needs
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// Failed to launch a local browser instance
    #[error("failed to launch browser: {0}")]
    LaunchFailed(String),

    /// Failed to attach to a remote debugging endpoint
    #[error("failed to connect to browser: {0}")]
    ConnectionFailed(String),

    /// Navigation did not produce an evaluable page
    #[error("navigation failed: {0}")]
    NavigationFailed(String),

    /// Tab bookkeeping failed (no usable tab, lock poisoned, ...)
    #[error("tab operation failed: {0}")]
    TabOperationFailed(String),

    /// In-page script evaluation failed
    #[error("page evaluation failed: {0}")]
    EvaluationFailed(String),

    /// An anti-bot challenge blocks the page and cannot be resolved
    #[error("anti-bot challenge: {0}")]
    ChallengeActive(String),
}

/// Result type alias for browser operations
pub type Result<T> = std::result::Result<T, ScoutError>;
