use thiserror::Error;

/// Terminal error of a single job. Stored in `DownloadReturn::errors`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DownloadError {
    /// Directory creation or request construction failed before any network call.
    #[error("setup failed: {0}")]
    Setup(String),

    #[error("transport error: {0}")]
    Transport(String),

    /// Non-2xx response; carries the status line (e.g. `404 Not Found`).
    #[error("server responded with {0}")]
    Status(String),

    #[error("I/O error: {0}")]
    Io(String),

    #[error("cancelled by user")]
    Cancelled,

    /// The worker task ended without reporting an outcome.
    #[error("download worker exited unexpectedly")]
    WorkerLost,
}

impl DownloadError {
    pub fn is_cancelled(&self) -> bool {
        matches!(self, DownloadError::Cancelled)
    }
}

/// Batch-level failure reported by `DownloadManager::submit`.
#[derive(Debug, Error)]
pub enum SubmitError {
    #[error("max_concurrent must be at least 1, got {0}")]
    InvalidConcurrency(i64),

    #[error("submit must be called from within a tokio runtime")]
    NoRuntime,

    #[error("failed to build HTTP client: {0}")]
    Client(String),
}
