use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use super::error::DownloadError;

/// One file to fetch. Immutable once submitted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DownloadRequest {
    pub url: String,
    pub location: PathBuf,
    #[serde(default)]
    pub display_name: Option<String>,
}

impl DownloadRequest {
    pub fn new(url: impl Into<String>, location: impl Into<PathBuf>) -> Self {
        Self {
            url: url.into(),
            location: location.into(),
            display_name: None,
        }
    }

    pub fn with_display_name(mut self, name: impl Into<String>) -> Self {
        self.display_name = Some(name.into());
        self
    }

    /// Name to show for this request: the display name, else the destination file name, else the URL.
    pub fn label(&self) -> String {
        if let Some(name) = &self.display_name {
            return name.clone();
        }
        self.location
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.url.clone())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobStatus {
    Queued,
    Active,
    Completed,
    Failed,
    Cancelled,
}

impl JobStatus {
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            JobStatus::Completed | JobStatus::Failed | JobStatus::Cancelled
        )
    }
}

/// Read-only copy of an active job, taken by `DownloadManager::snapshot`.
#[derive(Debug, Clone)]
pub struct JobView {
    pub request: DownloadRequest,
    pub status: JobStatus,
    pub downloaded: u64,
    /// `None` until the response headers arrive, or when the server sends no length.
    pub total: Option<u64>,
    /// Fraction in `[0.0, 1.0]`; stays 0.0 while the total is unknown.
    pub progress: f32,
}

/// Outcome of a batch. `errors[i]` belongs to `failed[i]`.
#[derive(Debug, Clone, Default)]
pub struct DownloadReturn {
    pub completed: Vec<DownloadRequest>,
    pub failed: Vec<DownloadRequest>,
    pub errors: Vec<DownloadError>,
    /// Set when the caller aborted the batch with `cancel_all`.
    pub cancelled: bool,
}

impl DownloadReturn {
    pub(crate) fn push_completed(&mut self, request: DownloadRequest) {
        self.completed.push(request);
    }

    pub(crate) fn push_failed(&mut self, request: DownloadRequest, error: DownloadError) {
        self.failed.push(request);
        self.errors.push(error);
    }

    pub fn is_success(&self) -> bool {
        self.failed.is_empty() && !self.cancelled
    }

    pub fn cancelled_count(&self) -> usize {
        self.errors.iter().filter(|e| e.is_cancelled()).count()
    }

    pub fn error_messages(&self) -> Vec<String> {
        self.errors.iter().map(|e| e.to_string()).collect()
    }

    pub fn total(&self) -> usize {
        self.completed.len() + self.failed.len()
    }
}

/// Everything a frame loop needs to draw the batch and detect completion.
#[derive(Debug, Clone)]
pub struct Snapshot {
    pub active: Vec<JobView>,
    pub queued: usize,
    pub result: DownloadReturn,
    /// True once the queue is empty and no job is active.
    pub done: bool,
}
