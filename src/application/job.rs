//! Per-job record and the progress counters shared with its worker.

use std::sync::atomic::{AtomicI64, AtomicU64, Ordering};
use std::sync::Arc;

use tokio::sync::oneshot;
use tokio::sync::oneshot::error::TryRecvError;
use tokio_util::sync::CancellationToken;

use crate::domain::{DownloadError, DownloadRequest, JobStatus, JobView};

/// Transfer counters shared between a worker (writer) and the manager (reader).
#[derive(Debug)]
pub struct JobProgress {
    downloaded: AtomicU64,
    /// `-1` while unknown.
    total: AtomicI64,
}

impl JobProgress {
    pub fn new() -> Self {
        Self {
            downloaded: AtomicU64::new(0),
            total: AtomicI64::new(-1),
        }
    }

    pub fn set_total(&self, total: Option<u64>) {
        let value = total.and_then(|t| i64::try_from(t).ok()).unwrap_or(-1);
        self.total.store(value, Ordering::Release);
    }

    /// Record a cumulative byte count. Never moves the counter backwards.
    pub fn record(&self, downloaded: u64) {
        self.downloaded.fetch_max(downloaded, Ordering::AcqRel);
    }

    pub fn downloaded(&self) -> u64 {
        self.downloaded.load(Ordering::Acquire)
    }

    pub fn total(&self) -> Option<u64> {
        u64::try_from(self.total.load(Ordering::Acquire)).ok()
    }

    pub fn fraction(&self) -> f32 {
        match self.total() {
            Some(0) | None => 0.0,
            Some(total) => (self.downloaded() as f64 / total as f64).min(1.0) as f32,
        }
    }
}

impl Default for JobProgress {
    fn default() -> Self {
        Self::new()
    }
}

pub(crate) type Outcome = Result<(), DownloadError>;

/// Manager-side record of one request. Status and error are only touched by the manager;
/// the worker writes to `progress` and reports its result over `outcome`.
pub(crate) struct DownloadJob {
    pub(crate) request: DownloadRequest,
    pub(crate) status: JobStatus,
    pub(crate) error: Option<DownloadError>,
    pub(crate) progress: Arc<JobProgress>,
    pub(crate) cancel: CancellationToken,
    outcome: Option<oneshot::Receiver<Outcome>>,
}

impl DownloadJob {
    pub(crate) fn new(request: DownloadRequest) -> Self {
        Self {
            request,
            status: JobStatus::Queued,
            error: None,
            progress: Arc::new(JobProgress::new()),
            cancel: CancellationToken::new(),
            outcome: None,
        }
    }

    pub(crate) fn start(&mut self, outcome: oneshot::Receiver<Outcome>) {
        debug_assert_eq!(self.status, JobStatus::Queued);
        self.status = JobStatus::Active;
        self.outcome = Some(outcome);
    }

    /// Non-blocking check for the worker's result.
    pub(crate) fn poll_outcome(&mut self) -> Option<Outcome> {
        let rx = self.outcome.as_mut()?;
        match rx.try_recv() {
            Ok(outcome) => Some(outcome),
            Err(TryRecvError::Empty) => None,
            Err(TryRecvError::Closed) => Some(Err(DownloadError::WorkerLost)),
        }
    }

    pub(crate) fn finish(&mut self, outcome: Outcome) {
        if self.status.is_terminal() {
            return;
        }
        self.outcome = None;
        match outcome {
            Ok(()) => self.status = JobStatus::Completed,
            Err(e) => {
                self.status = if e.is_cancelled() {
                    JobStatus::Cancelled
                } else {
                    JobStatus::Failed
                };
                self.error = Some(e);
            }
        }
    }

    /// Cancel a job that never started.
    pub(crate) fn cancel_queued(&mut self) {
        self.cancel.cancel();
        self.finish(Err(DownloadError::Cancelled));
    }

    pub(crate) fn view(&self) -> JobView {
        JobView {
            request: self.request.clone(),
            status: self.status,
            downloaded: self.progress.downloaded(),
            total: self.progress.total(),
            progress: self.progress.fraction(),
        }
    }
}
