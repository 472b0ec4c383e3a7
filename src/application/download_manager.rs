//! Frame-driven scheduler for a batch of downloads.
//!
//! The caller owns a `DownloadManager` and calls `tick` once per frame. Each tick reaps
//! workers that reported an outcome, folds them into the batch result, and admits queued
//! jobs in submission order up to the concurrency cap. Nothing here blocks: worker results
//! arrive over oneshot channels and live counters are atomics.

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;

use tokio::runtime::Handle;
use tokio::sync::oneshot;
use tracing::Instrument;

use super::job::DownloadJob;
use super::worker::{self, WorkerContext};
use crate::api::HttpClient;
use crate::config::ManagerConfig;
use crate::domain::{DownloadRequest, DownloadReturn, Snapshot, SubmitError};

pub const DEFAULT_MAX_CONCURRENT: i64 = 3;

pub struct DownloadManager {
    queue: VecDeque<DownloadJob>,
    active: Vec<DownloadJob>,
    result: DownloadReturn,
    max_concurrent: usize,
    headers: Arc<HashMap<String, String>>,
    client: HttpClient,
    runtime: Handle,
    finish_logged: bool,
}

impl DownloadManager {
    /// Queue a batch with default HTTP settings. Workers start on the first `tick`.
    pub fn submit(
        requests: Vec<DownloadRequest>,
        headers: HashMap<String, String>,
        max_concurrent: i64,
    ) -> Result<Self, SubmitError> {
        let config = ManagerConfig {
            max_concurrent,
            ..ManagerConfig::default()
        };
        Self::submit_with_config(requests, headers, &config)
    }

    /// Queue a batch. Must be called from within a tokio runtime; workers are spawned on it.
    pub fn submit_with_config(
        requests: Vec<DownloadRequest>,
        headers: HashMap<String, String>,
        config: &ManagerConfig,
    ) -> Result<Self, SubmitError> {
        let max_concurrent = usize::try_from(config.max_concurrent)
            .ok()
            .filter(|n| *n > 0)
            .ok_or(SubmitError::InvalidConcurrency(config.max_concurrent))?;
        let runtime = Handle::try_current().map_err(|_| SubmitError::NoRuntime)?;
        let client =
            HttpClient::new(&config.http).map_err(|e| SubmitError::Client(e.to_string()))?;

        let queue: VecDeque<DownloadJob> = requests.into_iter().map(DownloadJob::new).collect();
        tracing::info!(jobs = queue.len(), max_concurrent, "download batch submitted");

        Ok(Self {
            queue,
            active: Vec::with_capacity(max_concurrent),
            result: DownloadReturn::default(),
            max_concurrent,
            headers: Arc::new(headers),
            client,
            runtime,
            finish_logged: false,
        })
    }

    /// Reap finished workers, then fill free slots from the front of the queue.
    pub fn tick(&mut self) {
        self.reap();
        self.admit();

        if self.is_done() && !self.finish_logged {
            self.finish_logged = true;
            tracing::info!(
                completed = self.result.completed.len(),
                failed = self.result.failed.len(),
                cancelled = self.result.cancelled,
                "download batch finished"
            );
        }
    }

    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            active: self.active.iter().map(DownloadJob::view).collect(),
            queued: self.queue.len(),
            result: self.result.clone(),
            done: self.is_done(),
        }
    }

    pub fn is_done(&self) -> bool {
        self.queue.is_empty() && self.active.is_empty()
    }

    /// Abort the batch: signal every active worker and fail every queued job as cancelled.
    /// Active jobs land in the result once their workers report back on a later `tick`.
    /// A batch that already finished is left as it is.
    pub fn cancel_all(&mut self) {
        if self.result.cancelled || self.is_done() {
            return;
        }
        self.result.cancelled = true;

        for job in &self.active {
            job.cancel.cancel();
        }
        let never_started = self.queue.len();
        while let Some(mut job) = self.queue.pop_front() {
            job.cancel_queued();
            self.fold(job);
        }

        tracing::info!(
            active = self.active.len(),
            never_started,
            "download batch cancelled"
        );
    }

    /// Signal one active job, by its position in `snapshot().active`.
    /// Returns false when there is no such job.
    pub fn cancel_one(&self, index: usize) -> bool {
        match self.active.get(index) {
            Some(job) => {
                tracing::debug!(url = %job.request.url, "cancelling job");
                job.cancel.cancel();
                true
            }
            None => false,
        }
    }

    /// Hand back the batch result, cancelling any worker still running.
    pub fn into_result(mut self) -> DownloadReturn {
        std::mem::take(&mut self.result)
    }

    fn reap(&mut self) {
        let mut i = 0;
        while i < self.active.len() {
            match self.active[i].poll_outcome() {
                Some(outcome) => {
                    let mut job = self.active.remove(i);
                    job.finish(outcome);
                    self.fold(job);
                }
                None => i += 1,
            }
        }
    }

    fn admit(&mut self) {
        let free = self.max_concurrent.saturating_sub(self.active.len());
        for _ in 0..free {
            let Some(mut job) = self.queue.pop_front() else {
                break;
            };
            self.spawn_worker(&mut job);
            self.active.push(job);
        }
    }

    fn spawn_worker(&self, job: &mut DownloadJob) {
        let (tx, rx) = oneshot::channel();
        let ctx = WorkerContext {
            client: self.client.clone(),
            request: job.request.clone(),
            headers: Arc::clone(&self.headers),
            progress: Arc::clone(&job.progress),
            cancel: job.cancel.clone(),
        };
        let span = tracing::debug_span!("download", url = %job.request.url);

        tracing::debug!(url = %job.request.url, "admitting job");
        self.runtime.spawn(
            async move {
                let outcome = worker::run_job(ctx).await;
                // The manager may already be gone.
                let _ = tx.send(outcome);
            }
            .instrument(span),
        );
        job.start(rx);
    }

    fn fold(&mut self, job: DownloadJob) {
        match job.error {
            None => {
                tracing::debug!(url = %job.request.url, "download completed");
                self.result.push_completed(job.request);
            }
            Some(error) => {
                if error.is_cancelled() {
                    tracing::debug!(url = %job.request.url, "download cancelled");
                } else {
                    tracing::warn!(url = %job.request.url, error = %error, "download failed");
                }
                self.result.push_failed(job.request, error);
            }
        }
    }
}

impl Drop for DownloadManager {
    fn drop(&mut self) {
        for job in &self.active {
            job.cancel.cancel();
        }
    }
}
