//! Concurrent batch download manager for handheld launchers.
//!
//! A frame loop submits a batch, calls [`DownloadManager::tick`] every frame and reads
//! [`DownloadManager::snapshot`] to draw progress. Cancellation comes from the same loop
//! through [`DownloadManager::cancel_all`] or [`DownloadManager::cancel_one`].

pub mod api;
pub mod application;
pub mod config;
pub mod domain;
pub mod logging;
pub mod utils;

pub use application::{DownloadManager, ProgressReader, DEFAULT_MAX_CONCURRENT};
pub use config::ManagerConfig;
pub use domain::{
    DownloadError, DownloadRequest, DownloadReturn, JobStatus, JobView, Snapshot, SubmitError,
};
