pub mod download_manager;
pub mod job;
pub mod progress_reader;
pub mod worker;

pub use download_manager::{DownloadManager, DEFAULT_MAX_CONCURRENT};
pub use job::JobProgress;
pub use progress_reader::{ProgressFn, ProgressReader};
