pub mod error;
pub mod model;

pub use error::{DownloadError, SubmitError};
pub use model::{DownloadRequest, DownloadReturn, JobStatus, JobView, Snapshot};
