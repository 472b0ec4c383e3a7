//! Transfer of a single job: directory setup, GET, streaming the body to disk.

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use futures::StreamExt;
use tokio::io::AsyncWriteExt;
use tokio_util::sync::CancellationToken;

use super::job::JobProgress;
use super::progress_reader::ProgressReader;
use crate::api::{build_headers, HttpClient};
use crate::domain::{DownloadError, DownloadRequest};

/// Everything a worker owns for the lifetime of its job.
pub struct WorkerContext {
    pub client: HttpClient,
    pub request: DownloadRequest,
    pub headers: Arc<HashMap<String, String>>,
    pub progress: Arc<JobProgress>,
    pub cancel: CancellationToken,
}

/// Run one job to a terminal outcome. Cancellation wins over a transfer finishing at the same time.
///
/// On failure or cancellation a destination file this job created is removed.
pub async fn run_job(ctx: WorkerContext) -> Result<(), DownloadError> {
    let WorkerContext {
        client,
        request,
        headers,
        progress,
        cancel,
    } = ctx;

    let mut file_created = false;
    let outcome = tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(DownloadError::Cancelled),
        result = transfer(&client, &request, &headers, &progress, &mut file_created) => result,
    };

    match &outcome {
        Ok(()) => tracing::debug!(bytes = progress.downloaded(), "transfer finished"),
        Err(e) => {
            tracing::debug!(error = %e, "transfer stopped");
            if file_created {
                remove_partial(&request.location).await;
            }
        }
    }

    outcome
}

async fn transfer(
    client: &HttpClient,
    request: &DownloadRequest,
    headers: &HashMap<String, String>,
    progress: &Arc<JobProgress>,
    file_created: &mut bool,
) -> Result<(), DownloadError> {
    if let Some(parent) = request.location.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent).await.map_err(|e| {
            DownloadError::Setup(format!("failed to create {}: {}", parent.display(), e))
        })?;
    }

    let header_map = build_headers(headers)?;
    let (total_size, body) = client.fetch_stream(&request.url, header_map).await?;
    progress.set_total(total_size);

    // Set before the await: a dropped create may still truncate the file.
    *file_created = true;
    let mut file = tokio::fs::File::create(&request.location)
        .await
        .map_err(|e| DownloadError::Io(format!("Failed to create file: {}", e)))?;

    let sink = Arc::clone(progress);
    let mut body = ProgressReader::new(
        body,
        Some(Box::new(move |read: u64| sink.record(read))),
    );

    while let Some(chunk) = body.next().await {
        let chunk = chunk?;
        file.write_all(&chunk)
            .await
            .map_err(|e| DownloadError::Io(format!("Write error: {}", e)))?;
    }

    file.sync_all()
        .await
        .map_err(|e| DownloadError::Io(format!("Failed to sync file: {}", e)))?;

    Ok(())
}

async fn remove_partial(path: &Path) {
    if let Err(e) = tokio::fs::remove_file(path).await {
        if e.kind() != std::io::ErrorKind::NotFound {
            tracing::warn!(
                path = %path.display(),
                error = %e,
                "failed to remove partial download"
            );
        }
    }
}
