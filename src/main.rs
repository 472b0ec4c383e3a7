use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::{Duration, Instant};

use anyhow::{anyhow, bail, Context, Result};
use clap::Parser;
use serde::Deserialize;

use launcher_downloads::utils::{file_name_from_url, format_bytes};
use launcher_downloads::{config, logging, DownloadManager, DownloadRequest, Snapshot};

const REPORT_INTERVAL: Duration = Duration::from_secs(1);

/// Fetch a batch of files listed in a JSON manifest, a few at a time.
#[derive(Debug, Parser)]
#[command(name = "launcher-downloads", version)]
struct Args {
    /// JSON array of {"url", "location"?, "display_name"?}
    manifest: PathBuf,

    /// Directory for entries without an explicit location.
    #[arg(short, long, default_value = ".")]
    output_dir: PathBuf,

    /// TOML config file.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Overrides max_concurrent from the config.
    #[arg(short = 'j', long)]
    max_concurrent: Option<i64>,

    /// Extra request header, NAME:VALUE. Repeatable.
    #[arg(short = 'H', long = "header")]
    headers: Vec<String>,

    /// Tick interval in milliseconds.
    #[arg(long, default_value_t = 16)]
    frame_ms: u64,
}

#[derive(Debug, Deserialize)]
struct ManifestEntry {
    url: String,
    #[serde(default)]
    location: Option<PathBuf>,
    #[serde(default)]
    display_name: Option<String>,
}

#[tokio::main]
async fn main() -> ExitCode {
    logging::init_logging_stderr();

    match run(Args::parse()).await {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            tracing::error!("{:#}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(args: Args) -> Result<bool> {
    let mut cfg = match &args.config {
        Some(path) => config::load_from(path)?,
        None => config::ManagerConfig::default(),
    };
    if let Some(n) = args.max_concurrent {
        cfg.max_concurrent = n;
    }

    let requests = read_manifest(&args.manifest, &args.output_dir)?;
    let headers = parse_headers(&args.headers)?;

    let mut manager = DownloadManager::submit_with_config(requests, headers, &cfg)?;
    let mut frame = tokio::time::interval(Duration::from_millis(args.frame_ms.max(1)));
    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);
    let mut interrupted = false;
    let mut last_report = Instant::now();

    loop {
        tokio::select! {
            _ = frame.tick() => {}
            res = &mut ctrl_c, if !interrupted => {
                interrupted = true;
                if let Err(e) = res {
                    tracing::warn!("failed to listen for Ctrl-C: {}", e);
                } else {
                    tracing::info!("interrupted, cancelling downloads");
                    manager.cancel_all();
                }
            }
        }

        manager.tick();
        let snapshot = manager.snapshot();
        if snapshot.done {
            break;
        }
        if last_report.elapsed() >= REPORT_INTERVAL {
            report(&snapshot);
            last_report = Instant::now();
        }
    }

    let result = manager.into_result();
    for request in &result.completed {
        tracing::info!("completed: {}", request.label());
    }
    for (request, error) in result.failed.iter().zip(&result.errors) {
        if error.is_cancelled() {
            tracing::info!("canceled: {}", request.label());
        } else {
            tracing::error!("failed: {} ({})", request.label(), error);
        }
    }

    Ok(result.is_success())
}

fn report(snapshot: &Snapshot) {
    for job in &snapshot.active {
        match job.total {
            Some(total) => tracing::info!(
                "{}: {} / {} ({:.0}%)",
                job.request.label(),
                format_bytes(job.downloaded),
                format_bytes(total),
                job.progress * 100.0
            ),
            None => tracing::info!("{}: {}", job.request.label(), format_bytes(job.downloaded)),
        }
    }
    tracing::info!(
        "{} queued, {} done, {} failed",
        snapshot.queued,
        snapshot.result.completed.len(),
        snapshot.result.failed.len()
    );
}

fn read_manifest(path: &Path, output_dir: &Path) -> Result<Vec<DownloadRequest>> {
    let data = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read manifest {}", path.display()))?;
    let entries: Vec<ManifestEntry> = serde_json::from_str(&data)
        .with_context(|| format!("invalid manifest {}", path.display()))?;

    entries
        .into_iter()
        .map(|entry| {
            let location = match entry.location {
                Some(location) => location,
                None => {
                    let name = file_name_from_url(&entry.url)
                        .ok_or_else(|| anyhow!("cannot derive a file name from {}", entry.url))?;
                    output_dir.join(name)
                }
            };
            Ok(DownloadRequest {
                url: entry.url,
                location,
                display_name: entry.display_name,
            })
        })
        .collect()
}

fn parse_headers(raw: &[String]) -> Result<HashMap<String, String>> {
    let mut headers = HashMap::with_capacity(raw.len());
    for item in raw {
        let Some((name, value)) = item.split_once(':') else {
            bail!("header must be NAME:VALUE, got {:?}", item);
        };
        headers.insert(name.trim().to_string(), value.trim().to_string());
    }
    Ok(headers)
}
