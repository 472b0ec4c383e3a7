#![allow(dead_code)]

pub mod stall_server;

use std::time::{Duration, Instant};

use launcher_downloads::{DownloadManager, Snapshot};

/// Tick the manager like a frame loop until `cond` holds. Panics after ten seconds.
pub async fn tick_until(
    manager: &mut DownloadManager,
    mut cond: impl FnMut(&Snapshot) -> bool,
) -> Snapshot {
    let deadline = Instant::now() + Duration::from_secs(10);
    loop {
        manager.tick();
        let snapshot = manager.snapshot();
        if cond(&snapshot) {
            return snapshot;
        }
        assert!(
            Instant::now() < deadline,
            "timed out waiting for condition, last snapshot: {:?}",
            snapshot
        );
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
}

pub async fn run_to_done(manager: &mut DownloadManager) -> Snapshot {
    tick_until(manager, |s| s.done).await
}
