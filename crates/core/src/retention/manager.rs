//! Retention manager implementation.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::{Duration, SystemTime};

use futures::StreamExt;
use serde::{Deserialize, Serialize};
use tokio::sync::{broadcast, mpsc};
use tokio_util::time::DelayQueue;
use tracing::{debug, info, warn};

use super::{RetentionConfig, RetentionError, MAX_SERVE_GRACE_MS};
use crate::metrics;

/// Outcome of one sweep.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SweepReport {
    pub removed: usize,
    pub failed: usize,
}

/// Owns artifact files once their job has completed.
pub struct RetentionManager {
    config: RetentionConfig,
    running: Arc<AtomicBool>,
    shutdown_tx: broadcast::Sender<()>,
    removal_tx: mpsc::UnboundedSender<PathBuf>,
    // Taken by the scheduler task on start
    removal_rx: Mutex<Option<mpsc::UnboundedReceiver<PathBuf>>>,
}

impl RetentionManager {
    pub fn new(config: RetentionConfig) -> Self {
        let (shutdown_tx, _) = broadcast::channel(1);
        let (removal_tx, removal_rx) = mpsc::unbounded_channel();

        Self {
            config,
            running: Arc::new(AtomicBool::new(false)),
            shutdown_tx,
            removal_tx,
            removal_rx: Mutex::new(Some(removal_rx)),
        }
    }

    /// Directory artifacts live in.
    pub fn scratch_dir(&self) -> &Path {
        &self.config.scratch_dir
    }

    /// Whether the background tasks are running.
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Relaxed)
    }

    /// Start the removal scheduler and the periodic sweep.
    pub async fn start(&self) {
        if self.running.swap(true, Ordering::SeqCst) {
            warn!("Retention manager already running");
            return;
        }

        let receiver = self
            .removal_rx
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        let Some(receiver) = receiver else {
            warn!("Retention manager cannot be restarted after stop");
            self.running.store(false, Ordering::SeqCst);
            return;
        };

        info!(
            "Starting retention manager (dir: {}, ttl: {}s, sweep every {}s)",
            self.config.scratch_dir.display(),
            self.config.file_ttl_secs,
            self.config.sweep_interval_secs
        );

        if let Err(e) = tokio::fs::create_dir_all(&self.config.scratch_dir).await {
            warn!(
                "Failed to create scratch directory {}: {}",
                self.config.scratch_dir.display(),
                e
            );
        }

        self.spawn_removal_scheduler(receiver);
        self.spawn_sweep_loop();
    }

    /// Stop the background tasks. Pending removals are abandoned.
    pub async fn stop(&self) {
        if !self.running.swap(false, Ordering::SeqCst) {
            warn!("Retention manager not running");
            return;
        }

        info!("Stopping retention manager");
        let _ = self.shutdown_tx.send(());
    }

    /// Delete every regular file in the scratch directory older than the TTL.
    pub async fn sweep(&self) -> Result<SweepReport, RetentionError> {
        sweep_dir(
            &self.config.scratch_dir,
            Duration::from_secs(self.config.file_ttl_secs),
        )
        .await
    }

    /// Delete `path` once the serve grace period has elapsed.
    ///
    /// Requests made before `start` are held until the scheduler runs.
    pub fn schedule_removal(&self, path: PathBuf) -> Result<(), RetentionError> {
        debug!(
            "Scheduling removal of {} in {}ms",
            path.display(),
            self.config.serve_grace_ms
        );
        self.removal_tx
            .send(path)
            .map_err(|_| RetentionError::SchedulerClosed)
    }

    fn spawn_removal_scheduler(&self, mut receiver: mpsc::UnboundedReceiver<PathBuf>) {
        // DelayQueue panics on delays past its timer wheel range
        let grace = Duration::from_millis(self.config.serve_grace_ms.min(MAX_SERVE_GRACE_MS));
        let mut shutdown_rx = self.shutdown_tx.subscribe();

        tokio::spawn(async move {
            info!("Removal scheduler started");
            let mut queue: DelayQueue<PathBuf> = DelayQueue::new();
            loop {
                tokio::select! {
                    _ = shutdown_rx.recv() => {
                        info!("Removal scheduler received shutdown signal");
                        break;
                    }
                    request = receiver.recv() => {
                        match request {
                            Some(path) => {
                                queue.insert(path, grace);
                            }
                            None => break,
                        }
                    }
                    Some(expired) = queue.next(), if !queue.is_empty() => {
                        remove_served_file(&expired.into_inner()).await;
                    }
                }
            }
            if !queue.is_empty() {
                debug!("Dropping {} pending removals", queue.len());
            }
            info!("Removal scheduler stopped");
        });
    }

    fn spawn_sweep_loop(&self) {
        let running = Arc::clone(&self.running);
        let dir = self.config.scratch_dir.clone();
        let ttl = Duration::from_secs(self.config.file_ttl_secs);
        let interval = Duration::from_secs(self.config.sweep_interval_secs);
        let mut shutdown_rx = self.shutdown_tx.subscribe();

        tokio::spawn(async move {
            info!("Sweep loop started");
            loop {
                tokio::select! {
                    _ = shutdown_rx.recv() => {
                        info!("Sweep loop received shutdown signal");
                        break;
                    }
                    _ = tokio::time::sleep(interval) => {
                        if !running.load(Ordering::Relaxed) {
                            break;
                        }
                        match sweep_dir(&dir, ttl).await {
                            Ok(report) if report.removed > 0 || report.failed > 0 => {
                                info!(
                                    "Sweep removed {} files ({} failures)",
                                    report.removed, report.failed
                                );
                            }
                            Ok(_) => debug!("Sweep found nothing to remove"),
                            Err(e) => warn!("Sweep failed: {}", e),
                        }
                    }
                }
            }
            info!("Sweep loop stopped");
        });
    }
}

async fn remove_served_file(path: &Path) {
    match tokio::fs::remove_file(path).await {
        Ok(()) => {
            metrics::FILES_REMOVED.with_label_values(&["served"]).inc();
            info!("Removed served file {}", path.display());
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            debug!("Served file {} already gone", path.display());
        }
        Err(e) => {
            metrics::FILE_REMOVAL_FAILURES.inc();
            warn!("Failed to remove served file {}: {}", path.display(), e);
        }
    }
}

async fn sweep_dir(dir: &Path, ttl: Duration) -> Result<SweepReport, RetentionError> {
    let mut report = SweepReport::default();

    let mut entries = match tokio::fs::read_dir(dir).await {
        Ok(entries) => entries,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(report),
        Err(e) => {
            return Err(RetentionError::ReadDir {
                path: dir.display().to_string(),
                source: e,
            })
        }
    };

    let now = SystemTime::now();
    loop {
        let entry = match entries.next_entry().await {
            Ok(Some(entry)) => entry,
            Ok(None) => break,
            Err(e) => {
                warn!("Failed to read entry in {}: {}", dir.display(), e);
                report.failed += 1;
                break;
            }
        };

        let Ok(meta) = entry.metadata().await else {
            continue;
        };
        if !meta.is_file() {
            continue;
        }
        let is_stale = meta
            .modified()
            .ok()
            .and_then(|modified| now.duration_since(modified).ok())
            .is_some_and(|age| age > ttl);
        if !is_stale {
            continue;
        }

        let path = entry.path();
        match tokio::fs::remove_file(&path).await {
            Ok(()) => {
                report.removed += 1;
                metrics::FILES_REMOVED.with_label_values(&["sweep"]).inc();
                debug!("Swept stale file {}", path.display());
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => {
                report.failed += 1;
                metrics::FILE_REMOVAL_FAILURES.inc();
                warn!("Failed to sweep {}: {}", path.display(), e);
            }
        }
    }

    Ok(report)
}
