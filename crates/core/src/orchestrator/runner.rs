//! Job orchestrator implementation.
//!
//! Each submitted job runs on its own task:
//! - Slot: waits for a pipeline slot when a concurrency limit is set
//! - Prefetch: page metadata is merged into the job, which then starts downloading
//! - Sequencer: fallback attempts run until one produces a file

use std::any::Any;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::{broadcast, Semaphore};
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::classify::FailureKind;
use crate::extractor::{Extractor, ProgressSink};
use crate::job::{Job, JobRegistry, JobStatus};
use crate::metadata::MetadataFetcher;
use crate::metrics;
use crate::progress::ProgressReporter;
use crate::strategy::{build_attempts, Quality, StrategySequencer};
use crate::urls::UrlPolicy;

use super::config::OrchestratorConfig;
use super::types::{Artifact, OrchestratorError, OrchestratorStatus};

/// Everything a job task needs, shared across all jobs.
struct PipelineContext {
    registry: Arc<JobRegistry>,
    metadata: Arc<dyn MetadataFetcher>,
    sequencer: StrategySequencer,
    policy: UrlPolicy,
    scratch_dir: PathBuf,
    slots: Option<Arc<Semaphore>>,
}

impl PipelineContext {
    fn fail(&self, job_id: &str, message: String, kind: &str, started: Instant) {
        match self.registry.update(job_id, |job| job.fail(message.clone())) {
            Ok(()) => {
                metrics::JOBS_FAILED.with_label_values(&[kind]).inc();
                metrics::JOB_DURATION
                    .with_label_values(&["error"])
                    .observe(started.elapsed().as_secs_f64());
                info!("Job {} failed ({}): {}", job_id, kind, message);
            }
            Err(e) => warn!("Job {}: could not record failure: {}", job_id, e),
        }
    }
}

/// The job orchestrator - accepts submissions and drives each job to a terminal state.
pub struct JobOrchestrator {
    config: OrchestratorConfig,
    ctx: Arc<PipelineContext>,

    // Runtime state
    running: Arc<AtomicBool>,
    shutdown_tx: broadcast::Sender<()>,
}

impl JobOrchestrator {
    /// Create a new orchestrator.
    pub fn new(
        config: OrchestratorConfig,
        scratch_dir: PathBuf,
        policy: UrlPolicy,
        registry: Arc<JobRegistry>,
        metadata: Arc<dyn MetadataFetcher>,
        extractor: Arc<dyn Extractor>,
    ) -> Self {
        let (shutdown_tx, _) = broadcast::channel(1);
        let slots = match config.max_concurrent_jobs {
            0 => None,
            n => Some(Arc::new(Semaphore::new(n))),
        };
        let scratch_dir = std::path::absolute(&scratch_dir).unwrap_or(scratch_dir);

        Self {
            config,
            ctx: Arc::new(PipelineContext {
                registry,
                metadata,
                sequencer: StrategySequencer::new(extractor),
                policy,
                scratch_dir,
                slots,
            }),
            running: Arc::new(AtomicBool::new(false)),
            shutdown_tx,
        }
    }

    /// The registry jobs are tracked in.
    pub fn registry(&self) -> &Arc<JobRegistry> {
        &self.ctx.registry
    }

    /// Start the orchestrator (spawns the eviction loop).
    pub async fn start(&self) {
        if self.running.swap(true, Ordering::SeqCst) {
            warn!("Orchestrator already running");
            return;
        }

        info!("Starting job orchestrator");
        self.spawn_eviction_loop();
        info!("Job orchestrator started");
    }

    /// Stop the orchestrator gracefully. In-flight jobs keep running.
    pub async fn stop(&self) {
        if !self.running.swap(false, Ordering::SeqCst) {
            warn!("Orchestrator not running");
            return;
        }

        info!("Stopping job orchestrator");
        let _ = self.shutdown_tx.send(());
        info!("Job orchestrator stopped");
    }

    /// Validate a request, create its job and start the pipeline.
    ///
    /// Returns the job id immediately. Must be called from within a Tokio runtime.
    pub fn submit(&self, url: &str, quality: &str) -> Result<String, OrchestratorError> {
        let url = url.trim();
        if url.is_empty() {
            metrics::JOBS_REJECTED.with_label_values(&["empty_url"]).inc();
            return Err(OrchestratorError::EmptyUrl);
        }
        if !self.ctx.policy.is_acceptable(url) {
            metrics::JOBS_REJECTED
                .with_label_values(&["unsupported_host"])
                .inc();
            return Err(OrchestratorError::UnsupportedHost(url.to_string()));
        }
        let quality: Quality = quality.parse().inspect_err(|_| {
            metrics::JOBS_REJECTED
                .with_label_values(&["invalid_quality"])
                .inc();
        })?;

        let id = Uuid::new_v4().to_string();
        self.ctx.registry.create(&id)?;
        metrics::JOBS_SUBMITTED.inc();
        info!("Job {} submitted for {} (quality: {})", id, url, quality);

        self.spawn_job(id.clone(), url.to_string(), quality);
        Ok(id)
    }

    /// Snapshot of a job, `None` if unknown.
    pub fn job(&self, id: &str) -> Option<Job> {
        self.ctx.registry.get(id)
    }

    /// Locate the file of a completed job.
    pub async fn artifact(&self, id: &str) -> Result<Artifact, OrchestratorError> {
        let job = self
            .ctx
            .registry
            .get(id)
            .ok_or_else(|| OrchestratorError::JobNotFound(id.to_string()))?;

        if job.status != JobStatus::Completed {
            return Err(OrchestratorError::NotReady {
                job_id: id.to_string(),
                status: job.status,
            });
        }

        let filename = job
            .filename
            .ok_or_else(|| OrchestratorError::ArtifactMissing(id.to_string()))?;
        let path = self.ctx.scratch_dir.join(&filename);
        if !tokio::fs::try_exists(&path).await.unwrap_or(false) {
            return Err(OrchestratorError::ArtifactMissing(id.to_string()));
        }

        let display_name = filename
            .strip_prefix(&format!("{}_", id))
            .unwrap_or(&filename)
            .to_string();

        Ok(Artifact { path, display_name })
    }

    /// Get current orchestrator status.
    pub fn status(&self) -> OrchestratorStatus {
        let counts = self.ctx.registry.count_by_status();
        let count = |s: JobStatus| counts.get(&s).copied().unwrap_or(0);

        OrchestratorStatus {
            running: self.running.load(Ordering::Relaxed),
            total_jobs: counts.values().sum(),
            starting_count: count(JobStatus::Starting),
            downloading_count: count(JobStatus::Downloading),
            completed_count: count(JobStatus::Completed),
            error_count: count(JobStatus::Error),
            available_slots: self.ctx.slots.as_ref().map(|s| s.available_permits()),
        }
    }

    /// Run the job pipeline on its own task, supervised so a panic still
    /// leaves the job in a terminal state.
    fn spawn_job(&self, id: String, url: String, quality: Quality) {
        let ctx = Arc::clone(&self.ctx);

        tokio::spawn(async move {
            let started = Instant::now();
            let pipeline = tokio::spawn(run_pipeline(
                Arc::clone(&ctx),
                id.clone(),
                url,
                quality,
            ));

            if let Err(e) = pipeline.await {
                let detail = if e.is_panic() {
                    panic_message(e.into_panic())
                } else {
                    "job task was cancelled".to_string()
                };
                error!("Job {} pipeline aborted: {}", id, detail);
                ctx.fail(
                    &id,
                    FailureKind::Generic.user_message(&detail),
                    "internal",
                    started,
                );
            }
        });
    }

    /// Spawn the eviction loop task.
    fn spawn_eviction_loop(&self) {
        let running = Arc::clone(&self.running);
        let registry = Arc::clone(&self.ctx.registry);
        let interval = Duration::from_secs(self.config.eviction_interval_secs);
        let ttl = self.config.job_ttl();
        let mut shutdown_rx = self.shutdown_tx.subscribe();

        tokio::spawn(async move {
            info!("Eviction loop started");
            loop {
                tokio::select! {
                    _ = shutdown_rx.recv() => {
                        info!("Eviction loop received shutdown signal");
                        break;
                    }
                    _ = tokio::time::sleep(interval) => {
                        if !running.load(Ordering::Relaxed) {
                            break;
                        }
                        let evicted = registry.evict_terminal(ttl);
                        if evicted > 0 {
                            metrics::JOBS_EVICTED.inc_by(evicted as u64);
                            info!("Evicted {} finished jobs", evicted);
                        }
                    }
                }
            }
            info!("Eviction loop stopped");
        });
    }
}

async fn run_pipeline(ctx: Arc<PipelineContext>, id: String, url: String, quality: Quality) {
    let _permit = match &ctx.slots {
        Some(slots) => match Arc::clone(slots).acquire_owned().await {
            Ok(permit) => Some(permit),
            Err(_) => {
                ctx.fail(
                    &id,
                    FailureKind::Generic.user_message("no pipeline slot available"),
                    "internal",
                    Instant::now(),
                );
                return;
            }
        },
        None => None,
    };
    let started = Instant::now();

    let descriptor = ctx.metadata.fetch(&url).await;
    let merged = ctx.registry.update(&id, |job| {
        job.apply_descriptor(&descriptor);
        job.begin_download()
    });
    if let Err(e) = merged {
        warn!("Job {}: could not enter download phase: {}", id, e);
        return;
    }
    info!("Job {} downloading \"{}\"", id, descriptor.title);

    if let Err(e) = tokio::fs::create_dir_all(&ctx.scratch_dir).await {
        warn!(
            "Job {}: failed to create scratch directory {}: {}",
            id,
            ctx.scratch_dir.display(),
            e
        );
    }

    let template = ctx
        .scratch_dir
        .join(format!("{}_%(title)s.%(ext)s", id))
        .to_string_lossy()
        .into_owned();
    let attempts = build_attempts(&ctx.policy, &url, quality, &template);
    debug!("Job {}: {} attempts planned", id, attempts.len());

    let reporter = ProgressReporter::new(Arc::clone(&ctx.registry), id.clone());
    match ctx.sequencer.run(&id, &attempts, &reporter).await {
        Ok(outcome) => {
            reporter.on_finished(&outcome.path);
            match ctx.registry.get(&id) {
                Some(job) if job.status == JobStatus::Completed => {
                    metrics::JOBS_COMPLETED.inc();
                    metrics::JOB_DURATION
                        .with_label_values(&["completed"])
                        .observe(started.elapsed().as_secs_f64());
                    info!(
                        "Job {} completed via attempt {}: {}",
                        id,
                        outcome.attempt + 1,
                        job.filename.unwrap_or_default()
                    );
                }
                _ => warn!("Job {}: file produced but job was not marked completed", id),
            }
        }
        Err(e) => {
            let detail = e.to_string();
            let kind = FailureKind::classify(&detail);
            ctx.fail(&id, kind.user_message(&detail), kind.as_str(), started);
        }
    }
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "job task panicked".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{MockExtractor, MockMetadataFetcher};

    fn orchestrator(dir: &std::path::Path) -> JobOrchestrator {
        JobOrchestrator::new(
            OrchestratorConfig::default(),
            dir.to_path_buf(),
            UrlPolicy::default(),
            Arc::new(JobRegistry::new()),
            Arc::new(MockMetadataFetcher::new()),
            Arc::new(MockExtractor::new()),
        )
    }

    #[tokio::test]
    async fn test_submit_validation_creates_no_job() {
        let dir = tempfile::tempdir().unwrap();
        let orch = orchestrator(dir.path());

        assert!(matches!(
            orch.submit("   ", "best"),
            Err(OrchestratorError::EmptyUrl)
        ));
        assert!(matches!(
            orch.submit("https://youtube.com/watch?v=1", "best"),
            Err(OrchestratorError::UnsupportedHost(_))
        ));
        assert!(matches!(
            orch.submit("https://www.facebook.com/watch/?v=1", "ultra"),
            Err(OrchestratorError::InvalidQuality(_))
        ));
        assert!(orch.registry().is_empty());
    }

    #[tokio::test]
    async fn test_submit_returns_fresh_ids() {
        let dir = tempfile::tempdir().unwrap();
        let orch = orchestrator(dir.path());

        let a = orch.submit("https://www.facebook.com/watch/?v=1", "best").unwrap();
        let b = orch.submit("https://www.facebook.com/watch/?v=1", "720").unwrap();
        assert_ne!(a, b);
        assert!(Uuid::parse_str(&a).is_ok());
        assert!(orch.job(&a).is_some());
    }

    #[tokio::test]
    async fn test_artifact_unknown_job() {
        let dir = tempfile::tempdir().unwrap();
        let orch = orchestrator(dir.path());
        assert!(matches!(
            orch.artifact("missing").await,
            Err(OrchestratorError::JobNotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_artifact_strips_job_prefix() {
        let dir = tempfile::tempdir().unwrap();
        let orch = orchestrator(dir.path());
        let registry = orch.registry();
        registry.create("abc").unwrap();
        registry
            .update("abc", |job| {
                job.begin_download()?;
                job.complete("abc_My clip.mp4")
            })
            .unwrap();

        // File not written yet
        assert!(matches!(
            orch.artifact("abc").await,
            Err(OrchestratorError::ArtifactMissing(_))
        ));

        std::fs::write(dir.path().join("abc_My clip.mp4"), b"x").unwrap();
        let artifact = orch.artifact("abc").await.unwrap();
        assert_eq!(artifact.display_name, "My clip.mp4");
        assert!(artifact.path.is_absolute());
        assert!(artifact.path.ends_with("abc_My clip.mp4"));
    }

    #[tokio::test]
    async fn test_status_counts() {
        let dir = tempfile::tempdir().unwrap();
        let orch = orchestrator(dir.path());
        orch.registry().create("a").unwrap();
        orch.registry().create("b").unwrap();
        orch.registry().update("b", |job| job.fail("boom")).unwrap();

        let status = orch.status();
        assert!(!status.running);
        assert_eq!(status.total_jobs, 2);
        assert_eq!(status.starting_count, 1);
        assert_eq!(status.error_count, 1);
        assert_eq!(status.available_slots, Some(4));
    }

    #[tokio::test]
    async fn test_start_stop() {
        let dir = tempfile::tempdir().unwrap();
        let orch = orchestrator(dir.path());
        orch.start().await;
        assert!(orch.status().running);
        orch.stop().await;
        assert!(!orch.status().running);
    }

    #[tokio::test]
    async fn test_eviction_loop_with_unbounded_ttl() {
        let dir = tempfile::tempdir().unwrap();
        let registry = Arc::new(JobRegistry::new());
        let orch = JobOrchestrator::new(
            OrchestratorConfig {
                job_ttl_secs: u64::MAX,
                eviction_interval_secs: 1,
                ..Default::default()
            },
            dir.path().to_path_buf(),
            UrlPolicy::default(),
            Arc::clone(&registry),
            Arc::new(MockMetadataFetcher::new()),
            Arc::new(MockExtractor::new()),
        );
        registry.create("old").unwrap();
        registry.update("old", |job| job.fail("boom")).unwrap();

        orch.start().await;
        tokio::time::sleep(Duration::from_millis(1500)).await;

        // The loop survived at least one pass and kept the job
        assert!(orch.status().running);
        assert!(orch.job("old").is_some());
        orch.stop().await;
    }

    #[test]
    fn test_panic_message() {
        assert_eq!(panic_message(Box::new("boom")), "boom");
        assert_eq!(panic_message(Box::new("bang".to_string())), "bang");
        assert_eq!(panic_message(Box::new(7u8)), "job task panicked");
    }
}
