//! Prometheus metrics for core components.
//!
//! This module provides metrics for:
//! - Job lifecycle (submissions, outcomes, durations)
//! - Extraction attempts
//! - Retention (files removed by sweep or after serving)
//! - Metadata prefetch

use once_cell::sync::Lazy;
use prometheus::{HistogramOpts, HistogramVec, IntCounter, IntCounterVec, Opts};

// =============================================================================
// Job Metrics
// =============================================================================

/// Jobs accepted by the orchestrator.
pub static JOBS_SUBMITTED: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new("vidfetch_jobs_submitted_total", "Total jobs submitted").unwrap()
});

/// Submissions rejected before a job was created.
pub static JOBS_REJECTED: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new(
            "vidfetch_jobs_rejected_total",
            "Total submissions rejected by validation",
        ),
        &["reason"], // "empty_url", "unsupported_host", "invalid_quality"
    )
    .unwrap()
});

/// Jobs that reached `completed`.
pub static JOBS_COMPLETED: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new(
        "vidfetch_jobs_completed_total",
        "Total jobs completed successfully",
    )
    .unwrap()
});

/// Jobs that reached `error`, by failure kind.
pub static JOBS_FAILED: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("vidfetch_jobs_failed_total", "Total jobs that failed"),
        &["kind"], // "access_blocked", "unavailable", "quality_unavailable", "no_stream", "generic", "internal"
    )
    .unwrap()
});

/// Wall time of a job pipeline in seconds.
pub static JOB_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    HistogramVec::new(
        HistogramOpts::new("vidfetch_job_duration_seconds", "Duration of job pipelines")
            .buckets(vec![1.0, 5.0, 10.0, 30.0, 60.0, 120.0, 300.0, 600.0, 1800.0]),
        &["result"], // "completed", "error"
    )
    .unwrap()
});

/// Terminal jobs dropped from the registry.
pub static JOBS_EVICTED: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new(
        "vidfetch_jobs_evicted_total",
        "Total terminal jobs evicted from the registry",
    )
    .unwrap()
});

// =============================================================================
// Extraction Metrics
// =============================================================================

/// Extraction attempts by result.
pub static EXTRACTION_ATTEMPTS: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new(
            "vidfetch_extraction_attempts_total",
            "Total extraction attempts",
        ),
        &["result"], // "success", "failed"
    )
    .unwrap()
});

/// Metadata prefetches that fell back to the default descriptor.
pub static METADATA_FALLBACKS: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new(
        "vidfetch_metadata_fallbacks_total",
        "Total metadata prefetches that returned the default descriptor",
    )
    .unwrap()
});

// =============================================================================
// Retention Metrics
// =============================================================================

/// Files removed from the scratch directory.
pub static FILES_REMOVED: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new(
            "vidfetch_files_removed_total",
            "Total artifact files removed",
        ),
        &["reason"], // "sweep", "served"
    )
    .unwrap()
});

/// File removals that failed.
pub static FILE_REMOVAL_FAILURES: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new(
        "vidfetch_file_removal_failures_total",
        "Total artifact removals that failed",
    )
    .unwrap()
});

/// Get all core metrics for registration.
pub fn all_metrics() -> Vec<Box<dyn prometheus::core::Collector>> {
    vec![
        // Jobs
        Box::new(JOBS_SUBMITTED.clone()),
        Box::new(JOBS_REJECTED.clone()),
        Box::new(JOBS_COMPLETED.clone()),
        Box::new(JOBS_FAILED.clone()),
        Box::new(JOB_DURATION.clone()),
        Box::new(JOBS_EVICTED.clone()),
        // Extraction
        Box::new(EXTRACTION_ATTEMPTS.clone()),
        Box::new(METADATA_FALLBACKS.clone()),
        // Retention
        Box::new(FILES_REMOVED.clone()),
        Box::new(FILE_REMOVAL_FAILURES.clone()),
    ]
}
