//! In-memory job registry.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use chrono::{Duration, Utc};

use super::types::{Job, JobStatus};
use super::JobError;

/// Concurrency-safe mapping from job id to job record.
///
/// The whole map sits behind one exclusive lock. Callers only get
/// read-after-write ordering per key.
#[derive(Debug, Default)]
pub struct JobRegistry {
    jobs: Mutex<HashMap<String, Job>>,
}

impl JobRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, Job>> {
        // A panicking mutator cannot leave a half-applied transition behind,
        // so the map stays usable after poisoning.
        self.jobs.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Insert a fresh `starting` record.
    pub fn create(&self, id: &str) -> Result<Job, JobError> {
        let mut jobs = self.lock();
        if jobs.contains_key(id) {
            return Err(JobError::AlreadyExists(id.to_string()));
        }
        let job = Job::new(id);
        jobs.insert(id.to_string(), job.clone());
        Ok(job)
    }

    /// Snapshot of a job. `None` means the id is unknown.
    pub fn get(&self, id: &str) -> Option<Job> {
        self.lock().get(id).cloned()
    }

    /// Apply a mutation to one job under the registry lock.
    ///
    /// The mutator runs on a scratch copy; the stored record only changes
    /// when it returns `Ok`.
    pub fn update<F, R>(&self, id: &str, mutator: F) -> Result<R, JobError>
    where
        F: FnOnce(&mut Job) -> Result<R, JobError>,
    {
        let mut jobs = self.lock();
        let stored = jobs
            .get_mut(id)
            .ok_or_else(|| JobError::NotFound(id.to_string()))?;

        let mut draft = stored.clone();
        let result = mutator(&mut draft)?;
        *stored = draft;
        Ok(result)
    }

    /// Number of tracked jobs.
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// Whether the registry holds no jobs.
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Count jobs per status.
    pub fn count_by_status(&self) -> HashMap<JobStatus, usize> {
        let jobs = self.lock();
        let mut counts: HashMap<JobStatus, usize> =
            JobStatus::all().into_iter().map(|s| (s, 0)).collect();
        for job in jobs.values() {
            *counts.entry(job.status).or_insert(0) += 1;
        }
        counts
    }

    /// Drop terminal jobs whose last update is older than `older_than`.
    ///
    /// Returns the number of evicted jobs.
    pub fn evict_terminal(&self, older_than: Duration) -> usize {
        // A cutoff before the representable range means nothing is old enough
        let Some(cutoff) = Utc::now().checked_sub_signed(older_than) else {
            return 0;
        };
        let mut jobs = self.lock();
        let before = jobs.len();
        jobs.retain(|_, job| !(job.status.is_terminal() && job.updated_at < cutoff));
        before - jobs.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn test_create_and_get() {
        let registry = JobRegistry::new();
        let job = registry.create("abc").unwrap();
        assert_eq!(job.status, JobStatus::Starting);

        let fetched = registry.get("abc").unwrap();
        assert_eq!(fetched.id, "abc");
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_create_duplicate_fails() {
        let registry = JobRegistry::new();
        registry.create("abc").unwrap();
        assert!(matches!(
            registry.create("abc"),
            Err(JobError::AlreadyExists(_))
        ));
    }

    #[test]
    fn test_get_unknown_returns_none() {
        let registry = JobRegistry::new();
        assert!(registry.get("missing").is_none());
        assert!(registry.is_empty());
    }

    #[test]
    fn test_update_unknown_fails() {
        let registry = JobRegistry::new();
        let result = registry.update("missing", |job| job.begin_download());
        assert!(matches!(result, Err(JobError::NotFound(_))));
    }

    #[test]
    fn test_failed_mutation_leaves_record_untouched() {
        let registry = JobRegistry::new();
        registry.create("abc").unwrap();

        let result = registry.update("abc", |job| {
            job.title = "changed".to_string();
            job.complete("abc_x.mp4")
        });
        assert!(matches!(result, Err(JobError::InvalidTransition { .. })));

        let job = registry.get("abc").unwrap();
        assert_eq!(job.title, "Loading...");
        assert_eq!(job.status, JobStatus::Starting);
    }

    #[test]
    fn test_update_returns_mutator_value() {
        let registry = JobRegistry::new();
        registry.create("abc").unwrap();
        let status = registry
            .update("abc", |job| {
                job.begin_download()?;
                Ok(job.status)
            })
            .unwrap();
        assert_eq!(status, JobStatus::Downloading);
    }

    #[test]
    fn test_count_by_status() {
        let registry = JobRegistry::new();
        registry.create("a").unwrap();
        registry.create("b").unwrap();
        registry.update("b", |job| job.begin_download()).unwrap();

        let counts = registry.count_by_status();
        assert_eq!(counts[&JobStatus::Starting], 1);
        assert_eq!(counts[&JobStatus::Downloading], 1);
        assert_eq!(counts[&JobStatus::Completed], 0);
        assert_eq!(counts[&JobStatus::Error], 0);
    }

    #[test]
    fn test_evict_terminal_with_out_of_range_age() {
        let registry = JobRegistry::new();
        registry.create("failed").unwrap();
        registry.update("failed", |job| job.fail("boom")).unwrap();

        assert_eq!(registry.evict_terminal(Duration::MAX), 0);
        assert_eq!(registry.evict_terminal(Duration::days(365 * 1_000_000)), 0);
        assert!(registry.get("failed").is_some());
    }

    #[test]
    fn test_evict_terminal_only_removes_old_finished_jobs() {
        let registry = JobRegistry::new();
        registry.create("running").unwrap();
        registry.create("done").unwrap();
        registry.create("failed").unwrap();
        registry.update("running", |job| job.begin_download()).unwrap();
        registry
            .update("done", |job| {
                job.begin_download()?;
                job.complete("done_x.mp4")
            })
            .unwrap();
        registry.update("failed", |job| job.fail("boom")).unwrap();

        // Nothing is old enough yet
        assert_eq!(registry.evict_terminal(Duration::hours(1)), 0);
        assert_eq!(registry.len(), 3);

        // Negative age puts the cutoff in the future
        assert_eq!(registry.evict_terminal(Duration::seconds(-1)), 2);
        assert_eq!(registry.len(), 1);
        assert!(registry.get("running").is_some());
    }

    #[test]
    fn test_concurrent_updates_are_serialized() {
        let registry = Arc::new(JobRegistry::new());
        registry.create("abc").unwrap();
        registry.update("abc", |job| job.begin_download()).unwrap();

        let handles: Vec<_> = (1..=8u64)
            .map(|i| {
                let registry = Arc::clone(&registry);
                std::thread::spawn(move || {
                    for step in 0..100u64 {
                        registry
                            .update("abc", |job| job.record_progress(i * step, 800, 1.0))
                            .unwrap();
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        let job = registry.get("abc").unwrap();
        // Max sample is 8 * 99 = 792 of 800
        assert_eq!(job.progress, 99.0);
    }
}
