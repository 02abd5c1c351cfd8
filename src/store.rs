//! In-memory job table shared by the engine and the editor.
//!
//! Every mutation is a targeted update keyed by job id, so interleaved
//! per-job updates never overwrite each other's fields.

use std::sync::{Arc, Mutex, MutexGuard};

use crate::pipeline::{Job, JobId};
use crate::seed::SeedRecord;

#[derive(Debug)]
struct StoreInner {
    jobs: Vec<Job>,
    /// Next id to hand out. Survives `clear` so ids are never reused.
    next_id: JobId,
}

/// Cloneable handle to the single job table.
#[derive(Debug, Clone)]
pub struct JobStore {
    inner: Arc<Mutex<StoreInner>>,
}

impl Default for JobStore {
    fn default() -> Self {
        Self {
            inner: Arc::new(Mutex::new(StoreInner {
                jobs: Vec::new(),
                next_id: 1,
            })),
        }
    }
}

impl JobStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, StoreInner> {
        match self.inner.lock() {
            Ok(guard) => guard,
            Err(poisoned) => {
                tracing::warn!("Job store lock was poisoned, recovering");
                poisoned.into_inner()
            }
        }
    }

    /// Appends one `Pending` job per seed, in order, and returns their ids.
    pub fn ingest(&self, seeds: Vec<SeedRecord>) -> Vec<JobId> {
        let mut inner = self.lock();
        let mut ids = Vec::with_capacity(seeds.len());
        for seed in seeds {
            let id = inner.next_id;
            inner.next_id += 1;
            inner.jobs.push(Job::new(id, seed));
            ids.push(id);
        }
        ids
    }

    pub fn get(&self, id: JobId) -> Option<Job> {
        self.lock().jobs.iter().find(|j| j.id() == id).cloned()
    }

    pub fn contains(&self, id: JobId) -> bool {
        self.lock().jobs.iter().any(|j| j.id() == id)
    }

    /// Copy of every job in insertion order.
    pub fn snapshot(&self) -> Vec<Job> {
        self.lock().jobs.clone()
    }

    /// Runs `f` against the job with `id`. `None` if no such job exists.
    pub fn update<R>(&self, id: JobId, f: impl FnOnce(&mut Job) -> R) -> Option<R> {
        let mut inner = self.lock();
        inner.jobs.iter_mut().find(|j| j.id() == id).map(f)
    }

    /// Like [`update`](Self::update), but skipped when `still_valid` is false
    /// at the moment the lock is held.
    pub fn update_if<R>(
        &self,
        id: JobId,
        still_valid: impl FnOnce() -> bool,
        f: impl FnOnce(&mut Job) -> R,
    ) -> Option<R> {
        let mut inner = self.lock();
        if !still_valid() {
            return None;
        }
        inner.jobs.iter_mut().find(|j| j.id() == id).map(f)
    }

    /// Ids of jobs a new batch may start: `Pending` or `Failed`.
    pub fn eligible_ids(&self) -> Vec<JobId> {
        self.lock()
            .jobs
            .iter()
            .filter(|j| j.status().is_eligible())
            .map(Job::id)
            .collect()
    }

    /// Whether any of `ids` is still `Pending` or `Running`, read live.
    pub fn any_in_flight(&self, ids: &[JobId]) -> bool {
        use crate::pipeline::JobStatus;

        self.lock().jobs.iter().any(|j| {
            ids.contains(&j.id()) && matches!(j.status(), JobStatus::Pending | JobStatus::Running)
        })
    }

    /// Drops every job and returns how many were removed.
    pub fn clear(&self) -> usize {
        let mut inner = self.lock();
        let removed = inner.jobs.len();
        inner.jobs.clear();
        removed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::{JobStatus, Stage};
    use crate::seed::parse_seeds;

    #[test]
    fn ingest_assigns_increasing_ids() {
        let store = JobStore::new();
        let ids = store.ingest(parse_seeds("seo tools,best seo|top seo\nkeyword research,"));
        assert_eq!(ids, vec![1, 2]);

        let jobs = store.snapshot();
        assert_eq!(jobs[0].secondary_keywords(), ["best seo", "top seo"]);
        assert!(jobs[1].secondary_keywords().is_empty());
        assert!(jobs.iter().all(|j| j.status() == &JobStatus::Pending));
    }

    #[test]
    fn ids_are_not_reused_after_clear() {
        let store = JobStore::new();
        store.ingest(parse_seeds("a\nb"));
        assert_eq!(store.clear(), 2);
        assert!(store.snapshot().is_empty());
        let ids = store.ingest(parse_seeds("c"));
        assert_eq!(ids, vec![3]);
    }

    #[test]
    fn update_touches_only_the_target_job() {
        let store = JobStore::new();
        store.ingest(parse_seeds("a\nb"));
        store.update(2, |job| job.enter_stage(Stage::Research));

        assert_eq!(store.get(1).unwrap().status(), &JobStatus::Pending);
        assert_eq!(store.get(2).unwrap().status(), &JobStatus::Running);
        assert!(store.update(99, |_| ()).is_none());
    }

    #[test]
    fn update_if_respects_the_check() {
        let store = JobStore::new();
        store.ingest(parse_seeds("a"));
        assert!(store.update_if(1, || false, |_| ()).is_none());
        assert_eq!(store.update_if(1, || true, |job| job.id()), Some(1));
    }

    #[test]
    fn in_flight_reads_live_state() {
        let store = JobStore::new();
        let ids = store.ingest(parse_seeds("a\nb"));
        assert!(store.any_in_flight(&ids));

        for id in &ids {
            store.update(*id, |job| job.mark_done(format!("url/{id}")));
        }
        assert!(!store.any_in_flight(&ids));
        assert!(store.eligible_ids().is_empty());
    }
}
