//! Drives eligible jobs through the pipeline.
//!
//! Each job of a batch runs as its own Tokio task that sleeps between
//! stages and applies one stage per wake-up through [`StageMachine`]. The
//! tasks share nothing but the [`JobStore`] and the [`TaskManager`].

use std::sync::Arc;

use chrono::Utc;
use tokio_util::sync::CancellationToken;

use crate::config::KeywriterConfig;
use crate::editor::{ConfirmPrompt, EditorSession};
use crate::error::{KeywriterError, Result};
use crate::pipeline::{JobId, Stage, StageMachine, Transition};
use crate::random::RandomSource;
use crate::scheduler::{BatchId, TaskManager, sleep_unless_cancelled};
use crate::seed::SeedRecord;
use crate::store::JobStore;

/// What a successful `start_batch` kicked off.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchSummary {
    pub batch_id: BatchId,
    pub jobs: Vec<JobId>,
    /// How many jobs drew a failure point for this run.
    pub doomed: usize,
}

struct EngineInner {
    store: JobStore,
    tasks: TaskManager,
    rng: Arc<dyn RandomSource>,
    config: KeywriterConfig,
}

/// Cloneable handle; clones share the same store and guard.
#[derive(Clone)]
pub struct WorkflowEngine {
    inner: Arc<EngineInner>,
}

impl WorkflowEngine {
    pub fn new(config: KeywriterConfig, rng: Arc<dyn RandomSource>) -> Self {
        Self {
            inner: Arc::new(EngineInner {
                store: JobStore::new(),
                tasks: TaskManager::default(),
                rng,
                config,
            }),
        }
    }

    pub fn store(&self) -> &JobStore {
        &self.inner.store
    }

    /// Opens an editor session over this engine's jobs.
    pub fn editor<C: ConfirmPrompt>(&self, confirm: C) -> EditorSession<C> {
        EditorSession::new(
            self.inner.store.clone(),
            &self.inner.config,
            self.inner.rng.clone(),
            confirm,
        )
    }

    /// Appends one `Pending` job per seed.
    pub fn ingest(&self, seeds: Vec<SeedRecord>) -> Vec<JobId> {
        let ids = self.inner.store.ingest(seeds);
        tracing::info!(count = ids.len(), "Ingested jobs");
        ids
    }

    /// Whether a batch currently holds the concurrency guard.
    #[cfg(test)]
    pub fn is_running(&self) -> bool {
        self.inner.tasks.is_active()
    }

    /// Starts every `Pending` or `Failed` job.
    ///
    /// Rejected without touching any job if nothing is eligible or another
    /// batch is still in flight. Must be called inside a Tokio runtime.
    pub fn start_batch(&self) -> Result<BatchSummary> {
        let store = &self.inner.store;
        let ticket = self
            .inner
            .tasks
            .begin(|| store.eligible_ids())
            .map_err(|reason| {
                tracing::warn!(%reason, "Batch start rejected");
                KeywriterError::Rejected(reason)
            })?;

        let batch_id = ticket.id;
        let mut doomed = 0;

        // Every member is Pending before any task can settle the batch.
        for (position, (job_id, _)) in ticket.jobs.iter().enumerate() {
            let fail_at = self.draw_failure();
            if fail_at.is_some() {
                doomed += 1;
            }
            store.update(*job_id, |job| job.prepare_run(fail_at));
            tracing::debug!(batch_id, job_id, position, fail_at_step_index = ?fail_at, "Job prepared");
        }

        let mut jobs = Vec::with_capacity(ticket.jobs.len());
        for (position, (job_id, token)) in ticket.jobs.into_iter().enumerate() {
            let engine = self.clone();
            tokio::spawn(engine.drive_job(batch_id, job_id, position, token));
            jobs.push(job_id);
        }

        tracing::info!(batch_id, jobs = jobs.len(), doomed, "Batch started");
        Ok(BatchSummary {
            batch_id,
            jobs,
            doomed,
        })
    }

    /// Cancels all scheduled steps, releases the guard and drops every job.
    pub fn clear_all(&self) -> usize {
        self.inner.tasks.cancel_all();
        let removed = self.inner.store.clear();
        tracing::info!(removed, "Cleared all jobs");
        removed
    }

    /// Resolves once no batch holds the guard.
    pub async fn wait_idle(&self) {
        self.inner.tasks.wait_idle().await;
    }

    /// Doomed with `failure_probability`; the stage is drawn from every
    /// index except the terminal one.
    fn draw_failure(&self) -> Option<usize> {
        let rng = self.inner.rng.as_ref();
        if rng.chance(self.inner.config.failure_probability) {
            Some(rng.below(Stage::TERMINAL_INDEX as u64) as usize)
        } else {
            None
        }
    }

    async fn drive_job(
        self,
        batch_id: BatchId,
        job_id: JobId,
        position: usize,
        token: CancellationToken,
    ) {
        let config = &self.inner.config;
        let store = &self.inner.store;
        let mut delay = config.first_step_delay(position);
        let mut cursor = 0;

        loop {
            if !sleep_unless_cancelled(&token, delay).await {
                return;
            }

            let rng = self.inner.rng.as_ref();
            let applied = store.update_if(
                job_id,
                || !token.is_cancelled(),
                |job| StageMachine::advance(job, cursor, rng, Utc::now()),
            );

            match applied {
                None => return,
                Some(Transition::Next(next)) => {
                    tracing::debug!(job_id, stage_index = cursor, "Stage complete");
                    cursor = next;
                    delay = config.step_delay(position);
                }
                Some(Transition::Failed(record)) => {
                    tracing::warn!(
                        job_id,
                        step_index = record.step_index,
                        stage = %record.stage,
                        reason = %record.reason,
                        "Job failed",
                    );
                    break;
                }
                Some(Transition::Finish) => {
                    if !sleep_unless_cancelled(&token, config.step_delay(position)).await {
                        return;
                    }
                    let url = config.article_url(job_id);
                    let finished = store.update_if(
                        job_id,
                        || !token.is_cancelled(),
                        |job| StageMachine::finish(job, url),
                    );
                    if finished.is_none() {
                        return;
                    }
                    tracing::info!(job_id, "Job done");
                    break;
                }
            }
        }

        self.inner
            .tasks
            .settle(batch_id, |members| store.any_in_flight(members));
    }
}
