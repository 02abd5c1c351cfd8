//! Batch guard and cancellation.
//!
//! [`TaskManager`] owns the one batch-level [`CancellationToken`] and hands
//! each job a child token. Cancelling the batch revokes every child, so any
//! step still sleeping or queued becomes unobservable.

use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use tokio::sync::watch;
use tokio_util::sync::CancellationToken;

use crate::error::RejectReason;
use crate::pipeline::JobId;

pub type BatchId = u64;

#[derive(Debug)]
struct ActiveBatch {
    id: BatchId,
    token: CancellationToken,
    members: Vec<JobId>,
}

#[derive(Debug, Default)]
struct SchedulerState {
    active: Option<ActiveBatch>,
    next_batch: BatchId,
}

/// Handed out when a batch starts: one child token per member job.
#[derive(Debug)]
pub struct BatchTicket {
    pub id: BatchId,
    pub jobs: Vec<(JobId, CancellationToken)>,
}

#[derive(Debug)]
pub struct TaskManager {
    state: Mutex<SchedulerState>,
    idle: watch::Sender<bool>,
}

impl Default for TaskManager {
    fn default() -> Self {
        let (idle, _) = watch::channel(true);
        Self {
            state: Mutex::new(SchedulerState::default()),
            idle,
        }
    }
}

impl TaskManager {
    fn lock(&self) -> MutexGuard<'_, SchedulerState> {
        match self.state.lock() {
            Ok(guard) => guard,
            Err(poisoned) => {
                tracing::warn!("Scheduler lock was poisoned, recovering");
                poisoned.into_inner()
            }
        }
    }

    /// Takes the guard for a new batch.
    ///
    /// `select` runs while the guard is checked, so no other start can slip
    /// in between choosing the members and taking the guard.
    pub fn begin(
        &self,
        select: impl FnOnce() -> Vec<JobId>,
    ) -> Result<BatchTicket, RejectReason> {
        let mut state = self.lock();
        let members = select();
        if members.is_empty() {
            return Err(RejectReason::NoEligibleJobs);
        }
        if state.active.is_some() {
            return Err(RejectReason::BatchActive);
        }

        state.next_batch += 1;
        let id = state.next_batch;
        let token = CancellationToken::new();
        let jobs = members
            .iter()
            .map(|job_id| (*job_id, token.child_token()))
            .collect();

        state.active = Some(ActiveBatch { id, token, members });
        self.idle.send_replace(false);
        Ok(BatchTicket { id, jobs })
    }

    /// Releases the guard for `batch` once `in_flight` reports no member
    /// still pending or running. Returns true if this call released it.
    pub fn settle(&self, batch: BatchId, in_flight: impl FnOnce(&[JobId]) -> bool) -> bool {
        let mut state = self.lock();
        let Some(active) = state.active.as_ref() else {
            return false;
        };
        if active.id != batch || active.token.is_cancelled() {
            return false;
        }
        if in_flight(&active.members) {
            return false;
        }

        state.active = None;
        self.idle.send_replace(true);
        tracing::info!(batch_id = batch, "Batch finished, guard released");
        true
    }

    /// Revokes every outstanding step and clears the guard unconditionally.
    pub fn cancel_all(&self) -> Option<BatchId> {
        let mut state = self.lock();
        let cancelled = state.active.take().map(|active| {
            active.token.cancel();
            active.id
        });
        self.idle.send_replace(true);
        if let Some(batch_id) = cancelled {
            tracing::info!(batch_id, "Batch cancelled");
        }
        cancelled
    }

    #[cfg(test)]
    pub fn is_active(&self) -> bool {
        self.lock().active.is_some()
    }

    /// Resolves once no batch holds the guard.
    pub async fn wait_idle(&self) {
        let mut rx = self.idle.subscribe();
        // The sender lives as long as `self`, so this cannot fail.
        let _ = rx.wait_for(|idle| *idle).await;
    }
}

/// Sleeps for `delay` unless `token` is cancelled first. Returns whether the
/// full delay elapsed.
pub async fn sleep_unless_cancelled(token: &CancellationToken, delay: Duration) -> bool {
    tokio::select! {
        _ = token.cancelled() => false,
        _ = tokio::time::sleep(delay) => !token.is_cancelled(),
    }
}
