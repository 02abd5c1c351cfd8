use chrono::{DateTime, Utc};

use super::job::{FailureRecord, Job};
use super::stage::Stage;
use crate::random::RandomSource;
use crate::seo::SeoMetrics;

/// What the engine should do after a stage has been applied.
#[derive(Debug, Clone, PartialEq)]
pub enum Transition {
    /// Schedule the stage at this cursor.
    Next(usize),
    /// Every working stage ran; schedule the terminal step.
    Finish,
    /// The job hit its drawn failure point and stops here.
    Failed(FailureRecord),
}

/// Applies one pipeline step to a `Job`.
pub struct StageMachine;

impl StageMachine {
    /// Enters the stage at `cursor` and applies its effects.
    ///
    /// - Draft Generation installs a fresh generated draft.
    /// - SEO Optimization attaches new metrics.
    /// - If the job was doomed at this cursor it is parked in `Failed`
    ///   after the stage's effects are applied.
    pub fn advance(
        job: &mut Job,
        cursor: usize,
        rng: &dyn RandomSource,
        now: DateTime<Utc>,
    ) -> Transition {
        let Some(stage) = Stage::at(cursor).filter(|s| !s.is_terminal()) else {
            return Transition::Finish;
        };

        job.enter_stage(stage);

        if stage == Stage::DRAFT {
            job.install_generated_draft(now);
        }
        if stage == Stage::SEO {
            job.attach_seo(SeoMetrics::generate(rng));
        }

        if job.fail_at_step_index() == Some(cursor) {
            let record = FailureRecord {
                step_index: cursor,
                stage,
                failed_at: now,
                reason: format!("Simulated failure during {stage}"),
            };
            job.mark_failed(record.clone());
            return Transition::Failed(record);
        }

        let next = cursor + 1;
        if next >= Stage::TERMINAL_INDEX {
            Transition::Finish
        } else {
            Transition::Next(next)
        }
    }

    /// Terminal step: `Done`, progress 100, output reference attached.
    pub fn finish(job: &mut Job, url: String) {
        job.mark_done(url);
    }
}
