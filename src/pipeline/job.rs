use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::stage::{CurrentStep, Stage};
use crate::content;
use crate::seed::SeedRecord;
use crate::seo::SeoMetrics;
use crate::versions::{VersionHistory, VersionNote};

pub type JobId = u64;

/// Details of a simulated mid-pipeline failure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FailureRecord {
    pub step_index: usize,
    pub stage: Stage,
    pub failed_at: DateTime<Utc>,
    pub reason: String,
}

/// Lifecycle status of a job. Failure and output fields only exist on the
/// variant where they are meaningful.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status")]
pub enum JobStatus {
    Pending,
    Running,
    Done { url: String },
    Failed(FailureRecord),
}

impl JobStatus {
    pub fn label(&self) -> &'static str {
        match self {
            JobStatus::Pending => "Pending",
            JobStatus::Running => "Running",
            JobStatus::Done { .. } => "Done",
            JobStatus::Failed(_) => "Failed",
        }
    }

    /// Whether a new batch may pick this job up.
    pub fn is_eligible(&self) -> bool {
        matches!(self, JobStatus::Pending | JobStatus::Failed(_))
    }
}

/// Who touched the draft last, and when.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EditStamp {
    pub at: DateTime<Utc>,
    pub by: String,
}

/// One keyword row moving through the pipeline, plus its editable draft.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Job {
    id: JobId,
    main_keyword: String,
    secondary_keywords: Vec<String>,
    #[serde(flatten)]
    status: JobStatus,
    current_step: CurrentStep,
    progress: u8,
    draft: Option<String>,
    original_ai_draft: Option<String>,
    ai_generated_at: Option<DateTime<Utc>>,
    /// `draft != original_ai_draft`, refreshed after every draft change.
    edited: bool,
    regeneration_count: u32,
    versions: VersionHistory,
    last_edit: Option<EditStamp>,
    seo: Option<SeoMetrics>,
    #[serde(skip)]
    fail_at_step_index: Option<usize>,
}

impl Job {
    pub fn new(id: JobId, seed: SeedRecord) -> Self {
        Self {
            id,
            main_keyword: seed.main_keyword,
            secondary_keywords: seed.secondary_keywords,
            status: JobStatus::Pending,
            current_step: CurrentStep::Waiting,
            progress: 0,
            draft: None,
            original_ai_draft: None,
            ai_generated_at: None,
            edited: false,
            regeneration_count: 0,
            versions: VersionHistory::default(),
            last_edit: None,
            seo: None,
            fail_at_step_index: None,
        }
    }

    pub fn id(&self) -> JobId {
        self.id
    }

    pub fn main_keyword(&self) -> &str {
        &self.main_keyword
    }

    pub fn secondary_keywords(&self) -> &[String] {
        &self.secondary_keywords
    }

    pub fn status(&self) -> &JobStatus {
        &self.status
    }

    pub fn current_step(&self) -> CurrentStep {
        self.current_step
    }

    pub fn progress(&self) -> u8 {
        self.progress
    }

    pub fn draft(&self) -> Option<&str> {
        self.draft.as_deref()
    }

    pub fn original_ai_draft(&self) -> Option<&str> {
        self.original_ai_draft.as_deref()
    }

    pub fn ai_generated_at(&self) -> Option<DateTime<Utc>> {
        self.ai_generated_at
    }

    /// True iff the draft diverges from the generated one.
    pub fn is_edited(&self) -> bool {
        self.edited
    }

    pub fn regeneration_count(&self) -> u32 {
        self.regeneration_count
    }

    pub fn versions(&self) -> &VersionHistory {
        &self.versions
    }

    pub fn last_edit(&self) -> Option<&EditStamp> {
        self.last_edit.as_ref()
    }

    pub fn seo(&self) -> Option<&SeoMetrics> {
        self.seo.as_ref()
    }

    pub fn url(&self) -> Option<&str> {
        match &self.status {
            JobStatus::Done { url } => Some(url),
            _ => None,
        }
    }

    pub fn failure(&self) -> Option<&FailureRecord> {
        match &self.status {
            JobStatus::Failed(record) => Some(record),
            _ => None,
        }
    }

    // ─── Engine side ────────────────────────────────────────────────────────

    pub(crate) fn fail_at_step_index(&self) -> Option<usize> {
        self.fail_at_step_index
    }

    /// Resets the job for a fresh run with a newly drawn failure point.
    pub(crate) fn prepare_run(&mut self, fail_at_step_index: Option<usize>) {
        self.status = JobStatus::Pending;
        self.current_step = CurrentStep::Waiting;
        self.progress = 0;
        self.fail_at_step_index = fail_at_step_index;
    }

    pub(crate) fn enter_stage(&mut self, stage: Stage) {
        self.status = JobStatus::Running;
        self.current_step = CurrentStep::At(stage);
        self.progress = Stage::progress_at(stage.index());
    }

    /// Installs freshly generated text. Starts a new history for it.
    pub(crate) fn install_generated_draft(&mut self, at: DateTime<Utc>) {
        let text = content::initial_draft(&self.main_keyword, &self.secondary_keywords);
        self.original_ai_draft = Some(text.clone());
        self.draft = Some(text);
        self.ai_generated_at = Some(at);
        self.versions = VersionHistory::default();
        self.regeneration_count = 0;
        self.last_edit = None;
        self.refresh_edited();
    }

    pub(crate) fn attach_seo(&mut self, metrics: SeoMetrics) {
        self.seo = Some(metrics);
    }

    /// Parks the job in `Failed`. A failing job never reports 100%.
    pub(crate) fn mark_failed(&mut self, record: FailureRecord) {
        self.progress = self.progress.min(99);
        self.status = JobStatus::Failed(record);
    }

    pub(crate) fn mark_done(&mut self, url: String) {
        self.status = JobStatus::Done { url };
        self.current_step = CurrentStep::At(Stage::Done);
        self.progress = 100;
    }

    // ─── Editor side ────────────────────────────────────────────────────────

    /// Replaces the draft with user text; returns the backup version id.
    pub(crate) fn apply_manual_edit(
        &mut self,
        text: String,
        author: &str,
        at: DateTime<Utc>,
        seo: SeoMetrics,
    ) -> u64 {
        let version = self.snapshot_draft(VersionNote::ManualSave, author, at);
        self.draft = Some(text);
        self.seo = Some(seo);
        self.refresh_edited();
        self.stamp(author, at);
        version
    }

    pub(crate) fn revert_to_source(&mut self, author: &str, at: DateTime<Utc>) -> u64 {
        let version = self.snapshot_draft(VersionNote::RevertBackup, author, at);
        self.draft = self.original_ai_draft.clone();
        self.refresh_edited();
        self.stamp(author, at);
        version
    }

    pub(crate) fn regenerate(&mut self, author: &str, at: DateTime<Utc>) -> u64 {
        let next = self.regeneration_count + 1;
        let text = content::regenerated_draft(&self.main_keyword, &self.secondary_keywords, next);
        let version = self.snapshot_draft(VersionNote::RegenerateBackup, author, at);
        self.draft = Some(text);
        self.regeneration_count = next;
        self.refresh_edited();
        self.stamp(author, at);
        version
    }

    fn snapshot_draft(&mut self, note: VersionNote, author: &str, at: DateTime<Utc>) -> u64 {
        let content = self.draft.clone().unwrap_or_default();
        self.versions.record(content, author, note, at)
    }

    fn refresh_edited(&mut self) {
        self.edited = self.draft != self.original_ai_draft;
    }

    fn stamp(&mut self, author: &str, at: DateTime<Utc>) {
        self.last_edit = Some(EditStamp {
            at,
            by: author.to_string(),
        });
    }
}
