//! Draft editor session.
//!
//! An [`EditorSession`] binds to one job at a time and keeps a live text
//! buffer for it. Save, revert and regenerate write through to the
//! [`JobStore`], each appending one backup [`Version`](crate::versions::Version)
//! of the text being replaced. Closing with unsaved changes asks a
//! [`ConfirmPrompt`] first.

use std::sync::Arc;

use chrono::Utc;

use crate::config::KeywriterConfig;
use crate::error::{KeywriterError, Result};
use crate::pipeline::JobId;
use crate::random::RandomSource;
use crate::seo::SeoMetrics;
use crate::store::JobStore;

pub const CLOSE_PROMPT: &str = "You have unsaved changes. Are you sure you want to close?";
pub const CANCEL_PROMPT: &str = "Are you sure? All your unsaved work will be lost.";

/// Yes/no capability used before discarding unsaved edits.
pub trait ConfirmPrompt {
    fn confirm(&self, message: &str) -> bool;
}

impl<F> ConfirmPrompt for F
where
    F: Fn(&str) -> bool,
{
    fn confirm(&self, message: &str) -> bool {
        self(message)
    }
}

/// Accepts every prompt.
#[derive(Debug, Default, Clone, Copy)]
pub struct AssumeYes;

impl ConfirmPrompt for AssumeYes {
    fn confirm(&self, _message: &str) -> bool {
        true
    }
}

#[derive(Debug)]
struct OpenDraft {
    job_id: JobId,
    buffer: String,
}

pub struct EditorSession<C> {
    store: JobStore,
    rng: Arc<dyn RandomSource>,
    author: String,
    scoring_delay: std::time::Duration,
    confirm: C,
    open: Option<OpenDraft>,
}

impl<C: ConfirmPrompt> EditorSession<C> {
    pub fn new(
        store: JobStore,
        config: &KeywriterConfig,
        rng: Arc<dyn RandomSource>,
        confirm: C,
    ) -> Self {
        Self {
            store,
            rng,
            author: config.editor_name.clone(),
            scoring_delay: config.scoring_delay(),
            confirm,
            open: None,
        }
    }

    /// Binds the session to `job_id` and loads its draft into the buffer.
    pub fn open(&mut self, job_id: JobId) -> Result<()> {
        let job = self
            .store
            .get(job_id)
            .ok_or(KeywriterError::JobNotFound(job_id))?;
        let draft = job
            .draft()
            .ok_or(KeywriterError::DraftUnavailable(job_id))?;

        self.open = Some(OpenDraft {
            job_id,
            buffer: draft.to_string(),
        });
        tracing::debug!(job_id, "Editor opened");
        Ok(())
    }

    /// Bound job, if it still exists. Clearing the store unbinds the session.
    pub fn active_job(&self) -> Option<JobId> {
        self.open
            .as_ref()
            .map(|o| o.job_id)
            .filter(|id| self.store.contains(*id))
    }

    pub fn buffer(&self) -> Option<&str> {
        self.open
            .as_ref()
            .filter(|o| self.store.contains(o.job_id))
            .map(|o| o.buffer.as_str())
    }

    /// Replaces the live buffer without persisting anything.
    pub fn edit_buffer(&mut self, text: impl Into<String>) -> Result<()> {
        let open = self.bound()?;
        open.buffer = text.into();
        Ok(())
    }

    /// Whether the buffer differs from the job's persisted draft.
    pub fn has_unsaved_changes(&self) -> bool {
        let Some(open) = &self.open else {
            return false;
        };
        match self.store.get(open.job_id) {
            Some(job) => job.draft() != Some(open.buffer.as_str()),
            None => false,
        }
    }

    /// The open draft, dropping it first if its job was cleared.
    fn bound(&mut self) -> Result<&mut OpenDraft> {
        if let Some(open) = &self.open
            && !self.store.contains(open.job_id)
        {
            tracing::debug!(job_id = open.job_id, "Bound job cleared, discarding buffer");
            self.open = None;
        }
        self.open.as_mut().ok_or(KeywriterError::NoActiveJob)
    }

    fn active_id(&mut self) -> Result<JobId> {
        self.bound().map(|open| open.job_id)
    }

    fn set_buffer(&mut self, text: String) {
        if let Some(open) = self.open.as_mut() {
            open.buffer = text;
        }
    }

    /// Persists `text` as the new draft after the scoring delay.
    ///
    /// Whitespace-only text is refused with no change. Returns the id of the
    /// "manual save" backup version.
    pub async fn save(&mut self, text: impl Into<String>) -> Result<u64> {
        let job_id = self.active_id()?;
        let text = text.into();
        if text.trim().is_empty() {
            return Err(KeywriterError::EmptyDraft);
        }
        self.set_buffer(text.clone());

        tokio::time::sleep(self.scoring_delay).await;

        let seo = SeoMetrics::generate(self.rng.as_ref());
        let author = self.author.as_str();
        let version = self
            .store
            .update(job_id, |job| job.apply_manual_edit(text, author, Utc::now(), seo))
            .ok_or(KeywriterError::JobNotFound(job_id))?;

        tracing::info!(job_id, version, "Draft saved");
        Ok(version)
    }

    /// Restores the generated draft, backing up the current one.
    pub fn revert(&mut self) -> Result<u64> {
        let job_id = self.active_id()?;
        let author = self.author.as_str();
        let (version, restored) = self
            .store
            .update(job_id, |job| {
                let version = job.revert_to_source(author, Utc::now());
                (version, job.draft().unwrap_or_default().to_string())
            })
            .ok_or(KeywriterError::JobNotFound(job_id))?;

        self.set_buffer(restored);
        tracing::info!(job_id, version, "Draft reverted to generated text");
        Ok(version)
    }

    /// Produces the next regenerated draft, backing up the current one.
    pub fn regenerate(&mut self) -> Result<u64> {
        let job_id = self.active_id()?;
        let author = self.author.as_str();
        let (version, text, count) = self
            .store
            .update(job_id, |job| {
                let version = job.regenerate(author, Utc::now());
                let text = job.draft().unwrap_or_default().to_string();
                (version, text, job.regeneration_count())
            })
            .ok_or(KeywriterError::JobNotFound(job_id))?;

        self.set_buffer(text);
        tracing::info!(job_id, version, regeneration = count, "Draft regenerated");
        Ok(version)
    }

    /// Closes the session. Returns `Ok(false)` if the user chose to keep
    /// unsaved changes open.
    pub fn close(&mut self) -> Result<bool> {
        self.dismiss(CLOSE_PROMPT)
    }

    /// Same as [`close`](Self::close) with the discard-work prompt.
    pub fn cancel(&mut self) -> Result<bool> {
        self.dismiss(CANCEL_PROMPT)
    }

    fn dismiss(&mut self, prompt: &str) -> Result<bool> {
        let job_id = self.active_id()?;
        if self.has_unsaved_changes() && !self.confirm.confirm(prompt) {
            tracing::debug!(job_id, "Close declined, keeping unsaved changes");
            return Ok(false);
        }
        self.open = None;
        tracing::debug!(job_id, "Editor closed");
        Ok(true)
    }

    /// Unbinds without prompting.
    pub fn reset(&mut self) {
        self.open = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    use crate::pipeline::{StageMachine, Transition};
    use crate::random::FixedRandom;
    use crate::seed::parse_seeds;
    use crate::versions::VersionNote;

    fn config() -> KeywriterConfig {
        KeywriterConfig {
            scoring_delay_ms: 1,
            ..KeywriterConfig::default()
        }
    }

    /// Store with job 1 finished and job 2 untouched.
    fn finished_store() -> JobStore {
        let store = JobStore::new();
        store.ingest(parse_seeds("seo tools,best seo|top seo\nkeyword research,"));
        let rng = FixedRandom::never_fails();
        store.update(1, |job| {
            job.prepare_run(None);
            let mut cursor = 0;
            while let Transition::Next(next) = StageMachine::advance(job, cursor, &rng, Utc::now())
            {
                cursor = next;
            }
            StageMachine::finish(job, "https://fakewebsite.com/articles/1".into());
        });
        store
    }

    fn session<C: ConfirmPrompt>(store: &JobStore, confirm: C) -> EditorSession<C> {
        EditorSession::new(
            store.clone(),
            &config(),
            Arc::new(FixedRandom {
                fraction: 0.2,
                index: 5,
            }),
            confirm,
        )
    }

    fn refuse(_: &str) -> bool {
        panic!("no prompt expected")
    }

    #[test]
    fn open_requires_existing_job_with_draft() {
        let store = finished_store();
        let mut editor = session(&store, refuse);

        assert!(matches!(editor.open(42), Err(KeywriterError::JobNotFound(42))));
        assert!(matches!(editor.open(2), Err(KeywriterError::DraftUnavailable(2))));
        assert!(editor.active_job().is_none());

        editor.open(1).unwrap();
        assert_eq!(editor.active_job(), Some(1));
        assert_eq!(editor.buffer(), store.get(1).unwrap().draft());
    }

    #[tokio::test]
    async fn actions_without_a_bound_job_are_rejected() {
        let store = finished_store();
        let before = serde_json::to_string(&store.snapshot()).unwrap();
        let mut editor = session(&store, refuse);

        let err = editor.save("text").await.unwrap_err();
        assert_eq!(err.code(), "NO_ACTIVE_JOB");
        assert!(matches!(editor.revert(), Err(KeywriterError::NoActiveJob)));
        assert!(matches!(editor.regenerate(), Err(KeywriterError::NoActiveJob)));
        assert!(matches!(editor.close(), Err(KeywriterError::NoActiveJob)));
        assert!(matches!(editor.edit_buffer("x"), Err(KeywriterError::NoActiveJob)));
        assert_eq!(serde_json::to_string(&store.snapshot()).unwrap(), before);
    }

    #[tokio::test]
    async fn empty_save_changes_nothing() {
        let store = finished_store();
        let before = serde_json::to_string(&store.snapshot()).unwrap();
        let mut editor = session(&store, refuse);
        editor.open(1).unwrap();

        let err = editor.save("   \n\t").await.unwrap_err();
        assert!(matches!(err, KeywriterError::EmptyDraft));
        assert_eq!(err.code(), "USER_INPUT_ERROR");
        assert_eq!(serde_json::to_string(&store.snapshot()).unwrap(), before);
        assert!(store.get(1).unwrap().versions().is_empty());
    }

    #[tokio::test]
    async fn save_backs_up_previous_draft_and_rescores() {
        let store = finished_store();
        let original = store.get(1).unwrap().draft().unwrap().to_string();
        let mut editor = session(&store, refuse);
        editor.open(1).unwrap();

        let version = editor.save("Hand-written intro").await.unwrap();

        let job = store.get(1).unwrap();
        assert_eq!(version, 1);
        assert_eq!(job.draft(), Some("Hand-written intro"));
        assert!(job.is_edited());
        assert_eq!(job.original_ai_draft(), Some(original.as_str()));
        let backup = job.versions().entries().last().unwrap();
        assert_eq!(backup.content, original);
        assert_eq!(backup.note, VersionNote::ManualSave);
        assert_eq!(backup.author, "You");
        assert_eq!(job.last_edit().unwrap().by, "You");
        assert_eq!(job.seo().unwrap().readability, 60);
        assert!(!editor.has_unsaved_changes());
    }

    #[test]
    fn regenerate_twice_counts_and_tags_each_backup() {
        let store = finished_store();
        let mut editor = session(&store, refuse);
        editor.open(1).unwrap();

        assert_eq!(editor.regenerate().unwrap(), 1);
        assert_eq!(store.get(1).unwrap().regeneration_count(), 1);
        assert_eq!(editor.regenerate().unwrap(), 2);

        let job = store.get(1).unwrap();
        assert_eq!(job.regeneration_count(), 2);
        assert_eq!(job.versions().len(), 2);
        assert!(
            job.versions()
                .entries()
                .iter()
                .all(|v| v.note == VersionNote::RegenerateBackup)
        );
        assert!(job.is_edited());
        assert_eq!(editor.buffer(), job.draft());
    }

    #[tokio::test]
    async fn revert_restores_generated_text() {
        let store = finished_store();
        let mut editor = session(&store, refuse);
        editor.open(1).unwrap();
        editor.save("mine").await.unwrap();

        let version = editor.revert().unwrap();

        let job = store.get(1).unwrap();
        assert_eq!(version, 2);
        assert_eq!(job.draft(), job.original_ai_draft());
        assert!(!job.is_edited());
        assert_eq!(job.versions().entries().last().unwrap().content, "mine");
        assert_eq!(job.versions().entries().last().unwrap().note, VersionNote::RevertBackup);
        assert_eq!(editor.buffer(), job.original_ai_draft());
    }

    #[tokio::test]
    async fn every_version_holds_the_draft_it_replaced() {
        let store = finished_store();
        let mut editor = session(&store, refuse);
        editor.open(1).unwrap();

        let mut replaced = Vec::new();
        replaced.push(store.get(1).unwrap().draft().unwrap().to_string());
        editor.save("first edit").await.unwrap();
        replaced.push(store.get(1).unwrap().draft().unwrap().to_string());
        editor.regenerate().unwrap();
        replaced.push(store.get(1).unwrap().draft().unwrap().to_string());
        editor.revert().unwrap();

        let job = store.get(1).unwrap();
        let ids: Vec<u64> = job.versions().entries().iter().map(|v| v.id).collect();
        let contents: Vec<String> =
            job.versions().entries().iter().map(|v| v.content.clone()).collect();
        assert_eq!(ids, vec![1, 2, 3]);
        assert_eq!(contents, replaced);
    }

    #[test]
    fn declining_close_keeps_session_and_buffer() {
        let store = finished_store();
        let prompts = Rc::new(RefCell::new(Vec::new()));
        let seen = prompts.clone();
        let mut editor = session(&store, move |msg: &str| {
            seen.borrow_mut().push(msg.to_string());
            false
        });
        editor.open(1).unwrap();
        editor.edit_buffer("unsaved words").unwrap();
        let before = serde_json::to_string(&store.snapshot()).unwrap();

        assert!(!editor.close().unwrap());
        assert!(!editor.cancel().unwrap());

        assert_eq!(editor.active_job(), Some(1));
        assert_eq!(editor.buffer(), Some("unsaved words"));
        assert_eq!(serde_json::to_string(&store.snapshot()).unwrap(), before);
        assert_eq!(*prompts.borrow(), vec![CLOSE_PROMPT, CANCEL_PROMPT]);
    }

    #[test]
    fn accepting_close_discards_buffer() {
        let store = finished_store();
        let mut editor = session(&store, AssumeYes);
        editor.open(1).unwrap();
        editor.edit_buffer("throwaway").unwrap();

        assert!(editor.cancel().unwrap());
        assert!(editor.active_job().is_none());
        assert!(editor.buffer().is_none());
        assert_ne!(store.get(1).unwrap().draft(), Some("throwaway"));
    }

    #[test]
    fn clean_close_does_not_prompt() {
        let store = finished_store();
        let mut editor = session(&store, refuse);
        editor.open(1).unwrap();
        assert!(editor.close().unwrap());
        assert!(editor.active_job().is_none());
    }

    #[tokio::test]
    async fn clearing_the_store_unbinds_the_session() {
        let store = finished_store();
        let mut editor = session(&store, refuse);
        editor.open(1).unwrap();
        editor.edit_buffer("unsaved").unwrap();
        store.clear();

        assert!(editor.active_job().is_none());
        assert!(!editor.has_unsaved_changes());
        let err = editor.save("late").await.unwrap_err();
        assert!(matches!(err, KeywriterError::NoActiveJob));
        assert!(matches!(editor.close(), Err(KeywriterError::NoActiveJob)));
    }

    #[test]
    fn clearing_the_store_discards_the_buffer() {
        let store = finished_store();
        let mut editor = session(&store, refuse);
        editor.open(1).unwrap();
        editor.edit_buffer("unsaved").unwrap();
        store.clear();

        assert!(editor.buffer().is_none());
        let err = editor.edit_buffer("more").unwrap_err();
        assert!(matches!(err, KeywriterError::NoActiveJob));
        assert!(editor.open.is_none());
        assert!(matches!(editor.cancel(), Err(KeywriterError::NoActiveJob)));
        assert!(editor.buffer().is_none());
    }
}
