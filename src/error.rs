use thiserror::Error;

use crate::pipeline::JobId;

/// Why a batch start was refused. Neither case mutates any job.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectReason {
    /// No job is `Pending` or `Failed`.
    NoEligibleJobs,
    /// The concurrency guard is held by a batch still in flight.
    BatchActive,
}

impl std::fmt::Display for RejectReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RejectReason::NoEligibleJobs => write!(f, "all jobs are already done"),
            RejectReason::BatchActive => write!(f, "processing already in progress"),
        }
    }
}

#[derive(Debug, Error)]
pub enum KeywriterError {
    #[error("Draft is empty")]
    EmptyDraft,

    #[error("Batch rejected: {0}")]
    Rejected(RejectReason),

    #[error("No job is open in the editor")]
    NoActiveJob,

    #[error("Job not found: {0}")]
    JobNotFound(JobId),

    #[error("Job {0} has no draft yet")]
    DraftUnavailable(JobId),

    #[error("Config error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
}

impl KeywriterError {
    /// Taxonomy code surfaced to callers alongside the message.
    pub fn code(&self) -> &'static str {
        match self {
            KeywriterError::EmptyDraft => "USER_INPUT_ERROR",
            KeywriterError::Rejected(_) => "OPERATION_REJECTED",
            KeywriterError::NoActiveJob => "NO_ACTIVE_JOB",
            KeywriterError::JobNotFound(_) | KeywriterError::DraftUnavailable(_) => {
                "OPERATION_REJECTED"
            }
            KeywriterError::Config(_) | KeywriterError::Io(_) | KeywriterError::Toml(_) => {
                "CONFIG_ERROR"
            }
        }
    }
}

pub type Result<T> = std::result::Result<T, KeywriterError>;
