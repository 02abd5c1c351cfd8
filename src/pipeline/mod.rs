mod job;
mod machine;
mod stage;

pub use job::{FailureRecord, Job, JobId, JobStatus};
pub use machine::{StageMachine, Transition};
pub use stage::{CurrentStep, Stage};
