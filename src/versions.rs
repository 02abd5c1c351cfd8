//! Append-only draft history.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Which editor action superseded the snapshotted text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum VersionNote {
    ManualSave,
    RevertBackup,
    RegenerateBackup,
}

impl std::fmt::Display for VersionNote {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            VersionNote::ManualSave => write!(f, "manual save"),
            VersionNote::RevertBackup => write!(f, "revert backup"),
            VersionNote::RegenerateBackup => write!(f, "regenerate backup"),
        }
    }
}

/// Immutable snapshot of a draft taken just before it was replaced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Version {
    pub id: u64,
    pub content: String,
    pub timestamp: DateTime<Utc>,
    pub author: String,
    pub note: VersionNote,
}

/// Ordered versions of one job's draft. Ids come from `next_id`, not the
/// entry count.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VersionHistory {
    entries: Vec<Version>,
    next_id: u64,
}

impl Default for VersionHistory {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
            next_id: 1,
        }
    }
}

impl VersionHistory {
    /// Appends a snapshot and returns its id.
    pub fn record(
        &mut self,
        content: impl Into<String>,
        author: impl Into<String>,
        note: VersionNote,
        timestamp: DateTime<Utc>,
    ) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        self.entries.push(Version {
            id,
            content: content.into(),
            timestamp,
            author: author.into(),
            note,
        });
        id
    }

    pub fn entries(&self) -> &[Version] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
