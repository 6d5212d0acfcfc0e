use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::join::JoinBarrier;
use super::revision::RevisionSource;
use super::status::{Role, Status};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProposalId(Uuid);

impl ProposalId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ProposalId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ProposalId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<Uuid> for ProposalId {
    fn from(id: Uuid) -> Self {
        Self(id)
    }
}

/// A cooperation proposal under workflow control.
///
/// Only the transition executor mutates a stored proposal; everything else
/// works on snapshots.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Proposal {
    pub id: ProposalId,
    pub title: String,
    pub status: Status,
    /// Bumped by the store on every successful save.
    pub version: u64,
    pub revision_count: u32,
    pub revision_source: RevisionSource,
    pub last_feedback: Option<String>,
    /// Role whose gateway produced `last_feedback`.
    pub feedback_from: Option<Role>,
    #[serde(flatten)]
    pub join: JoinBarrier,
    pub created_by: String,
    /// Opaque references into the external document store, oldest first.
    pub documents: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Proposal {
    pub fn new(title: impl Into<String>, created_by: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: ProposalId::new(),
            title: title.into(),
            status: Status::INITIAL,
            version: 0,
            revision_count: 0,
            revision_source: RevisionSource::None,
            last_feedback: None,
            feedback_from: None,
            join: JoinBarrier::new(),
            created_by: created_by.into(),
            documents: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }
}
