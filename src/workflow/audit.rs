//! Append-only audit trail of executed transitions.
//!
//! The trail is the provenance of every status a proposal has held. Replaying
//! it must land on the proposal's live status; [`replay`] and
//! [`verify_consistency`] check exactly that.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::AuditError;

use super::proposal::{Proposal, ProposalId};
use super::status::{Actor, Role, Status};

/// Action recorded when a proposal is created.
pub const CREATE_ACTION: &str = "create";

/// One executed transition. Immutable once appended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditRecord {
    pub id: Uuid,
    pub proposal_id: ProposalId,
    pub action: String,
    pub actor: String,
    pub role: Role,
    /// `None` only for the creation record.
    pub from_status: Option<Status>,
    pub to_status: Status,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub document_ref: Option<String>,
    pub timestamp: DateTime<Utc>,
}

impl AuditRecord {
    pub fn new(
        proposal_id: ProposalId,
        action: impl Into<String>,
        actor: &Actor,
        from_status: Option<Status>,
        to_status: Status,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            proposal_id,
            action: action.into(),
            actor: actor.id.clone(),
            role: actor.role,
            from_status,
            to_status,
            comment: None,
            document_ref: None,
            timestamp,
        }
    }

    pub fn with_comment(mut self, comment: Option<&str>) -> Self {
        self.comment = comment.map(str::to_string);
        self
    }

    pub fn with_document(mut self, document_ref: Option<&str>) -> Self {
        self.document_ref = document_ref.map(str::to_string);
        self
    }
}

/// Storage for audit records. No update or delete is exposed.
pub trait AuditTrail: Send + Sync {
    /// Appends `record`. Fails if it would break timestamp ordering for its proposal.
    fn append(&self, record: AuditRecord) -> Result<(), AuditError>;

    /// Records for `id`, oldest first. Unknown ids have an empty history.
    fn history_of(&self, id: ProposalId) -> Result<Vec<AuditRecord>, AuditError>;

    /// Timestamp of the most recent record for `id`.
    fn last_timestamp(&self, id: ProposalId) -> Result<Option<DateTime<Utc>>, AuditError> {
        Ok(self.history_of(id)?.last().map(|r| r.timestamp))
    }
}

impl<T: AuditTrail + ?Sized> AuditTrail for Arc<T> {
    fn append(&self, record: AuditRecord) -> Result<(), AuditError> {
        (**self).append(record)
    }

    fn history_of(&self, id: ProposalId) -> Result<Vec<AuditRecord>, AuditError> {
        (**self).history_of(id)
    }

    fn last_timestamp(&self, id: ProposalId) -> Result<Option<DateTime<Utc>>, AuditError> {
        (**self).last_timestamp(id)
    }
}

/// Process-local audit trail.
#[derive(Debug, Default)]
pub struct InMemoryAuditTrail {
    records: RwLock<HashMap<ProposalId, Vec<AuditRecord>>>,
}

impl InMemoryAuditTrail {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every record of every proposal, grouped by proposal and oldest first.
    pub fn export(&self) -> Result<Vec<AuditRecord>, AuditError> {
        let records = self.records.read().map_err(|_| AuditError::LockPoisoned)?;
        let mut all: Vec<AuditRecord> = records.values().flatten().cloned().collect();
        all.sort_by(|a, b| {
            (a.proposal_id, a.timestamp).cmp(&(b.proposal_id, b.timestamp))
        });
        Ok(all)
    }
}

impl AuditTrail for InMemoryAuditTrail {
    fn append(&self, record: AuditRecord) -> Result<(), AuditError> {
        let mut records = self.records.write().map_err(|_| AuditError::LockPoisoned)?;
        let history = records.entry(record.proposal_id).or_default();
        if let Some(last) = history.last()
            && record.timestamp < last.timestamp
        {
            return Err(AuditError::OutOfOrder {
                id: record.proposal_id,
                previous: last.timestamp,
                attempted: record.timestamp,
            });
        }
        history.push(record);
        Ok(())
    }

    fn history_of(&self, id: ProposalId) -> Result<Vec<AuditRecord>, AuditError> {
        let records = self.records.read().map_err(|_| AuditError::LockPoisoned)?;
        Ok(records.get(&id).cloned().unwrap_or_default())
    }

    fn last_timestamp(&self, id: ProposalId) -> Result<Option<DateTime<Utc>>, AuditError> {
        let records = self.records.read().map_err(|_| AuditError::LockPoisoned)?;
        Ok(records.get(&id).and_then(|h| h.last()).map(|r| r.timestamp))
    }
}

/// Reconstructs the status a history ends in.
///
/// Each record must start where the previous one ended, the first one at no
/// status at all. Returns `None` for an empty history.
pub fn replay(id: ProposalId, history: &[AuditRecord]) -> Result<Option<Status>, AuditError> {
    let mut current: Option<Status> = None;
    for (index, record) in history.iter().enumerate() {
        if record.from_status != current {
            return Err(AuditError::BrokenChain {
                id,
                index,
                expected: current,
                found: record.from_status,
            });
        }
        current = Some(record.to_status);
    }
    Ok(current)
}

/// Checks that replaying `history` lands on the live status of `proposal`.
pub fn verify_consistency(proposal: &Proposal, history: &[AuditRecord]) -> Result<(), AuditError> {
    let replayed = replay(proposal.id, history)?;
    if replayed != Some(proposal.status) {
        return Err(AuditError::Inconsistent {
            id: proposal.id,
            replayed,
            live: proposal.status,
        });
    }
    Ok(())
}
