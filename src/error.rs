use thiserror::Error;

use crate::workflow::{Evidence, ProposalId, Role, Status};

/// Failures returned by the workflow engine to its caller.
///
/// None of these are retried internally. `ConcurrentModification` is the only
/// variant a caller is expected to retry, after reloading the proposal.
#[derive(Debug, Error)]
pub enum WorkflowError {
    #[error("role {role} may not act on a proposal in status {status}")]
    Unauthorized { status: Status, role: Role },

    #[error("no transition from {from} to {to}")]
    InvalidTransition { from: Status, to: Status },

    #[error("action `{action}` requires a {required}")]
    MissingEvidence {
        action: &'static str,
        required: Evidence,
    },

    #[error("proposal {id} changed since it was loaded (expected version {expected}, found {found})")]
    ConcurrentModification {
        id: ProposalId,
        expected: u64,
        found: u64,
    },

    #[error("proposal not found: {0}")]
    NotFound(ProposalId),

    #[error("proposal is in terminal status {0}")]
    TerminalState(Status),

    #[error("store error: {0}")]
    Store(StoreError),

    #[error("audit error: {0}")]
    Audit(#[from] AuditError),
}

impl From<StoreError> for WorkflowError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(id) => WorkflowError::NotFound(id),
            StoreError::Conflict {
                id,
                expected,
                found,
            } => WorkflowError::ConcurrentModification {
                id,
                expected,
                found,
            },
            other => WorkflowError::Store(other),
        }
    }
}

/// Failures of a proposal store backend.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("proposal not found: {0}")]
    NotFound(ProposalId),

    #[error("proposal already exists: {0}")]
    AlreadyExists(ProposalId),

    #[error("version conflict on {id}: expected {expected}, found {found}")]
    Conflict {
        id: ProposalId,
        expected: u64,
        found: u64,
    },

    #[error("store lock poisoned")]
    LockPoisoned,
}

/// Failures of an audit trail backend or of a history replay.
#[derive(Debug, Error)]
pub enum AuditError {
    #[error("audit record for {id} at {attempted} precedes the last record at {previous}")]
    OutOfOrder {
        id: ProposalId,
        previous: chrono::DateTime<chrono::Utc>,
        attempted: chrono::DateTime<chrono::Utc>,
    },

    #[error("history of {id} breaks at record {index}: expected source {expected:?}, found {found:?}")]
    BrokenChain {
        id: ProposalId,
        index: usize,
        expected: Option<Status>,
        found: Option<Status>,
    },

    #[error("history of {id} ends in {replayed:?} but the proposal is {live}")]
    Inconsistent {
        id: ProposalId,
        replayed: Option<Status>,
        live: Status,
    },

    #[error("audit lock poisoned")]
    LockPoisoned,
}

/// Problems found while validating a transition table.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    #[error("non-terminal status {0} has no outgoing transition")]
    DeadEnd(Status),

    #[error("terminal status {0} has an outgoing transition")]
    TerminalHasEdges(Status),

    #[error("transition `{0}` allows no role")]
    NoRoles(&'static str),

    #[error("transitions from {from} to {to} overlap on role {role}")]
    Ambiguous { from: Status, to: Status, role: Role },

    #[error("status {0} is unreachable from the initial status")]
    Unreachable(Status),

    #[error("transition `{action}` from {from} is misclassified: {reason}")]
    Misclassified {
        action: &'static str,
        from: Status,
        reason: &'static str,
    },
}
