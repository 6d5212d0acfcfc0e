mod audit;
mod executor;
mod guard;
mod join;
mod notify;
mod proposal;
mod registry;
mod revision;
mod status;
mod store;
mod transition;

pub use audit::{
    AuditRecord, AuditTrail, CREATE_ACTION, InMemoryAuditTrail, replay, verify_consistency,
};
pub use executor::{AvailableAction, WorkflowEngine};
pub use guard::AuthorizationGuard;
pub use join::{JoinBarrier, JoinOutcome};
pub use notify::{LogNotifier, NotifyError, RecordingNotifier, StatusChange, StatusNotifier};
pub use proposal::{Proposal, ProposalId};
pub use registry::{TransitionRegistry, standard_edges};
pub use revision::{JoinResetPolicy, RevisionDecision, RevisionManager, RevisionSource};
pub use status::{Actor, ParseStatusError, Phase, Role, Status};
pub use store::{InMemoryProposalStore, ProposalEvent, ProposalStore};
pub use transition::{
    Correction, EdgeKind, Evidence, Track, TransitionDefinition, TransitionPayload,
};
