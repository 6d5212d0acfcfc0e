use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

use crate::error::StoreError;

use super::proposal::{Proposal, ProposalId};
use super::status::Status;

/// Change notification published by a store after a successful write.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum ProposalEvent {
    Created {
        id: ProposalId,
        status: Status,
    },
    Updated {
        id: ProposalId,
        status: Status,
        version: u64,
    },
}

impl ProposalEvent {
    pub fn id(&self) -> ProposalId {
        match self {
            ProposalEvent::Created { id, .. } | ProposalEvent::Updated { id, .. } => *id,
        }
    }
}

/// Repository for proposals with optimistic concurrency.
///
/// `save` succeeds only when the stored version still equals `expected_version`;
/// the stored copy then gets `expected_version + 1`.
pub trait ProposalStore: Send + Sync {
    fn insert(&self, proposal: &Proposal) -> Result<(), StoreError>;

    fn load(&self, id: ProposalId) -> Result<Proposal, StoreError>;

    /// Returns the new version.
    fn save(&self, proposal: &Proposal, expected_version: u64) -> Result<u64, StoreError>;

    fn subscribe(&self) -> broadcast::Receiver<ProposalEvent>;
}

impl<T: ProposalStore + ?Sized> ProposalStore for Arc<T> {
    fn insert(&self, proposal: &Proposal) -> Result<(), StoreError> {
        (**self).insert(proposal)
    }

    fn load(&self, id: ProposalId) -> Result<Proposal, StoreError> {
        (**self).load(id)
    }

    fn save(&self, proposal: &Proposal, expected_version: u64) -> Result<u64, StoreError> {
        (**self).save(proposal, expected_version)
    }

    fn subscribe(&self) -> broadcast::Receiver<ProposalEvent> {
        (**self).subscribe()
    }
}

const EVENT_CAPACITY: usize = 256;

/// Process-local store. Each proposal is an independent unit; the lock only
/// guards the map and is never held across a caller's work.
#[derive(Debug)]
pub struct InMemoryProposalStore {
    proposals: RwLock<HashMap<ProposalId, Proposal>>,
    events: broadcast::Sender<ProposalEvent>,
}

impl InMemoryProposalStore {
    pub fn new() -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            proposals: RwLock::new(HashMap::new()),
            events,
        }
    }

    pub fn len(&self) -> Result<usize, StoreError> {
        Ok(self.proposals.read().map_err(|_| StoreError::LockPoisoned)?.len())
    }

    pub fn is_empty(&self) -> Result<bool, StoreError> {
        Ok(self.len()? == 0)
    }

    fn publish(&self, event: ProposalEvent) {
        // No subscribers is not an error.
        let _ = self.events.send(event);
    }
}

impl Default for InMemoryProposalStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ProposalStore for InMemoryProposalStore {
    fn insert(&self, proposal: &Proposal) -> Result<(), StoreError> {
        {
            let mut proposals = self.proposals.write().map_err(|_| StoreError::LockPoisoned)?;
            if proposals.contains_key(&proposal.id) {
                return Err(StoreError::AlreadyExists(proposal.id));
            }
            proposals.insert(proposal.id, proposal.clone());
        }
        self.publish(ProposalEvent::Created {
            id: proposal.id,
            status: proposal.status,
        });
        Ok(())
    }

    fn load(&self, id: ProposalId) -> Result<Proposal, StoreError> {
        let proposals = self.proposals.read().map_err(|_| StoreError::LockPoisoned)?;
        proposals.get(&id).cloned().ok_or(StoreError::NotFound(id))
    }

    fn save(&self, proposal: &Proposal, expected_version: u64) -> Result<u64, StoreError> {
        let version = {
            let mut proposals = self.proposals.write().map_err(|_| StoreError::LockPoisoned)?;
            let stored = proposals
                .get_mut(&proposal.id)
                .ok_or(StoreError::NotFound(proposal.id))?;
            if stored.version != expected_version {
                return Err(StoreError::Conflict {
                    id: proposal.id,
                    expected: expected_version,
                    found: stored.version,
                });
            }
            let mut next = proposal.clone();
            next.version = expected_version + 1;
            *stored = next;
            stored.version
        };
        self.publish(ProposalEvent::Updated {
            id: proposal.id,
            status: proposal.status,
            version,
        });
        Ok(version)
    }

    fn subscribe(&self) -> broadcast::Receiver<ProposalEvent> {
        self.events.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insert_then_load() {
        let store = InMemoryProposalStore::new();
        let proposal = Proposal::new("MoU", "partner-1");
        store.insert(&proposal).unwrap();
        assert_eq!(store.load(proposal.id).unwrap(), proposal);
        assert_eq!(store.len().unwrap(), 1);
    }

    #[test]
    fn duplicate_insert_is_refused() {
        let store = InMemoryProposalStore::new();
        let proposal = Proposal::new("MoU", "partner-1");
        store.insert(&proposal).unwrap();
        assert!(matches!(
            store.insert(&proposal),
            Err(StoreError::AlreadyExists(_))
        ));
    }

    #[test]
    fn load_unknown_is_not_found() {
        let store = InMemoryProposalStore::new();
        assert!(matches!(
            store.load(ProposalId::new()),
            Err(StoreError::NotFound(_))
        ));
    }

    #[test]
    fn save_bumps_version() {
        let store = InMemoryProposalStore::new();
        let mut proposal = Proposal::new("MoU", "partner-1");
        store.insert(&proposal).unwrap();
        proposal.status = Status::Submitted;
        assert_eq!(store.save(&proposal, 0).unwrap(), 1);
        let stored = store.load(proposal.id).unwrap();
        assert_eq!(stored.version, 1);
        assert_eq!(stored.status, Status::Submitted);
    }

    #[test]
    fn stale_save_conflicts_and_leaves_state() {
        let store = InMemoryProposalStore::new();
        let mut proposal = Proposal::new("MoU", "partner-1");
        store.insert(&proposal).unwrap();
        proposal.status = Status::Submitted;
        store.save(&proposal, 0).unwrap();

        proposal.status = Status::Rejected;
        let err = store.save(&proposal, 0).unwrap_err();
        assert!(matches!(
            err,
            StoreError::Conflict {
                expected: 0,
                found: 1,
                ..
            }
        ));
        assert_eq!(store.load(proposal.id).unwrap().status, Status::Submitted);
    }

    #[test]
    fn subscribers_see_writes() {
        let store = InMemoryProposalStore::new();
        let mut events = store.subscribe();
        let mut proposal = Proposal::new("MoU", "partner-1");
        store.insert(&proposal).unwrap();
        proposal.status = Status::Submitted;
        store.save(&proposal, 0).unwrap();

        assert_eq!(
            events.try_recv().unwrap(),
            ProposalEvent::Created {
                id: proposal.id,
                status: Status::Draft
            }
        );
        let updated = events.try_recv().unwrap();
        assert_eq!(updated.id(), proposal.id);
        assert!(matches!(
            updated,
            ProposalEvent::Updated {
                status: Status::Submitted,
                version: 1,
                ..
            }
        ));
    }
}
