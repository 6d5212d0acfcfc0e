//! Transition executor: the only code path that mutates a stored proposal.
//!
//! A transition request is resolved through the [`AuthorizationGuard`] and the
//! [`JoinBarrier`](super::join::JoinBarrier), checked for evidence, applied to a
//! copy of the proposal, recorded in the audit trail and then saved with an
//! optimistic version check. Any failure leaves the stored proposal and its
//! audit trail as they were.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::error::{StoreError, WorkflowError};

use super::audit::{self, AuditRecord, AuditTrail, CREATE_ACTION};
use super::guard::AuthorizationGuard;
use super::join::JoinOutcome;
use super::notify::{StatusChange, StatusNotifier};
use super::proposal::{Proposal, ProposalId};
use super::registry::TransitionRegistry;
use super::revision::{JoinResetPolicy, RevisionManager};
use super::status::{Actor, Role, Status};
use super::store::ProposalStore;
use super::transition::{Evidence, TransitionDefinition, TransitionPayload, Track};

/// An action a role may take on a proposal right now.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AvailableAction {
    pub action: &'static str,
    pub label: &'static str,
    pub target: Status,
    pub requires_evidence: bool,
    pub evidence: Evidence,
}

impl From<&TransitionDefinition> for AvailableAction {
    fn from(edge: &TransitionDefinition) -> Self {
        Self {
            action: edge.action,
            label: edge.label,
            target: edge.to,
            requires_evidence: edge.evidence.is_required(),
            evidence: edge.evidence,
        }
    }
}

/// Drives proposals through the approval graph.
pub struct WorkflowEngine<S, A> {
    registry: Arc<TransitionRegistry>,
    store: S,
    audit: A,
    revisions: RevisionManager,
    notifiers: Vec<Box<dyn StatusNotifier>>,
    locks: CommitLocks,
}

impl<S: ProposalStore, A: AuditTrail> WorkflowEngine<S, A> {
    /// An engine with the default join reset policy and no notifiers.
    pub fn new(registry: Arc<TransitionRegistry>, store: S, audit: A) -> Self {
        Self {
            registry,
            store,
            audit,
            revisions: RevisionManager::default(),
            notifiers: Vec::new(),
            locks: CommitLocks::default(),
        }
    }

    /// Sets what a revision after the fork does to the join barrier.
    pub fn with_join_reset(mut self, policy: JoinResetPolicy) -> Self {
        self.revisions = RevisionManager::new(policy);
        self
    }

    /// Adds a notifier called after every committed change.
    pub fn with_notifier(mut self, notifier: impl StatusNotifier + 'static) -> Self {
        self.notifiers.push(Box::new(notifier));
        self
    }

    pub fn registry(&self) -> &TransitionRegistry {
        &self.registry
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn audit(&self) -> &A {
        &self.audit
    }

    pub fn guard(&self) -> AuthorizationGuard<'_> {
        AuthorizationGuard::new(&self.registry)
    }

    /// Creates a proposal in the initial status on behalf of an originating actor.
    pub fn create(
        &self,
        actor: &Actor,
        title: impl Into<String>,
    ) -> Result<Proposal, WorkflowError> {
        if !self.guard().can_act(Status::INITIAL, actor.role) {
            return Err(WorkflowError::Unauthorized {
                status: Status::INITIAL,
                role: actor.role,
            });
        }

        let proposal = Proposal::new(title, actor.id.clone());
        let record = AuditRecord::new(
            proposal.id,
            CREATE_ACTION,
            actor,
            None,
            proposal.status,
            proposal.created_at,
        );
        // Record first: a proposal never reaches the store without its creation record.
        self.audit.append(record)?;
        if let Err(err) = self.store.insert(&proposal) {
            tracing::error!(
                proposal_id = %proposal.id,
                error = %err,
                "Proposal insert failed after its creation record was appended"
            );
            return Err(err.into());
        }

        tracing::info!(
            proposal_id = %proposal.id,
            actor = %actor.id,
            role = %actor.role,
            "Proposal created"
        );
        self.notify(StatusChange {
            proposal_id: proposal.id,
            title: proposal.title.clone(),
            action: CREATE_ACTION.to_string(),
            actor: actor.id.clone(),
            role: actor.role,
            from: None,
            to: proposal.status,
            at: proposal.created_at,
        });
        Ok(proposal)
    }

    /// Moves proposal `id` to `target` on behalf of `actor`.
    pub fn execute(
        &self,
        id: ProposalId,
        actor: &Actor,
        target: Status,
        payload: Option<TransitionPayload>,
    ) -> Result<Proposal, WorkflowError> {
        let payload = payload.unwrap_or_default();
        let current = self.store.load(id)?;
        self.transition(current, actor, target, &payload)
            .inspect_err(|err| {
                tracing::warn!(
                    proposal_id = %id,
                    role = %actor.role,
                    to = %target,
                    error = %err,
                    "Transition refused"
                );
            })
    }

    /// Records completion of one signing track.
    ///
    /// Marking an already complete track returns the proposal unchanged and
    /// fires nothing. Otherwise the join edge matching the other track's state
    /// fires: into document exchange if the other track is done, into the
    /// track's waiting sub-state if not.
    pub fn mark_track_complete(
        &self,
        id: ProposalId,
        actor: &Actor,
        track: Track,
        payload: Option<TransitionPayload>,
    ) -> Result<Proposal, WorkflowError> {
        let current = self.store.load(id)?;
        if !self.can_sign(actor.role, track) {
            return Err(WorkflowError::Unauthorized {
                status: current.status,
                role: actor.role,
            });
        }
        if current.join.is_complete(track) {
            tracing::debug!(proposal_id = %id, %track, "Track already complete, nothing to do");
            return Ok(current);
        }
        let target = current.join.resulting_status(track, current.status);
        let payload = payload.unwrap_or_default();
        self.transition(current, actor, target, &payload)
            .inspect_err(|err| {
                tracing::warn!(
                    proposal_id = %id,
                    role = %actor.role,
                    %track,
                    error = %err,
                    "Track completion refused"
                );
            })
    }

    /// Actions `role` may fire from the proposal's current status.
    pub fn list_available_actions(
        &self,
        id: ProposalId,
        role: Role,
    ) -> Result<Vec<AvailableAction>, WorkflowError> {
        let proposal = self.store.load(id)?;
        Ok(self
            .guard()
            .permitted(proposal.status, role)
            .filter(|edge| proposal.join.admits(edge))
            .map(AvailableAction::from)
            .collect())
    }

    /// Whether `role` appears on any join edge of `track`.
    fn can_sign(&self, role: Role, track: Track) -> bool {
        self.registry
            .iter()
            .any(|edge| edge.join_track() == Some(track) && edge.allows(role))
    }

    /// The audit trail of `id`, oldest first.
    pub fn get_history(&self, id: ProposalId) -> Result<Vec<AuditRecord>, WorkflowError> {
        self.store.load(id)?;
        Ok(self.audit.history_of(id)?)
    }

    /// Live status of `id`.
    pub fn get_status(&self, id: ProposalId) -> Result<Status, WorkflowError> {
        Ok(self.store.load(id)?.status)
    }

    pub fn get_proposal(&self, id: ProposalId) -> Result<Proposal, WorkflowError> {
        Ok(self.store.load(id)?)
    }

    /// Replays the audit trail of `id` and checks it against the live status.
    pub fn verify_history(&self, id: ProposalId) -> Result<(), WorkflowError> {
        let proposal = self.store.load(id)?;
        let history = self.audit.history_of(id)?;
        audit::verify_consistency(&proposal, &history)?;
        Ok(())
    }

    fn transition(
        &self,
        current: Proposal,
        actor: &Actor,
        target: Status,
        payload: &TransitionPayload,
    ) -> Result<Proposal, WorkflowError> {
        let edge = self.guard().authorize(current.status, actor.role, target)?;
        if !current.join.admits(edge) {
            return Err(WorkflowError::InvalidTransition {
                from: current.status,
                to: target,
            });
        }
        if !edge.evidence.satisfied_by(payload) {
            return Err(WorkflowError::MissingEvidence {
                action: edge.action,
                required: edge.evidence,
            });
        }
        self.commit(current, edge, actor, payload)
    }

    fn commit(
        &self,
        current: Proposal,
        edge: &TransitionDefinition,
        actor: &Actor,
        payload: &TransitionPayload,
    ) -> Result<Proposal, WorkflowError> {
        let id = current.id;
        let lock = self.locks.acquire(id)?;
        let result = match lock.lock() {
            Ok(_commit) => self.commit_locked(current, edge, actor, payload),
            Err(_) => Err(WorkflowError::Store(StoreError::LockPoisoned)),
        };
        self.locks.release(id, lock);

        let next = result?;
        tracing::info!(
            proposal_id = %next.id,
            action = edge.action,
            from = %edge.from,
            to = %next.status,
            role = %actor.role,
            revision_count = next.revision_count,
            "Transition applied"
        );
        self.notify(StatusChange {
            proposal_id: next.id,
            title: next.title.clone(),
            action: edge.action.to_string(),
            actor: actor.id.clone(),
            role: actor.role,
            from: Some(edge.from),
            to: next.status,
            at: next.updated_at,
        });
        Ok(next)
    }

    /// Applies `edge` to `current`. Caller holds the proposal's commit lock.
    ///
    /// The version is re-checked against a fresh load before anything is
    /// written, then the audit record goes in, then the proposal. Nothing is
    /// written to the store unless the audit append succeeded.
    fn commit_locked(
        &self,
        current: Proposal,
        edge: &TransitionDefinition,
        actor: &Actor,
        payload: &TransitionPayload,
    ) -> Result<Proposal, WorkflowError> {
        let fresh = self.store.load(current.id)?;
        if fresh.version != current.version {
            return Err(WorkflowError::ConcurrentModification {
                id: current.id,
                expected: current.version,
                found: fresh.version,
            });
        }

        let at = self.next_timestamp(&current)?;
        let mut next = current.clone();
        next.status = edge.to;
        next.updated_at = at;
        self.revisions.apply(&mut next, edge, actor.role, payload);
        if let Some(track) = edge.join_track()
            && next.join.mark(track) == JoinOutcome::Merged
        {
            tracing::info!(proposal_id = %next.id, "Both signing tracks complete, merging");
        }
        if let Some(document) = payload.document_ref() {
            next.documents.push(document.to_string());
        }

        let record = AuditRecord::new(
            next.id,
            edge.action,
            actor,
            Some(current.status),
            next.status,
            at,
        )
        .with_comment(payload.comment())
        .with_document(payload.document_ref());

        self.audit.append(record)?;
        match self.store.save(&next, current.version) {
            Ok(version) => {
                next.version = version;
                Ok(next)
            }
            Err(err) => {
                // Only reachable when something writes the store behind the engine's back.
                tracing::error!(
                    proposal_id = %next.id,
                    action = edge.action,
                    error = %err,
                    "Proposal save failed after its audit record was appended"
                );
                Err(err.into())
            }
        }
    }

    /// Commit time for the next record: never earlier than anything already
    /// recorded for the proposal.
    fn next_timestamp(&self, current: &Proposal) -> Result<DateTime<Utc>, WorkflowError> {
        let now = Utc::now().max(current.updated_at);
        Ok(match self.audit.last_timestamp(current.id)? {
            Some(last) => now.max(last),
            None => now,
        })
    }

    fn notify(&self, change: StatusChange) {
        for notifier in &self.notifiers {
            if let Err(err) = notifier.notify(&change) {
                tracing::warn!(
                    proposal_id = %change.proposal_id,
                    notifier = notifier.name(),
                    error = %err,
                    "Notifier failed"
                );
            }
        }
    }
}

/// Per-proposal commit locks. Appending the audit record and saving the
/// proposal happen under the proposal's lock, so records land in commit order.
///
/// An entry lives only while some commit holds or waits for it.
#[derive(Debug, Default)]
struct CommitLocks {
    locks: Mutex<HashMap<ProposalId, Arc<Mutex<()>>>>,
}

impl CommitLocks {
    fn acquire(&self, id: ProposalId) -> Result<Arc<Mutex<()>>, WorkflowError> {
        let mut locks = self
            .locks
            .lock()
            .map_err(|_| WorkflowError::Store(StoreError::LockPoisoned))?;
        Ok(locks.entry(id).or_default().clone())
    }

    /// Drops `lock` and removes the entry once no other commit references it.
    fn release(&self, id: ProposalId, lock: Arc<Mutex<()>>) {
        drop(lock);
        let Ok(mut locks) = self.locks.lock() else {
            return;
        };
        if locks.get(&id).is_some_and(|entry| Arc::strong_count(entry) == 1) {
            locks.remove(&id);
        }
    }

    #[cfg(test)]
    fn len(&self) -> usize {
        self.locks.lock().map_or(0, |locks| locks.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{AuditError, StoreError};
    use crate::workflow::audit::InMemoryAuditTrail;
    use crate::workflow::notify::{NotifyError, RecordingNotifier};
    use crate::workflow::revision::RevisionSource;
    use crate::workflow::store::{InMemoryProposalStore, ProposalEvent};
    use std::sync::atomic::{AtomicBool, Ordering};
    use tokio::sync::broadcast;

    type Engine = WorkflowEngine<Arc<InMemoryProposalStore>, Arc<InMemoryAuditTrail>>;

    fn engine() -> Engine {
        WorkflowEngine::new(
            Arc::new(TransitionRegistry::standard().unwrap()),
            Arc::new(InMemoryProposalStore::new()),
            Arc::new(InMemoryAuditTrail::new()),
        )
    }

    fn actor(role: Role) -> Actor {
        Actor::new(format!("{role}-1"), role)
    }

    fn doc(name: &str) -> Option<TransitionPayload> {
        Some(TransitionPayload::new().with_document(format!("store://{name}")))
    }

    fn reason(text: &str) -> Option<TransitionPayload> {
        Some(TransitionPayload::new().with_comment(text))
    }

    /// Walks a fresh proposal to `under_substantive_review`.
    fn to_substantive_review(engine: &Engine) -> ProposalId {
        let p = engine.create(&actor(Role::Partner), "Joint research").unwrap();
        let office = actor(Role::Office);
        engine
            .execute(p.id, &actor(Role::Partner), Status::Submitted, doc("proposal.pdf"))
            .unwrap();
        engine.execute(p.id, &office, Status::Received, None).unwrap();
        engine.execute(p.id, &office, Status::UnderSubstantiveReview, None).unwrap();
        p.id
    }

    #[test]
    fn create_records_initial_status() {
        let engine = engine();
        let proposal = engine.create(&actor(Role::Partner), "MoU").unwrap();
        assert_eq!(proposal.status, Status::Draft);
        let history = engine.get_history(proposal.id).unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].action, CREATE_ACTION);
        assert_eq!(history[0].from_status, None);
        engine.verify_history(proposal.id).unwrap();
    }

    #[test]
    fn create_requires_originating_role() {
        let engine = engine();
        let err = engine.create(&actor(Role::President), "MoU").unwrap_err();
        assert!(matches!(err, WorkflowError::Unauthorized { status: Status::Draft, .. }));
    }

    #[test]
    fn execute_appends_exactly_one_record() {
        let engine = engine();
        let p = engine.create(&actor(Role::Partner), "MoU").unwrap();
        let updated = engine
            .execute(p.id, &actor(Role::Partner), Status::Submitted, doc("proposal.pdf"))
            .unwrap();
        assert_eq!(updated.status, Status::Submitted);
        assert_eq!(updated.version, 1);
        assert_eq!(updated.documents, vec!["store://proposal.pdf".to_string()]);

        let history = engine.get_history(p.id).unwrap();
        assert_eq!(history.len(), 2);
        let last = history.last().unwrap();
        assert_eq!(last.action, "submit");
        assert_eq!(last.from_status, Some(Status::Draft));
        assert_eq!(last.to_status, updated.status);
        assert!(last.timestamp >= history[0].timestamp);
        assert_eq!(last.document_ref.as_deref(), Some("store://proposal.pdf"));
    }

    #[test]
    fn missing_evidence_leaves_everything_untouched() {
        let engine = engine();
        let p = engine.create(&actor(Role::Partner), "MoU").unwrap();
        let err = engine
            .execute(p.id, &actor(Role::Partner), Status::Submitted, None)
            .unwrap_err();
        assert!(matches!(
            err,
            WorkflowError::MissingEvidence {
                action: "submit",
                required: Evidence::Document
            }
        ));
        assert_eq!(engine.get_proposal(p.id).unwrap(), p);
        assert_eq!(engine.get_history(p.id).unwrap().len(), 1);
    }

    #[test]
    fn unknown_proposal_is_not_found() {
        let engine = engine();
        let id = ProposalId::new();
        assert!(matches!(engine.get_status(id), Err(WorkflowError::NotFound(_))));
        assert!(matches!(engine.get_history(id), Err(WorkflowError::NotFound(_))));
        assert!(matches!(
            engine.execute(id, &actor(Role::Office), Status::Received, None),
            Err(WorkflowError::NotFound(_))
        ));
    }

    #[test]
    fn reject_and_delegate_increments_revision() {
        let engine = engine();
        let id = to_substantive_review(&engine);
        let office = actor(Role::Office);
        engine
            .execute(
                id,
                &actor(Role::ReviewingUnit),
                Status::FeedbackEvaluation,
                reason("Scope too broad"),
            )
            .unwrap();
        let p = engine
            .execute(id, &office, Status::AwaitingPartnerRevision, reason("Narrow the scope"))
            .unwrap();
        assert_eq!(p.revision_count, 1);
        assert_eq!(p.revision_source, RevisionSource::ExternalPartner);
        assert_eq!(p.last_feedback.as_deref(), Some("Narrow the scope"));
        assert_eq!(p.feedback_from, Some(Role::ReviewingUnit));
    }

    #[test]
    fn gateway_reject_without_reason_is_refused() {
        let engine = engine();
        let id = to_substantive_review(&engine);
        let err = engine
            .execute(id, &actor(Role::ReviewingUnit), Status::FeedbackEvaluation, reason("  "))
            .unwrap_err();
        assert!(matches!(err, WorkflowError::MissingEvidence { required: Evidence::Reason, .. }));
        assert_eq!(engine.get_status(id).unwrap(), Status::UnderSubstantiveReview);
    }

    #[test]
    fn available_actions_follow_role() {
        let engine = engine();
        let id = to_substantive_review(&engine);
        let actions = engine.list_available_actions(id, Role::ReviewingUnit).unwrap();
        let targets: Vec<Status> = actions.iter().map(|a| a.target).collect();
        assert_eq!(targets, vec![Status::SubstantiveApproved, Status::FeedbackEvaluation]);
        assert!(actions[1].requires_evidence);
        assert!(engine.list_available_actions(id, Role::Partner).unwrap().is_empty());
    }

    #[test]
    fn subscribers_and_notifiers_see_transitions() {
        let notifier = RecordingNotifier::new();
        let engine = engine().with_notifier(notifier.clone());
        let mut events: broadcast::Receiver<ProposalEvent> = engine.store().subscribe();
        let p = engine.create(&actor(Role::Office), "Internship programme").unwrap();
        engine
            .execute(p.id, &actor(Role::Office), Status::Submitted, doc("p.pdf"))
            .unwrap();

        assert!(matches!(events.try_recv().unwrap(), ProposalEvent::Created { .. }));
        assert!(matches!(events.try_recv().unwrap(), ProposalEvent::Updated { version: 1, .. }));
        let changes = notifier.changes();
        assert_eq!(changes.len(), 2);
        assert_eq!(changes[1].from, Some(Status::Draft));
        assert_eq!(changes[1].to, Status::Submitted);
    }

    struct FailingNotifier;

    impl StatusNotifier for FailingNotifier {
        fn name(&self) -> &'static str {
            "failing"
        }

        fn notify(&self, _change: &StatusChange) -> Result<(), NotifyError> {
            Err(NotifyError {
                notifier: "failing",
                message: "mail server down".into(),
            })
        }
    }

    #[test]
    fn notifier_failure_does_not_fail_transition() {
        let engine = engine().with_notifier(FailingNotifier);
        let p = engine.create(&actor(Role::Partner), "MoU").unwrap();
        let updated = engine
            .execute(p.id, &actor(Role::Partner), Status::Submitted, doc("p.pdf"))
            .unwrap();
        assert_eq!(updated.status, Status::Submitted);
    }

    /// Store that lets another writer slip in between load and save.
    struct RacingStore {
        inner: InMemoryProposalStore,
        raced: AtomicBool,
    }

    impl ProposalStore for RacingStore {
        fn insert(&self, proposal: &Proposal) -> Result<(), StoreError> {
            self.inner.insert(proposal)
        }

        fn load(&self, id: ProposalId) -> Result<Proposal, StoreError> {
            let loaded = self.inner.load(id)?;
            if !self.raced.swap(true, Ordering::SeqCst) {
                let mut other = loaded.clone();
                other.status = Status::Received;
                self.inner.save(&other, loaded.version)?;
            }
            Ok(loaded)
        }

        fn save(&self, proposal: &Proposal, expected_version: u64) -> Result<u64, StoreError> {
            self.inner.save(proposal, expected_version)
        }

        fn subscribe(&self) -> broadcast::Receiver<ProposalEvent> {
            self.inner.subscribe()
        }
    }

    #[test]
    fn stale_load_fails_with_concurrent_modification() {
        let store = RacingStore {
            inner: InMemoryProposalStore::new(),
            raced: AtomicBool::new(true),
        };
        let engine = WorkflowEngine::new(
            Arc::new(TransitionRegistry::standard().unwrap()),
            store,
            InMemoryAuditTrail::new(),
        );
        let p = engine.create(&actor(Role::Partner), "MoU").unwrap();
        engine
            .execute(p.id, &actor(Role::Partner), Status::Submitted, doc("p.pdf"))
            .unwrap();
        engine.store().raced.store(false, Ordering::SeqCst);

        let err = engine
            .execute(p.id, &actor(Role::Office), Status::Rejected, reason("out of scope"))
            .unwrap_err();
        assert!(matches!(err, WorkflowError::ConcurrentModification { expected: 1, found: 2, .. }));
        assert_eq!(engine.audit().history_of(p.id).unwrap().len(), 2);
    }

    #[test]
    fn racing_transitions_from_same_status_admit_one() {
        let engine = engine();
        let id = to_substantive_review(&engine);
        let unit = actor(Role::ReviewingUnit);

        let results: Vec<Result<Proposal, WorkflowError>> = std::thread::scope(|scope| {
            let approve =
                scope.spawn(|| engine.execute(id, &unit, Status::SubstantiveApproved, None));
            let reject = scope.spawn(|| {
                engine.execute(id, &unit, Status::FeedbackEvaluation, reason("Not aligned"))
            });
            vec![approve.join().unwrap(), reject.join().unwrap()]
        });

        let successes = results.iter().filter(|r| r.is_ok()).count();
        assert_eq!(successes, 1);
        for err in results.iter().filter_map(|r| r.as_ref().err()) {
            assert!(matches!(
                err,
                WorkflowError::ConcurrentModification { .. }
                    | WorkflowError::InvalidTransition { .. }
            ));
        }
        assert_eq!(engine.get_history(id).unwrap().len(), 5);
        engine.verify_history(id).unwrap();
    }

    /// Audit trail whose appends always fail.
    struct BrokenTrail;

    impl AuditTrail for BrokenTrail {
        fn append(&self, _record: AuditRecord) -> Result<(), AuditError> {
            Err(AuditError::LockPoisoned)
        }

        fn history_of(&self, _id: ProposalId) -> Result<Vec<AuditRecord>, AuditError> {
            Ok(Vec::new())
        }
    }

    #[test]
    fn audit_failure_leaves_stored_proposal_untouched() {
        let store = Arc::new(InMemoryProposalStore::new());
        let engine = WorkflowEngine::new(
            Arc::new(TransitionRegistry::standard().unwrap()),
            store.clone(),
            BrokenTrail,
        );
        let proposal = Proposal::new("MoU", "partner-1");
        store.insert(&proposal).unwrap();
        let mut events = store.subscribe();

        let err = engine
            .execute(proposal.id, &actor(Role::Partner), Status::Submitted, doc("p.pdf"))
            .unwrap_err();
        assert!(matches!(err, WorkflowError::Audit(AuditError::LockPoisoned)));
        assert_eq!(store.load(proposal.id).unwrap(), proposal);
        assert_eq!(store.load(proposal.id).unwrap().version, 0);
        assert!(matches!(
            events.try_recv(),
            Err(broadcast::error::TryRecvError::Empty)
        ));
    }

    #[test]
    fn audit_failure_on_create_stores_nothing() {
        let store = Arc::new(InMemoryProposalStore::new());
        let engine = WorkflowEngine::new(
            Arc::new(TransitionRegistry::standard().unwrap()),
            store.clone(),
            BrokenTrail,
        );
        let mut events = store.subscribe();

        let err = engine.create(&actor(Role::Partner), "MoU").unwrap_err();
        assert!(matches!(err, WorkflowError::Audit(AuditError::LockPoisoned)));
        assert_eq!(store.len().unwrap(), 0);
        assert!(events.try_recv().is_err());
    }

    #[test]
    fn commit_locks_are_released_after_commit() {
        let engine = engine();
        let id = to_substantive_review(&engine);
        assert_eq!(engine.locks.len(), 0);

        engine
            .execute(id, &actor(Role::ReviewingUnit), Status::SubstantiveApproved, None)
            .unwrap();
        assert_eq!(engine.locks.len(), 0);
    }

    #[test]
    fn marking_a_track_requires_a_signing_role() {
        let engine = engine();
        let id = to_substantive_review(&engine);
        let err = engine
            .mark_track_complete(id, &actor(Role::Deputy), Track::Partner, doc("sig.pdf"))
            .unwrap_err();
        assert!(matches!(
            err,
            WorkflowError::Unauthorized {
                status: Status::UnderSubstantiveReview,
                role: Role::Deputy
            }
        ));
    }

    #[test]
    fn remarking_a_complete_track_checks_role_first() {
        let engine = engine();
        let p = engine.create(&actor(Role::Partner), "MoU").unwrap();
        let mut signed = engine.get_proposal(p.id).unwrap();
        signed.join.mark(Track::Partner);
        engine.store().save(&signed, signed.version).unwrap();

        let unchanged = engine
            .mark_track_complete(p.id, &actor(Role::Partner), Track::Partner, None)
            .unwrap();
        assert!(unchanged.join.partner_complete());

        let err = engine
            .mark_track_complete(p.id, &actor(Role::Deputy), Track::Partner, None)
            .unwrap_err();
        assert!(matches!(err, WorkflowError::Unauthorized { role: Role::Deputy, .. }));
        assert_eq!(engine.get_history(p.id).unwrap().len(), 1);
    }
}
