use serde::{Deserialize, Serialize};

use super::proposal::Proposal;
use super::status::Role;
use super::transition::{Correction, EdgeKind, TransitionDefinition, TransitionPayload};

/// Who performed the most recent correction.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RevisionSource {
    /// No revision has happened yet.
    #[default]
    None,
    /// The partner was asked to correct and resubmit.
    ExternalPartner,
    /// The cooperation office corrected the proposal itself.
    InternalOffice,
}

impl From<Correction> for RevisionSource {
    fn from(correction: Correction) -> Self {
        match correction {
            Correction::DelegateToPartner => RevisionSource::ExternalPartner,
            Correction::Internal => RevisionSource::InternalOffice,
        }
    }
}

/// What a transition means for the revision loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RevisionDecision {
    /// Not part of the loop.
    Unaffected,
    /// A gateway rejected the proposal; its reason becomes the latest feedback.
    Feedback,
    /// The office picked who corrects the proposal.
    Revise(RevisionSource),
}

/// Whether a revision loop taken after the fork clears the join barrier.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JoinResetPolicy {
    /// Redrafting invalidates signatures collected so far; both tracks start over.
    #[default]
    ResetOnRevision,
    /// Keep whatever track completions were recorded before the loop.
    Preserve,
}

/// Applies revision-loop side effects to a proposal.
#[derive(Debug, Clone, Copy, Default)]
pub struct RevisionManager {
    join_reset: JoinResetPolicy,
}

impl RevisionManager {
    /// A manager applying `join_reset` when a revision follows the fork.
    pub fn new(join_reset: JoinResetPolicy) -> Self {
        Self { join_reset }
    }

    /// The configured join reset policy.
    pub fn join_reset(&self) -> JoinResetPolicy {
        self.join_reset
    }

    /// Reads the decision off the edge kind: gateway rejects are feedback,
    /// revision edges revise, everything else is unaffected.
    pub fn classify(transition: &TransitionDefinition) -> RevisionDecision {
        match transition.kind {
            EdgeKind::GatewayReject => RevisionDecision::Feedback,
            EdgeKind::Revision(correction) => RevisionDecision::Revise(correction.into()),
            EdgeKind::Advance | EdgeKind::GatewayApprove | EdgeKind::Join(_) => {
                RevisionDecision::Unaffected
            }
        }
    }

    /// Updates counters, source, feedback and (per policy) the join barrier.
    /// Returns the decision that was applied.
    pub fn apply(
        &self,
        proposal: &mut Proposal,
        transition: &TransitionDefinition,
        role: Role,
        payload: &TransitionPayload,
    ) -> RevisionDecision {
        let decision = Self::classify(transition);
        match decision {
            RevisionDecision::Unaffected => {}
            RevisionDecision::Feedback => {
                if let Some(reason) = payload.comment() {
                    proposal.last_feedback = Some(reason.to_string());
                    proposal.feedback_from = Some(role);
                }
            }
            RevisionDecision::Revise(source) => {
                proposal.revision_count += 1;
                proposal.revision_source = source;
                if let Some(reason) = payload.comment() {
                    proposal.last_feedback = Some(reason.to_string());
                }
                if self.join_reset == JoinResetPolicy::ResetOnRevision
                    && proposal.join.any_complete()
                {
                    tracing::info!(
                        proposal_id = %proposal.id,
                        partner = proposal.join.partner_complete(),
                        leadership = proposal.join.leadership_complete(),
                        "Revision after fork, clearing join barrier"
                    );
                    proposal.join.reset();
                }
            }
        }
        decision
    }
}
