//! Transition registry: the immutable directed graph of legal status changes.
//!
//! The registry is built once at startup from [`standard_edges`], validated,
//! and then shared read-only (typically behind an `Arc`) by every engine.

use std::collections::{BTreeMap, BTreeSet, VecDeque};

use crate::error::RegistryError;

use super::status::{Role, Status};
use super::transition::{Correction, EdgeKind, Evidence, TransitionDefinition, Track};

const PARTNER: &[Role] = &[Role::Partner];
const OFFICE: &[Role] = &[Role::Office];
const ORIGINATORS: &[Role] = &[Role::Partner, Role::Office];
const REVIEWING_UNIT: &[Role] = &[Role::ReviewingUnit];
const LEGAL_OFFICER: &[Role] = &[Role::LegalOfficer];
const LEGAL_BUREAU: &[Role] = &[Role::LegalBureau];
const DEPUTY: &[Role] = &[Role::Deputy];
const PRESIDENT: &[Role] = &[Role::President];

const fn edge(
    action: &'static str,
    label: &'static str,
    from: Status,
    to: Status,
    roles: &'static [Role],
    kind: EdgeKind,
    evidence: Evidence,
) -> TransitionDefinition {
    TransitionDefinition {
        action,
        label,
        from,
        to,
        roles,
        kind,
        evidence,
    }
}

const fn countersign(at: Status) -> TransitionDefinition {
    edge(
        "partner_countersign",
        "Countersign agreement",
        at,
        at,
        PARTNER,
        EdgeKind::Join(Track::Partner),
        Evidence::Document,
    )
}

use EdgeKind::{Advance, GatewayApprove, GatewayReject};
use Status::*;

/// The cooperation-agreement approval process, phase by phase.
#[rustfmt::skip]
pub fn standard_edges() -> Vec<TransitionDefinition> {
    vec![
        // Submission
        edge("submit", "Submit proposal", Draft, Submitted, ORIGINATORS, Advance, Evidence::Document),
        edge("receive", "Receive proposal", Submitted, Received, OFFICE, GatewayApprove, Evidence::None),
        edge("reject_intake", "Reject at intake", Submitted, Rejected, OFFICE, GatewayReject, Evidence::Reason),
        // Intake and summarization
        edge("request_summary", "Request summary", Received, SummaryPending, OFFICE, Advance, Evidence::None),
        edge("attach_summary", "Attach summary", SummaryPending, SummaryReady, OFFICE, Advance, Evidence::None),
        edge("forward_to_unit", "Forward to reviewing unit", Received, UnderSubstantiveReview, OFFICE, Advance, Evidence::None),
        edge("forward_to_unit", "Forward to reviewing unit", SummaryReady, UnderSubstantiveReview, OFFICE, Advance, Evidence::None),
        // Substantive review
        edge("approve_substance", "Approve substance", UnderSubstantiveReview, SubstantiveApproved, REVIEWING_UNIT, GatewayApprove, Evidence::None),
        edge("reject_substance", "Reject substance", UnderSubstantiveReview, FeedbackEvaluation, REVIEWING_UNIT, GatewayReject, Evidence::Reason),
        edge("start_drafting", "Start drafting agreement", SubstantiveApproved, DocumentDrafting, OFFICE, Advance, Evidence::None),
        // Revision hub
        edge("delegate_to_partner", "Delegate correction to partner", FeedbackEvaluation, AwaitingPartnerRevision, OFFICE, EdgeKind::Revision(Correction::DelegateToPartner), Evidence::Reason),
        edge("revise_internally", "Correct internally", FeedbackEvaluation, InternalRevision, OFFICE, EdgeKind::Revision(Correction::Internal), Evidence::Reason),
        edge("reject_proposal", "Reject proposal", FeedbackEvaluation, Rejected, OFFICE, GatewayReject, Evidence::Reason),
        edge("resubmit", "Resubmit corrected proposal", AwaitingPartnerRevision, UnderSubstantiveReview, PARTNER, Advance, Evidence::Document),
        edge("complete_revision", "Complete internal correction", InternalRevision, UnderSubstantiveReview, OFFICE, Advance, Evidence::Document),
        // Drafting
        edge("share_draft", "Share draft with partner", DocumentDrafting, PartnerDraftReview, OFFICE, Advance, Evidence::Document),
        edge("accept_draft", "Accept draft", PartnerDraftReview, InternalLegalReview, PARTNER, GatewayApprove, Evidence::None),
        edge("request_changes", "Request changes", PartnerDraftReview, FeedbackEvaluation, PARTNER, GatewayReject, Evidence::Reason),
        // Two-tier legal review
        edge("approve_legal", "Approve legal review", InternalLegalReview, InternalLegalApproved, LEGAL_OFFICER, GatewayApprove, Evidence::None),
        edge("reject_legal", "Reject legal review", InternalLegalReview, FeedbackEvaluation, LEGAL_OFFICER, GatewayReject, Evidence::Reason),
        edge("forward_to_bureau", "Forward to legal bureau", InternalLegalApproved, LegalBureauReview, OFFICE, Advance, Evidence::None),
        edge("approve_bureau", "Approve bureau review", LegalBureauReview, LegalBureauApproved, LEGAL_BUREAU, GatewayApprove, Evidence::None),
        edge("reject_bureau", "Reject bureau review", LegalBureauReview, FeedbackEvaluation, LEGAL_BUREAU, GatewayReject, Evidence::Reason),
        edge("start_paraf", "Start paraf chain", LegalBureauApproved, AwaitingUnitParaf, OFFICE, Advance, Evidence::Document),
        // Paraf chain
        edge("paraf_unit", "Paraf (reviewing unit)", AwaitingUnitParaf, AwaitingOfficeParaf, REVIEWING_UNIT, Advance, Evidence::None),
        edge("paraf_office", "Paraf (cooperation office)", AwaitingOfficeParaf, AwaitingBureauParaf, OFFICE, Advance, Evidence::None),
        edge("paraf_bureau", "Paraf (legal bureau)", AwaitingBureauParaf, FinalApprovalReview, LEGAL_BUREAU, Advance, Evidence::None),
        // Final approval opens the fork
        edge("final_approve", "Give final approval", FinalApprovalReview, DeputyReview, OFFICE, GatewayApprove, Evidence::None),
        edge("final_reject", "Refuse final approval", FinalApprovalReview, FeedbackEvaluation, OFFICE, GatewayReject, Evidence::Reason),
        // Leadership track
        edge("deputy_approve", "Approve (deputy)", DeputyReview, DeputyStamping, DEPUTY, GatewayApprove, Evidence::None),
        edge("deputy_reject", "Reject (deputy)", DeputyReview, FeedbackEvaluation, DEPUTY, GatewayReject, Evidence::Reason),
        edge("stamp_for_deputy", "Affix stamp for deputy", DeputyStamping, DeputySigning, OFFICE, Advance, Evidence::Document),
        edge("deputy_sign", "Sign (deputy)", DeputySigning, PresidentReview, DEPUTY, Advance, Evidence::Document),
        edge("president_approve", "Approve (president)", PresidentReview, PresidentStamping, PRESIDENT, GatewayApprove, Evidence::None),
        edge("president_reject", "Reject (president)", PresidentReview, FeedbackEvaluation, PRESIDENT, GatewayReject, Evidence::Reason),
        edge("stamp_for_president", "Affix stamp for president", PresidentStamping, PresidentSigning, OFFICE, Advance, Evidence::Document),
        edge("president_sign", "Sign (president)", PresidentSigning, AwaitingPartnerSignature, PRESIDENT, EdgeKind::Join(Track::Leadership), Evidence::Document),
        edge("president_sign", "Sign (president)", PresidentSigning, DocumentExchange, PRESIDENT, EdgeKind::Join(Track::Leadership), Evidence::Document),
        // Partner track
        countersign(DeputyReview),
        countersign(DeputyStamping),
        countersign(DeputySigning),
        countersign(PresidentReview),
        countersign(PresidentStamping),
        countersign(PresidentSigning),
        edge("partner_countersign", "Countersign agreement", AwaitingPartnerSignature, DocumentExchange, PARTNER, EdgeKind::Join(Track::Partner), Evidence::Document),
        // Exchange and archival
        edge("confirm_exchange", "Confirm document exchange", DocumentExchange, Archived, OFFICE, Advance, Evidence::Document),
        edge("complete", "Complete", Archived, Completed, OFFICE, Advance, Evidence::None),
    ]
}

/// Validated, read-only adjacency list of [`TransitionDefinition`]s.
#[derive(Debug, Clone)]
pub struct TransitionRegistry {
    edges: BTreeMap<Status, Vec<TransitionDefinition>>,
    len: usize,
}

impl TransitionRegistry {
    /// Builds the registry for the standard approval process.
    pub fn standard() -> Result<Self, RegistryError> {
        Self::build(standard_edges())
    }

    /// Validates `edges` and indexes them by source status.
    pub fn build(edges: Vec<TransitionDefinition>) -> Result<Self, RegistryError> {
        let len = edges.len();
        let mut by_source: BTreeMap<Status, Vec<TransitionDefinition>> = BTreeMap::new();
        for edge in edges {
            validate_edge(&edge)?;
            by_source.entry(edge.from).or_default().push(edge);
        }

        for status in Status::ALL {
            let outgoing = by_source.get(&status).map_or(0, Vec::len);
            if status.is_terminal() && outgoing > 0 {
                return Err(RegistryError::TerminalHasEdges(status));
            }
            if !status.is_terminal() && outgoing == 0 {
                return Err(RegistryError::DeadEnd(status));
            }
        }

        for outgoing in by_source.values() {
            check_ambiguity(outgoing)?;
        }

        let reachable = reachable_from(Status::INITIAL, &by_source);
        if let Some(status) = Status::ALL.into_iter().find(|s| !reachable.contains(s)) {
            return Err(RegistryError::Unreachable(status));
        }

        Ok(Self {
            edges: by_source,
            len,
        })
    }

    /// All edges leaving `status`; empty for terminal statuses.
    pub fn edges_from(&self, status: Status) -> &[TransitionDefinition] {
        self.edges.get(&status).map_or(&[], Vec::as_slice)
    }

    /// Every edge, grouped by source status in enumeration order.
    pub fn iter(&self) -> impl Iterator<Item = &TransitionDefinition> {
        self.edges.values().flatten()
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Number of gateway statuses: statuses with both an approve and a reject edge.
    pub fn gateway_count(&self) -> usize {
        self.edges
            .values()
            .filter(|out| {
                out.iter().any(|e| e.kind == EdgeKind::GatewayApprove)
                    && out.iter().any(|e| e.kind == EdgeKind::GatewayReject)
            })
            .count()
    }
}

fn validate_edge(edge: &TransitionDefinition) -> Result<(), RegistryError> {
    let misclassified = |reason| RegistryError::Misclassified {
        action: edge.action,
        from: edge.from,
        reason,
    };

    if edge.roles.is_empty() {
        return Err(RegistryError::NoRoles(edge.action));
    }
    match edge.kind {
        EdgeKind::GatewayReject => {
            if edge.to != Status::FEEDBACK_HUB && edge.to != Status::Rejected {
                return Err(misclassified(
                    "gateway reject must target the feedback hub or rejected",
                ));
            }
        }
        EdgeKind::Revision(_) => {
            if edge.from != Status::FEEDBACK_HUB {
                return Err(misclassified("revision edges must leave the feedback hub"));
            }
        }
        EdgeKind::Join(_) => {
            if edge.from.phase() != super::status::Phase::Signing {
                return Err(misclassified("join edges must leave a signing status"));
            }
        }
        EdgeKind::Advance | EdgeKind::GatewayApprove => {}
    }
    if edge.is_self_loop() && edge.kind != EdgeKind::Join(Track::Partner) {
        return Err(misclassified("only partner countersigning may keep the status"));
    }
    Ok(())
}

fn check_ambiguity(outgoing: &[TransitionDefinition]) -> Result<(), RegistryError> {
    for (i, a) in outgoing.iter().enumerate() {
        for b in &outgoing[i + 1..] {
            if a.to != b.to {
                continue;
            }
            if let Some(role) = a.roles.iter().find(|r| b.roles.contains(r)) {
                return Err(RegistryError::Ambiguous {
                    from: a.from,
                    to: a.to,
                    role: *role,
                });
            }
        }
    }
    Ok(())
}

fn reachable_from(
    start: Status,
    edges: &BTreeMap<Status, Vec<TransitionDefinition>>,
) -> BTreeSet<Status> {
    let mut seen = BTreeSet::from([start]);
    let mut queue = VecDeque::from([start]);
    while let Some(status) = queue.pop_front() {
        for edge in edges.get(&status).into_iter().flatten() {
            if seen.insert(edge.to) {
                queue.push_back(edge.to);
            }
        }
    }
    seen
}
