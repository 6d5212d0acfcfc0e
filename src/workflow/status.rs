use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Ordered phases a proposal moves through. Each [`Status`] belongs to exactly one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Submission,
    Intake,
    SubstantiveReview,
    Revision,
    Drafting,
    LegalReview,
    Paraf,
    FinalApproval,
    Signing,
    Exchange,
    Archival,
    Closed,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Phase::Submission => "submission",
            Phase::Intake => "intake",
            Phase::SubstantiveReview => "substantive review",
            Phase::Revision => "revision",
            Phase::Drafting => "drafting",
            Phase::LegalReview => "legal review",
            Phase::Paraf => "paraf",
            Phase::FinalApproval => "final approval",
            Phase::Signing => "signing",
            Phase::Exchange => "document exchange",
            Phase::Archival => "archival",
            Phase::Closed => "closed",
        };
        f.write_str(name)
    }
}

/// Every status a proposal can hold.
///
/// The set is closed: anything read from the wire that is not listed here
/// fails to parse instead of producing an unknown state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Status {
    Draft,
    Submitted,
    Received,
    SummaryPending,
    SummaryReady,
    UnderSubstantiveReview,
    SubstantiveApproved,
    FeedbackEvaluation,
    DocumentDrafting,
    PartnerDraftReview,
    AwaitingPartnerRevision,
    InternalRevision,
    InternalLegalReview,
    InternalLegalApproved,
    LegalBureauReview,
    LegalBureauApproved,
    AwaitingUnitParaf,
    AwaitingOfficeParaf,
    AwaitingBureauParaf,
    FinalApprovalReview,
    DeputyReview,
    DeputyStamping,
    DeputySigning,
    PresidentReview,
    PresidentStamping,
    PresidentSigning,
    AwaitingPartnerSignature,
    DocumentExchange,
    Archived,
    Completed,
    Rejected,
}

impl Status {
    pub const ALL: [Status; 31] = [
        Status::Draft,
        Status::Submitted,
        Status::Received,
        Status::SummaryPending,
        Status::SummaryReady,
        Status::UnderSubstantiveReview,
        Status::SubstantiveApproved,
        Status::FeedbackEvaluation,
        Status::DocumentDrafting,
        Status::PartnerDraftReview,
        Status::AwaitingPartnerRevision,
        Status::InternalRevision,
        Status::InternalLegalReview,
        Status::InternalLegalApproved,
        Status::LegalBureauReview,
        Status::LegalBureauApproved,
        Status::AwaitingUnitParaf,
        Status::AwaitingOfficeParaf,
        Status::AwaitingBureauParaf,
        Status::FinalApprovalReview,
        Status::DeputyReview,
        Status::DeputyStamping,
        Status::DeputySigning,
        Status::PresidentReview,
        Status::PresidentStamping,
        Status::PresidentSigning,
        Status::AwaitingPartnerSignature,
        Status::DocumentExchange,
        Status::Archived,
        Status::Completed,
        Status::Rejected,
    ];

    /// Status every new proposal starts in.
    pub const INITIAL: Status = Status::Draft;

    /// Status the parallel signing tracks merge into.
    pub const MERGE: Status = Status::DocumentExchange;

    /// Shared hub every gateway reject routes to.
    pub const FEEDBACK_HUB: Status = Status::FeedbackEvaluation;

    pub fn as_str(self) -> &'static str {
        match self {
            Status::Draft => "draft",
            Status::Submitted => "submitted",
            Status::Received => "received",
            Status::SummaryPending => "summary_pending",
            Status::SummaryReady => "summary_ready",
            Status::UnderSubstantiveReview => "under_substantive_review",
            Status::SubstantiveApproved => "substantive_approved",
            Status::FeedbackEvaluation => "feedback_evaluation",
            Status::DocumentDrafting => "document_drafting",
            Status::PartnerDraftReview => "partner_draft_review",
            Status::AwaitingPartnerRevision => "awaiting_partner_revision",
            Status::InternalRevision => "internal_revision",
            Status::InternalLegalReview => "internal_legal_review",
            Status::InternalLegalApproved => "internal_legal_approved",
            Status::LegalBureauReview => "legal_bureau_review",
            Status::LegalBureauApproved => "legal_bureau_approved",
            Status::AwaitingUnitParaf => "awaiting_unit_paraf",
            Status::AwaitingOfficeParaf => "awaiting_office_paraf",
            Status::AwaitingBureauParaf => "awaiting_bureau_paraf",
            Status::FinalApprovalReview => "final_approval_review",
            Status::DeputyReview => "deputy_review",
            Status::DeputyStamping => "deputy_stamping",
            Status::DeputySigning => "deputy_signing",
            Status::PresidentReview => "president_review",
            Status::PresidentStamping => "president_stamping",
            Status::PresidentSigning => "president_signing",
            Status::AwaitingPartnerSignature => "awaiting_partner_signature",
            Status::DocumentExchange => "document_exchange",
            Status::Archived => "archived",
            Status::Completed => "completed",
            Status::Rejected => "rejected",
        }
    }

    pub fn phase(self) -> Phase {
        match self {
            Status::Draft | Status::Submitted => Phase::Submission,
            Status::Received | Status::SummaryPending | Status::SummaryReady => Phase::Intake,
            Status::UnderSubstantiveReview | Status::SubstantiveApproved => {
                Phase::SubstantiveReview
            }
            Status::FeedbackEvaluation => Phase::Revision,
            Status::DocumentDrafting
            | Status::PartnerDraftReview
            | Status::AwaitingPartnerRevision
            | Status::InternalRevision => Phase::Drafting,
            Status::InternalLegalReview
            | Status::InternalLegalApproved
            | Status::LegalBureauReview
            | Status::LegalBureauApproved => Phase::LegalReview,
            Status::AwaitingUnitParaf
            | Status::AwaitingOfficeParaf
            | Status::AwaitingBureauParaf => {
                Phase::Paraf
            }
            Status::FinalApprovalReview => Phase::FinalApproval,
            Status::DeputyReview
            | Status::DeputyStamping
            | Status::DeputySigning
            | Status::PresidentReview
            | Status::PresidentStamping
            | Status::PresidentSigning
            | Status::AwaitingPartnerSignature => Phase::Signing,
            Status::DocumentExchange => Phase::Exchange,
            Status::Archived => Phase::Archival,
            Status::Completed | Status::Rejected => Phase::Closed,
        }
    }

    /// Terminal statuses have no outgoing transitions.
    pub fn is_terminal(self) -> bool {
        matches!(self, Status::Completed | Status::Rejected)
    }

    /// Statuses of the leadership signing chain. While the proposal sits in one
    /// of these after the partner countersigned, it is waiting on leadership.
    pub fn is_leadership_track(self) -> bool {
        matches!(
            self,
            Status::DeputyReview
                | Status::DeputyStamping
                | Status::DeputySigning
                | Status::PresidentReview
                | Status::PresidentStamping
                | Status::PresidentSigning
        )
    }

    /// Human-readable description handed to notification and summary collaborators.
    pub fn describe(self) -> &'static str {
        match self {
            Status::Draft => "Proposal is being prepared by its originator",
            Status::Submitted => "Proposal submitted and awaiting intake by the cooperation office",
            Status::Received => "Proposal received by the cooperation office",
            Status::SummaryPending => "Automated summary requested",
            Status::SummaryReady => "Summary attached, ready for substantive review",
            Status::UnderSubstantiveReview => "Under substantive review by the reviewing unit",
            Status::SubstantiveApproved => "Substance approved, agreement drafting can start",
            Status::FeedbackEvaluation => "Cooperation office is evaluating reviewer feedback",
            Status::DocumentDrafting => "Agreement document is being drafted",
            Status::PartnerDraftReview => "Partner is reviewing the draft agreement",
            Status::AwaitingPartnerRevision => "Waiting for the partner to correct the proposal",
            Status::InternalRevision => "Cooperation office is correcting the proposal",
            Status::InternalLegalReview => "Under internal legal review",
            Status::InternalLegalApproved => "Internal legal review passed",
            Status::LegalBureauReview => "Under review by the legal bureau",
            Status::LegalBureauApproved => "Legal bureau review passed",
            Status::AwaitingUnitParaf => "Waiting for the reviewing unit's paraf",
            Status::AwaitingOfficeParaf => "Waiting for the cooperation office's paraf",
            Status::AwaitingBureauParaf => "Waiting for the legal bureau's paraf",
            Status::FinalApprovalReview => "Waiting for final approval",
            Status::DeputyReview => "Deputy is reviewing the agreement",
            Status::DeputyStamping => "Stamping the agreement for the deputy's signature",
            Status::DeputySigning => "Waiting for the deputy's signature",
            Status::PresidentReview => "President is reviewing the agreement",
            Status::PresidentStamping => "Stamping the agreement for the president's signature",
            Status::PresidentSigning => "Waiting for the president's signature",
            Status::AwaitingPartnerSignature => {
                "Leadership signed, waiting for the partner's signature"
            }
            Status::DocumentExchange => "Signed documents are being exchanged",
            Status::Archived => "Agreement archived",
            Status::Completed => "Cooperation agreement completed",
            Status::Rejected => "Proposal rejected",
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown status: {0}")]
pub struct ParseStatusError(pub String);

impl FromStr for Status {
    type Err = ParseStatusError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let needle = s.trim().replace('-', "_").to_lowercase();
        Status::ALL
            .iter()
            .copied()
            .find(|status| status.as_str() == needle)
            .ok_or_else(|| ParseStatusError(s.to_string()))
    }
}

/// Organizational roles that act on a proposal. Identity and role come from an
/// already-authenticated caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Role {
    /// External counterpart originating or receiving the proposal.
    Partner,
    /// Cooperation office coordinating the workflow end-to-end.
    Office,
    /// Faculty or unit judging the substance of the proposal.
    ReviewingUnit,
    /// Internal legal staff, first legal tier.
    LegalOfficer,
    /// Legal bureau, second legal tier.
    LegalBureau,
    Deputy,
    President,
}

impl Role {
    pub const ALL: [Role; 7] = [
        Role::Partner,
        Role::Office,
        Role::ReviewingUnit,
        Role::LegalOfficer,
        Role::LegalBureau,
        Role::Deputy,
        Role::President,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Role::Partner => "partner",
            Role::Office => "office",
            Role::ReviewingUnit => "reviewing-unit",
            Role::LegalOfficer => "legal-officer",
            Role::LegalBureau => "legal-bureau",
            Role::Deputy => "deputy",
            Role::President => "president",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An authenticated identity acting in a given role.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
    pub id: String,
    pub role: Role,
}

impl Actor {
    pub fn new(id: impl Into<String>, role: Role) -> Self {
        Self {
            id: id.into(),
            role,
        }
    }
}
