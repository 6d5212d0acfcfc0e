//! Scripted walks through the approval process.
//!
//! Each [`Scenario`] drives one proposal through a [`WorkflowEngine`] with
//! stock actors and returns a [`ScenarioReport`]. The CLI `demo` command runs
//! them against in-memory collaborators.

use std::fmt;

use serde::Serialize;

use crate::error::WorkflowError;
use crate::workflow::{
    Actor, AuditRecord, AuditTrail, Proposal, ProposalId, ProposalStore, RevisionSource, Role,
    Status, Track, TransitionPayload, WorkflowEngine,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Scenario {
    /// Straight from draft to completed, leadership signing before the partner.
    HappyPath,
    /// Substantive rejection, delegated correction, resubmission.
    RevisionLoop,
    /// Partner countersigns first, leadership completes later and merges.
    ParallelFork,
    /// A partner tries to decide the legal bureau's gateway.
    Unauthorized,
}

impl Scenario {
    pub const ALL: [Scenario; 4] = [
        Scenario::HappyPath,
        Scenario::RevisionLoop,
        Scenario::ParallelFork,
        Scenario::Unauthorized,
    ];
}

impl fmt::Display for Scenario {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scenario::HappyPath => write!(f, "happy path"),
            Scenario::RevisionLoop => write!(f, "revision loop"),
            Scenario::ParallelFork => write!(f, "parallel fork/join"),
            Scenario::Unauthorized => write!(f, "unauthorized attempt"),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ScenarioReport {
    pub scenario: Scenario,
    pub proposal_id: ProposalId,
    pub final_status: Status,
    pub revision_count: u32,
    pub revision_source: RevisionSource,
    pub partner_track_complete: bool,
    pub leadership_track_complete: bool,
    /// Error message of a deliberately refused request, if the scenario makes one.
    pub refused: Option<String>,
    pub history: Vec<AuditRecord>,
}

#[derive(Debug, Clone, Copy)]
enum Input {
    Nothing,
    Reason(&'static str),
    Document(&'static str),
}

impl Input {
    fn payload(self) -> Option<TransitionPayload> {
        match self {
            Input::Nothing => None,
            Input::Reason(text) => Some(TransitionPayload::new().with_comment(text)),
            Input::Document(name) => {
                Some(TransitionPayload::new().with_document(format!("docstore://demo/{name}")))
            }
        }
    }
}

type Step = (Role, Status, Input);

const TO_SUBSTANTIVE_REVIEW: &[Step] = &[
    (Role::Partner, Status::Submitted, Input::Document("proposal.pdf")),
    (Role::Office, Status::Received, Input::Nothing),
    (Role::Office, Status::SummaryPending, Input::Nothing),
    (Role::Office, Status::SummaryReady, Input::Nothing),
    (Role::Office, Status::UnderSubstantiveReview, Input::Nothing),
];

const TO_BUREAU_REVIEW: &[Step] = &[
    (Role::ReviewingUnit, Status::SubstantiveApproved, Input::Nothing),
    (Role::Office, Status::DocumentDrafting, Input::Nothing),
    (Role::Office, Status::PartnerDraftReview, Input::Document("agreement-draft.docx")),
    (Role::Partner, Status::InternalLegalReview, Input::Nothing),
    (Role::LegalOfficer, Status::InternalLegalApproved, Input::Nothing),
    (Role::Office, Status::LegalBureauReview, Input::Nothing),
];

const TO_FORK: &[Step] = &[
    (Role::LegalBureau, Status::LegalBureauApproved, Input::Nothing),
    (Role::Office, Status::AwaitingUnitParaf, Input::Document("agreement-final.pdf")),
    (Role::ReviewingUnit, Status::AwaitingOfficeParaf, Input::Nothing),
    (Role::Office, Status::AwaitingBureauParaf, Input::Nothing),
    (Role::LegalBureau, Status::FinalApprovalReview, Input::Nothing),
    (Role::Office, Status::DeputyReview, Input::Nothing),
];

const LEADERSHIP_TO_PRESIDENT_SIGNING: &[Step] = &[
    (Role::Deputy, Status::DeputyStamping, Input::Nothing),
    (Role::Office, Status::DeputySigning, Input::Document("stamped-deputy.pdf")),
    (Role::Deputy, Status::PresidentReview, Input::Document("signed-deputy.pdf")),
    (Role::President, Status::PresidentStamping, Input::Nothing),
    (Role::Office, Status::PresidentSigning, Input::Document("stamped-president.pdf")),
];

const REVISION_LOOP: &[Step] = &[
    (
        Role::ReviewingUnit,
        Status::FeedbackEvaluation,
        Input::Reason("Budget annex is missing"),
    ),
    (
        Role::Office,
        Status::AwaitingPartnerRevision,
        Input::Reason("Partner to attach the budget annex"),
    ),
    (
        Role::Partner,
        Status::UnderSubstantiveReview,
        Input::Document("proposal-rev1.pdf"),
    ),
];

const PARTNER_SIGNATURE: Input = Input::Document("signed-partner.pdf");
const PRESIDENT_SIGNATURE: Input = Input::Document("signed-president.pdf");

const CLOSE_OUT: &[Step] = &[
    (Role::Office, Status::Archived, Input::Document("exchange-receipt.pdf")),
    (Role::Office, Status::Completed, Input::Nothing),
];

fn demo_actor(role: Role) -> Actor {
    Actor::new(format!("demo-{role}"), role)
}

struct Walker<'e, S, A> {
    engine: &'e WorkflowEngine<S, A>,
    id: ProposalId,
    on_step: &'e mut dyn FnMut(&Proposal),
}

impl<S: ProposalStore, A: AuditTrail> Walker<'_, S, A> {
    fn run(&mut self, steps: &[Step]) -> Result<(), WorkflowError> {
        for &(role, target, input) in steps {
            let proposal = self
                .engine
                .execute(self.id, &demo_actor(role), target, input.payload())?;
            (self.on_step)(&proposal);
        }
        Ok(())
    }

    fn mark(&mut self, role: Role, track: Track, input: Input) -> Result<(), WorkflowError> {
        let proposal =
            self.engine
                .mark_track_complete(self.id, &demo_actor(role), track, input.payload())?;
        (self.on_step)(&proposal);
        Ok(())
    }
}

/// Runs `scenario` on a fresh proposal. `on_step` sees the proposal after
/// every committed transition.
pub fn run_scenario<S: ProposalStore, A: AuditTrail>(
    engine: &WorkflowEngine<S, A>,
    scenario: Scenario,
    on_step: &mut dyn FnMut(&Proposal),
) -> Result<ScenarioReport, WorkflowError> {
    let originator = demo_actor(Role::Partner);
    let proposal = engine.create(&originator, format!("Demo cooperation ({scenario})"))?;
    on_step(&proposal);

    let mut walker = Walker {
        engine,
        id: proposal.id,
        on_step,
    };
    let mut refused = None;

    walker.run(TO_SUBSTANTIVE_REVIEW)?;
    match scenario {
        Scenario::HappyPath => {
            walker.run(TO_BUREAU_REVIEW)?;
            walker.run(TO_FORK)?;
            walker.run(LEADERSHIP_TO_PRESIDENT_SIGNING)?;
            walker.mark(Role::President, Track::Leadership, PRESIDENT_SIGNATURE)?;
            walker.mark(Role::Partner, Track::Partner, PARTNER_SIGNATURE)?;
            walker.run(CLOSE_OUT)?;
        }
        Scenario::RevisionLoop => {
            walker.run(REVISION_LOOP)?;
        }
        Scenario::ParallelFork => {
            walker.run(TO_BUREAU_REVIEW)?;
            walker.run(TO_FORK)?;
            walker.mark(Role::Partner, Track::Partner, PARTNER_SIGNATURE)?;
            walker.run(LEADERSHIP_TO_PRESIDENT_SIGNING)?;
            walker.mark(Role::President, Track::Leadership, PRESIDENT_SIGNATURE)?;
        }
        Scenario::Unauthorized => {
            walker.run(TO_BUREAU_REVIEW)?;
            let attempt = engine.execute(
                proposal.id,
                &demo_actor(Role::Partner),
                Status::LegalBureauApproved,
                None,
            );
            match attempt {
                Err(err @ WorkflowError::Unauthorized { .. }) => refused = Some(err.to_string()),
                Err(other) => return Err(other),
                Ok(_) => {
                    return Err(WorkflowError::Unauthorized {
                        status: Status::LegalBureauReview,
                        role: Role::Partner,
                    });
                }
            }
        }
    }

    let proposal = engine.get_proposal(proposal.id)?;
    engine.verify_history(proposal.id)?;
    Ok(ScenarioReport {
        scenario,
        proposal_id: proposal.id,
        final_status: proposal.status,
        revision_count: proposal.revision_count,
        revision_source: proposal.revision_source,
        partner_track_complete: proposal.join.partner_complete(),
        leadership_track_complete: proposal.join.leadership_complete(),
        refused,
        history: engine.get_history(proposal.id)?,
    })
}
