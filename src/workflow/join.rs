//! Join barrier for the parallel signing tracks.
//!
//! Final approval forks the proposal into a partner counter-signing track and
//! a leadership signing chain. [`JoinBarrier`] holds one completion slot per
//! track and is the only place that decides whether a join edge may fire and
//! whether firing it merges the tracks.

use serde::{Deserialize, Serialize};

use super::status::Status;
use super::transition::{TransitionDefinition, Track};

/// Outcome of marking a track complete.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinOutcome {
    /// The track was already complete; nothing changed.
    AlreadyComplete,
    /// The track is now complete, the other one is still running.
    Waiting,
    /// Both tracks are complete; the proposal merges into document exchange.
    Merged,
}

/// Completion slots of the two signing tracks that run after final approval.
///
/// The proposal may leave the signing area only once both slots are set.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct JoinBarrier {
    #[serde(rename = "partner_track_complete")]
    partner: bool,
    #[serde(rename = "leadership_track_complete")]
    leadership: bool,
}

impl JoinBarrier {
    /// A barrier with neither track complete.
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether the slot for `track` is set.
    pub fn is_complete(&self, track: Track) -> bool {
        match track {
            Track::Partner => self.partner,
            Track::Leadership => self.leadership,
        }
    }

    /// The partner has countersigned.
    pub fn partner_complete(&self) -> bool {
        self.partner
    }

    /// Deputy and president have both signed.
    pub fn leadership_complete(&self) -> bool {
        self.leadership
    }

    /// The merge condition.
    pub fn both_complete(&self) -> bool {
        self.partner && self.leadership
    }

    /// At least one track has finished, i.e. the proposal has forked.
    pub fn any_complete(&self) -> bool {
        self.partner || self.leadership
    }

    /// Sets the slot for `track` and re-evaluates the merge condition.
    /// Marking a slot that is already set is a no-op.
    pub fn mark(&mut self, track: Track) -> JoinOutcome {
        if self.is_complete(track) {
            return JoinOutcome::AlreadyComplete;
        }
        match track {
            Track::Partner => self.partner = true,
            Track::Leadership => self.leadership = true,
        }
        if self.both_complete() {
            JoinOutcome::Merged
        } else {
            JoinOutcome::Waiting
        }
    }

    /// Status the proposal must end in once `track` completes, given the other slot.
    ///
    /// `current` is where the proposal sits now. A partner completing while
    /// leadership is still signing leaves the proposal where it is.
    pub fn resulting_status(&self, track: Track, current: Status) -> Status {
        if self.is_complete(track.other()) {
            return Status::MERGE;
        }
        match track {
            Track::Partner => current,
            Track::Leadership => Status::AwaitingPartnerSignature,
        }
    }

    /// Whether a join edge may fire against this barrier.
    ///
    /// The edge's track must still be open, and its target must agree with the
    /// merge condition: only the edge into the merge status is admitted once the
    /// other track is complete, and only a non-merge edge before that.
    pub fn admits(&self, edge: &TransitionDefinition) -> bool {
        let Some(track) = edge.join_track() else {
            return true;
        };
        !self.is_complete(track) && edge.to == self.resulting_status(track, edge.from)
    }

    /// Clears both slots. Only called when a revision loop sends an already
    /// forked proposal back to drafting.
    pub fn reset(&mut self) {
        self.partner = false;
        self.leadership = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workflow::status::Role;
    use crate::workflow::transition::{EdgeKind, Evidence};

    fn join_edge(from: Status, to: Status, track: Track) -> TransitionDefinition {
        TransitionDefinition {
            action: "test_join",
            label: "Test join",
            from,
            to,
            roles: &[Role::Partner],
            kind: EdgeKind::Join(track),
            evidence: Evidence::None,
        }
    }

    #[test]
    fn first_mark_waits_second_merges() {
        let mut barrier = JoinBarrier::new();
        assert_eq!(barrier.mark(Track::Partner), JoinOutcome::Waiting);
        assert!(barrier.partner_complete());
        assert!(!barrier.leadership_complete());
        assert_eq!(barrier.mark(Track::Leadership), JoinOutcome::Merged);
        assert!(barrier.both_complete());
    }

    #[test]
    fn remarking_is_a_no_op() {
        let mut barrier = JoinBarrier::new();
        barrier.mark(Track::Leadership);
        let before = barrier;
        assert_eq!(barrier.mark(Track::Leadership), JoinOutcome::AlreadyComplete);
        assert_eq!(barrier, before);

        barrier.mark(Track::Partner);
        assert_eq!(barrier.mark(Track::Partner), JoinOutcome::AlreadyComplete);
        assert!(barrier.both_complete());
    }

    #[test]
    fn resulting_status_depends_on_other_track() {
        let mut barrier = JoinBarrier::new();
        assert_eq!(
            barrier.resulting_status(Track::Leadership, Status::PresidentSigning),
            Status::AwaitingPartnerSignature
        );
        assert_eq!(
            barrier.resulting_status(Track::Partner, Status::DeputyReview),
            Status::DeputyReview
        );
        barrier.mark(Track::Partner);
        assert_eq!(
            barrier.resulting_status(Track::Leadership, Status::PresidentSigning),
            Status::DocumentExchange
        );
    }

    #[test]
    fn admits_only_the_edge_matching_the_merge_condition() {
        let to_waiting = join_edge(
            Status::PresidentSigning,
            Status::AwaitingPartnerSignature,
            Track::Leadership,
        );
        let to_merge = join_edge(
            Status::PresidentSigning,
            Status::DocumentExchange,
            Track::Leadership,
        );

        let mut barrier = JoinBarrier::new();
        assert!(barrier.admits(&to_waiting));
        assert!(!barrier.admits(&to_merge));

        barrier.mark(Track::Partner);
        assert!(!barrier.admits(&to_waiting));
        assert!(barrier.admits(&to_merge));

        barrier.mark(Track::Leadership);
        assert!(!barrier.admits(&to_merge));
    }

    #[test]
    fn closed_track_refuses_its_edges() {
        let countersign = join_edge(Status::DeputyReview, Status::DeputyReview, Track::Partner);
        let mut barrier = JoinBarrier::new();
        assert!(barrier.admits(&countersign));
        barrier.mark(Track::Partner);
        assert!(!barrier.admits(&countersign));
    }

    #[test]
    fn reset_clears_both_slots() {
        let mut barrier = JoinBarrier::new();
        barrier.mark(Track::Partner);
        barrier.mark(Track::Leadership);
        barrier.reset();
        assert!(!barrier.any_complete());
    }

    #[test]
    fn serializes_with_named_slots() {
        let mut barrier = JoinBarrier::new();
        barrier.mark(Track::Partner);
        let json = serde_json::to_value(barrier).unwrap();
        assert_eq!(json["partner_track_complete"], true);
        assert_eq!(json["leadership_track_complete"], false);
    }
}
