use std::fmt;

use serde::{Deserialize, Serialize};

use super::status::{Role, Status};

/// The two parallel tracks opened by final approval.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Track {
    /// External counter-signing by the partner.
    Partner,
    /// Internal deputy/president review-and-sign chain.
    Leadership,
}

impl Track {
    pub fn other(self) -> Track {
        match self {
            Track::Partner => Track::Leadership,
            Track::Leadership => Track::Partner,
        }
    }
}

impl fmt::Display for Track {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Track::Partner => write!(f, "partner"),
            Track::Leadership => write!(f, "leadership"),
        }
    }
}

/// Who performs the correction once feedback has been evaluated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Correction {
    DelegateToPartner,
    Internal,
}

/// Classification of an edge in the transition graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EdgeKind {
    Advance,
    GatewayApprove,
    GatewayReject,
    Revision(Correction),
    Join(Track),
}

impl fmt::Display for EdgeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EdgeKind::Advance => write!(f, "advance"),
            EdgeKind::GatewayApprove => write!(f, "gateway-approve"),
            EdgeKind::GatewayReject => write!(f, "gateway-reject"),
            EdgeKind::Revision(_) => write!(f, "revision"),
            EdgeKind::Join(track) => write!(f, "join({track})"),
        }
    }
}

/// Supporting evidence an edge demands before it may fire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Evidence {
    None,
    /// Free-text justification in the payload comment.
    Reason,
    /// Reference to a document (signed, stamped or drafted) in the external store.
    Document,
}

impl Evidence {
    pub fn is_required(self) -> bool {
        !matches!(self, Evidence::None)
    }

    /// Whether `payload` carries what this requirement asks for.
    pub fn satisfied_by(self, payload: &TransitionPayload) -> bool {
        match self {
            Evidence::None => true,
            Evidence::Reason => payload.comment().is_some(),
            Evidence::Document => payload.document_ref().is_some(),
        }
    }
}

impl fmt::Display for Evidence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Evidence::None => write!(f, "none"),
            Evidence::Reason => write!(f, "reason"),
            Evidence::Document => write!(f, "document reference"),
        }
    }
}

/// One legal edge of the transition graph.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TransitionDefinition {
    /// Stable action identifier recorded in the audit trail.
    pub action: &'static str,
    pub label: &'static str,
    pub from: Status,
    pub to: Status,
    pub roles: &'static [Role],
    pub kind: EdgeKind,
    pub evidence: Evidence,
}

impl TransitionDefinition {
    pub fn allows(&self, role: Role) -> bool {
        self.roles.contains(&role)
    }

    pub fn is_self_loop(&self) -> bool {
        self.from == self.to
    }

    pub fn join_track(&self) -> Option<Track> {
        match self.kind {
            EdgeKind::Join(track) => Some(track),
            _ => None,
        }
    }
}

/// Optional data accompanying a transition request.
///
/// Blank strings count as absent, so whitespace cannot satisfy an evidence requirement.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransitionPayload {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    comment: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    document_ref: Option<String>,
}

impl TransitionPayload {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_comment(mut self, comment: impl Into<String>) -> Self {
        self.comment = Some(comment.into());
        self
    }

    pub fn with_document(mut self, document_ref: impl Into<String>) -> Self {
        self.document_ref = Some(document_ref.into());
        self
    }

    pub fn comment(&self) -> Option<&str> {
        non_blank(self.comment.as_deref())
    }

    pub fn document_ref(&self) -> Option<&str> {
        non_blank(self.document_ref.as_deref())
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_comment_does_not_satisfy_reason() {
        let payload = TransitionPayload::new().with_comment("   ");
        assert!(!Evidence::Reason.satisfied_by(&payload));
        assert!(Evidence::None.satisfied_by(&payload));
    }

    #[test]
    fn document_evidence_needs_reference() {
        let with_doc = TransitionPayload::new().with_document("store://pks/42/signed.pdf");
        let comment_only = TransitionPayload::new().with_comment("signed");
        assert!(Evidence::Document.satisfied_by(&with_doc));
        assert!(!Evidence::Document.satisfied_by(&comment_only));
    }

    #[test]
    fn payload_trims_values() {
        let payload = TransitionPayload::new().with_comment("  missing clause 4  ");
        assert_eq!(payload.comment(), Some("missing clause 4"));
        assert_eq!(payload.document_ref(), None);
    }

    #[test]
    fn track_other_is_symmetric() {
        assert_eq!(Track::Partner.other(), Track::Leadership);
        assert_eq!(Track::Leadership.other().other(), Track::Leadership);
    }

    #[test]
    fn edge_kind_display() {
        assert_eq!(EdgeKind::GatewayReject.to_string(), "gateway-reject");
        assert_eq!(EdgeKind::Join(Track::Partner).to_string(), "join(partner)");
        assert_eq!(
            EdgeKind::Revision(Correction::Internal).to_string(),
            "revision"
        );
    }
}
