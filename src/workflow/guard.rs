use crate::error::WorkflowError;

use super::registry::TransitionRegistry;
use super::status::{Role, Status};
use super::transition::TransitionDefinition;

/// Decides whether a role may move a proposal from one status to another.
///
/// Fails closed: a request that matches no edge is always an error.
#[derive(Debug, Clone, Copy)]
pub struct AuthorizationGuard<'a> {
    registry: &'a TransitionRegistry,
}

impl<'a> AuthorizationGuard<'a> {
    /// A guard answering from `registry`.
    pub fn new(registry: &'a TransitionRegistry) -> Self {
        Self { registry }
    }

    /// Whether `role` can fire any transition out of `status`.
    pub fn can_act(&self, status: Status, role: Role) -> bool {
        self.registry
            .edges_from(status)
            .iter()
            .any(|edge| edge.allows(role))
    }

    /// Edges out of `status` that `role` is allowed to fire.
    pub fn permitted(
        &self,
        status: Status,
        role: Role,
    ) -> impl Iterator<Item = &'a TransitionDefinition> + 'a {
        self.registry
            .edges_from(status)
            .iter()
            .filter(move |edge| edge.allows(role))
    }

    /// Resolves the edge `role` fires to reach `target` from `status`.
    ///
    /// - no edges at all: [`WorkflowError::TerminalState`]
    /// - no edge to `target`: [`WorkflowError::InvalidTransition`]
    /// - edges to `target` exist but none admits `role`: [`WorkflowError::Unauthorized`]
    pub fn authorize(
        &self,
        status: Status,
        role: Role,
        target: Status,
    ) -> Result<&'a TransitionDefinition, WorkflowError> {
        let edges = self.registry.edges_from(status);
        if edges.is_empty() {
            return Err(WorkflowError::TerminalState(status));
        }

        let mut towards = edges.iter().filter(|edge| edge.to == target).peekable();
        if towards.peek().is_none() {
            return Err(WorkflowError::InvalidTransition {
                from: status,
                to: target,
            });
        }

        towards
            .find(|edge| edge.allows(role))
            .ok_or(WorkflowError::Unauthorized { status, role })
    }
}
