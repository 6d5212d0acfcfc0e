use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;

use super::proposal::ProposalId;
use super::status::{Role, Status};

/// Committed status change, handed to notification and summary collaborators.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatusChange {
    pub proposal_id: ProposalId,
    pub title: String,
    pub action: String,
    pub actor: String,
    pub role: Role,
    pub from: Option<Status>,
    pub to: Status,
    pub at: DateTime<Utc>,
}

impl StatusChange {
    /// One-line description of the new status, suitable for notification text
    /// or as input to a summarizer.
    pub fn describe(&self) -> String {
        match self.from {
            Some(from) if from == self.to => format!(
                "\"{}\": {} ({}) recorded `{}`; status remains {}",
                self.title, self.actor, self.role, self.action, self.to
            ),
            Some(from) => format!(
                "\"{}\" moved from {} to {} by {} ({}): {}",
                self.title,
                from,
                self.to,
                self.actor,
                self.role,
                self.to.describe()
            ),
            None => format!(
                "\"{}\" created by {} ({}): {}",
                self.title,
                self.actor,
                self.role,
                self.to.describe()
            ),
        }
    }
}

#[derive(Debug, Error)]
#[error("notifier `{notifier}` failed: {message}")]
pub struct NotifyError {
    pub notifier: &'static str,
    pub message: String,
}

/// Downstream collaborator told about every committed transition.
///
/// Failures are logged by the engine and never undo or fail the transition.
pub trait StatusNotifier: Send + Sync {
    fn name(&self) -> &'static str;

    fn notify(&self, change: &StatusChange) -> Result<(), NotifyError>;
}

/// Emits each change as a structured log event.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotifier;

impl StatusNotifier for LogNotifier {
    fn name(&self) -> &'static str {
        "log"
    }

    fn notify(&self, change: &StatusChange) -> Result<(), NotifyError> {
        tracing::info!(
            proposal_id = %change.proposal_id,
            to = %change.to,
            "{}",
            change.describe()
        );
        Ok(())
    }
}

/// Keeps every change in memory, for inspection by callers and tests.
#[derive(Debug, Default, Clone)]
pub struct RecordingNotifier {
    changes: Arc<Mutex<Vec<StatusChange>>>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn changes(&self) -> Vec<StatusChange> {
        self.changes
            .lock()
            .map(|changes| changes.clone())
            .unwrap_or_default()
    }
}

impl StatusNotifier for RecordingNotifier {
    fn name(&self) -> &'static str {
        "recording"
    }

    fn notify(&self, change: &StatusChange) -> Result<(), NotifyError> {
        let mut changes = self.changes.lock().map_err(|_| NotifyError {
            notifier: "recording",
            message: "lock poisoned".to_string(),
        })?;
        changes.push(change.clone());
        Ok(())
    }
}
