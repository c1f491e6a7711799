//! Application status workflow.
//!
//! The lifecycle is a strict linear state machine:
//!
//! ```text
//! new --accept--> in_progress --complete--> done
//! ```
//!
//! Every transition validates the *current* status before applying the
//! action; there is no way to skip a state or move backwards. Deletion and
//! owner edits are only permitted while the application is still `new`.

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// Workflow status of an application. Stored as text in the database.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApplicationStatus {
    New,
    InProgress,
    Done,
}

impl ApplicationStatus {
    /// The database / wire representation.
    pub fn as_str(self) -> &'static str {
        match self {
            ApplicationStatus::New => "new",
            ApplicationStatus::InProgress => "in_progress",
            ApplicationStatus::Done => "done",
        }
    }

    /// Parse the database / wire representation. Unknown values yield `None`.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "new" => Some(ApplicationStatus::New),
            "in_progress" => Some(ApplicationStatus::InProgress),
            "done" => Some(ApplicationStatus::Done),
            _ => None,
        }
    }

    /// Human-readable label used in conflict messages.
    pub fn label(self) -> &'static str {
        match self {
            ApplicationStatus::New => "new",
            ApplicationStatus::InProgress => "in progress",
            ApplicationStatus::Done => "done",
        }
    }
}

impl std::fmt::Display for ApplicationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An action a staff member can apply to an application.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkflowAction {
    /// Take the application into work (requires an admin comment).
    Accept,
    /// Mark the application as finished (requires a design image).
    Complete,
}

/// Apply `action` to an application currently in `current` status.
///
/// Returns the next status, or a [`CoreError::Conflict`] naming the current
/// status when the transition is not in the table.
pub fn transition(
    current: ApplicationStatus,
    action: WorkflowAction,
) -> Result<ApplicationStatus, CoreError> {
    match (current, action) {
        (ApplicationStatus::New, WorkflowAction::Accept) => Ok(ApplicationStatus::InProgress),
        (ApplicationStatus::InProgress, WorkflowAction::Complete) => Ok(ApplicationStatus::Done),
        (_, WorkflowAction::Accept) => Err(CoreError::Conflict(format!(
            "Only new applications can be accepted (current status: {})",
            current.label()
        ))),
        (_, WorkflowAction::Complete) => Err(CoreError::Conflict(format!(
            "Only applications in progress can be completed (current status: {})",
            current.label()
        ))),
    }
}

/// Owners may edit an application only while it has not been triaged.
pub fn can_edit(status: ApplicationStatus) -> bool {
    status == ApplicationStatus::New
}

/// Owners may delete an application only while it has not been triaged.
pub fn can_delete(status: ApplicationStatus) -> bool {
    status == ApplicationStatus::New
}
