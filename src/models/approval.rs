//! Approval history types shared by leave applications and requisitions.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Role label recorded when the owner of an entity acts on it.
pub const REQUESTER_ROLE: &str = "Requester";

/// An action that moves an entity through its approval workflow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApprovalAction {
    /// Hand a draft over to the first approver.
    Submit,
    /// Sign off the current stage.
    Approve,
    /// Refuse at the current stage.
    Reject,
    /// Withdraw before a final decision.
    Cancel,
    /// Restart a rejected entity from the first stage.
    Resubmit,
}

impl ApprovalAction {
    /// Returns the wire name of the action.
    pub fn as_str(&self) -> &'static str {
        match self {
            ApprovalAction::Submit => "submit",
            ApprovalAction::Approve => "approve",
            ApprovalAction::Reject => "reject",
            ApprovalAction::Cancel => "cancel",
            ApprovalAction::Resubmit => "resubmit",
        }
    }
}

impl fmt::Display for ApprovalAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One entry of an approval history.
///
/// `S` is the status type of the entity the record belongs to; `status` is
/// the status the entity ended up in after the action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApprovalRecord<S> {
    /// Id of the user who acted.
    pub actor_id: String,
    /// Display name of the user who acted.
    pub actor_name: String,
    /// Role under which the user acted.
    pub actor_role: String,
    /// What the user did.
    pub action: ApprovalAction,
    /// Free-text comment attached to the action.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
    /// When the action happened.
    pub timestamp: DateTime<Utc>,
    /// Resulting status.
    pub status: S,
}
