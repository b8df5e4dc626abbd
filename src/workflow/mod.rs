//! Approval workflows for the office system.
//!
//! This module contains the leave approval state machine, the staged
//! requisition approval, and the requisition cost arithmetic.

use std::fmt::Display;

use crate::error::WorkflowError;
use crate::models::User;

mod costing;
mod leave;
mod requisition;

pub use costing::{estimated_cost, line_total, price_items, recalculate};
pub use leave::{LeaveDraft, LeaveWorkflow};
pub use requisition::{RequisitionDraft, RequisitionWorkflow};

fn invalid_transition(action: impl Display, status: impl Display) -> WorkflowError {
    WorkflowError::InvalidTransition {
        action: action.to_string(),
        status: status.to_string(),
    }
}

fn not_permitted(actor: &User, action: impl Display, reason: &str) -> WorkflowError {
    WorkflowError::NotPermitted {
        actor: actor.id.clone(),
        action: action.to_string(),
        reason: reason.to_string(),
    }
}

fn normalize_comment(comment: Option<&str>) -> Option<String> {
    comment
        .map(str::trim)
        .filter(|c| !c.is_empty())
        .map(str::to_string)
}
