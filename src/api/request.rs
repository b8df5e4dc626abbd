//! Request types for the office workflow API.
//!
//! This module defines the JSON request bodies and query strings accepted by
//! the leave, requisition and access endpoints.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::models::{ApprovalAction, LeaveType, Priority, RequisitionItem};
use crate::workflow::{LeaveDraft, RequisitionDraft};

/// Request body for `POST /leaves` and `PATCH /leaves/:id`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LeaveRequest {
    /// Kind of leave.
    pub leave_type: LeaveType,
    /// First day (inclusive).
    pub start_date: NaiveDate,
    /// Last day (inclusive).
    pub end_date: NaiveDate,
    /// Free-text reason.
    #[serde(default)]
    pub reason: String,
    /// Submit straight away instead of keeping a draft (create only).
    #[serde(default)]
    pub submit: bool,
}

impl From<LeaveRequest> for LeaveDraft {
    fn from(req: LeaveRequest) -> Self {
        LeaveDraft {
            leave_type: req.leave_type,
            start_date: req.start_date,
            end_date: req.end_date,
            reason: req.reason,
        }
    }
}

/// Line item in a requisition request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ItemRequest {
    /// What is being requested.
    pub name: String,
    /// How many units.
    pub quantity: u32,
    /// Price of one unit.
    pub unit_price: Decimal,
}

impl From<ItemRequest> for RequisitionItem {
    fn from(req: ItemRequest) -> Self {
        RequisitionItem {
            name: req.name,
            quantity: req.quantity,
            unit_price: req.unit_price,
            total_price: Decimal::ZERO,
        }
    }
}

/// Request body for `POST /requisitions` and `PATCH /requisitions/:id`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RequisitionRequest {
    /// Short description.
    pub title: String,
    /// Department the purchase is for.
    pub department: String,
    /// Urgency.
    #[serde(default)]
    pub priority: Priority,
    /// Date by which the goods are needed.
    pub required_date: NaiveDate,
    /// Line items.
    #[serde(default)]
    pub items: Vec<ItemRequest>,
    /// Submit straight away instead of keeping a draft (create only).
    #[serde(default)]
    pub submit: bool,
}

impl From<RequisitionRequest> for RequisitionDraft {
    fn from(req: RequisitionRequest) -> Self {
        RequisitionDraft {
            title: req.title,
            department: req.department,
            priority: req.priority,
            required_date: req.required_date,
            items: req.items.into_iter().map(Into::into).collect(),
        }
    }
}

/// Request body for the `/status` endpoints.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusChangeRequest {
    /// What to do.
    pub action: ApprovalAction,
    /// Optional comment recorded in the history.
    #[serde(default)]
    pub comment: Option<String>,
}

/// Request body for `PATCH /requisitions/:id/actual-cost`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActualCostRequest {
    /// Amount actually spent.
    pub actual_cost: Decimal,
}

/// Request body for `POST /access/check`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccessCheckRequest {
    /// Client route being opened, optionally with a query string.
    pub path: String,
}

/// Query string for the list endpoints.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ListQuery {
    /// Only return records in this status.
    #[serde(default)]
    pub status: Option<String>,
}
