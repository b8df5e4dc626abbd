//! Requisition model and related types.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::ApprovalRecord;

/// Urgency of a requisition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    /// No rush.
    Low,
    /// Normal turnaround.
    #[default]
    Medium,
    /// Needed soon.
    High,
    /// Needed immediately.
    Urgent,
}

/// Lifecycle status of a requisition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RequisitionStatus {
    /// Being prepared by the requester.
    Draft,
    /// Submitted and moving through the approval stages.
    #[serde(alias = "submitted")]
    Pending,
    /// Every stage signed off.
    Approved,
    /// Refused at some stage.
    Rejected,
    /// Withdrawn by the requester.
    Cancelled,
}

impl RequisitionStatus {
    /// Returns the wire name of the status.
    pub fn as_str(&self) -> &'static str {
        match self {
            RequisitionStatus::Draft => "draft",
            RequisitionStatus::Pending => "pending",
            RequisitionStatus::Approved => "approved",
            RequisitionStatus::Rejected => "rejected",
            RequisitionStatus::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for RequisitionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RequisitionStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "draft" => Ok(RequisitionStatus::Draft),
            "pending" | "submitted" => Ok(RequisitionStatus::Pending),
            "approved" => Ok(RequisitionStatus::Approved),
            "rejected" => Ok(RequisitionStatus::Rejected),
            "cancelled" => Ok(RequisitionStatus::Cancelled),
            other => Err(format!("unknown requisition status '{}'", other)),
        }
    }
}

/// One line of a requisition.
///
/// `total_price` is always recomputed from `quantity` and `unit_price`;
/// any value supplied on input is ignored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequisitionItem {
    /// What is being requested.
    pub name: String,
    /// How many units.
    pub quantity: u32,
    /// Price of a single unit.
    pub unit_price: Decimal,
    /// quantity x unit_price.
    #[serde(default)]
    pub total_price: Decimal,
}

/// A purchase request travelling through the sign-off stages.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Requisition {
    /// Unique identifier for the requisition.
    pub id: Uuid,
    /// Short description.
    pub title: String,
    /// Department the purchase is for.
    pub department: String,
    /// Id of the requesting user.
    pub requested_by: String,
    /// Urgency.
    pub priority: Priority,
    /// Date by which the goods are needed.
    pub required_date: NaiveDate,
    /// Line items.
    pub items: Vec<RequisitionItem>,
    /// Sum of item totals.
    pub estimated_cost: Decimal,
    /// What was actually spent, recorded after approval.
    pub actual_cost: Option<Decimal>,
    /// Lifecycle status.
    pub status: RequisitionStatus,
    /// Index of the stage awaiting sign-off; equals `total_stages` once approved.
    pub approval_stage: usize,
    /// Number of stages in the chain this requisition was submitted into.
    pub total_stages: usize,
    /// Name of the stage awaiting sign-off, if any.
    pub current_stage_name: Option<String>,
    /// Every action taken on the requisition, oldest first.
    pub history: Vec<ApprovalRecord<RequisitionStatus>>,
    /// When the requisition was created.
    pub created_at: DateTime<Utc>,
    /// When the requisition last changed.
    pub updated_at: DateTime<Utc>,
}
