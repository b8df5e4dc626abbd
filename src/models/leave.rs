//! Leave application model and related types.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::ApprovalRecord;

/// Kind of leave being requested.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LeaveType {
    /// Paid annual leave.
    Annual,
    /// Sick leave.
    Sick,
    /// Leave without pay.
    Unpaid,
    /// Maternity leave.
    Maternity,
    /// Paternity leave.
    Paternity,
    /// Bereavement and other compassionate leave.
    Compassionate,
}

/// Position of a leave application in its approval sequence.
///
/// The wire names match what the office front end stores in
/// `approval_status`, including the space in `"approved by hr"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LeaveStatus {
    /// Initial, still editable by the requester.
    #[serde(rename = "draft")]
    Draft,
    /// Awaiting the first approver.
    #[serde(rename = "pending")]
    Pending,
    /// Signed off by HR, awaiting final approval.
    #[serde(rename = "approved by hr")]
    ApprovedByHr,
    /// Fully approved.
    #[serde(rename = "approved")]
    Approved,
    /// Refused by an approver. Only resubmission leaves this state.
    #[serde(rename = "rejected")]
    Rejected,
    /// Withdrawn by the requester.
    #[serde(rename = "cancelled")]
    Cancelled,
}

impl LeaveStatus {
    /// Returns the wire name of the status.
    pub fn as_str(&self) -> &'static str {
        match self {
            LeaveStatus::Draft => "draft",
            LeaveStatus::Pending => "pending",
            LeaveStatus::ApprovedByHr => "approved by hr",
            LeaveStatus::Approved => "approved",
            LeaveStatus::Rejected => "rejected",
            LeaveStatus::Cancelled => "cancelled",
        }
    }

    /// Position along the approval sequence; final outcomes share the top rank.
    pub fn rank(&self) -> u8 {
        match self {
            LeaveStatus::Draft => 0,
            LeaveStatus::Pending => 1,
            LeaveStatus::ApprovedByHr => 2,
            LeaveStatus::Approved | LeaveStatus::Rejected | LeaveStatus::Cancelled => 3,
        }
    }

    /// Returns true once no further approval step can happen.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            LeaveStatus::Approved | LeaveStatus::Rejected | LeaveStatus::Cancelled
        )
    }
}

impl fmt::Display for LeaveStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LeaveStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "draft" => Ok(LeaveStatus::Draft),
            "pending" => Ok(LeaveStatus::Pending),
            "approved by hr" => Ok(LeaveStatus::ApprovedByHr),
            "approved" => Ok(LeaveStatus::Approved),
            "rejected" => Ok(LeaveStatus::Rejected),
            "cancelled" => Ok(LeaveStatus::Cancelled),
            other => Err(format!("unknown leave status '{}'", other)),
        }
    }
}

/// A request for time off and its approval trail.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeaveApplication {
    /// Unique identifier for the application.
    pub id: Uuid,
    /// Id of the user asking for leave.
    pub requester_id: String,
    /// Kind of leave.
    pub leave_type: LeaveType,
    /// First day of leave (inclusive).
    pub start_date: NaiveDate,
    /// Last day of leave (inclusive).
    pub end_date: NaiveDate,
    /// Number of calendar days covered, both ends included.
    pub days: u32,
    /// Requester's explanation.
    #[serde(default)]
    pub reason: String,
    /// Current position in the approval sequence.
    pub approval_status: LeaveStatus,
    /// Role expected to act next, if any.
    pub current_approver_role: Option<String>,
    /// Comment attached to the most recent action.
    pub comment: Option<String>,
    /// Every action taken on the application, oldest first.
    pub history: Vec<ApprovalRecord<LeaveStatus>>,
    /// When the application was created.
    pub created_at: DateTime<Utc>,
    /// When the application last changed.
    pub updated_at: DateTime<Utc>,
}

/// Counts calendar days between two dates, both ends included.
///
/// Returns `None` when `end` is before `start`.
///
/// # Examples
///
/// ```
/// use office_workflow::models::inclusive_days;
/// use chrono::NaiveDate;
///
/// let start = NaiveDate::from_ymd_opt(2026, 3, 2).unwrap();
/// let end = NaiveDate::from_ymd_opt(2026, 3, 6).unwrap();
/// assert_eq!(inclusive_days(start, end), Some(5));
/// assert_eq!(inclusive_days(end, start), None);
/// ```
pub fn inclusive_days(start: NaiveDate, end: NaiveDate) -> Option<u32> {
    let span = (end - start).num_days();
    if span < 0 {
        return None;
    }
    u32::try_from(span + 1).ok()
}
