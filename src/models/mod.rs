//! Core data models for the office workflow engine.
//!
//! This module contains the domain records the guard and the approval
//! workflows operate on.

mod approval;
mod leave;
mod menu;
mod requisition;
mod user;

pub use approval::{ApprovalAction, ApprovalRecord, REQUESTER_ROLE};
pub use leave::{LeaveApplication, LeaveStatus, LeaveType, inclusive_days};
pub use menu::{Menu, MenuType};
pub use requisition::{Priority, Requisition, RequisitionItem, RequisitionStatus};
pub use user::User;
