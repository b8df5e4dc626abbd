//! Configuration types for the office workflow engine.
//!
//! This module contains the strongly-typed configuration structures that
//! are deserialized from YAML configuration files.

use std::collections::HashSet;

use serde::Deserialize;

use crate::access::RouteRule;
use crate::error::{WorkflowError, WorkflowResult};
use crate::models::{LeaveStatus, Menu, User};

/// One sign-off step of the leave approval chain.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LeaveStageConfig {
    /// Status an application is in while waiting at this stage.
    pub status: LeaveStatus,
    /// Role that may approve or reject at this stage.
    pub role: String,
    /// Status reached when this stage approves.
    pub next: LeaveStatus,
}

/// One sign-off step of the requisition approval chain.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RequisitionStageConfig {
    /// Display name of the stage (e.g. "Finance Review").
    pub name: String,
    /// Role that may approve or reject at this stage.
    pub role: String,
}

/// Workflow settings loaded from `workflow.yaml`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct WorkflowSettings {
    /// Leave approval chain, in order.
    #[serde(default = "default_leave_stages")]
    pub leave_stages: Vec<LeaveStageConfig>,
    /// Requisition approval chain, in order.
    #[serde(default = "default_requisition_stages")]
    pub requisition_stages: Vec<RequisitionStageConfig>,
    /// Role allowed to record the actual cost of an approved requisition.
    #[serde(default = "default_finance_role")]
    pub finance_role: String,
    /// Where unauthenticated visitors are sent.
    #[serde(default = "default_login_path")]
    pub login_path: String,
    /// Where authenticated but unauthorized visitors are sent.
    #[serde(default = "default_unauthorized_path")]
    pub unauthorized_path: String,
}

impl Default for WorkflowSettings {
    fn default() -> Self {
        Self {
            leave_stages: default_leave_stages(),
            requisition_stages: default_requisition_stages(),
            finance_role: default_finance_role(),
            login_path: default_login_path(),
            unauthorized_path: default_unauthorized_path(),
        }
    }
}

fn default_leave_stages() -> Vec<LeaveStageConfig> {
    vec![
        LeaveStageConfig {
            status: LeaveStatus::Pending,
            role: "HR Manager".to_string(),
            next: LeaveStatus::ApprovedByHr,
        },
        LeaveStageConfig {
            status: LeaveStatus::ApprovedByHr,
            role: "Admin".to_string(),
            next: LeaveStatus::Approved,
        },
    ]
}

fn default_requisition_stages() -> Vec<RequisitionStageConfig> {
    [
        ("Department Head", "Department Head"),
        ("Finance Review", "Finance Manager"),
        ("Final Approval", "Admin"),
    ]
    .into_iter()
    .map(|(name, role)| RequisitionStageConfig {
        name: name.to_string(),
        role: role.to_string(),
    })
    .collect()
}

fn default_finance_role() -> String {
    "Finance Manager".to_string()
}

fn default_login_path() -> String {
    "/login".to_string()
}

fn default_unauthorized_path() -> String {
    "/unauthorized".to_string()
}

impl WorkflowSettings {
    /// Checks that both approval chains are well formed.
    ///
    /// The leave chain must start at `pending`, each stage must hand over to
    /// the status of the following stage, and the last stage must end in
    /// `approved`. No two stages may wait at the same status and every stage
    /// must lead to a later status, so approvals only ever move forward.
    pub fn validate(&self) -> WorkflowResult<()> {
        let invalid = |message: String| WorkflowError::InvalidConfig { message };

        let first = self
            .leave_stages
            .first()
            .ok_or_else(|| invalid("leave_stages must not be empty".to_string()))?;
        if first.status != LeaveStatus::Pending {
            return Err(invalid(format!(
                "first leave stage must wait at 'pending', found '{}'",
                first.status
            )));
        }

        let mut seen = HashSet::new();
        if let Some(repeated) = self.leave_stages.iter().find(|s| !seen.insert(s.status)) {
            return Err(invalid(format!(
                "more than one leave stage waits at '{}'",
                repeated.status
            )));
        }

        for (index, stage) in self.leave_stages.iter().enumerate() {
            if stage.next.rank() <= stage.status.rank() {
                return Err(invalid(format!(
                    "leave stage '{}' cannot lead back to '{}'",
                    stage.status, stage.next
                )));
            }
            if stage.role.trim().is_empty() {
                return Err(invalid(format!("leave stage {} has no role", index)));
            }
            let expected_next = match self.leave_stages.get(index + 1) {
                Some(following) => following.status,
                None => LeaveStatus::Approved,
            };
            if stage.next != expected_next {
                return Err(invalid(format!(
                    "leave stage '{}' must lead to '{}', found '{}'",
                    stage.status, expected_next, stage.next
                )));
            }
            if stage.status.is_terminal() || stage.status == LeaveStatus::Draft {
                return Err(invalid(format!(
                    "leave stage cannot wait at '{}'",
                    stage.status
                )));
            }
        }

        if self.requisition_stages.is_empty() {
            return Err(invalid("requisition_stages must not be empty".to_string()));
        }
        for (index, stage) in self.requisition_stages.iter().enumerate() {
            if stage.name.trim().is_empty() || stage.role.trim().is_empty() {
                return Err(invalid(format!(
                    "requisition stage {} needs both a name and a role",
                    index
                )));
            }
        }

        if self.finance_role.trim().is_empty() {
            return Err(invalid("finance_role must not be empty".to_string()));
        }

        Ok(())
    }
}

/// Users configuration file structure.
#[derive(Debug, Clone, Deserialize)]
pub struct UsersConfig {
    /// Every user known to the system.
    pub users: Vec<User>,
}

/// Menus configuration file structure.
#[derive(Debug, Clone, Deserialize)]
pub struct MenusConfig {
    /// Flat list of menu entries; hierarchy comes from `parent_id`.
    pub menus: Vec<Menu>,
}

/// Routes configuration file structure.
#[derive(Debug, Clone, Deserialize)]
pub struct RoutesConfig {
    /// Guard rules for client routes.
    pub routes: Vec<RouteRule>,
}
