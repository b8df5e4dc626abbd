//! Staged requisition approval.
//!
//! A submitted requisition waits at `approval_stage`, an index into the
//! configured stage list (by default Department Head, Finance Review, Final
//! Approval). Each approval advances the index by one; passing the last stage
//! approves the requisition. A rejection at any stage halts it.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::config::RequisitionStageConfig;
use crate::error::{WorkflowError, WorkflowResult};
use crate::models::{
    ApprovalAction, ApprovalRecord, Priority, REQUESTER_ROLE, Requisition, RequisitionItem,
    RequisitionStatus, User,
};

use super::costing::{estimated_cost, price_items};
use super::{invalid_transition, normalize_comment, not_permitted};

/// Requester-editable fields of a requisition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequisitionDraft {
    /// Short description.
    pub title: String,
    /// Department the purchase is for.
    pub department: String,
    /// Urgency.
    pub priority: Priority,
    /// Date by which the goods are needed.
    pub required_date: NaiveDate,
    /// Line items; totals are recomputed.
    pub items: Vec<RequisitionItem>,
}

struct PricedDraft {
    title: String,
    department: String,
    items: Vec<RequisitionItem>,
    estimated_cost: Decimal,
}

impl RequisitionDraft {
    fn price(&self) -> WorkflowResult<PricedDraft> {
        let title = self.title.trim().to_string();
        if title.is_empty() {
            return Err(WorkflowError::validation("title", "must not be empty"));
        }
        let department = self.department.trim().to_string();
        if department.is_empty() {
            return Err(WorkflowError::validation("department", "must not be empty"));
        }
        let items = price_items(self.items.clone())?;
        let estimated_cost = estimated_cost(&items)?;
        Ok(PricedDraft {
            title,
            department,
            items,
            estimated_cost,
        })
    }
}

struct Transition {
    status: RequisitionStatus,
    stage: usize,
    stage_name: Option<String>,
    actor_role: String,
}

/// Applies the requisition approval rules for a configured stage list.
#[derive(Debug, Clone, Copy)]
pub struct RequisitionWorkflow<'a> {
    stages: &'a [RequisitionStageConfig],
    finance_role: &'a str,
}

impl<'a> RequisitionWorkflow<'a> {
    /// Creates a workflow over an already validated stage list.
    pub fn new(stages: &'a [RequisitionStageConfig], finance_role: &'a str) -> Self {
        Self {
            stages,
            finance_role,
        }
    }

    /// Returns the stage names in order.
    pub fn stage_names(&self) -> Vec<&'a str> {
        self.stages.iter().map(|s| s.name.as_str()).collect()
    }

    /// Returns every role that may see requisitions beyond their own.
    pub fn reviewer_roles(&self) -> impl Iterator<Item = &'a str> + 'a {
        self.stages
            .iter()
            .map(|s| s.role.as_str())
            .chain(std::iter::once(self.finance_role))
    }

    /// Creates a new draft requisition owned by `requester`.
    pub fn create_draft(
        &self,
        requester: &User,
        draft: RequisitionDraft,
        now: DateTime<Utc>,
    ) -> WorkflowResult<Requisition> {
        let priced = draft.price()?;
        Ok(Requisition {
            id: Uuid::new_v4(),
            title: priced.title,
            department: priced.department,
            requested_by: requester.id.clone(),
            priority: draft.priority,
            required_date: draft.required_date,
            items: priced.items,
            estimated_cost: priced.estimated_cost,
            actual_cost: None,
            status: RequisitionStatus::Draft,
            approval_stage: 0,
            total_stages: self.stages.len(),
            current_stage_name: None,
            history: Vec::new(),
            created_at: now,
            updated_at: now,
        })
    }

    /// Replaces the editable fields of a draft and recomputes its costs.
    pub fn edit(
        &self,
        requisition: &mut Requisition,
        actor: &User,
        draft: RequisitionDraft,
        now: DateTime<Utc>,
    ) -> WorkflowResult<()> {
        if requisition.status != RequisitionStatus::Draft {
            return Err(invalid_transition("edit", requisition.status));
        }
        if actor.id != requisition.requested_by {
            return Err(not_permitted(actor, "edit", "only the requester may edit"));
        }
        let priced = draft.price()?;

        requisition.title = priced.title;
        requisition.department = priced.department;
        requisition.priority = draft.priority;
        requisition.required_date = draft.required_date;
        requisition.items = priced.items;
        requisition.estimated_cost = priced.estimated_cost;
        requisition.updated_at = now;
        Ok(())
    }

    /// Performs `action` as `actor`, appending one history record.
    ///
    /// Nothing is modified when the action is refused.
    pub fn apply(
        &self,
        requisition: &mut Requisition,
        actor: &User,
        action: ApprovalAction,
        comment: Option<&str>,
        now: DateTime<Utc>,
    ) -> WorkflowResult<()> {
        let transition = self.plan(requisition, actor, action)?;
        let comment = normalize_comment(comment);

        if action == ApprovalAction::Submit {
            requisition.total_stages = self.stages.len();
        }
        requisition.status = transition.status;
        requisition.approval_stage = transition.stage;
        requisition.current_stage_name = transition.stage_name;
        requisition.updated_at = now;
        requisition.history.push(ApprovalRecord {
            actor_id: actor.id.clone(),
            actor_name: actor.full_name(),
            actor_role: transition.actor_role,
            action,
            comment,
            timestamp: now,
            status: transition.status,
        });
        Ok(())
    }

    /// Records what an approved requisition actually cost.
    pub fn record_actual_cost(
        &self,
        requisition: &mut Requisition,
        actor: &User,
        actual_cost: Decimal,
        now: DateTime<Utc>,
    ) -> WorkflowResult<()> {
        const ACTION: &str = "record actual cost";
        if requisition.status != RequisitionStatus::Approved {
            return Err(invalid_transition(ACTION, requisition.status));
        }
        if !actor.has_role(self.finance_role) {
            return Err(not_permitted(
                actor,
                ACTION,
                &format!("requires role '{}'", self.finance_role),
            ));
        }
        if actual_cost < Decimal::ZERO {
            return Err(WorkflowError::validation("actual_cost", "must not be negative"));
        }
        requisition.actual_cost = Some(actual_cost);
        requisition.updated_at = now;
        Ok(())
    }

    /// Lists the actions `user` may take on the requisition right now.
    pub fn available_actions(&self, requisition: &Requisition, user: &User) -> Vec<ApprovalAction> {
        [
            ApprovalAction::Submit,
            ApprovalAction::Approve,
            ApprovalAction::Reject,
            ApprovalAction::Cancel,
        ]
        .into_iter()
        .filter(|action| self.plan(requisition, user, *action).is_ok())
        .collect()
    }

    fn plan(
        &self,
        requisition: &Requisition,
        actor: &User,
        action: ApprovalAction,
    ) -> WorkflowResult<Transition> {
        let status = requisition.status;
        let is_owner = actor.id == requisition.requested_by;

        match action {
            ApprovalAction::Submit => {
                if status != RequisitionStatus::Draft {
                    return Err(invalid_transition(action, status));
                }
                if !is_owner {
                    return Err(not_permitted(actor, action, "only the requester may submit"));
                }
                if requisition.items.is_empty() {
                    return Err(WorkflowError::validation(
                        "items",
                        "at least one item is required to submit",
                    ));
                }
                let first = self.stages.first().ok_or_else(|| WorkflowError::InvalidConfig {
                    message: "requisition approval chain is empty".to_string(),
                })?;
                Ok(Transition {
                    status: RequisitionStatus::Pending,
                    stage: 0,
                    stage_name: Some(first.name.clone()),
                    actor_role: REQUESTER_ROLE.to_string(),
                })
            }
            ApprovalAction::Approve | ApprovalAction::Reject => {
                if status != RequisitionStatus::Pending
                    || requisition.approval_stage >= requisition.total_stages
                {
                    return Err(invalid_transition(action, status));
                }
                let stage = self.stages.get(requisition.approval_stage).ok_or_else(|| {
                    WorkflowError::InvalidConfig {
                        message: format!(
                            "requisition stage {} is not configured",
                            requisition.approval_stage
                        ),
                    }
                })?;
                if is_owner {
                    return Err(not_permitted(
                        actor,
                        action,
                        "requesters cannot decide on their own requisition",
                    ));
                }
                if !actor.has_role(&stage.role) {
                    return Err(not_permitted(
                        actor,
                        action,
                        &format!("requires role '{}'", stage.role),
                    ));
                }

                if action == ApprovalAction::Reject {
                    return Ok(Transition {
                        status: RequisitionStatus::Rejected,
                        stage: requisition.approval_stage,
                        stage_name: None,
                        actor_role: stage.role.clone(),
                    });
                }

                let next = requisition.approval_stage + 1;
                let (status, stage_name) = if next >= requisition.total_stages {
                    (RequisitionStatus::Approved, None)
                } else {
                    (
                        RequisitionStatus::Pending,
                        self.stages.get(next).map(|s| s.name.clone()),
                    )
                };
                Ok(Transition {
                    status,
                    stage: next.min(requisition.total_stages),
                    stage_name,
                    actor_role: stage.role.clone(),
                })
            }
            ApprovalAction::Cancel => {
                if !matches!(status, RequisitionStatus::Draft | RequisitionStatus::Pending) {
                    return Err(invalid_transition(action, status));
                }
                if !is_owner {
                    return Err(not_permitted(actor, action, "only the requester may cancel"));
                }
                Ok(Transition {
                    status: RequisitionStatus::Cancelled,
                    stage: requisition.approval_stage,
                    stage_name: None,
                    actor_role: REQUESTER_ROLE.to_string(),
                })
            }
            ApprovalAction::Resubmit => Err(invalid_transition(action, status)),
        }
    }
}
