//! Leave approval state machine.
//!
//! An application starts as an editable `draft`, is submitted into
//! `pending`, and then climbs the configured approval chain (by default HR
//! Manager, then Admin) until it is `approved`. Any stage approver may reject
//! instead. The requester may cancel while no final decision exists, and may
//! resubmit a rejected application, which restarts the chain from the first
//! stage.

use chrono::{DateTime, NaiveDate, Utc};
use uuid::Uuid;

use crate::config::LeaveStageConfig;
use crate::error::{WorkflowError, WorkflowResult};
use crate::models::{
    ApprovalAction, ApprovalRecord, LeaveApplication, LeaveStatus, LeaveType, REQUESTER_ROLE,
    User, inclusive_days,
};

use super::{invalid_transition, normalize_comment, not_permitted};

/// Requester-editable fields of a leave application.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LeaveDraft {
    /// Kind of leave.
    pub leave_type: LeaveType,
    /// First day (inclusive).
    pub start_date: NaiveDate,
    /// Last day (inclusive).
    pub end_date: NaiveDate,
    /// Free-text reason.
    pub reason: String,
}

impl LeaveDraft {
    fn days(&self) -> WorkflowResult<u32> {
        inclusive_days(self.start_date, self.end_date).ok_or_else(|| {
            WorkflowError::validation("end_date", "cannot be before start_date")
        })
    }
}

#[derive(Debug)]
struct Transition {
    status: LeaveStatus,
    approver: Option<String>,
    actor_role: String,
}

/// Applies the leave approval rules for a configured chain.
#[derive(Debug, Clone, Copy)]
pub struct LeaveWorkflow<'a> {
    stages: &'a [LeaveStageConfig],
}

impl<'a> LeaveWorkflow<'a> {
    /// Creates a workflow over an already validated chain.
    pub fn new(stages: &'a [LeaveStageConfig]) -> Self {
        Self { stages }
    }

    fn first_stage(&self) -> WorkflowResult<&'a LeaveStageConfig> {
        self.stages.first().ok_or_else(|| WorkflowError::InvalidConfig {
            message: "leave approval chain is empty".to_string(),
        })
    }

    fn stage_at(&self, status: LeaveStatus) -> Option<&'a LeaveStageConfig> {
        self.stages.iter().find(|stage| stage.status == status)
    }

    /// Returns every role that approves at some stage.
    pub fn approver_roles(&self) -> impl Iterator<Item = &'a str> + 'a {
        self.stages.iter().map(|stage| stage.role.as_str())
    }

    /// Creates a new draft application owned by `requester`.
    pub fn create_draft(
        &self,
        requester: &User,
        draft: LeaveDraft,
        now: DateTime<Utc>,
    ) -> WorkflowResult<LeaveApplication> {
        let days = draft.days()?;
        Ok(LeaveApplication {
            id: Uuid::new_v4(),
            requester_id: requester.id.clone(),
            leave_type: draft.leave_type,
            start_date: draft.start_date,
            end_date: draft.end_date,
            days,
            reason: draft.reason.trim().to_string(),
            approval_status: LeaveStatus::Draft,
            current_approver_role: None,
            comment: None,
            history: Vec::new(),
            created_at: now,
            updated_at: now,
        })
    }

    /// Replaces the editable fields of a draft. Only the requester may edit.
    pub fn edit(
        &self,
        application: &mut LeaveApplication,
        actor: &User,
        draft: LeaveDraft,
        now: DateTime<Utc>,
    ) -> WorkflowResult<()> {
        if application.approval_status != LeaveStatus::Draft {
            return Err(invalid_transition("edit", application.approval_status));
        }
        if actor.id != application.requester_id {
            return Err(not_permitted(actor, "edit", "only the requester may edit"));
        }
        let days = draft.days()?;

        application.leave_type = draft.leave_type;
        application.start_date = draft.start_date;
        application.end_date = draft.end_date;
        application.days = days;
        application.reason = draft.reason.trim().to_string();
        application.updated_at = now;
        Ok(())
    }

    /// Performs `action` as `actor`, appending one history record.
    ///
    /// Nothing is modified when the action is refused.
    ///
    /// # Examples
    ///
    /// ```
    /// use chrono::{NaiveDate, Utc};
    /// use office_workflow::config::WorkflowSettings;
    /// use office_workflow::models::{ApprovalAction, LeaveStatus, LeaveType, User};
    /// use office_workflow::workflow::{LeaveDraft, LeaveWorkflow};
    ///
    /// fn user(id: &str, roles: &[&str]) -> User {
    ///     User {
    ///         id: id.to_string(),
    ///         first_name: id.to_string(),
    ///         last_name: String::new(),
    ///         email: format!("{}@ghf.org", id),
    ///         roles: roles.iter().map(|r| r.to_string()).collect(),
    ///         permissions: vec![],
    ///     }
    /// }
    ///
    /// let settings = WorkflowSettings::default();
    /// let workflow = LeaveWorkflow::new(&settings.leave_stages);
    /// let staff = user("staff", &[]);
    /// let hr = user("hr", &["HR Manager"]);
    ///
    /// let draft = LeaveDraft {
    ///     leave_type: LeaveType::Annual,
    ///     start_date: NaiveDate::from_ymd_opt(2026, 3, 2).unwrap(),
    ///     end_date: NaiveDate::from_ymd_opt(2026, 3, 6).unwrap(),
    ///     reason: "Family visit".to_string(),
    /// };
    /// let mut leave = workflow.create_draft(&staff, draft, Utc::now()).unwrap();
    /// workflow.apply(&mut leave, &staff, ApprovalAction::Submit, None, Utc::now()).unwrap();
    /// workflow.apply(&mut leave, &hr, ApprovalAction::Approve, Some("ok"), Utc::now()).unwrap();
    ///
    /// assert_eq!(leave.approval_status, LeaveStatus::ApprovedByHr);
    /// assert_eq!(leave.current_approver_role.as_deref(), Some("Admin"));
    /// ```
    pub fn apply(
        &self,
        application: &mut LeaveApplication,
        actor: &User,
        action: ApprovalAction,
        comment: Option<&str>,
        now: DateTime<Utc>,
    ) -> WorkflowResult<()> {
        let transition = self.plan(application, actor, action)?;
        let comment = normalize_comment(comment);

        application.approval_status = transition.status;
        application.current_approver_role = transition.approver;
        application.comment = comment.clone();
        application.updated_at = now;
        application.history.push(ApprovalRecord {
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

    /// Submits a draft to the first approver.
    pub fn submit(
        &self,
        application: &mut LeaveApplication,
        actor: &User,
        comment: Option<&str>,
        now: DateTime<Utc>,
    ) -> WorkflowResult<()> {
        self.apply(application, actor, ApprovalAction::Submit, comment, now)
    }

    /// Signs off the stage the application is waiting at.
    pub fn approve(
        &self,
        application: &mut LeaveApplication,
        actor: &User,
        comment: Option<&str>,
        now: DateTime<Utc>,
    ) -> WorkflowResult<()> {
        self.apply(application, actor, ApprovalAction::Approve, comment, now)
    }

    /// Refuses at the stage the application is waiting at.
    pub fn reject(
        &self,
        application: &mut LeaveApplication,
        actor: &User,
        comment: Option<&str>,
        now: DateTime<Utc>,
    ) -> WorkflowResult<()> {
        self.apply(application, actor, ApprovalAction::Reject, comment, now)
    }

    /// Withdraws an application that has no final decision yet.
    pub fn cancel(
        &self,
        application: &mut LeaveApplication,
        actor: &User,
        comment: Option<&str>,
        now: DateTime<Utc>,
    ) -> WorkflowResult<()> {
        self.apply(application, actor, ApprovalAction::Cancel, comment, now)
    }

    /// Puts a rejected application back at the start of the chain.
    pub fn resubmit(
        &self,
        application: &mut LeaveApplication,
        actor: &User,
        comment: Option<&str>,
        now: DateTime<Utc>,
    ) -> WorkflowResult<()> {
        self.apply(application, actor, ApprovalAction::Resubmit, comment, now)
    }

    /// Lists the actions `user` may take on the application right now.
    pub fn available_actions(
        &self,
        application: &LeaveApplication,
        user: &User,
    ) -> Vec<ApprovalAction> {
        [
            ApprovalAction::Submit,
            ApprovalAction::Approve,
            ApprovalAction::Reject,
            ApprovalAction::Cancel,
            ApprovalAction::Resubmit,
        ]
        .into_iter()
        .filter(|action| self.plan(application, user, *action).is_ok())
        .collect()
    }

    fn plan(
        &self,
        application: &LeaveApplication,
        actor: &User,
        action: ApprovalAction,
    ) -> WorkflowResult<Transition> {
        let status = application.approval_status;
        let is_owner = actor.id == application.requester_id;

        match action {
            ApprovalAction::Submit | ApprovalAction::Resubmit => {
                let from = match action {
                    ApprovalAction::Submit => LeaveStatus::Draft,
                    _ => LeaveStatus::Rejected,
                };
                if status != from {
                    return Err(invalid_transition(action, status));
                }
                if !is_owner {
                    return Err(not_permitted(
                        actor,
                        action,
                        &format!("only the requester may {}", action),
                    ));
                }
                let first = self.first_stage()?;
                Ok(Transition {
                    status: first.status,
                    approver: Some(first.role.clone()),
                    actor_role: REQUESTER_ROLE.to_string(),
                })
            }
            ApprovalAction::Approve | ApprovalAction::Reject => {
                let stage = self
                    .stage_at(status)
                    .ok_or_else(|| invalid_transition(action, status))?;
                if is_owner {
                    return Err(not_permitted(
                        actor,
                        action,
                        "requesters cannot decide on their own leave",
                    ));
                }
                if !actor.has_role(&stage.role) {
                    return Err(not_permitted(
                        actor,
                        action,
                        &format!("requires role '{}'", stage.role),
                    ));
                }
                let (next, approver) = match action {
                    ApprovalAction::Approve => (
                        stage.next,
                        self.stage_at(stage.next).map(|s| s.role.clone()),
                    ),
                    _ => (LeaveStatus::Rejected, None),
                };
                Ok(Transition {
                    status: next,
                    approver,
                    actor_role: stage.role.clone(),
                })
            }
            ApprovalAction::Cancel => {
                if status.is_terminal() {
                    return Err(invalid_transition(action, status));
                }
                if !is_owner {
                    return Err(not_permitted(
                        actor,
                        action,
                        "only the requester may cancel",
                    ));
                }
                Ok(Transition {
                    status: LeaveStatus::Cancelled,
                    approver: None,
                    actor_role: REQUESTER_ROLE.to_string(),
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::WorkflowSettings;

    fn user(id: &str, roles: &[&str]) -> User {
        User {
            id: id.to_string(),
            first_name: id.to_string(),
            last_name: "Tester".to_string(),
            email: format!("{}@ghf.org", id),
            roles: roles.iter().map(|r| r.to_string()).collect(),
            permissions: vec![],
        }
    }

    fn now() -> DateTime<Utc> {
        DateTime::parse_from_rfc3339("2026-02-10T09:30:00Z")
            .unwrap()
            .with_timezone(&Utc)
    }

    fn draft() -> LeaveDraft {
        LeaveDraft {
            leave_type: LeaveType::Annual,
            start_date: NaiveDate::from_ymd_opt(2026, 3, 2).unwrap(),
            end_date: NaiveDate::from_ymd_opt(2026, 3, 6).unwrap(),
            reason: " Family visit ".to_string(),
        }
    }

    struct Fixture {
        settings: WorkflowSettings,
        staff: User,
        hr: User,
        admin: User,
    }

    impl Fixture {
        fn new() -> Self {
            Self {
                settings: WorkflowSettings::default(),
                staff: user("staff", &["Staff"]),
                hr: user("hr", &["HR Manager"]),
                admin: user("admin", &["Admin"]),
            }
        }

        fn workflow(&self) -> LeaveWorkflow<'_> {
            LeaveWorkflow::new(&self.settings.leave_stages)
        }

        fn pending(&self) -> LeaveApplication {
            let wf = self.workflow();
            let mut leave = wf.create_draft(&self.staff, draft(), now()).unwrap();
            wf.submit(&mut leave, &self.staff, None, now()).unwrap();
            leave
        }
    }

    #[test]
    fn test_create_draft_counts_days_and_trims_reason() {
        let f = Fixture::new();
        let leave = f.workflow().create_draft(&f.staff, draft(), now()).unwrap();
        assert_eq!(leave.approval_status, LeaveStatus::Draft);
        assert_eq!(leave.days, 5);
        assert_eq!(leave.reason, "Family visit");
        assert_eq!(leave.requester_id, "staff");
        assert!(leave.current_approver_role.is_none());
        assert!(leave.history.is_empty());
    }

    #[test]
    fn test_create_draft_rejects_inverted_dates() {
        let f = Fixture::new();
        let mut d = draft();
        d.end_date = NaiveDate::from_ymd_opt(2026, 3, 1).unwrap();
        let err = f.workflow().create_draft(&f.staff, d, now()).unwrap_err();
        assert!(matches!(err, WorkflowError::Validation { ref field, .. } if field == "end_date"));
    }

    #[test]
    fn test_submit_moves_to_pending_with_hr_approver() {
        let f = Fixture::new();
        let leave = f.pending();
        assert_eq!(leave.approval_status, LeaveStatus::Pending);
        assert_eq!(leave.current_approver_role.as_deref(), Some("HR Manager"));
        assert_eq!(leave.history.len(), 1);
        assert_eq!(leave.history[0].action, ApprovalAction::Submit);
        assert_eq!(leave.history[0].actor_role, REQUESTER_ROLE);
    }

    #[test]
    fn test_hr_approval_records_history() {
        let f = Fixture::new();
        let mut leave = f.pending();
        f.workflow()
            .approve(&mut leave, &f.hr, Some("ok"), now())
            .unwrap();

        assert_eq!(leave.approval_status, LeaveStatus::ApprovedByHr);
        assert_eq!(leave.current_approver_role.as_deref(), Some("Admin"));
        assert_eq!(leave.comment.as_deref(), Some("ok"));
        let last = leave.history.last().unwrap();
        assert_eq!(last.actor_id, "hr");
        assert_eq!(last.actor_role, "HR Manager");
        assert_eq!(last.action, ApprovalAction::Approve);
        assert_eq!(last.comment.as_deref(), Some("ok"));
        assert_eq!(last.status, LeaveStatus::ApprovedByHr);
        assert_eq!(last.timestamp, now());
    }

    #[test]
    fn test_admin_final_approval() {
        let f = Fixture::new();
        let wf = f.workflow();
        let mut leave = f.pending();
        wf.approve(&mut leave, &f.hr, None, now()).unwrap();
        wf.approve(&mut leave, &f.admin, None, now()).unwrap();
        assert_eq!(leave.approval_status, LeaveStatus::Approved);
        assert!(leave.current_approver_role.is_none());
        assert_eq!(leave.history.len(), 3);
    }

    #[test]
    fn test_admin_cannot_act_on_pending_leave() {
        let f = Fixture::new();
        let mut leave = f.pending();
        let before = leave.clone();
        let err = f
            .workflow()
            .approve(&mut leave, &f.admin, None, now())
            .unwrap_err();
        assert!(matches!(err, WorkflowError::NotPermitted { .. }));
        assert_eq!(leave, before);
        assert!(f.workflow().reject(&mut leave, &f.admin, None, now()).is_err());
    }

    #[test]
    fn test_hr_cannot_give_final_approval() {
        let f = Fixture::new();
        let wf = f.workflow();
        let mut leave = f.pending();
        wf.approve(&mut leave, &f.hr, None, now()).unwrap();
        let err = wf.approve(&mut leave, &f.hr, None, now()).unwrap_err();
        assert!(err.to_string().contains("requires role 'Admin'"));
        assert_eq!(leave.approval_status, LeaveStatus::ApprovedByHr);
    }

    #[test]
    fn test_admin_may_reject_after_hr() {
        let f = Fixture::new();
        let wf = f.workflow();
        let mut leave = f.pending();
        wf.approve(&mut leave, &f.hr, None, now()).unwrap();
        wf.reject(&mut leave, &f.admin, Some("busy season"), now())
            .unwrap();
        assert_eq!(leave.approval_status, LeaveStatus::Rejected);
        assert!(leave.current_approver_role.is_none());
    }

    #[test]
    fn test_requester_cannot_approve_own_leave() {
        let f = Fixture::new();
        let wf = f.workflow();
        let hr_requester = user("hr2", &["HR Manager"]);
        let mut leave = wf.create_draft(&hr_requester, draft(), now()).unwrap();
        wf.submit(&mut leave, &hr_requester, None, now()).unwrap();
        let err = wf.approve(&mut leave, &hr_requester, None, now()).unwrap_err();
        assert!(err.to_string().contains("own leave"));
    }

    #[test]
    fn test_only_requester_submits() {
        let f = Fixture::new();
        let wf = f.workflow();
        let mut leave = wf.create_draft(&f.staff, draft(), now()).unwrap();
        assert!(matches!(
            wf.submit(&mut leave, &f.hr, None, now()),
            Err(WorkflowError::NotPermitted { .. })
        ));
    }

    #[test]
    fn test_submit_twice_is_invalid() {
        let f = Fixture::new();
        let mut leave = f.pending();
        assert!(matches!(
            f.workflow().submit(&mut leave, &f.staff, None, now()),
            Err(WorkflowError::InvalidTransition { .. })
        ));
    }

    #[test]
    fn test_cannot_approve_draft() {
        let f = Fixture::new();
        let wf = f.workflow();
        let mut leave = wf.create_draft(&f.staff, draft(), now()).unwrap();
        let err = wf.approve(&mut leave, &f.hr, None, now()).unwrap_err();
        assert_eq!(err.to_string(), "Cannot approve when status is 'draft'");
    }

    #[test]
    fn test_resubmit_restarts_chain() {
        let f = Fixture::new();
        let wf = f.workflow();
        let mut leave = f.pending();
        wf.approve(&mut leave, &f.hr, None, now()).unwrap();
        wf.reject(&mut leave, &f.admin, None, now()).unwrap();
        wf.resubmit(&mut leave, &f.staff, Some("dates moved"), now())
            .unwrap();

        assert_eq!(leave.approval_status, LeaveStatus::Pending);
        assert_eq!(leave.current_approver_role.as_deref(), Some("HR Manager"));
        assert_eq!(leave.history.len(), 4);
        assert_eq!(leave.history[3].action, ApprovalAction::Resubmit);
    }

    #[test]
    fn test_only_requester_resubmits() {
        let f = Fixture::new();
        let wf = f.workflow();
        let mut leave = f.pending();
        wf.reject(&mut leave, &f.hr, None, now()).unwrap();

        let err = wf.resubmit(&mut leave, &f.hr, None, now()).unwrap_err();
        assert!(matches!(err, WorkflowError::NotPermitted { .. }));
        assert!(err.to_string().ends_with("only the requester may resubmit"));
        assert_eq!(leave.approval_status, LeaveStatus::Rejected);
    }

    #[test]
    fn test_resubmit_only_from_rejected() {
        let f = Fixture::new();
        let mut leave = f.pending();
        assert!(f
            .workflow()
            .resubmit(&mut leave, &f.staff, None, now())
            .is_err());
    }

    #[test]
    fn test_cancel_by_requester_from_non_terminal() {
        let f = Fixture::new();
        let wf = f.workflow();
        let mut leave = f.pending();
        wf.approve(&mut leave, &f.hr, None, now()).unwrap();
        wf.cancel(&mut leave, &f.staff, None, now()).unwrap();
        assert_eq!(leave.approval_status, LeaveStatus::Cancelled);
        assert!(wf.cancel(&mut leave, &f.staff, None, now()).is_err());
        assert!(wf.resubmit(&mut leave, &f.staff, None, now()).is_err());
    }

    #[test]
    fn test_cancel_by_other_user_refused() {
        let f = Fixture::new();
        let mut leave = f.pending();
        assert!(matches!(
            f.workflow().cancel(&mut leave, &f.admin, None, now()),
            Err(WorkflowError::NotPermitted { .. })
        ));
    }

    #[test]
    fn test_edit_only_in_draft() {
        let f = Fixture::new();
        let wf = f.workflow();
        let mut leave = wf.create_draft(&f.staff, draft(), now()).unwrap();
        let mut changed = draft();
        changed.leave_type = LeaveType::Sick;
        changed.end_date = NaiveDate::from_ymd_opt(2026, 3, 3).unwrap();
        wf.edit(&mut leave, &f.staff, changed.clone(), now()).unwrap();
        assert_eq!(leave.leave_type, LeaveType::Sick);
        assert_eq!(leave.days, 2);

        assert!(wf.edit(&mut leave, &f.hr, changed.clone(), now()).is_err());
        wf.submit(&mut leave, &f.staff, None, now()).unwrap();
        assert!(matches!(
            wf.edit(&mut leave, &f.staff, changed, now()),
            Err(WorkflowError::InvalidTransition { .. })
        ));
    }

    #[test]
    fn test_blank_comment_is_dropped() {
        let f = Fixture::new();
        let mut leave = f.pending();
        f.workflow()
            .approve(&mut leave, &f.hr, Some("   "), now())
            .unwrap();
        assert!(leave.comment.is_none());
        assert!(leave.history.last().unwrap().comment.is_none());
    }

    #[test]
    fn test_available_actions_per_actor() {
        let f = Fixture::new();
        let wf = f.workflow();
        let leave = f.pending();
        assert_eq!(
            wf.available_actions(&leave, &f.hr),
            vec![ApprovalAction::Approve, ApprovalAction::Reject]
        );
        assert_eq!(
            wf.available_actions(&leave, &f.staff),
            vec![ApprovalAction::Cancel]
        );
        assert!(wf.available_actions(&leave, &f.admin).is_empty());
    }

    #[test]
    fn test_single_stage_chain_goes_straight_to_approved() {
        let stages = vec![LeaveStageConfig {
            status: LeaveStatus::Pending,
            role: "Admin".to_string(),
            next: LeaveStatus::Approved,
        }];
        let wf = LeaveWorkflow::new(&stages);
        let staff = user("staff", &[]);
        let admin = user("admin", &["Admin"]);
        let mut leave = wf.create_draft(&staff, draft(), now()).unwrap();
        wf.submit(&mut leave, &staff, None, now()).unwrap();
        assert_eq!(leave.current_approver_role.as_deref(), Some("Admin"));
        wf.approve(&mut leave, &admin, None, now()).unwrap();
        assert_eq!(leave.approval_status, LeaveStatus::Approved);
    }
}
