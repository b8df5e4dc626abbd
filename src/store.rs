//! In-memory record store.
//!
//! Holds leave applications and requisitions for the lifetime of the
//! process. Every update runs as a read-modify-write under the write lock, so
//! a workflow check and the mutation it guards happen atomically.

use std::collections::HashMap;

use tokio::sync::RwLock;
use uuid::Uuid;

use crate::error::{WorkflowError, WorkflowResult};
use crate::models::{LeaveApplication, Requisition};

/// Shared storage for workflow records.
#[derive(Debug, Default)]
pub struct Store {
    leaves: RwLock<HashMap<Uuid, LeaveApplication>>,
    requisitions: RwLock<HashMap<Uuid, Requisition>>,
}

impl Store {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a leave application.
    pub async fn insert_leave(&self, application: LeaveApplication) {
        self.leaves.write().await.insert(application.id, application);
    }

    /// Fetches a copy of a leave application.
    pub async fn get_leave(&self, id: Uuid) -> WorkflowResult<LeaveApplication> {
        self.leaves
            .read()
            .await
            .get(&id)
            .cloned()
            .ok_or_else(|| leave_not_found(id))
    }

    /// Lists leave applications matching `filter`, oldest first.
    pub async fn list_leaves<F>(&self, filter: F) -> Vec<LeaveApplication>
    where
        F: Fn(&LeaveApplication) -> bool,
    {
        let mut found: Vec<_> = self
            .leaves
            .read()
            .await
            .values()
            .filter(|l| filter(l))
            .cloned()
            .collect();
        found.sort_by_key(|l| (l.created_at, l.id));
        found
    }

    /// Applies `update` to a leave application and stores the result.
    ///
    /// The stored record is left untouched if `update` fails.
    pub async fn update_leave<F>(&self, id: Uuid, update: F) -> WorkflowResult<LeaveApplication>
    where
        F: FnOnce(&mut LeaveApplication) -> WorkflowResult<()>,
    {
        let mut leaves = self.leaves.write().await;
        let stored = leaves.get_mut(&id).ok_or_else(|| leave_not_found(id))?;
        let mut updated = stored.clone();
        update(&mut updated)?;
        *stored = updated.clone();
        Ok(updated)
    }

    /// Adds a requisition.
    pub async fn insert_requisition(&self, requisition: Requisition) {
        self.requisitions
            .write()
            .await
            .insert(requisition.id, requisition);
    }

    /// Fetches a copy of a requisition.
    pub async fn get_requisition(&self, id: Uuid) -> WorkflowResult<Requisition> {
        self.requisitions
            .read()
            .await
            .get(&id)
            .cloned()
            .ok_or_else(|| requisition_not_found(id))
    }

    /// Lists requisitions matching `filter`, oldest first.
    pub async fn list_requisitions<F>(&self, filter: F) -> Vec<Requisition>
    where
        F: Fn(&Requisition) -> bool,
    {
        let mut found: Vec<_> = self
            .requisitions
            .read()
            .await
            .values()
            .filter(|r| filter(r))
            .cloned()
            .collect();
        found.sort_by_key(|r| (r.created_at, r.id));
        found
    }

    /// Applies `update` to a requisition and stores the result.
    ///
    /// The stored record is left untouched if `update` fails.
    pub async fn update_requisition<F>(&self, id: Uuid, update: F) -> WorkflowResult<Requisition>
    where
        F: FnOnce(&mut Requisition) -> WorkflowResult<()>,
    {
        let mut requisitions = self.requisitions.write().await;
        let stored = requisitions
            .get_mut(&id)
            .ok_or_else(|| requisition_not_found(id))?;
        let mut updated = stored.clone();
        update(&mut updated)?;
        *stored = updated.clone();
        Ok(updated)
    }
}

fn leave_not_found(id: Uuid) -> WorkflowError {
    WorkflowError::NotFound {
        entity: "leave application",
        id: id.to_string(),
    }
}

fn requisition_not_found(id: Uuid) -> WorkflowError {
    WorkflowError::NotFound {
        entity: "requisition",
        id: id.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, Utc};

    use crate::models::{LeaveStatus, LeaveType};

    fn leave(requester: &str) -> LeaveApplication {
        let now = Utc::now();
        LeaveApplication {
            id: Uuid::new_v4(),
            requester_id: requester.to_string(),
            leave_type: LeaveType::Sick,
            start_date: NaiveDate::from_ymd_opt(2026, 5, 4).unwrap(),
            end_date: NaiveDate::from_ymd_opt(2026, 5, 4).unwrap(),
            days: 1,
            reason: String::new(),
            approval_status: LeaveStatus::Draft,
            current_approver_role: None,
            comment: None,
            history: vec![],
            created_at: now,
            updated_at: now,
        }
    }

    #[tokio::test]
    async fn test_insert_and_get_leave() {
        let store = Store::new();
        let l = leave("u-staff");
        store.insert_leave(l.clone()).await;
        assert_eq!(store.get_leave(l.id).await.unwrap(), l);
    }

    #[tokio::test]
    async fn test_get_missing_leave() {
        let store = Store::new();
        let err = store.get_leave(Uuid::nil()).await.unwrap_err();
        assert!(matches!(err, WorkflowError::NotFound { entity: "leave application", .. }));
    }

    #[tokio::test]
    async fn test_failed_update_leaves_record_untouched() {
        let store = Store::new();
        let l = leave("u-staff");
        store.insert_leave(l.clone()).await;

        let result = store
            .update_leave(l.id, |stored| {
                stored.reason = "changed".to_string();
                Err(WorkflowError::validation("reason", "nope"))
            })
            .await;
        assert!(result.is_err());
        assert_eq!(store.get_leave(l.id).await.unwrap().reason, "");
    }

    #[tokio::test]
    async fn test_successful_update_is_stored() {
        let store = Store::new();
        let l = leave("u-staff");
        store.insert_leave(l.clone()).await;

        let updated = store
            .update_leave(l.id, |stored| {
                stored.approval_status = LeaveStatus::Pending;
                Ok(())
            })
            .await
            .unwrap();
        assert_eq!(updated.approval_status, LeaveStatus::Pending);
        assert_eq!(
            store.get_leave(l.id).await.unwrap().approval_status,
            LeaveStatus::Pending
        );
    }

    #[tokio::test]
    async fn test_list_leaves_filters() {
        let store = Store::new();
        store.insert_leave(leave("a")).await;
        store.insert_leave(leave("b")).await;
        store.insert_leave(leave("a")).await;
        let mine = store.list_leaves(|l| l.requester_id == "a").await;
        assert_eq!(mine.len(), 2);
        assert_eq!(store.list_leaves(|_| true).await.len(), 3);
    }

    #[tokio::test]
    async fn test_missing_requisition() {
        let store = Store::new();
        assert!(store.get_requisition(Uuid::new_v4()).await.is_err());
        assert!(store
            .update_requisition(Uuid::new_v4(), |_| Ok(()))
            .await
            .is_err());
    }
}
