//! HTTP request handlers for the office workflow API.
//!
//! This module contains the handler functions for all API endpoints. Every
//! mutation goes through the workflow rules, so status and role checks are
//! enforced here regardless of what the client chose to display.

use axum::{
    Json, Router,
    extract::{Path, Query, State, rejection::JsonRejection},
    routing::{get, patch, post},
};
use chrono::Utc;
use tracing::{info, warn};
use uuid::Uuid;

use crate::access::{AccessDecision, MenuNode};
use crate::error::WorkflowError;
use crate::models::{
    ApprovalAction, LeaveApplication, LeaveStatus, Requisition, RequisitionStatus, User,
};

use super::auth::{CurrentUser, MaybeUser};
use super::request::{
    AccessCheckRequest, ActualCostRequest, LeaveRequest, ListQuery, RequisitionRequest,
    StatusChangeRequest,
};
use super::response::{ApiError, ApiErrorResponse, ApiSuccess};
use super::state::AppState;

type ApiResult<T> = Result<ApiSuccess<T>, ApiErrorResponse>;

/// Creates the API router with all endpoints.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .route("/me", get(me_handler))
        .route("/access/check", post(access_check_handler))
        .route("/menus", get(menus_handler))
        .route(
            "/leaves",
            get(list_leaves_handler).post(create_leave_handler),
        )
        .route(
            "/leaves/:id",
            get(get_leave_handler).patch(update_leave_handler),
        )
        .route("/leaves/:id/actions", get(leave_actions_handler))
        .route("/leaves/:id/status", patch(change_leave_status_handler))
        .route(
            "/requisitions",
            get(list_requisitions_handler).post(create_requisition_handler),
        )
        .route(
            "/requisitions/:id",
            get(get_requisition_handler).patch(update_requisition_handler),
        )
        .route(
            "/requisitions/:id/actions",
            get(requisition_actions_handler),
        )
        .route(
            "/requisitions/:id/status",
            patch(change_requisition_status_handler),
        )
        .route(
            "/requisitions/:id/actual-cost",
            patch(record_actual_cost_handler),
        )
        .with_state(state)
}

/// Unwraps a JSON body, turning extractor rejections into envelope errors.
fn parse_json<T>(
    payload: Result<Json<T>, JsonRejection>,
    correlation_id: Uuid,
) -> Result<T, ApiErrorResponse> {
    match payload {
        Ok(Json(body)) => Ok(body),
        Err(rejection) => {
            let error = match rejection {
                JsonRejection::JsonDataError(err) => {
                    let body_text = err.body_text();
                    warn!(
                        correlation_id = %correlation_id,
                        error = %body_text,
                        "JSON data error"
                    );
                    if body_text.contains("missing field") {
                        ApiError::validation_error(body_text)
                    } else {
                        ApiError::malformed_json(body_text)
                    }
                }
                JsonRejection::JsonSyntaxError(err) => {
                    warn!(
                        correlation_id = %correlation_id,
                        error = %err,
                        "JSON syntax error"
                    );
                    ApiError::malformed_json(format!("Invalid JSON syntax: {}", err))
                }
                JsonRejection::MissingJsonContentType(_) => {
                    ApiError::new("MISSING_CONTENT_TYPE", "Content-Type must be application/json")
                }
                _ => ApiError::malformed_json("Failed to parse request body"),
            };
            Err(ApiErrorResponse::bad_request(error))
        }
    }
}

fn parse_id(raw: &str) -> Result<Uuid, ApiErrorResponse> {
    Uuid::parse_str(raw).map_err(|_| {
        ApiErrorResponse::bad_request(ApiError::validation_error(format!(
            "'{}' is not a valid id",
            raw
        )))
    })
}

fn parse_status<S>(raw: Option<&str>) -> Result<Option<S>, ApiErrorResponse>
where
    S: std::str::FromStr<Err = String>,
{
    raw.map(str::parse)
        .transpose()
        .map_err(|message| ApiErrorResponse::bad_request(ApiError::validation_error(message)))
}

fn holds_any<'a>(user: &User, mut roles: impl Iterator<Item = &'a str>) -> bool {
    roles.any(|role| user.has_role(role))
}

fn can_view_leave(state: &AppState, user: &User, leave: &LeaveApplication) -> bool {
    leave.requester_id == user.id
        || holds_any(user, state.config().leave_workflow().approver_roles())
}

fn can_view_requisition(state: &AppState, user: &User, requisition: &Requisition) -> bool {
    requisition.requested_by == user.id
        || holds_any(user, state.config().requisition_workflow().reviewer_roles())
}

fn view_denied(user: &User, what: &str) -> WorkflowError {
    WorkflowError::NotPermitted {
        actor: user.id.clone(),
        action: format!("view this {}", what),
        reason: "not the requester or a reviewer".to_string(),
    }
}

/// Handler for GET /health.
async fn health_handler() -> ApiResult<serde_json::Value> {
    Ok(ApiSuccess::ok(
        serde_json::json!({ "status": "ok", "version": env!("CARGO_PKG_VERSION") }),
        "Service healthy",
    ))
}

/// Handler for GET /me.
async fn me_handler(CurrentUser(user): CurrentUser) -> ApiResult<User> {
    Ok(ApiSuccess::ok(user, "Current user"))
}

/// Handler for POST /access/check.
///
/// Works without an `X-User-Id` header so clients can evaluate routes for
/// anonymous visitors.
async fn access_check_handler(
    State(state): State<AppState>,
    MaybeUser(user): MaybeUser,
    payload: Result<Json<AccessCheckRequest>, JsonRejection>,
) -> ApiResult<AccessDecision> {
    let correlation_id = Uuid::new_v4();
    let request = parse_json(payload, correlation_id)?;

    let decision = state
        .config()
        .route_guard()
        .evaluate(&request.path, user.as_ref());
    info!(
        correlation_id = %correlation_id,
        path = %request.path,
        user_id = user.as_ref().map(|u| u.id.as_str()).unwrap_or("anonymous"),
        allowed = decision.is_allowed(),
        "Route access evaluated"
    );

    let message = match &decision {
        AccessDecision::Allow => "Access granted",
        AccessDecision::RedirectToLogin { .. } => "Login required",
        AccessDecision::RedirectToUnauthorized { .. } => "Access denied",
    };
    Ok(ApiSuccess::ok(decision, message))
}

/// Handler for GET /menus.
async fn menus_handler(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> ApiResult<Vec<MenuNode>> {
    let menus = state.config().menus().visible_for(&user);
    Ok(ApiSuccess::ok(menus, "Menus loaded"))
}

/// Handler for GET /leaves.
///
/// Requesters see their own applications; holders of an approver role see
/// every application.
async fn list_leaves_handler(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Query(query): Query<ListQuery>,
) -> ApiResult<Vec<LeaveApplication>> {
    let status: Option<LeaveStatus> = parse_status(query.status.as_deref())?;
    let leaves = state
        .store()
        .list_leaves(|leave| {
            can_view_leave(&state, &user, leave)
                && status.is_none_or(|s| leave.approval_status == s)
        })
        .await;
    Ok(ApiSuccess::ok(leaves, "Leave applications loaded"))
}

/// Handler for POST /leaves.
async fn create_leave_handler(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    payload: Result<Json<LeaveRequest>, JsonRejection>,
) -> ApiResult<LeaveApplication> {
    let correlation_id = Uuid::new_v4();
    let request = parse_json(payload, correlation_id)?;
    let submit = request.submit;
    let now = Utc::now();

    let workflow = state.config().leave_workflow();
    let mut leave = workflow.create_draft(&user, request.into(), now)?;
    if submit {
        workflow.submit(&mut leave, &user, None, now)?;
    }
    state.store().insert_leave(leave.clone()).await;

    info!(
        correlation_id = %correlation_id,
        leave_id = %leave.id,
        requester = %user.id,
        status = %leave.approval_status,
        days = leave.days,
        "Leave application created"
    );
    let message = if submit {
        "Leave request submitted"
    } else {
        "Leave draft saved"
    };
    Ok(ApiSuccess::created(leave, message))
}

/// Handler for GET /leaves/:id.
async fn get_leave_handler(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<String>,
) -> ApiResult<LeaveApplication> {
    let leave = state.store().get_leave(parse_id(&id)?).await?;
    if !can_view_leave(&state, &user, &leave) {
        return Err(view_denied(&user, "leave application").into());
    }
    Ok(ApiSuccess::ok(leave, "Leave application loaded"))
}

/// Handler for PATCH /leaves/:id.
async fn update_leave_handler(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<String>,
    payload: Result<Json<LeaveRequest>, JsonRejection>,
) -> ApiResult<LeaveApplication> {
    let correlation_id = Uuid::new_v4();
    let id = parse_id(&id)?;
    let request = parse_json(payload, correlation_id)?;

    let workflow = state.config().leave_workflow();
    let leave = state
        .store()
        .update_leave(id, |leave| {
            if !can_view_leave(&state, &user, leave) {
                return Err(view_denied(&user, "leave application"));
            }
            workflow.edit(leave, &user, request.into(), Utc::now())
        })
        .await?;

    info!(correlation_id = %correlation_id, leave_id = %id, "Leave draft updated");
    Ok(ApiSuccess::ok(leave, "Leave draft updated"))
}

/// Handler for GET /leaves/:id/actions.
async fn leave_actions_handler(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<String>,
) -> ApiResult<Vec<ApprovalAction>> {
    let leave = state.store().get_leave(parse_id(&id)?).await?;
    if !can_view_leave(&state, &user, &leave) {
        return Err(view_denied(&user, "leave application").into());
    }
    let actions = state.config().leave_workflow().available_actions(&leave, &user);
    Ok(ApiSuccess::ok(actions, "Available actions"))
}

/// Handler for PATCH /leaves/:id/status.
async fn change_leave_status_handler(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<String>,
    payload: Result<Json<StatusChangeRequest>, JsonRejection>,
) -> ApiResult<LeaveApplication> {
    let correlation_id = Uuid::new_v4();
    let id = parse_id(&id)?;
    let request = parse_json(payload, correlation_id)?;

    let workflow = state.config().leave_workflow();
    let result = state
        .store()
        .update_leave(id, |leave| {
            if !can_view_leave(&state, &user, leave) {
                return Err(view_denied(&user, "leave application"));
            }
            workflow.apply(
                leave,
                &user,
                request.action,
                request.comment.as_deref(),
                Utc::now(),
            )
        })
        .await;

    match result {
        Ok(leave) => {
            info!(
                correlation_id = %correlation_id,
                leave_id = %id,
                actor = %user.id,
                action = %request.action,
                status = %leave.approval_status,
                "Leave status changed"
            );
            let message = format!("Leave application is now {}", leave.approval_status);
            Ok(ApiSuccess::ok(leave, message))
        }
        Err(err) => {
            warn!(
                correlation_id = %correlation_id,
                leave_id = %id,
                actor = %user.id,
                action = %request.action,
                error = %err,
                "Leave status change refused"
            );
            Err(err.into())
        }
    }
}

/// Handler for GET /requisitions.
async fn list_requisitions_handler(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Query(query): Query<ListQuery>,
) -> ApiResult<Vec<Requisition>> {
    let status: Option<RequisitionStatus> = parse_status(query.status.as_deref())?;
    let requisitions = state
        .store()
        .list_requisitions(|req| {
            can_view_requisition(&state, &user, req) && status.is_none_or(|s| req.status == s)
        })
        .await;
    Ok(ApiSuccess::ok(requisitions, "Requisitions loaded"))
}

/// Handler for POST /requisitions.
async fn create_requisition_handler(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    payload: Result<Json<RequisitionRequest>, JsonRejection>,
) -> ApiResult<Requisition> {
    let correlation_id = Uuid::new_v4();
    let request = parse_json(payload, correlation_id)?;
    let submit = request.submit;
    let now = Utc::now();

    let workflow = state.config().requisition_workflow();
    let mut requisition = workflow.create_draft(&user, request.into(), now)?;
    if submit {
        workflow.apply(&mut requisition, &user, ApprovalAction::Submit, None, now)?;
    }
    state.store().insert_requisition(requisition.clone()).await;

    info!(
        correlation_id = %correlation_id,
        requisition_id = %requisition.id,
        requester = %user.id,
        status = %requisition.status,
        estimated_cost = %requisition.estimated_cost,
        "Requisition created"
    );
    let message = if submit {
        "Requisition submitted"
    } else {
        "Requisition draft saved"
    };
    Ok(ApiSuccess::created(requisition, message))
}

/// Handler for GET /requisitions/:id.
async fn get_requisition_handler(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<String>,
) -> ApiResult<Requisition> {
    let requisition = state.store().get_requisition(parse_id(&id)?).await?;
    if !can_view_requisition(&state, &user, &requisition) {
        return Err(view_denied(&user, "requisition").into());
    }
    Ok(ApiSuccess::ok(requisition, "Requisition loaded"))
}

/// Handler for PATCH /requisitions/:id.
async fn update_requisition_handler(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<String>,
    payload: Result<Json<RequisitionRequest>, JsonRejection>,
) -> ApiResult<Requisition> {
    let correlation_id = Uuid::new_v4();
    let id = parse_id(&id)?;
    let request = parse_json(payload, correlation_id)?;

    let workflow = state.config().requisition_workflow();
    let requisition = state
        .store()
        .update_requisition(id, |req| {
            if !can_view_requisition(&state, &user, req) {
                return Err(view_denied(&user, "requisition"));
            }
            workflow.edit(req, &user, request.into(), Utc::now())
        })
        .await?;

    info!(
        correlation_id = %correlation_id,
        requisition_id = %id,
        estimated_cost = %requisition.estimated_cost,
        "Requisition draft updated"
    );
    Ok(ApiSuccess::ok(requisition, "Requisition draft updated"))
}

/// Handler for GET /requisitions/:id/actions.
async fn requisition_actions_handler(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<String>,
) -> ApiResult<Vec<ApprovalAction>> {
    let requisition = state.store().get_requisition(parse_id(&id)?).await?;
    if !can_view_requisition(&state, &user, &requisition) {
        return Err(view_denied(&user, "requisition").into());
    }
    let actions = state
        .config()
        .requisition_workflow()
        .available_actions(&requisition, &user);
    Ok(ApiSuccess::ok(actions, "Available actions"))
}

/// Handler for PATCH /requisitions/:id/status.
async fn change_requisition_status_handler(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<String>,
    payload: Result<Json<StatusChangeRequest>, JsonRejection>,
) -> ApiResult<Requisition> {
    let correlation_id = Uuid::new_v4();
    let id = parse_id(&id)?;
    let request = parse_json(payload, correlation_id)?;

    let workflow = state.config().requisition_workflow();
    let result = state
        .store()
        .update_requisition(id, |req| {
            if !can_view_requisition(&state, &user, req) {
                return Err(view_denied(&user, "requisition"));
            }
            workflow.apply(
                req,
                &user,
                request.action,
                request.comment.as_deref(),
                Utc::now(),
            )
        })
        .await;

    match result {
        Ok(requisition) => {
            info!(
                correlation_id = %correlation_id,
                requisition_id = %id,
                actor = %user.id,
                action = %request.action,
                status = %requisition.status,
                approval_stage = requisition.approval_stage,
                "Requisition status changed"
            );
            let message = match &requisition.current_stage_name {
                Some(stage) => format!("Requisition awaiting {}", stage),
                None => format!("Requisition is now {}", requisition.status),
            };
            Ok(ApiSuccess::ok(requisition, message))
        }
        Err(err) => {
            warn!(
                correlation_id = %correlation_id,
                requisition_id = %id,
                actor = %user.id,
                action = %request.action,
                error = %err,
                "Requisition status change refused"
            );
            Err(err.into())
        }
    }
}

/// Handler for PATCH /requisitions/:id/actual-cost.
async fn record_actual_cost_handler(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<String>,
    payload: Result<Json<ActualCostRequest>, JsonRejection>,
) -> ApiResult<Requisition> {
    let correlation_id = Uuid::new_v4();
    let id = parse_id(&id)?;
    let request = parse_json(payload, correlation_id)?;

    let workflow = state.config().requisition_workflow();
    let requisition = state
        .store()
        .update_requisition(id, |req| {
            if !can_view_requisition(&state, &user, req) {
                return Err(view_denied(&user, "requisition"));
            }
            workflow.record_actual_cost(req, &user, request.actual_cost, Utc::now())
        })
        .await?;

    info!(
        correlation_id = %correlation_id,
        requisition_id = %id,
        actual_cost = %request.actual_cost,
        "Requisition actual cost recorded"
    );
    Ok(ApiSuccess::ok(requisition, "Actual cost recorded"))
}
