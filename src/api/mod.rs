//! HTTP API module for the office workflow service.
//!
//! This module exposes the route guard, menu tree, leave approvals and
//! requisition approvals over REST endpoints.

mod auth;
mod handlers;
mod request;
mod response;
mod state;

pub use auth::{CurrentUser, MaybeUser, USER_ID_HEADER};
pub use handlers::create_router;
pub use request::{
    AccessCheckRequest, ActualCostRequest, ItemRequest, LeaveRequest, ListQuery,
    RequisitionRequest, StatusChangeRequest,
};
pub use response::{ApiError, ApiErrorResponse, ApiSuccess, Envelope};
pub use state::AppState;
