//! Acting-user extraction.
//!
//! Authentication happens upstream; requests reach this service with the
//! authenticated user's id in the `X-User-Id` header. The id is resolved
//! against the configured directory to obtain roles and permissions.

use axum::{async_trait, extract::FromRequestParts, http::request::Parts};
use tracing::warn;

use crate::models::User;

use super::response::ApiErrorResponse;
use super::state::AppState;

/// Header carrying the authenticated user's id.
pub const USER_ID_HEADER: &str = "x-user-id";

/// The authenticated user making the request.
#[derive(Debug, Clone)]
pub struct CurrentUser(pub User);

/// The user making the request, if any.
#[derive(Debug, Clone)]
pub struct MaybeUser(pub Option<User>);

fn header_user_id(parts: &Parts) -> Result<Option<&str>, ApiErrorResponse> {
    match parts.headers.get(USER_ID_HEADER) {
        None => Ok(None),
        Some(value) => value
            .to_str()
            .map(|v| Some(v.trim()).filter(|v| !v.is_empty()))
            .map_err(|_| ApiErrorResponse::unauthorized("Invalid X-User-Id header encoding")),
    }
}

fn resolve(state: &AppState, user_id: &str) -> Result<User, ApiErrorResponse> {
    state.config().get_user(user_id).cloned().map_err(|err| {
        warn!(user_id = %user_id, "Unknown user in X-User-Id header");
        ApiErrorResponse::from(err)
    })
}

#[async_trait]
impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = ApiErrorResponse;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let user_id = header_user_id(parts)?
            .ok_or_else(|| ApiErrorResponse::unauthorized("Missing X-User-Id header"))?;
        resolve(state, user_id).map(CurrentUser)
    }
}

#[async_trait]
impl FromRequestParts<AppState> for MaybeUser {
    type Rejection = ApiErrorResponse;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        match header_user_id(parts)? {
            Some(user_id) => resolve(state, user_id).map(|u| MaybeUser(Some(u))),
            None => Ok(MaybeUser(None)),
        }
    }
}
