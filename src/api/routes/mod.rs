//! API routes module

pub mod notifications;
pub mod push;

use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use axum::{Json, Router, extract::rejection::JsonRejection};

use crate::api::public::ApiError;
use crate::api::state::AppState;

pub type SharedState = Arc<RwLock<AppState>>;

// Guards must be dropped before any `.await`
pub(crate) fn read_state(state: &SharedState) -> Result<RwLockReadGuard<'_, AppState>, ApiError> {
    state
        .read()
        .map_err(|_| anyhow::anyhow!("Unable to read shared state").into())
}

pub(crate) fn write_state(
    state: &SharedState,
) -> Result<RwLockWriteGuard<'_, AppState>, ApiError> {
    state
        .write()
        .map_err(|_| anyhow::anyhow!("Unable to write shared state").into())
}

// Malformed or mistyped JSON is the caller's fault, answer 400
pub(crate) fn json_body<T>(payload: Result<Json<T>, JsonRejection>) -> Result<T, ApiError> {
    payload
        .map(|Json(body)| body)
        .map_err(|rejection| ApiError::bad_request(rejection.body_text()))
}

/// Create the combined API router
pub fn router() -> Router<SharedState> {
    Router::new()
        // Server actions used by the browser client
        .nest("/push", push::router())
        // Test endpoint and delay queue callback
        .nest("/notifications", notifications::router())
}
