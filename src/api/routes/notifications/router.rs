//! Router for the notifications API

use axum::{
    Json, Router,
    body::Bytes,
    extract::State,
    response::{IntoResponse, Response},
};
use http::{HeaderMap, StatusCode};
use serde_json::json;

use super::public;
use crate::api::public::ApiError;
use crate::api::routes::{SharedState, read_state};
use crate::notify::NotificationPayload;
use crate::qstash::verify::SIGNATURE_HEADER;

// Send a one-off notification to the subscription in the request body
async fn test_notification(
    State(state): State<SharedState>,
    Json(request): Json<public::TestNotificationRequest>,
) -> Result<Response, ApiError> {
    let Some(subscription) = request.subscription else {
        return Ok((
            StatusCode::BAD_REQUEST,
            Json(json!({ "error": "Missing subscription" })),
        )
            .into_response());
    };

    let push = read_state(&state)?.push.clone();
    let message = request
        .message
        .filter(|m| !m.is_empty())
        .unwrap_or_else(|| "Test notification from API".to_string());
    let payload = NotificationPayload::basic("PWA Demo - Test", &message);

    if let Err(e) = push.send(&subscription, &payload).await {
        tracing::error!("Test notification error: {}", e);
        return Ok((
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({
                "error": "Failed to send test notification",
                "details": e.to_string(),
            })),
        )
            .into_response());
    }

    Ok(Json(json!({ "success": true, "message": "Test notification sent" })).into_response())
}

/// Callback invoked by the delay queue once a scheduled notification is
/// due. The raw body is needed to check the signature.
async fn send_scheduled(
    State(state): State<SharedState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Response, ApiError> {
    tracing::info!(
        "QStash callback received at {}",
        chrono::Utc::now().to_rfc3339()
    );

    let (push, keys) = {
        let state = read_state(&state)?;
        (state.push.clone(), state.config.qstash_signing_keys.clone())
    };

    if keys.is_configured() {
        let signature = headers
            .get(SIGNATURE_HEADER)
            .and_then(|v| v.to_str().ok());
        if let Err(e) = keys.verify(signature, &body, None) {
            tracing::error!("QStash signature verification failed: {}", e);
            return Ok((
                StatusCode::UNAUTHORIZED,
                Json(json!({
                    "error": "Signature verification failed",
                    "details": e.to_string(),
                })),
            )
                .into_response());
        }
    } else {
        tracing::warn!(
            "QStash signing keys not set, skipping signature verification (not recommended for production)"
        );
    }

    let callback: public::ScheduledCallback = match serde_json::from_slice(&body) {
        Ok(callback) => callback,
        Err(e) => {
            tracing::error!("Unable to parse scheduled notification: {}", e);
            return Ok((
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": "Failed to send notification", "id": null })),
            )
                .into_response());
        }
    };

    let id = callback.id;
    let message = callback.message.filter(|m| !m.is_empty());
    let (Some(message), Some(subscription)) = (message, callback.subscription) else {
        tracing::error!("Scheduled notification {:?} is missing required fields", id);
        return Ok((
            StatusCode::BAD_REQUEST,
            Json(json!({ "error": "Missing message or subscription" })),
        )
            .into_response());
    };

    if let Err(e) = subscription.validate() {
        tracing::error!("Scheduled notification {:?}: {}", id, e);
        return Ok((
            StatusCode::BAD_REQUEST,
            Json(json!({ "error": "Invalid subscription structure" })),
        )
            .into_response());
    }

    tracing::info!(
        "Sending scheduled notification {:?} to {}",
        id,
        subscription.short_endpoint()
    );

    let payload = NotificationPayload::basic("PWA Demo", &message);
    match push.send(&subscription, &payload).await {
        Ok(()) => {
            tracing::info!("Successfully sent notification {:?}", id);
            Ok(Json(json!({
                "success": true,
                "id": id,
                "sentAt": chrono::Utc::now().timestamp_millis(),
            }))
            .into_response())
        }
        // Answer 200 so the queue does not retry a dead subscription
        Err(e) if e.is_gone() => {
            tracing::warn!("Subscription expired for notification {:?}: {}", id, e);
            Ok(Json(json!({ "error": "Subscription expired", "id": id })).into_response())
        }
        Err(e) => {
            tracing::error!("Send scheduled notification {:?} error: {}", id, e);
            Ok((
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": "Failed to send notification", "id": id })),
            )
                .into_response())
        }
    }
}

/// Create the notifications router
pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/test", axum::routing::post(test_notification))
        .route("/send-scheduled", axum::routing::post(send_scheduled))
}
