//! Router for the push API

use axum::{
    Json, Router,
    extract::{State, rejection::JsonRejection},
};
use http::StatusCode;
use serde_json::Value;

use super::public;
use crate::api::public::ApiError;
use crate::api::routes::notifications::public::ScheduledJob;
use crate::api::routes::{SharedState, json_body, read_state, write_state};
use crate::notify::{
    NotificationOptions, NotificationPayload, PushError, PushSender, SerializedSubscription,
};

const NOTIFICATION_TITLE: &str = "PWA Demo";

// A year is far beyond anything the delay queue accepts
const MAX_DELAY_MINUTES: f64 = 60.0 * 24.0 * 365.0;

/// Translate a delivery failure into the message shown to the user.
fn send_error(err: PushError) -> ApiError {
    match err {
        PushError::SubscriptionExpired => ApiError::new(
            StatusCode::GONE,
            "Subscription expired. Please subscribe again.",
        ),
        PushError::SubscriptionNotFound => ApiError::new(
            StatusCode::NOT_FOUND,
            "Subscription not found. Please subscribe again.",
        ),
        PushError::InvalidSubscription(_) => ApiError::bad_request(err.to_string()),
        PushError::VapidNotConfigured => ApiError::new(
            StatusCode::SERVICE_UNAVAILABLE,
            format!("Failed to send notification: {}", err),
        ),
        err if err.is_upstream() => ApiError::new(
            StatusCode::BAD_GATEWAY,
            format!("Failed to send notification: {}", err),
        ),
        err => ApiError::new(
            StatusCode::INTERNAL_SERVER_ERROR,
            format!("Failed to send notification: {}", err),
        ),
    }
}

/// The full notification shape when options were sent, title, body and
/// icons otherwise.
fn notification_payload(
    message: &str,
    options: Option<NotificationOptions>,
) -> NotificationPayload {
    match options {
        Some(options) => NotificationPayload::build(NOTIFICATION_TITLE, message, options),
        None => NotificationPayload::basic(NOTIFICATION_TITLE, message),
    }
}

/// Delay in whole seconds, or `None` when it is not a usable number of
/// minutes.
fn delay_seconds(delay_minutes: f64) -> Option<u64> {
    if !delay_minutes.is_finite() || delay_minutes > MAX_DELAY_MINUTES {
        return None;
    }
    Some((delay_minutes * 60.0).round() as u64)
}

fn no_subscription() -> ApiError {
    ApiError::bad_request("No subscription available. Please subscribe first.")
}

async fn deliver(
    push: &PushSender,
    subscription: &SerializedSubscription,
    payload: &NotificationPayload,
) -> Result<Json<Value>, ApiError> {
    push.send(subscription, payload).await.map_err(send_error)?;
    tracing::info!("Notification sent to {}", subscription.short_endpoint());
    Ok(Json(serde_json::json!({ "success": true })))
}

// Register a client for push notifications
async fn subscribe(
    State(state): State<SharedState>,
    payload: Result<Json<SerializedSubscription>, JsonRejection>,
) -> Result<Json<Value>, ApiError> {
    let subscription = json_body(payload)?;
    subscription
        .validate()
        .map_err(|e| ApiError::bad_request(e.to_string()))?;

    write_state(&state)?.subscriptions.subscribe(subscription);

    Ok(Json(serde_json::json!({ "success": true })))
}

async fn unsubscribe(State(state): State<SharedState>) -> Result<Json<Value>, ApiError> {
    if let Some(removed) = write_state(&state)?.subscriptions.unsubscribe() {
        tracing::info!("Removed push subscription for {}", removed.short_endpoint());
    }
    Ok(Json(serde_json::json!({ "success": true })))
}

// Send a notification right away to the given or stored subscription
async fn send_notification(
    State(state): State<SharedState>,
    payload: Result<Json<public::SendNotificationRequest>, JsonRejection>,
) -> Result<Json<Value>, ApiError> {
    let request = json_body(payload)?;
    let message = request.message.trim();
    if message.is_empty() {
        return Err(ApiError::bad_request("Message cannot be empty."));
    }

    let (push, subscription) = {
        let state = read_state(&state)?;
        (
            state.push.clone(),
            state.subscriptions.resolve(request.subscription),
        )
    };
    let subscription = subscription.ok_or_else(no_subscription)?;

    let payload = notification_payload(message, request.options);

    deliver(&push, &subscription, &payload).await
}

// Defer a notification through the delay queue
async fn schedule_notification(
    State(state): State<SharedState>,
    payload: Result<Json<public::ScheduleNotificationRequest>, JsonRejection>,
) -> Result<Json<Value>, ApiError> {
    let request = json_body(payload)?;
    let message = request.message.trim();
    if message.is_empty() {
        return Err(ApiError::bad_request("Message cannot be empty."));
    }

    let (push, qstash, callback_url, subscription) = {
        let state = read_state(&state)?;
        (
            state.push.clone(),
            state.qstash.clone(),
            state.config.scheduled_callback_url(),
            state.subscriptions.resolve(request.subscription),
        )
    };
    let subscription = subscription.ok_or_else(no_subscription)?;

    if request.delay_minutes <= 0.0 {
        let payload = NotificationPayload::basic(NOTIFICATION_TITLE, message);
        return deliver(&push, &subscription, &payload).await;
    }

    let qstash = qstash.ok_or_else(|| {
        ApiError::new(
            StatusCode::SERVICE_UNAVAILABLE,
            "QStash is not configured. Please set QSTASH_TOKEN environment variable.",
        )
    })?;

    let delay_seconds = delay_seconds(request.delay_minutes).ok_or_else(|| {
        ApiError::bad_request(format!(
            "Delay must be at most {} minutes.",
            MAX_DELAY_MINUTES
        ))
    })?;
    let scheduled_for = i64::try_from(delay_seconds)
        .ok()
        .and_then(|secs| secs.checked_mul(1000))
        .and_then(|ms| chrono::Utc::now().timestamp_millis().checked_add(ms))
        .ok_or_else(|| ApiError::bad_request("Delay is out of range."))?;
    let job = ScheduledJob {
        id: uuid::Uuid::new_v4().to_string(),
        message: message.to_string(),
        subscription,
    };

    tracing::info!(
        "Scheduling notification {} in {}s via {}",
        job.id,
        delay_seconds,
        callback_url
    );

    let message_id = qstash
        .publish_json(&callback_url, &job, delay_seconds)
        .await
        .map_err(|e| {
            ApiError::new(
                StatusCode::BAD_GATEWAY,
                format!("Failed to schedule notification: {}", e),
            )
        })?;

    tracing::info!("QStash message {} scheduled for {}", message_id, job.id);

    let response = public::ScheduleNotificationResponse {
        success: true,
        scheduled_for,
        id: job.id,
        message_id,
    };
    Ok(Json(serde_json::to_value(response)?))
}

// The browser needs the public key to create a subscription
async fn vapid_public_key(
    State(state): State<SharedState>,
) -> Result<Json<public::VapidPublicKeyResponse>, ApiError> {
    let public_key = read_state(&state)?
        .push
        .public_key()
        .map(|k| k.to_string())
        .ok_or_else(|| {
            ApiError::new(
                StatusCode::SERVICE_UNAVAILABLE,
                "VAPID keys are not configured",
            )
        })?;

    Ok(Json(public::VapidPublicKeyResponse { public_key }))
}

/// Create the push router
pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/subscribe", axum::routing::post(subscribe))
        .route("/unsubscribe", axum::routing::post(unsubscribe))
        .route("/send", axum::routing::post(send_notification))
        .route("/schedule", axum::routing::post(schedule_notification))
        .route("/vapid-public-key", axum::routing::get(vapid_public_key))
}
