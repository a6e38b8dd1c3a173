//! Public types for the push API
use serde::{Deserialize, Serialize};

use crate::notify::{NotificationOptions, SerializedSubscription};

#[derive(Deserialize)]
pub struct SendNotificationRequest {
    #[serde(default)]
    pub message: String,
    // Falls back to the stored subscription when absent
    #[serde(default)]
    pub subscription: Option<SerializedSubscription>,
    // Use the full notification shape instead of title, body and icons
    #[serde(default)]
    pub options: Option<NotificationOptions>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleNotificationRequest {
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub delay_minutes: f64,
    #[serde(default)]
    pub subscription: Option<SerializedSubscription>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleNotificationResponse {
    pub success: bool,
    // Unix timestamp in milliseconds
    pub scheduled_for: i64,
    pub id: String,
    pub message_id: String,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VapidPublicKeyResponse {
    pub public_key: String,
}
