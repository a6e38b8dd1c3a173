//! Public types for the notifications API
use serde::{Deserialize, Serialize};

use crate::notify::SerializedSubscription;

#[derive(Deserialize)]
pub struct TestNotificationRequest {
    #[serde(default)]
    pub subscription: Option<SerializedSubscription>,
    #[serde(default)]
    pub message: Option<String>,
}

/// Message body published to the delay queue and posted back to
/// `/api/notifications/send-scheduled` once the delay elapses.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ScheduledJob {
    pub id: String,
    pub message: String,
    pub subscription: SerializedSubscription,
}

/// A queue callback body. Every field is optional so that incomplete
/// jobs are answered with a 400 instead of a rejection.
#[derive(Debug, Default, Deserialize)]
pub struct ScheduledCallback {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub subscription: Option<SerializedSubscription>,
}
