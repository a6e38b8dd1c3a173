use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::PushError;

pub const DEFAULT_ICON: &str = "/android/android-launchericon-192-192.png";
pub const DEFAULT_BADGE: &str = "/android/android-launchericon-72-72.png";
pub const DEFAULT_TAG: &str = "pwa-demo";

/// Keys issued by the browser alongside the push endpoint.
#[derive(Debug, Default, Serialize, Deserialize, Clone, PartialEq)]
pub struct SubscriptionKeys {
    #[serde(default)]
    pub p256dh: String,
    #[serde(default)]
    pub auth: String,
}

/// The JSON form of a browser `PushSubscription` (what
/// `PushSubscription.toJSON()` returns in the browser).
///
/// Fields default to empty when missing so that a partial subscription
/// can be reported as invalid instead of failing deserialization.
#[derive(Debug, Default, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SerializedSubscription {
    #[serde(default)]
    pub endpoint: String,
    #[serde(default)]
    pub keys: SubscriptionKeys,
    #[serde(default)]
    pub expiration_time: Option<i64>,
}

impl SerializedSubscription {
    pub fn new(endpoint: &str, p256dh: &str, auth: &str) -> Self {
        Self {
            endpoint: endpoint.to_string(),
            keys: SubscriptionKeys {
                p256dh: p256dh.to_string(),
                auth: auth.to_string(),
            },
            expiration_time: None,
        }
    }

    /// A subscription can only be delivered to when it carries an
    /// endpoint and both keys.
    pub fn validate(&self) -> Result<(), PushError> {
        if self.endpoint.trim().is_empty() {
            return Err(PushError::InvalidSubscription("missing endpoint"));
        }
        if self.keys.p256dh.trim().is_empty() {
            return Err(PushError::InvalidSubscription("missing p256dh key"));
        }
        if self.keys.auth.trim().is_empty() {
            return Err(PushError::InvalidSubscription("missing auth key"));
        }
        Ok(())
    }

    pub fn is_usable(&self) -> bool {
        self.validate().is_ok()
    }

    /// Endpoint shortened for log lines.
    pub fn short_endpoint(&self) -> String {
        if self.endpoint.chars().count() <= 50 {
            return self.endpoint.clone();
        }
        let head: String = self.endpoint.chars().take(50).collect();
        format!("{}...", head)
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum TextDirection {
    Auto,
    Ltr,
    Rtl,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct NotificationAction {
    pub action: String,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
}

/// Application data handed to the service worker with the
/// notification. `sw.js` reads `url` when the notification is clicked.
#[derive(Debug, Default, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct NotificationData {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date_of_arrival: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub update_in_app_counter: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub update_icon_badge_counter: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Payload encrypted into the push message and passed to
/// `showNotification` by the service worker.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct NotificationPayload {
    pub title: String,
    pub body: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub badge: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dir: Option<TextDirection>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lang: Option<String>,
    // Sending another notification with the same tag replaces the
    // previous one if the user has not interacted with it yet.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tag: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub renotify: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub require_interaction: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub silent: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vibrate: Option<Vec<u32>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub actions: Option<Vec<NotificationAction>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<NotificationData>,
}

/// Optional overrides accepted by [`NotificationPayload::build`].
#[derive(Debug, Default, Serialize, Deserialize, Clone, PartialEq)]
pub struct NotificationOptions {
    #[serde(default)]
    pub icon: Option<String>,
    #[serde(default)]
    pub badge: Option<String>,
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default)]
    pub tag: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub actions: Option<Vec<NotificationAction>>,
}

impl NotificationPayload {
    /// Title, body and the default launcher icon and badge.
    pub fn basic(title: &str, body: &str) -> Self {
        Self {
            title: title.to_string(),
            body: body.to_string(),
            icon: Some(DEFAULT_ICON.to_string()),
            badge: Some(DEFAULT_BADGE.to_string()),
            image: None,
            dir: None,
            lang: None,
            tag: None,
            renotify: None,
            require_interaction: None,
            silent: None,
            vibrate: None,
            actions: None,
            data: None,
        }
    }

    /// Full notification with every display option filled in. Icon
    /// paths are relative and resolved by the service worker.
    pub fn build(title: &str, body: &str, options: NotificationOptions) -> Self {
        let NotificationOptions {
            icon,
            badge,
            image,
            tag,
            url,
            actions,
        } = options;

        Self {
            title: title.to_string(),
            body: body.to_string(),
            icon: Some(icon.unwrap_or_else(|| DEFAULT_ICON.to_string())),
            badge: Some(badge.unwrap_or_else(|| DEFAULT_BADGE.to_string())),
            image,
            dir: Some(TextDirection::Auto),
            lang: Some("en-US".to_string()),
            tag: Some(tag.unwrap_or_else(|| DEFAULT_TAG.to_string())),
            renotify: Some(false),
            require_interaction: Some(false),
            silent: Some(false),
            vibrate: None,
            actions: Some(actions.unwrap_or_default()),
            data: Some(NotificationData {
                date_of_arrival: Some(chrono::Utc::now().timestamp_millis()),
                update_in_app_counter: Some(true),
                update_icon_badge_counter: Some(true),
                url: Some(url.unwrap_or_else(|| "/".to_string())),
                extra: Map::new(),
            }),
        }
    }
}
