//! Test utilities for integration tests
#![allow(dead_code)]

use axum::{Router, body::Body, http::Request};
use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};
use serde_json::Value;

use pwa_push::api::{AppState, app};
use pwa_push::core::AppConfig;
use pwa_push::notify::VapidKeys;
use pwa_push::qstash::SigningKeys;

/// Creates a test application router with fresh VAPID keys and no
/// delay queue.
pub fn test_app() -> Router {
    app(AppState::new(test_config()))
}

pub fn test_app_with(config: AppConfig) -> Router {
    app(AppState::new(config))
}

pub fn test_config() -> AppConfig {
    AppConfig {
        vapid: Some(VapidKeys::generate()),
        vapid_contact: String::from("mailto:test@example.com"),
        qstash_token: None,
        qstash_url: String::from("http://127.0.0.1:1"),
        qstash_signing_keys: SigningKeys::default(),
        public_base_url: String::from("https://push.example.com"),
        web_root: String::from("./web-ui"),
    }
}

/// A subscription as a browser would produce it, delivering to
/// `endpoint`.
pub fn browser_subscription(endpoint: &str) -> Value {
    let browser_key = VapidKeys::generate();
    serde_json::json!({
        "endpoint": endpoint,
        "expirationTime": null,
        "keys": {
            "p256dh": browser_key.public_key_base64url(),
            "auth": URL_SAFE_NO_PAD.encode(uuid::Uuid::new_v4().as_bytes()),
        }
    })
}

pub fn post_json(uri: &str, body: &Value) -> Request<Body> {
    Request::builder()
        .uri(uri)
        .method("POST")
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

pub async fn body_to_string(body: Body) -> String {
    let bytes = axum::body::to_bytes(body, usize::MAX).await.unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

pub async fn body_to_json(body: Body) -> Value {
    serde_json::from_str(&body_to_string(body).await).unwrap()
}

