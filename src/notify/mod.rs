pub mod models;
pub mod store;
pub mod vapid;
pub use models::*;
pub use store::SubscriptionStore;
pub use vapid::VapidKeys;

use thiserror::Error;
use web_push::{
    ContentEncoding, SubscriptionInfo, VapidSignatureBuilder, WebPushError, WebPushMessage,
    WebPushMessageBuilder,
};

// Push services keep undelivered messages for a day
const PUSH_TTL_SECONDS: u32 = 60 * 60 * 24;

#[derive(Debug, Error)]
pub enum PushError {
    #[error("VAPID keys are not configured")]
    VapidNotConfigured,
    #[error("Invalid subscription: {0}")]
    InvalidSubscription(&'static str),
    #[error("Push subscription has expired (410)")]
    SubscriptionExpired,
    #[error("Push subscription was not found (404)")]
    SubscriptionNotFound,
    #[error("Push service rejected the message (HTTP {status}): {body}")]
    Rejected { status: u16, body: String },
    #[error("Failed to encrypt or sign push message: {0}")]
    Message(#[from] WebPushError),
    #[error("Failed to encode notification payload: {0}")]
    Payload(#[from] serde_json::Error),
    #[error("Push request failed: {0}")]
    Transport(#[from] reqwest::Error),
}

impl PushError {
    /// The push service no longer knows the subscription. Retrying will
    /// never succeed.
    pub fn is_gone(&self) -> bool {
        matches!(
            self,
            PushError::SubscriptionExpired | PushError::SubscriptionNotFound
        )
    }

    /// The failure happened at the push service rather than locally.
    pub fn is_upstream(&self) -> bool {
        matches!(
            self,
            PushError::SubscriptionExpired
                | PushError::SubscriptionNotFound
                | PushError::Rejected { .. }
                | PushError::Transport(_)
        )
    }
}

/// Signs, encrypts and delivers web push messages.
///
/// Cloning is cheap. The underlying `reqwest::Client` is shared so
/// connections to push services are pooled.
#[derive(Clone, Debug)]
pub struct PushSender {
    client: reqwest::Client,
    vapid: Option<VapidKeys>,
    contact: String,
}

impl PushSender {
    pub fn new(client: reqwest::Client, vapid: Option<VapidKeys>, contact: &str) -> Self {
        Self {
            client,
            vapid,
            contact: contact.to_string(),
        }
    }

    pub fn is_configured(&self) -> bool {
        self.vapid.is_some()
    }

    pub fn public_key(&self) -> Option<&str> {
        self.vapid.as_ref().map(|k| k.public_key_base64url())
    }

    /// Deliver `payload` to a single subscription.
    pub async fn send(
        &self,
        subscription: &SerializedSubscription,
        payload: &NotificationPayload,
    ) -> Result<(), PushError> {
        subscription.validate()?;
        let vapid = self.vapid.as_ref().ok_or(PushError::VapidNotConfigured)?;
        let message = self.seal(vapid, subscription, payload)?;

        tracing::debug!("Sending push message to {}", subscription.short_endpoint());
        let response = self.request_for(message).send().await?;
        delivery_outcome(response).await
    }

    // Encrypt for the browser's keys and sign with ours
    fn seal(
        &self,
        vapid: &VapidKeys,
        subscription: &SerializedSubscription,
        payload: &NotificationPayload,
    ) -> Result<WebPushMessage, PushError> {
        let sub_info = SubscriptionInfo::new(
            &subscription.endpoint,
            &subscription.keys.p256dh,
            &subscription.keys.auth,
        );

        let mut claims =
            VapidSignatureBuilder::from_base64(vapid.private_key_base64url(), &sub_info)?;
        claims.add_claim("sub", self.contact.as_str());

        let content = serde_json::to_vec(payload)?;
        let mut message = WebPushMessageBuilder::new(&sub_info);
        message.set_payload(ContentEncoding::Aes128Gcm, &content);
        message.set_vapid_signature(claims.build()?);
        message.set_ttl(PUSH_TTL_SECONDS);
        Ok(message.build()?)
    }

    fn request_for(&self, message: WebPushMessage) -> reqwest::RequestBuilder {
        let mut headers: Vec<(&'static str, String)> = vec![("TTL", message.ttl.to_string())];
        headers.extend(message.urgency.map(|urgency| ("Urgency", urgency.to_string())));
        headers.extend(message.topic.map(|topic| ("Topic", topic)));

        let mut request = self.client.post(message.endpoint.to_string());
        if let Some(encrypted) = message.payload {
            headers.push((
                "Content-Encoding",
                encrypted.content_encoding.to_str().to_string(),
            ));
            headers.push(("Content-Type", "application/octet-stream".to_string()));
            headers.extend(encrypted.crypto_headers);
            request = request.body(encrypted.content);
        }

        headers
            .into_iter()
            .fold(request, |request, (name, value)| request.header(name, value))
    }
}

/// Map the push service response onto a delivery result. 410 and 404
/// mean the browser dropped the subscription.
async fn delivery_outcome(response: reqwest::Response) -> Result<(), PushError> {
    if response.status().is_success() {
        return Ok(());
    }
    match response.status().as_u16() {
        410 => Err(PushError::SubscriptionExpired),
        404 => Err(PushError::SubscriptionNotFound),
        status => Err(PushError::Rejected {
            status,
            body: response.text().await.unwrap_or_default(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};

    fn browser_subscription(endpoint: &str) -> SerializedSubscription {
        // Any P-256 point works as the browser's ECDH key
        let browser_key = VapidKeys::generate();
        let auth = URL_SAFE_NO_PAD.encode(uuid::Uuid::new_v4().as_bytes());
        SerializedSubscription::new(endpoint, browser_key.public_key_base64url(), &auth)
    }

    fn sender() -> PushSender {
        PushSender::new(
            reqwest::Client::new(),
            Some(VapidKeys::generate()),
            "mailto:test@example.com",
        )
    }

    #[tokio::test]
    async fn it_delivers_an_encrypted_message() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/push/abc")
            .match_header("content-encoding", "aes128gcm")
            .match_header("ttl", "86400")
            .with_status(201)
            .create_async()
            .await;

        let sub = browser_subscription(&format!("{}/push/abc", server.url()));
        let payload = NotificationPayload::basic("PWA Demo", "hello");

        let result = sender().send(&sub, &payload).await;
        assert!(result.is_ok(), "{:?}", result);
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn it_maps_gone_to_expired() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/push/gone")
            .with_status(410)
            .create_async()
            .await;

        let sub = browser_subscription(&format!("{}/push/gone", server.url()));
        let err = sender()
            .send(&sub, &NotificationPayload::basic("t", "b"))
            .await
            .unwrap_err();

        assert!(matches!(err, PushError::SubscriptionExpired));
        assert!(err.is_gone());
    }

    #[tokio::test]
    async fn it_maps_not_found() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/push/missing")
            .with_status(404)
            .create_async()
            .await;

        let sub = browser_subscription(&format!("{}/push/missing", server.url()));
        let err = sender()
            .send(&sub, &NotificationPayload::basic("t", "b"))
            .await
            .unwrap_err();

        assert!(matches!(err, PushError::SubscriptionNotFound));
    }

    #[tokio::test]
    async fn it_reports_other_rejections_with_body() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/push/bad")
            .with_status(403)
            .with_body("invalid JWT")
            .create_async()
            .await;

        let sub = browser_subscription(&format!("{}/push/bad", server.url()));
        let err = sender()
            .send(&sub, &NotificationPayload::basic("t", "b"))
            .await
            .unwrap_err();

        match err {
            PushError::Rejected { status, ref body } => {
                assert_eq!(status, 403);
                assert_eq!(body, "invalid JWT");
            }
            other => panic!("unexpected error: {:?}", other),
        }
        assert!(!err.is_gone());
        assert!(err.is_upstream());
    }

    #[tokio::test]
    async fn it_requires_vapid_keys() {
        let sender = PushSender::new(reqwest::Client::new(), None, "mailto:test@example.com");
        let sub = browser_subscription("https://push.example.com/abc");

        let err = sender
            .send(&sub, &NotificationPayload::basic("t", "b"))
            .await
            .unwrap_err();
        assert!(matches!(err, PushError::VapidNotConfigured));
        assert!(!sender.is_configured());
    }

    #[tokio::test]
    async fn it_rejects_incomplete_subscription_before_sending() {
        let sub = SerializedSubscription::new("https://push.example.com/abc", "", "auth");
        let err = sender()
            .send(&sub, &NotificationPayload::basic("t", "b"))
            .await
            .unwrap_err();
        assert!(matches!(err, PushError::InvalidSubscription(_)));
    }
}
