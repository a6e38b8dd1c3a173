use std::fs;

use anyhow::{Context, Result};

use crate::core::AppConfig;
use crate::notify::{NotificationPayload, PushSender, SerializedSubscription};

pub async fn run(subscription_path: &str, title: &str, message: &str) -> Result<()> {
    let config = AppConfig::from_env()?;
    send(&config, subscription_path, title, message).await?;
    println!("Notification sent");
    Ok(())
}

pub async fn send(
    config: &AppConfig,
    subscription_path: &str,
    title: &str,
    message: &str,
) -> Result<()> {
    let contents = fs::read_to_string(subscription_path)
        .with_context(|| format!("Unable to read subscription file {}", subscription_path))?;
    let subscription: SerializedSubscription =
        serde_json::from_str(&contents).context("Subscription file is not valid JSON")?;

    let push = PushSender::new(
        reqwest::Client::new(),
        config.vapid.clone(),
        &config.vapid_contact,
    );
    push.send(&subscription, &NotificationPayload::basic(title, message))
        .await
        .with_context(|| format!("Failed to send to {}", subscription.short_endpoint()))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notify::VapidKeys;
    use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};
    use std::io::Write;

    fn write_subscription(endpoint: &str) -> tempfile::NamedTempFile {
        let browser_key = VapidKeys::generate();
        let json = serde_json::json!({
            "endpoint": endpoint,
            "expirationTime": null,
            "keys": {
                "p256dh": browser_key.public_key_base64url(),
                "auth": URL_SAFE_NO_PAD.encode(uuid::Uuid::new_v4().as_bytes()),
            }
        });
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "{}", json).unwrap();
        file
    }

    fn config() -> AppConfig {
        AppConfig {
            vapid: Some(VapidKeys::generate()),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn it_sends_to_subscription_file() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/push/cli")
            .with_status(201)
            .create_async()
            .await;

        let file = write_subscription(&format!("{}/push/cli", server.url()));
        let path = file.path().to_str().unwrap();

        send(&config(), path, "PWA Demo", "from the cli").await.unwrap();
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn it_fails_for_missing_file() {
        let result = send(&config(), "/nonexistent/subscription.json", "t", "m").await;
        assert!(result.unwrap_err().to_string().contains("Unable to read"));
    }

    #[tokio::test]
    async fn it_reports_expired_subscriptions() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/push/expired")
            .with_status(410)
            .create_async()
            .await;

        let file = write_subscription(&format!("{}/push/expired", server.url()));
        let path = file.path().to_str().unwrap();

        let err = send(&config(), path, "t", "m").await.unwrap_err();
        assert!(format!("{:#}", err).contains("expired"));
    }
}
