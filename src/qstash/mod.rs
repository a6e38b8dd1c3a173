//! Client for the Upstash QStash delay queue
//!
//! QStash accepts a JSON body for a destination URL, waits for the
//! requested delay, then POSTs the body to the destination with a
//! signed `Upstash-Signature` header (see [`verify`]).

pub mod verify;
pub use verify::{SignatureError, SigningKeys};

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const DEFAULT_QSTASH_URL: &str = "https://qstash.upstash.io";

#[derive(Debug, Error)]
pub enum QstashError {
    #[error("QStash request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("QStash returned HTTP {status}: {body}")]
    Api { status: u16, body: String },
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PublishResponse {
    message_id: String,
}

#[derive(Clone, Debug)]
pub struct QstashClient {
    client: reqwest::Client,
    base_url: String,
    token: String,
}

impl QstashClient {
    pub fn new(client: reqwest::Client, base_url: &str, token: &str) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            token: token.to_string(),
        }
    }

    /// Publish `body` to `destination` after `delay_seconds`. Returns
    /// the QStash message id.
    pub async fn publish_json<T: Serialize>(
        &self,
        destination: &str,
        body: &T,
        delay_seconds: u64,
    ) -> Result<String, QstashError> {
        let url = format!("{}/v2/publish/{}", self.base_url, destination);

        let mut request = self.client.post(url).bearer_auth(&self.token).json(body);
        if delay_seconds > 0 {
            request = request.header("Upstash-Delay", format!("{}s", delay_seconds));
        }

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(QstashError::Api {
                status: status.as_u16(),
                body,
            });
        }

        let published: PublishResponse = response.json().await?;
        Ok(published.message_id)
    }
}
