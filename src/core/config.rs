use std::env;

use anyhow::{Context, Result};

use crate::notify::VapidKeys;
use crate::qstash::{DEFAULT_QSTASH_URL, SigningKeys};

pub const DEFAULT_VAPID_CONTACT: &str = "mailto:admin@pwa-demo.local";
pub const DEFAULT_PUBLIC_BASE_URL: &str = "http://127.0.0.1:2222";
pub const DEFAULT_WEB_ROOT: &str = "./web-ui";

#[derive(Clone, Debug)]
pub struct AppConfig {
    // Push is disabled when no key pair is configured
    pub vapid: Option<VapidKeys>,
    pub vapid_contact: String,
    pub qstash_token: Option<String>,
    pub qstash_url: String,
    pub qstash_signing_keys: SigningKeys,
    // Where the delay queue should call us back
    pub public_base_url: String,
    pub web_root: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            vapid: None,
            vapid_contact: DEFAULT_VAPID_CONTACT.to_string(),
            qstash_token: None,
            qstash_url: DEFAULT_QSTASH_URL.to_string(),
            qstash_signing_keys: SigningKeys::default(),
            public_base_url: DEFAULT_PUBLIC_BASE_URL.to_string(),
            web_root: DEFAULT_WEB_ROOT.to_string(),
        }
    }
}

impl AppConfig {
    /// Read configuration from the process environment.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Read configuration through `lookup`. Empty values count as
    /// unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        let public_key = var("VAPID_PUBLIC_KEY").or_else(|| var("NEXT_PUBLIC_VAPID_PUBLIC_KEY"));
        let private_key = var("VAPID_PRIVATE_KEY");
        let vapid = match (public_key, private_key) {
            (Some(public_key), Some(private_key)) => Some(
                VapidKeys::from_base64url(&public_key, &private_key)
                    .context("Invalid VAPID key pair in VAPID_PUBLIC_KEY/VAPID_PRIVATE_KEY")?,
            ),
            (None, None) => None,
            (Some(_), None) => anyhow::bail!("Missing env var VAPID_PRIVATE_KEY"),
            (None, Some(_)) => anyhow::bail!("Missing env var VAPID_PUBLIC_KEY"),
        };

        match &vapid {
            Some(keys) => tracing::info!(
                "VAPID public key loaded ({} chars)",
                keys.public_key_base64url().len()
            ),
            None => tracing::warn!("VAPID keys not set, push delivery is disabled"),
        }

        let defaults = Self::default();
        Ok(Self {
            vapid,
            vapid_contact: var("VAPID_CONTACT_EMAIL").unwrap_or(defaults.vapid_contact),
            qstash_token: var("QSTASH_TOKEN"),
            qstash_url: var("QSTASH_URL").unwrap_or(defaults.qstash_url),
            qstash_signing_keys: SigningKeys::new(
                var("QSTASH_CURRENT_SIGNING_KEY"),
                var("QSTASH_NEXT_SIGNING_KEY"),
            ),
            public_base_url: var("PUBLIC_BASE_URL").unwrap_or(defaults.public_base_url),
            web_root: var("PWA_PUSH_WEB_ROOT").unwrap_or(defaults.web_root),
        })
    }

    /// URL the delay queue POSTs scheduled notifications to.
    pub fn scheduled_callback_url(&self) -> String {
        format!(
            "{}/api/notifications/send-scheduled",
            self.public_base_url.trim_end_matches('/')
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| vars.get(name).cloned()
    }

    #[test]
    fn it_uses_defaults_without_env() {
        let config = AppConfig::from_lookup(lookup(&[])).unwrap();
        assert!(config.vapid.is_none());
        assert!(config.qstash_token.is_none());
        assert!(!config.qstash_signing_keys.is_configured());
        assert_eq!(config.vapid_contact, DEFAULT_VAPID_CONTACT);
        assert_eq!(config.qstash_url, DEFAULT_QSTASH_URL);
        assert_eq!(
            config.scheduled_callback_url(),
            "http://127.0.0.1:2222/api/notifications/send-scheduled"
        );
    }

    #[test]
    fn it_reads_keys_and_queue_settings() {
        let keys = VapidKeys::generate();
        let config = AppConfig::from_lookup(lookup(&[
            ("NEXT_PUBLIC_VAPID_PUBLIC_KEY", keys.public_key_base64url()),
            ("VAPID_PRIVATE_KEY", keys.private_key_base64url()),
            ("VAPID_CONTACT_EMAIL", "mailto:me@example.com"),
            ("QSTASH_TOKEN", "token"),
            ("QSTASH_CURRENT_SIGNING_KEY", "sig_current"),
            ("QSTASH_NEXT_SIGNING_KEY", ""),
            ("PUBLIC_BASE_URL", "https://push.example.com/"),
        ]))
        .unwrap();

        assert_eq!(
            config.vapid.as_ref().unwrap().public_key_base64url(),
            keys.public_key_base64url()
        );
        assert_eq!(config.vapid_contact, "mailto:me@example.com");
        assert_eq!(config.qstash_token.as_deref(), Some("token"));
        assert_eq!(
            config.qstash_signing_keys.current.as_deref(),
            Some("sig_current")
        );
        assert!(config.qstash_signing_keys.next.is_none());
        assert_eq!(
            config.scheduled_callback_url(),
            "https://push.example.com/api/notifications/send-scheduled"
        );
    }

    #[test]
    fn it_rejects_half_configured_vapid() {
        let keys = VapidKeys::generate();
        let result = AppConfig::from_lookup(lookup(&[(
            "VAPID_PUBLIC_KEY",
            keys.public_key_base64url(),
        )]));
        assert!(result.is_err());
    }

    #[test]
    fn it_rejects_invalid_vapid_keys() {
        let result = AppConfig::from_lookup(lookup(&[
            ("VAPID_PUBLIC_KEY", "not-a-key"),
            ("VAPID_PRIVATE_KEY", "also-not-a-key"),
        ]));
        assert!(result.is_err());
    }
}
