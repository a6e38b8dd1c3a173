//! VAPID application server keys (RFC 8292).
//!
//! The private key is the raw 32-byte P-256 scalar and the public key
//! the 65-byte uncompressed point, both base64url without padding. This
//! is the format `web-push generate-vapid-keys` prints and the format
//! `VapidSignatureBuilder::from_base64` reads.

use std::fmt;

use anyhow::{Context, Result};
use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD as BASE64URL};
use p256::ecdsa::SigningKey;
use rand::rngs::OsRng;

#[derive(Clone)]
pub struct VapidKeys {
    public_key_b64: String,
    private_key_b64: String,
}

// Never print the private key
impl fmt::Debug for VapidKeys {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VapidKeys")
            .field("public_key_b64", &self.public_key_b64)
            .field("private_key_b64", &"<redacted>")
            .finish()
    }
}

impl VapidKeys {
    pub fn generate() -> Self {
        let signing_key = SigningKey::random(&mut OsRng);
        let public_point = signing_key.verifying_key().to_encoded_point(false);

        Self {
            public_key_b64: BASE64URL.encode(public_point.as_bytes()),
            private_key_b64: BASE64URL.encode(signing_key.to_bytes().as_slice()),
        }
    }

    /// Parse and validate a key pair. Whitespace (a common leftover of
    /// copying keys into env files) and trailing padding are stripped.
    pub fn from_base64url(public_key_b64: &str, private_key_b64: &str) -> Result<Self> {
        let public_key_b64 = clean_key(public_key_b64);
        let private_key_b64 = clean_key(private_key_b64);

        let pub_bytes = BASE64URL
            .decode(&public_key_b64)
            .context("Invalid base64url for VAPID public key")?;
        anyhow::ensure!(
            pub_bytes.len() == 65 && pub_bytes[0] == 0x04,
            "VAPID public key must be a 65-byte uncompressed P-256 point, got {} bytes",
            pub_bytes.len()
        );

        let priv_bytes = BASE64URL
            .decode(&private_key_b64)
            .context("Invalid base64url for VAPID private key")?;
        anyhow::ensure!(
            priv_bytes.len() == 32,
            "VAPID private key must be a 32-byte P-256 scalar, got {} bytes",
            priv_bytes.len()
        );
        let signing_key = SigningKey::from_bytes(priv_bytes.as_slice().into())
            .context("VAPID private key is not a valid P-256 scalar")?;

        let derived = signing_key.verifying_key().to_encoded_point(false);
        anyhow::ensure!(
            derived.as_bytes() == pub_bytes.as_slice(),
            "VAPID public key does not match the private key"
        );

        Ok(Self {
            public_key_b64,
            private_key_b64,
        })
    }

    /// Sent to browsers as the `applicationServerKey`.
    pub fn public_key_base64url(&self) -> &str {
        &self.public_key_b64
    }

    pub fn private_key_base64url(&self) -> &str {
        &self.private_key_b64
    }
}

fn clean_key(key: &str) -> String {
    key.chars()
        .filter(|c| !c.is_whitespace())
        .collect::<String>()
        .trim_end_matches('=')
        .to_string()
}
