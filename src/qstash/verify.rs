//! Verification of `Upstash-Signature` headers
//!
//! The header is an HS256 JWT signed with the current (or, during key
//! rotation, the next) signing key. Its `body` claim is the base64url
//! SHA-256 digest of the raw request body.

use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};
use jsonwebtoken::{Algorithm, DecodingKey, Validation, decode};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use thiserror::Error;

pub const SIGNATURE_HEADER: &str = "upstash-signature";
const ISSUER: &str = "Upstash";

#[derive(Debug, Error)]
pub enum SignatureError {
    #[error("`Upstash-Signature` header is missing")]
    Missing,
    #[error("Invalid signature: {0}")]
    Invalid(#[from] jsonwebtoken::errors::Error),
    #[error("Invalid signature: body hash does not match")]
    BodyMismatch,
    #[error("No signing key configured")]
    NoKeys,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    pub iss: String,
    pub sub: String,
    pub exp: i64,
    pub nbf: i64,
    pub iat: i64,
    pub jti: String,
    pub body: String,
}

/// The current and next QStash signing keys.
#[derive(Clone, Debug, Default)]
pub struct SigningKeys {
    pub current: Option<String>,
    pub next: Option<String>,
}

impl SigningKeys {
    pub fn new(current: Option<String>, next: Option<String>) -> Self {
        Self { current, next }
    }

    pub fn is_configured(&self) -> bool {
        self.current.is_some() || self.next.is_some()
    }

    /// Verify `signature` against `body`, trying the current key first
    /// and the next key second. When `url` is given the token subject
    /// must match it.
    pub fn verify(
        &self,
        signature: Option<&str>,
        body: &[u8],
        url: Option<&str>,
    ) -> Result<Claims, SignatureError> {
        let signature = signature.ok_or(SignatureError::Missing)?;

        let mut last_error = SignatureError::NoKeys;
        for key in [&self.current, &self.next].into_iter().flatten() {
            match verify_with_key(signature, key, body, url) {
                Ok(claims) => return Ok(claims),
                // Signed by this key, so the body itself was changed
                Err(SignatureError::BodyMismatch) => return Err(SignatureError::BodyMismatch),
                Err(e) => last_error = e,
            }
        }
        Err(last_error)
    }
}

fn verify_with_key(
    signature: &str,
    key: &str,
    body: &[u8],
    url: Option<&str>,
) -> Result<Claims, SignatureError> {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.set_issuer(&[ISSUER]);
    validation.validate_nbf = true;
    if let Some(url) = url {
        validation.sub = Some(url.to_string());
    }

    let token = decode::<Claims>(
        signature,
        &DecodingKey::from_secret(key.as_bytes()),
        &validation,
    )?;

    let claims = token.claims;
    if claims.body.trim_end_matches('=') != body_hash(body) {
        return Err(SignatureError::BodyMismatch);
    }
    Ok(claims)
}

/// Unpadded base64url SHA-256 of the request body.
pub fn body_hash(body: &[u8]) -> String {
    URL_SAFE_NO_PAD.encode(Sha256::digest(body))
}

#[cfg(test)]
mod tests {
    use super::*;
    use jsonwebtoken::{EncodingKey, Header, encode};

    const BODY: &[u8] = br#"{"id":"1","message":"hi"}"#;

    fn sign(key: &str, body: &[u8], sub: &str, exp_offset: i64) -> String {
        let now = chrono::Utc::now().timestamp();
        let claims = Claims {
            iss: ISSUER.to_string(),
            sub: sub.to_string(),
            exp: now + exp_offset,
            nbf: now,
            iat: now,
            jti: "jwt_1".to_string(),
            body: format!("{}=", body_hash(body)),
        };
        encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(key.as_bytes()),
        )
        .unwrap()
    }

    fn keys() -> SigningKeys {
        SigningKeys::new(Some("current-key".into()), Some("next-key".into()))
    }

    #[test]
    fn it_verifies_with_current_key() {
        let token = sign("current-key", BODY, "https://app.example.com/cb", 300);
        let claims = keys().verify(Some(&token), BODY, None).unwrap();
        assert_eq!(claims.iss, "Upstash");
    }

    #[test]
    fn it_falls_back_to_next_key() {
        let token = sign("next-key", BODY, "https://app.example.com/cb", 300);
        assert!(keys().verify(Some(&token), BODY, None).is_ok());
    }

    #[test]
    fn it_rejects_unknown_key() {
        let token = sign("other-key", BODY, "https://app.example.com/cb", 300);
        let err = keys().verify(Some(&token), BODY, None).unwrap_err();
        assert!(matches!(err, SignatureError::Invalid(_)));
    }

    #[test]
    fn it_rejects_tampered_body() {
        let token = sign("current-key", BODY, "https://app.example.com/cb", 300);
        let err = keys()
            .verify(Some(&token), br#"{"id":"1","message":"changed"}"#, None)
            .unwrap_err();
        assert!(matches!(err, SignatureError::BodyMismatch));
    }

    #[test]
    fn it_rejects_expired_tokens() {
        let token = sign("current-key", BODY, "https://app.example.com/cb", -3600);
        assert!(keys().verify(Some(&token), BODY, None).is_err());
    }

    #[test]
    fn it_checks_subject_when_url_given() {
        let token = sign("current-key", BODY, "https://app.example.com/cb", 300);
        assert!(
            keys()
                .verify(Some(&token), BODY, Some("https://app.example.com/cb"))
                .is_ok()
        );
        assert!(
            keys()
                .verify(Some(&token), BODY, Some("https://evil.example.com/cb"))
                .is_err()
        );
    }

    #[test]
    fn it_requires_a_signature() {
        let err = keys().verify(None, BODY, None).unwrap_err();
        assert!(matches!(err, SignatureError::Missing));
    }

    #[test]
    fn it_fails_without_keys() {
        let token = sign("current-key", BODY, "https://app.example.com/cb", 300);
        let keys = SigningKeys::default();
        assert!(!keys.is_configured());
        assert!(matches!(
            keys.verify(Some(&token), BODY, None).unwrap_err(),
            SignatureError::NoKeys
        ));
    }
}
