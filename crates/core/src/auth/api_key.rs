//! API Key authentication.

use async_trait::async_trait;
use sha2::{Digest, Sha256};

use super::{AuthError, AuthRequest, Authenticator, Identity};
use crate::config::ApiKeyEntry;

/// Authenticator that validates requests against the configured API keys.
///
/// Accepts the key in either:
/// - `Authorization: Bearer <key>` header
/// - `X-API-Key: <key>` header
///
/// Only SHA-256 digests of the keys are kept in memory.
pub struct ApiKeyAuthenticator {
    keys: Vec<KeyDigest>,
}

struct KeyDigest {
    user: String,
    digest: [u8; 32],
}

impl ApiKeyAuthenticator {
    pub fn new(entries: &[ApiKeyEntry]) -> Self {
        Self {
            keys: entries
                .iter()
                .map(|entry| KeyDigest {
                    user: entry.user.clone(),
                    digest: digest(&entry.key),
                })
                .collect(),
        }
    }

    /// Extract API key from request headers.
    /// Checks Authorization: Bearer and X-API-Key headers.
    fn extract_key<'a>(&self, request: &'a AuthRequest) -> Option<&'a str> {
        if let Some(auth_header) = request.headers.get("authorization") {
            if let Some(key) = auth_header
                .strip_prefix("Bearer ")
                .or_else(|| auth_header.strip_prefix("bearer "))
            {
                return Some(key.trim());
            }
        }

        request.headers.get("x-api-key").map(|key| key.trim())
    }
}

#[async_trait]
impl Authenticator for ApiKeyAuthenticator {
    async fn authenticate(&self, request: &AuthRequest) -> Result<Identity, AuthError> {
        let provided_key = self
            .extract_key(request)
            .ok_or(AuthError::NotAuthenticated)?;
        let provided = digest(provided_key);

        // Check every entry so the time taken does not depend on which key matched
        let mut matched = None;
        for key in &self.keys {
            if constant_time_eq(&provided, &key.digest) {
                matched = Some(key.user.as_str());
            }
        }

        match matched {
            Some(user) => Ok(Identity {
                user_id: user.to_string(),
                method: "api_key".to_string(),
            }),
            None => Err(AuthError::InvalidCredentials("Invalid API key".to_string())),
        }
    }

    fn method_name(&self) -> &'static str {
        "api_key"
    }
}

fn digest(key: &str) -> [u8; 32] {
    let mut out = [0u8; 32];
    out.copy_from_slice(&Sha256::digest(key.as_bytes()));
    out
}

/// Constant-time byte comparison to prevent timing attacks.
fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }

    let mut result = 0u8;
    for (x, y) in a.iter().zip(b.iter()) {
        result |= x ^ y;
    }
    result == 0
}
