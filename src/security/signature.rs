//! Signed access to the config server.
//!
//! # Header Format
//! ```text
//! Timestamp:     <unix millis>
//! Authorization: Apollo <app_id>:base64(HMAC-SHA1(secret, "<timestamp>\n<path?query>"))
//! ```

use std::time::{SystemTime, UNIX_EPOCH};

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use hmac::{Hmac, Mac};
use sha1::Sha1;
use thiserror::Error;
use url::Url;

type HmacSha1 = Hmac<Sha1>;

pub const AUTHORIZATION_HEADER: &str = "Authorization";
pub const TIMESTAMP_HEADER: &str = "Timestamp";

const AUTHORIZATION_SCHEME: &str = "Apollo";

#[derive(Debug, Error)]
#[error("failed to initialise HMAC: {0}")]
pub struct SignatureError(#[from] hmac::digest::InvalidLength);

/// Header values to attach to one outbound request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessHeaders {
    pub authorization: String,
    pub timestamp: String,
}

/// Produces access headers for an application secret.
#[derive(Clone)]
pub struct AccessSigner {
    app_id: String,
    secret: String,
}

impl std::fmt::Debug for AccessSigner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AccessSigner")
            .field("app_id", &self.app_id)
            .finish_non_exhaustive()
    }
}

impl AccessSigner {
    pub fn new(app_id: impl Into<String>, secret: impl Into<String>) -> Self {
        Self {
            app_id: app_id.into(),
            secret: secret.into(),
        }
    }

    /// Sign `url` with the current wall-clock time.
    pub fn sign(&self, url: &Url) -> Result<AccessHeaders, SignatureError> {
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_millis();
        self.sign_at(url, now)
    }

    /// Sign `url` as of `timestamp_ms`.
    pub fn sign_at(&self, url: &Url, timestamp_ms: u128) -> Result<AccessHeaders, SignatureError> {
        let timestamp = timestamp_ms.to_string();
        let signature = signature(&timestamp, &path_with_query(url), &self.secret)?;

        Ok(AccessHeaders {
            authorization: format!("{} {}:{}", AUTHORIZATION_SCHEME, self.app_id, signature),
            timestamp,
        })
    }
}

/// Base64 HMAC-SHA1 of `"<timestamp>\n<path_with_query>"`.
pub fn signature(
    timestamp: &str,
    path_with_query: &str,
    secret: &str,
) -> Result<String, SignatureError> {
    let mut mac = HmacSha1::new_from_slice(secret.as_bytes())?;
    mac.update(timestamp.as_bytes());
    mac.update(b"\n");
    mac.update(path_with_query.as_bytes());

    Ok(STANDARD.encode(mac.finalize().into_bytes()))
}

fn path_with_query(url: &Url) -> String {
    match url.query() {
        Some(query) => format!("{}?{}", url.path(), query),
        None => url.path().to_string(),
    }
}
