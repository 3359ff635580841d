//! Wire types and error definitions for the config server protocol.

use std::collections::HashMap;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::security::SignatureError;

/// Notification id of a namespace the server has never notified us about.
pub const NOTIFICATION_ID_PLACEHOLDER: i64 = -1;

/// One `{namespaceName, notificationId}` pair, in either direction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    pub namespace_name: String,
    pub notification_id: i64,
}

impl Notification {
    pub fn new(namespace_name: impl Into<String>, notification_id: i64) -> Self {
        Self {
            namespace_name: namespace_name.into(),
            notification_id,
        }
    }
}

/// Long-poll request covering a set of namespaces.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotificationRequest {
    pub cluster: String,
    pub notifications: Vec<Notification>,
    pub client_ip: Option<String>,
}

/// Full content fetch for one namespace.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigRequest {
    pub cluster: String,
    pub namespace: String,
    pub release_key: Option<String>,
    pub notification_id: i64,
    pub client_ip: Option<String>,
}

/// Body of a successful content fetch.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigPayload {
    #[serde(default)]
    pub app_id: String,
    #[serde(default)]
    pub cluster: String,
    #[serde(default)]
    pub namespace_name: String,
    #[serde(default)]
    pub configurations: HashMap<String, String>,
    #[serde(default)]
    pub release_key: Option<String>,
}

/// Errors talking to the config server.
#[derive(Debug, Error)]
pub enum RemoteError {
    /// Connection, timeout or body transfer failure.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Server answered with neither 2xx nor 304.
    #[error("Config server returned status {status}: {body}")]
    Status { status: u16, body: String },

    /// Response body was not the expected JSON.
    #[error("Failed to decode response: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    #[error(transparent)]
    Signature(#[from] SignatureError),
}

/// Result type for remote operations.
pub type RemoteResult<T> = Result<T, RemoteError>;

/// The two server calls the sync core depends on.
#[async_trait]
pub trait RemoteConfigService: Send + Sync + std::fmt::Debug {
    /// Long-poll for changes. An empty list means nothing changed before
    /// the server's hold timeout.
    async fn fetch_notifications(
        &self,
        request: &NotificationRequest,
    ) -> RemoteResult<Vec<Notification>>;

    /// Fetch full namespace content. `None` means not modified since
    /// `request.release_key`.
    async fn fetch_config(&self, request: &ConfigRequest) -> RemoteResult<Option<ConfigPayload>>;
}
