//! HTTP client for the config server.
//!
//! # Responsibilities
//! - Build notification and config URLs
//! - Sign requests when a secret is configured
//! - Map 304 / empty bodies to "no change"
//! - Enforce separate timeouts for long-poll and plain requests

use std::time::Duration;

use async_trait::async_trait;
use reqwest::StatusCode;
use serde_json::json;
use url::Url;

use crate::config::ClientConfig;
use crate::manager::cache::CLUSTER_NAMESPACE_SEPARATOR;
use crate::remote::types::{
    ConfigPayload, ConfigRequest, Notification, NotificationRequest, RemoteConfigService,
    RemoteError, RemoteResult, NOTIFICATION_ID_PLACEHOLDER,
};
use crate::security::signature::{AccessSigner, AUTHORIZATION_HEADER, TIMESTAMP_HEADER};

/// reqwest-backed [`RemoteConfigService`].
#[derive(Debug, Clone)]
pub struct HttpConfigService {
    client: reqwest::Client,
    base_url: Url,
    app_id: String,
    signer: Option<AccessSigner>,
    long_poll_timeout: Duration,
    request_timeout: Duration,
}

impl HttpConfigService {
    /// Create a client from settings.
    pub fn new(config: &ClientConfig) -> RemoteResult<Self> {
        let base_url = Url::parse(&config.config_server_url).map_err(|e| {
            RemoteError::InvalidUrl(format!("'{}': {}", config.config_server_url, e))
        })?;
        if base_url.cannot_be_a_base() {
            return Err(RemoteError::InvalidUrl(config.config_server_url.clone()));
        }

        let signer = config
            .secret
            .as_ref()
            .filter(|secret| !secret.is_empty())
            .map(|secret| AccessSigner::new(config.app_id.clone(), secret.clone()));

        let client = reqwest::Client::builder().build()?;

        tracing::info!(
            server = %base_url,
            app_id = %config.app_id,
            signed = signer.is_some(),
            "Config server client initialized"
        );

        Ok(Self {
            client,
            base_url,
            app_id: config.app_id.clone(),
            signer,
            long_poll_timeout: Duration::from_secs(config.poll.long_poll_timeout_secs),
            request_timeout: Duration::from_secs(config.timeouts.request_secs),
        })
    }

    /// `{server}/notifications/v2?appId=&cluster=&notifications=[&ip=]`
    pub fn notifications_url(&self, request: &NotificationRequest) -> RemoteResult<Url> {
        let mut url = self.endpoint(&["notifications", "v2"])?;
        let notifications = serde_json::to_string(&request.notifications)?;
        {
            let mut query = url.query_pairs_mut();
            query
                .append_pair("appId", &self.app_id)
                .append_pair("cluster", &request.cluster)
                .append_pair("notifications", &notifications);
            if let Some(ip) = &request.client_ip {
                query.append_pair("ip", ip);
            }
        }
        Ok(url)
    }

    /// `{server}/configs/{appId}/{cluster}/{namespace}[?releaseKey=&ip=&messages=]`
    pub fn config_url(&self, request: &ConfigRequest) -> RemoteResult<Url> {
        let mut url = self.endpoint(&[
            "configs",
            self.app_id.as_str(),
            request.cluster.as_str(),
            request.namespace.as_str(),
        ])?;

        let messages = if request.notification_id != NOTIFICATION_ID_PLACEHOLDER {
            let key = [
                self.app_id.as_str(),
                request.cluster.as_str(),
                request.namespace.as_str(),
            ]
            .join(CLUSTER_NAMESPACE_SEPARATOR);
            Some(json!({ "details": { key: request.notification_id } }).to_string())
        } else {
            None
        };

        let params = [
            ("releaseKey", request.release_key.as_deref()),
            ("ip", request.client_ip.as_deref()),
            ("messages", messages.as_deref()),
        ];
        if params.iter().any(|(_, value)| value.is_some()) {
            let mut query = url.query_pairs_mut();
            for (name, value) in params {
                if let Some(value) = value {
                    query.append_pair(name, value);
                }
            }
        }
        Ok(url)
    }

    fn endpoint(&self, segments: &[&str]) -> RemoteResult<Url> {
        let mut url = self.base_url.clone();
        url.set_query(None);
        url.path_segments_mut()
            .map_err(|_| RemoteError::InvalidUrl(self.base_url.to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    /// GET `url`, returning `None` for 304 or an empty body.
    async fn get(&self, url: Url, timeout: Duration) -> RemoteResult<Option<String>> {
        let mut builder = self.client.get(url.clone()).timeout(timeout);
        if let Some(signer) = &self.signer {
            let headers = signer.sign(&url)?;
            builder = builder
                .header(AUTHORIZATION_HEADER, headers.authorization)
                .header(TIMESTAMP_HEADER, headers.timestamp);
        }

        let response = builder.send().await?;
        let status = response.status();

        if status == StatusCode::NOT_MODIFIED {
            return Ok(None);
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(RemoteError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let body = response.text().await?;
        if body.trim().is_empty() {
            Ok(None)
        } else {
            Ok(Some(body))
        }
    }
}

#[async_trait]
impl RemoteConfigService for HttpConfigService {
    async fn fetch_notifications(
        &self,
        request: &NotificationRequest,
    ) -> RemoteResult<Vec<Notification>> {
        let url = self.notifications_url(request)?;
        match self.get(url, self.long_poll_timeout).await? {
            Some(body) => Ok(serde_json::from_str(&body)?),
            None => Ok(Vec::new()),
        }
    }

    async fn fetch_config(&self, request: &ConfigRequest) -> RemoteResult<Option<ConfigPayload>> {
        let url = self.config_url(request)?;
        match self.get(url, self.request_timeout).await? {
            Some(body) => Ok(Some(serde_json::from_str(&body)?)),
            None => Ok(None),
        }
    }
}
