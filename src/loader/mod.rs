//! Per-namespace config loaders.
//!
//! # Data Flow
//! ```text
//! refresh():
//!     LoaderCore::fetch (release key + notification id + client ip)
//!     → RemoteConfigService::fetch_config
//!     → None (304): keep current content
//!     → Some(payload): parse for the loader's type
//!         → ArcSwap content store
//!         → ConfigChangeEvent broadcast (if anything changed)
//! ```
//!
//! # Design Decisions
//! - One loader instance per cached namespace; handles are cheap `Arc` clones
//! - Readers never block: content lives behind `arc-swap`
//! - `ConfigHandle` is the tagged variant the cache stores; it dispatches
//!   to the `ConfigLoader` capability shared by every kind

pub mod change;
pub mod json;
pub mod properties;

use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;

use arc_swap::ArcSwapOption;
use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::broadcast;

use crate::namespace::ConfigType;
use crate::remote::{
    ConfigPayload, ConfigRequest, RemoteConfigService, RemoteError, NOTIFICATION_ID_PLACEHOLDER,
};

pub use change::{ChangeType, ConfigChange, ConfigChangeEvent};
pub use json::JsonConfig;
pub use properties::PropertiesConfig;

/// Buffered change events per subscriber before lagging.
pub const CHANGE_CHANNEL_CAPACITY: usize = 64;

/// Errors raised while refreshing a namespace.
#[derive(Debug, Error)]
pub enum LoaderError {
    #[error(transparent)]
    Remote(#[from] RemoteError),

    #[error("Invalid namespace content: {0}")]
    Content(#[source] serde_json::Error),
}

pub type LoaderResult<T> = Result<T, LoaderError>;

/// Operations every loader kind supports.
#[async_trait]
pub trait ConfigLoader: Send + Sync {
    fn namespace_name(&self) -> &str;

    fn config_type(&self) -> ConfigType;

    fn notification_id(&self) -> i64;

    fn set_notification_id(&self, notification_id: i64);

    /// Fetch the latest content from the server and apply it.
    async fn refresh(&self) -> LoaderResult<()>;

    fn subscribe(&self) -> broadcast::Receiver<ConfigChangeEvent>;
}

/// State shared by all loader kinds.
#[derive(Debug)]
pub struct LoaderCore {
    namespace: String,
    cluster: String,
    client_ip: Option<String>,
    notification_id: AtomicI64,
    release_key: ArcSwapOption<String>,
    service: Arc<dyn RemoteConfigService>,
    changes: broadcast::Sender<ConfigChangeEvent>,
}

impl LoaderCore {
    pub fn new(
        namespace: impl Into<String>,
        cluster: impl Into<String>,
        client_ip: Option<String>,
        service: Arc<dyn RemoteConfigService>,
    ) -> Self {
        let (changes, _) = broadcast::channel(CHANGE_CHANNEL_CAPACITY);
        Self {
            namespace: namespace.into(),
            cluster: cluster.into(),
            client_ip,
            notification_id: AtomicI64::new(NOTIFICATION_ID_PLACEHOLDER),
            release_key: ArcSwapOption::empty(),
            service,
            changes,
        }
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    pub fn cluster(&self) -> &str {
        &self.cluster
    }

    pub fn client_ip(&self) -> Option<&str> {
        self.client_ip.as_deref()
    }

    pub fn notification_id(&self) -> i64 {
        self.notification_id.load(Ordering::Acquire)
    }

    pub fn set_notification_id(&self, notification_id: i64) {
        self.notification_id.store(notification_id, Ordering::Release);
    }

    pub fn release_key(&self) -> Option<String> {
        self.release_key.load_full().map(|key| key.as_ref().clone())
    }

    /// Request the namespace content. `None` means unchanged.
    pub async fn fetch(&self) -> LoaderResult<Option<ConfigPayload>> {
        let request = ConfigRequest {
            cluster: self.cluster.clone(),
            namespace: self.namespace.clone(),
            release_key: self.release_key(),
            notification_id: self.notification_id(),
            client_ip: self.client_ip.clone(),
        };

        let payload = self.service.fetch_config(&request).await?;
        if payload.is_none() {
            tracing::debug!(namespace = %self.namespace, "Config not modified");
        }
        Ok(payload)
    }

    /// Record the release a successfully applied payload came from.
    pub fn commit_release(&self, release_key: Option<String>) {
        self.release_key.store(release_key.map(Arc::new));
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ConfigChangeEvent> {
        self.changes.subscribe()
    }

    /// Broadcast `changes`, if any. Having no subscribers is fine.
    pub fn publish(&self, changes: Vec<ConfigChange>) {
        if changes.is_empty() {
            return;
        }

        tracing::info!(
            namespace = %self.namespace,
            changed = changes.len(),
            "Config changed"
        );

        let _ = self.changes.send(ConfigChangeEvent {
            namespace: self.namespace.clone(),
            changes,
        });
    }
}

/// A cached namespace, tagged by content type.
#[derive(Debug, Clone)]
pub enum ConfigHandle {
    Properties(Arc<PropertiesConfig>),
    Json(Arc<JsonConfig>),
}

impl ConfigHandle {
    /// Build the loader for `config_type`, or `None` if no loader handles it.
    pub fn for_type(config_type: ConfigType, core: LoaderCore) -> Option<Self> {
        match config_type {
            ConfigType::Properties => Some(Self::Properties(Arc::new(PropertiesConfig::new(core)))),
            ConfigType::Json => Some(Self::Json(Arc::new(JsonConfig::new(core)))),
            ConfigType::Xml | ConfigType::Yml | ConfigType::Yaml | ConfigType::Txt => None,
        }
    }

    pub fn loader(&self) -> &dyn ConfigLoader {
        match self {
            Self::Properties(config) => config.as_ref() as &dyn ConfigLoader,
            Self::Json(config) => config.as_ref() as &dyn ConfigLoader,
        }
    }

    pub fn namespace_name(&self) -> &str {
        self.loader().namespace_name()
    }

    pub fn config_type(&self) -> ConfigType {
        self.loader().config_type()
    }

    pub fn notification_id(&self) -> i64 {
        self.loader().notification_id()
    }

    pub fn set_notification_id(&self, notification_id: i64) {
        self.loader().set_notification_id(notification_id)
    }

    pub async fn refresh(&self) -> LoaderResult<()> {
        self.loader().refresh().await
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ConfigChangeEvent> {
        self.loader().subscribe()
    }

    pub fn as_properties(&self) -> Option<&Arc<PropertiesConfig>> {
        match self {
            Self::Properties(config) => Some(config),
            Self::Json(_) => None,
        }
    }

    pub fn as_json(&self) -> Option<&Arc<JsonConfig>> {
        match self {
            Self::Json(config) => Some(config),
            Self::Properties(_) => None,
        }
    }

    /// True if both handles refer to the same loader instance.
    pub fn ptr_eq(&self, other: &ConfigHandle) -> bool {
        match (self, other) {
            (Self::Properties(a), Self::Properties(b)) => Arc::ptr_eq(a, b),
            (Self::Json(a), Self::Json(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }
}


#[cfg(test)]
mod tests {
    use super::testing::StubService;
    use super::*;

    fn core(namespace: &str) -> LoaderCore {
        LoaderCore::new(namespace, "default", None, Arc::new(StubService::default()))
    }

    #[test]
    fn test_for_type() {
        assert!(matches!(
            ConfigHandle::for_type(ConfigType::Properties, core("application")),
            Some(ConfigHandle::Properties(_))
        ));
        assert!(matches!(
            ConfigHandle::for_type(ConfigType::Json, core("flags.json")),
            Some(ConfigHandle::Json(_))
        ));
        assert!(ConfigHandle::for_type(ConfigType::Yaml, core("deploy.yaml")).is_none());
    }

    #[test]
    fn test_notification_id_starts_at_placeholder() {
        let handle = ConfigHandle::for_type(ConfigType::Properties, core("application")).unwrap();
        assert_eq!(handle.notification_id(), NOTIFICATION_ID_PLACEHOLDER);

        handle.set_notification_id(12);
        assert_eq!(handle.notification_id(), 12);
    }

    #[test]
    fn test_ptr_eq() {
        let a = ConfigHandle::for_type(ConfigType::Properties, core("application")).unwrap();
        let b = ConfigHandle::for_type(ConfigType::Properties, core("application")).unwrap();
        assert!(a.ptr_eq(&a.clone()));
        assert!(!a.ptr_eq(&b));
    }
}
