//! Config manager: cache, generations and the long-poll loop.
//!
//! # Data Flow
//! ```text
//! get_config(namespace):
//!     → namespace::resolve (base name + type)
//!     → cache hit?  return it (no network; freshness is the poll loop's job)
//!     → miss: build loader → warm-up notification + refresh (best effort)
//!            → cache insert → version.advance() → spawn poll::run(generation)
//!
//! poll::run(generation), per iteration:
//!     → stale generation?  exit
//!     → long-poll notifications for every cached namespace
//!     → refresh each changed namespace still in the cache
//!     → cache empty?  exit
//! ```
//!
//! # Design Decisions
//! - All state is owned by one manager; managers never share a cache or stamp
//! - The version stamp is the only coordination between loops
//! - Concurrent misses on one namespace are not serialized: each caller may
//!   warm its own loader and the last insert wins
//! - Nothing here is fatal; callers keep the last good content

pub mod cache;
pub mod poll;
pub mod version;

use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;

use crate::config::ClientConfig;
use crate::loader::{ConfigHandle, LoaderCore};
use crate::namespace::{resolve, ConfigType, NamespaceError};
use crate::observability::metrics;
use crate::remote::{
    HttpConfigService, Notification, NotificationRequest, RemoteConfigService, RemoteError,
    RemoteResult,
};

use self::cache::{cache_key, ConfigCache};
use self::version::VersionStamp;

pub use poll::PollState;

/// Errors returned to `get_config` callers.
#[derive(Debug, Error)]
pub enum ClientError {
    #[error(transparent)]
    Namespace(#[from] NamespaceError),

    #[error("Config type '{0}' is not supported")]
    UnsupportedType(ConfigType),

    #[error(transparent)]
    Remote(#[from] RemoteError),
}

pub type ClientResult<T> = Result<T, ClientError>;

/// Entry point for reading remote configuration.
///
/// Cloning is cheap and clones share state. Poll loops hold only a weak
/// reference, so they wind down once every clone is dropped.
#[derive(Debug, Clone)]
pub struct ConfigManager {
    inner: Arc<ManagerInner>,
}

#[derive(Debug)]
pub(crate) struct ManagerInner {
    pub(crate) cluster: String,
    client_ip: Option<String>,
    service: Arc<dyn RemoteConfigService>,
    pub(crate) cache: ConfigCache,
    pub(crate) version: VersionStamp,
    pub(crate) retry_delay: Duration,
}

impl ConfigManager {
    /// Create a manager over an arbitrary remote service.
    pub fn new(config: &ClientConfig, service: Arc<dyn RemoteConfigService>) -> Self {
        Self {
            inner: Arc::new(ManagerInner {
                cluster: config.cluster_name.clone(),
                client_ip: config.client_ip.clone(),
                service,
                cache: ConfigCache::new(),
                version: VersionStamp::default(),
                retry_delay: config.poll.failed_retry_delay(),
            }),
        }
    }

    /// Create a manager talking HTTP to `config.config_server_url`.
    pub fn connect(config: &ClientConfig) -> ClientResult<Self> {
        let service = HttpConfigService::new(config)?;
        Ok(Self::new(config, Arc::new(service)))
    }

    /// Return the loader for `namespace`, creating and warming it on first use.
    ///
    /// `client_ip` overrides the configured client IP for a newly created
    /// loader; it has no effect on a cache hit.
    pub async fn get_config(
        &self,
        namespace: &str,
        client_ip: Option<&str>,
    ) -> ClientResult<ConfigHandle> {
        let resolved = resolve(namespace)?;
        let key = cache_key(&self.inner.cluster, &resolved.base_name);

        if let Some(handle) = self.inner.cache.get(&key) {
            return Ok(handle);
        }

        let client_ip = client_ip
            .map(str::to_string)
            .or_else(|| self.inner.client_ip.clone());
        let core = LoaderCore::new(
            resolved.base_name.as_str(),
            self.inner.cluster.as_str(),
            client_ip,
            self.inner.service.clone(),
        );
        let handle = ConfigHandle::for_type(resolved.config_type, core)
            .ok_or(ClientError::UnsupportedType(resolved.config_type))?;

        let warming = |name: &str| (name == handle.namespace_name()).then(|| handle.clone());
        if let Err(e) = self.inner.sync(std::slice::from_ref(&handle), warming).await {
            tracing::warn!(
                namespace = %resolved.base_name,
                error = %e,
                "Load notifications failed, serving empty config until next poll"
            );
        }

        self.inner.cache.insert(key, handle.clone());
        let generation = self.inner.version.advance();
        metrics::record_entry_created();
        metrics::record_generation(generation);

        tracing::info!(
            namespace = %resolved.base_name,
            config_type = %resolved.config_type,
            generation,
            "Config namespace registered"
        );

        tokio::spawn(poll::run(Arc::downgrade(&self.inner), generation));

        Ok(handle)
    }

    /// Evict `namespace` from the cache. Returns whether an entry was removed.
    ///
    /// Running poll loops are not cancelled; they exit once the cache is empty.
    pub fn remove_config(&self, namespace: &str) -> bool {
        let Ok(resolved) = resolve(namespace) else {
            return false;
        };

        let removed = self
            .inner
            .cache
            .remove(&cache_key(&self.inner.cluster, &resolved.base_name))
            .is_some();
        if removed {
            tracing::info!(namespace = %resolved.base_name, "Config namespace removed");
        }
        removed
    }

    /// Current poll-loop generation. 0 until the first namespace is created.
    pub fn version(&self) -> u64 {
        self.inner.version.current()
    }

    pub fn cluster_name(&self) -> &str {
        &self.inner.cluster
    }

    /// Number of cached namespaces.
    pub fn len(&self) -> usize {
        self.inner.cache.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.cache.is_empty()
    }
}

impl ManagerInner {
    /// One notification round covering `targets`.
    ///
    /// Each changed namespace that `lookup` can still find is refreshed and
    /// then stamped with its new notification id. Refresh failures are
    /// logged and skipped. Returns how many namespaces were refreshed.
    pub(crate) async fn sync<F>(&self, targets: &[ConfigHandle], lookup: F) -> RemoteResult<usize>
    where
        F: Fn(&str) -> Option<ConfigHandle>,
    {
        let request = NotificationRequest {
            cluster: self.cluster.clone(),
            notifications: targets
                .iter()
                .map(|handle| Notification::new(handle.namespace_name(), handle.notification_id()))
                .collect(),
            client_ip: self.client_ip.clone(),
        };

        let notifications = self.service.fetch_notifications(&request).await?;
        if notifications.is_empty() {
            tracing::debug!(namespaces = targets.len(), "No config changes");
            return Ok(0);
        }

        let mut refreshed = 0;
        for notification in notifications {
            let Some(handle) = lookup(&notification.namespace_name) else {
                tracing::debug!(
                    namespace = %notification.namespace_name,
                    "Ignoring notification for uncached namespace"
                );
                continue;
            };

            match handle.refresh().await {
                Ok(()) => {
                    handle.set_notification_id(notification.notification_id);
                    metrics::record_refresh(&notification.namespace_name, true);
                    refreshed += 1;
                }
                Err(e) => {
                    metrics::record_refresh(&notification.namespace_name, false);
                    tracing::warn!(
                        namespace = %notification.namespace_name,
                        error = %e,
                        "Fetch configs failed"
                    );
                }
            }
        }

        Ok(refreshed)
    }
}

#[cfg(test)]
pub(crate) mod testing {
    //! Scripted config server for manager and poll loop tests.

    use std::collections::{HashSet, VecDeque};
    use std::sync::Mutex;
    use std::time::Duration;

    use async_trait::async_trait;
    use tokio::time::Instant;

    use crate::remote::{
        ConfigPayload, ConfigRequest, Notification, NotificationRequest, RemoteConfigService,
        RemoteError, RemoteResult,
    };

    /// Scripted answer to one notification call.
    #[derive(Debug)]
    pub enum Reply {
        Fail,
        Changes(Vec<Notification>),
    }

    /// Answers notification calls from a script; once the script runs out,
    /// holds each call for `hold` and reports no change, like an idle server.
    /// Content fetches succeed unless the namespace was marked failing.
    #[derive(Debug)]
    pub struct ScriptedServer {
        script: Mutex<VecDeque<Reply>>,
        hold: Duration,
        calls: Mutex<Vec<(Instant, NotificationRequest)>>,
        fetched: Mutex<Vec<String>>,
        failing: Mutex<HashSet<String>>,
    }

    impl ScriptedServer {
        pub fn new(script: Vec<Reply>, hold: Duration) -> Self {
            Self {
                script: Mutex::new(script.into()),
                hold,
                calls: Mutex::new(Vec::new()),
                fetched: Mutex::new(Vec::new()),
                failing: Mutex::new(HashSet::new()),
            }
        }

        /// Make every content fetch for `namespace` answer 500.
        pub fn fail_fetches(&self, namespace: &str) {
            self.failing.lock().unwrap().insert(namespace.to_string());
        }

        pub fn idle(hold: Duration) -> Self {
            Self::new(Vec::new(), hold)
        }

        pub fn call_count(&self) -> usize {
            self.calls.lock().unwrap().len()
        }

        pub fn call_times(&self) -> Vec<Instant> {
            self.calls.lock().unwrap().iter().map(|(at, _)| *at).collect()
        }

        pub fn requests(&self) -> Vec<NotificationRequest> {
            self.calls.lock().unwrap().iter().map(|(_, r)| r.clone()).collect()
        }

        pub fn fetch_count(&self, namespace: &str) -> usize {
            self.fetched.lock().unwrap().iter().filter(|n| *n == namespace).count()
        }
    }

    #[async_trait]
    impl RemoteConfigService for ScriptedServer {
        async fn fetch_notifications(
            &self,
            request: &NotificationRequest,
        ) -> RemoteResult<Vec<Notification>> {
            self.calls.lock().unwrap().push((Instant::now(), request.clone()));
            let reply = self.script.lock().unwrap().pop_front();

            match reply {
                Some(Reply::Fail) => Err(RemoteError::Status {
                    status: 500,
                    body: "scripted failure".into(),
                }),
                Some(Reply::Changes(changes)) => Ok(changes),
                None => {
                    tokio::time::sleep(self.hold).await;
                    Ok(Vec::new())
                }
            }
        }

        async fn fetch_config(
            &self,
            request: &ConfigRequest,
        ) -> RemoteResult<Option<ConfigPayload>> {
            let count = {
                let mut fetched = self.fetched.lock().unwrap();
                fetched.push(request.namespace.clone());
                fetched.len()
            };

            if self.failing.lock().unwrap().contains(&request.namespace) {
                return Err(RemoteError::Status {
                    status: 500,
                    body: "scripted fetch failure".into(),
                });
            }

            Ok(Some(ConfigPayload {
                namespace_name: request.namespace.clone(),
                configurations: [("revision".to_string(), count.to_string())].into_iter().collect(),
                release_key: Some(format!("rk-{}", count)),
                ..ConfigPayload::default()
            }))
        }
    }
}
