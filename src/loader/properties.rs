//! Key/value (properties) namespaces.

use std::collections::HashMap;
use std::sync::Arc;

use arc_swap::ArcSwap;
use async_trait::async_trait;
use tokio::sync::broadcast;

use crate::loader::change::{diff_properties, ConfigChangeEvent};
use crate::loader::{ConfigLoader, LoaderCore, LoaderResult};
use crate::namespace::ConfigType;

/// A properties namespace. Values are plain strings keyed by name.
#[derive(Debug)]
pub struct PropertiesConfig {
    core: LoaderCore,
    values: ArcSwap<HashMap<String, String>>,
}

impl PropertiesConfig {
    pub fn new(core: LoaderCore) -> Self {
        Self {
            core,
            values: ArcSwap::from_pointee(HashMap::new()),
        }
    }

    pub fn get_property(&self, key: &str) -> Option<String> {
        self.values.load().get(key).cloned()
    }

    pub fn get_property_or(&self, key: &str, default: &str) -> String {
        self.get_property(key).unwrap_or_else(|| default.to_string())
    }

    /// Snapshot of every key. Later refreshes do not affect it.
    pub fn get_all(&self) -> Arc<HashMap<String, String>> {
        self.values.load_full()
    }

    pub fn cluster_name(&self) -> &str {
        self.core.cluster()
    }

    pub fn release_key(&self) -> Option<String> {
        self.core.release_key()
    }
}

#[async_trait]
impl ConfigLoader for PropertiesConfig {
    fn namespace_name(&self) -> &str {
        self.core.namespace()
    }

    fn config_type(&self) -> ConfigType {
        ConfigType::Properties
    }

    fn notification_id(&self) -> i64 {
        self.core.notification_id()
    }

    fn set_notification_id(&self, notification_id: i64) {
        self.core.set_notification_id(notification_id);
    }

    async fn refresh(&self) -> LoaderResult<()> {
        let Some(payload) = self.core.fetch().await? else {
            return Ok(());
        };

        let next = Arc::new(payload.configurations);
        let previous = self.values.swap(next.clone());
        self.core.commit_release(payload.release_key);

        self.core.publish(diff_properties(&previous, &next));
        Ok(())
    }

    fn subscribe(&self) -> broadcast::Receiver<ConfigChangeEvent> {
        self.core.subscribe()
    }
}
