//! JSON document namespaces.
//!
//! The server ships the document as a string under the `content` key of
//! the namespace's configurations.

use std::sync::Arc;

use arc_swap::ArcSwap;
use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::broadcast;

use crate::loader::change::{ConfigChange, ConfigChangeEvent};
use crate::loader::{ConfigLoader, LoaderCore, LoaderError, LoaderResult};
use crate::namespace::ConfigType;

/// Key holding the raw document in a non-properties namespace.
pub const CONTENT_KEY: &str = "content";

/// A JSON namespace.
#[derive(Debug)]
pub struct JsonConfig {
    core: LoaderCore,
    value: ArcSwap<Value>,
}

impl JsonConfig {
    pub fn new(core: LoaderCore) -> Self {
        Self {
            core,
            value: ArcSwap::from_pointee(Value::Null),
        }
    }

    /// The whole document. `Value::Null` until first loaded.
    pub fn get_value(&self) -> Arc<Value> {
        self.value.load_full()
    }

    /// Look up a JSON pointer such as `/features/0/name`.
    pub fn get_property(&self, pointer: &str) -> Option<Value> {
        self.value.load().pointer(pointer).cloned()
    }

    pub fn cluster_name(&self) -> &str {
        self.core.cluster()
    }

    pub fn release_key(&self) -> Option<String> {
        self.core.release_key()
    }
}

fn render(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        other => Some(other.to_string()),
    }
}

#[async_trait]
impl ConfigLoader for JsonConfig {
    fn namespace_name(&self) -> &str {
        self.core.namespace()
    }

    fn config_type(&self) -> ConfigType {
        ConfigType::Json
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

        let next = match payload.configurations.get(CONTENT_KEY) {
            Some(raw) => serde_json::from_str(raw).map_err(LoaderError::Content)?,
            None => Value::Null,
        };

        let next = Arc::new(next);
        let previous = self.value.swap(next.clone());
        self.core.commit_release(payload.release_key);

        let change = ConfigChange::between(CONTENT_KEY, render(&previous), render(&next));
        self.core.publish(change.into_iter().collect());
        Ok(())
    }

    fn subscribe(&self) -> broadcast::Receiver<ConfigChangeEvent> {
        self.core.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loader::change::ChangeType;
    use crate::loader::testing::StubService;

    fn config(service: &Arc<StubService>) -> JsonConfig {
        JsonConfig::new(LoaderCore::new("flags.json", "default", None, service.clone()))
    }

    #[tokio::test]
    async fn test_refresh_parses_content() {
        let service = Arc::new(StubService::default());
        service.push_payload(
            "flags.json",
            &[("content", r#"{"features":[{"name":"dark-mode","on":true}]}"#)],
            "rk-1",
        );
        let config = config(&service);

        assert!(config.get_value().is_null());
        config.refresh().await.unwrap();

        assert_eq!(config.get_property("/features/0/name"), Some(Value::from("dark-mode")));
        assert_eq!(config.get_property("/features/0/on"), Some(Value::Bool(true)));
        assert!(config.get_property("/missing").is_none());
    }

    #[tokio::test]
    async fn test_document_change_event() {
        let service = Arc::new(StubService::default());
        service.push_payload("flags.json", &[("content", r#"{"v":1}"#)], "rk-1");
        service.push_payload("flags.json", &[("content", r#"{"v":1}"#)], "rk-2");
        service.push_payload("flags.json", &[("content", r#"{"v":2}"#)], "rk-3");
        let config = config(&service);
        let mut changes = config.subscribe();

        config.refresh().await.unwrap();
        let added = changes.recv().await.unwrap();
        assert_eq!(added.changes[0].change_type, ChangeType::Added);
        assert_eq!(added.changes[0].key, CONTENT_KEY);

        // Same document under a new release: no event.
        config.refresh().await.unwrap();
        assert!(changes.try_recv().is_err());

        config.refresh().await.unwrap();
        let modified = changes.recv().await.unwrap();
        assert_eq!(modified.changes[0].change_type, ChangeType::Modified);
        assert_eq!(modified.changes[0].new_value.as_deref(), Some(r#"{"v":2}"#));
    }

    #[tokio::test]
    async fn test_concurrent_refreshes_publish_installed_documents() {
        let service = Arc::new(StubService::default());
        for v in 1..=3 {
            let document = format!(r#"{{"v":{v}}}"#);
            service.push_payload("flags.json", &[("content", document.as_str())], "rk");
        }
        let config = config(&service);
        let mut changes = config.subscribe();

        let (a, b, c) = tokio::join!(config.refresh(), config.refresh(), config.refresh());
        a.unwrap();
        b.unwrap();
        c.unwrap();

        // Each event diffs the document it replaced against the one it installed.
        let mut installed: Option<String> = None;
        while let Ok(event) = changes.try_recv() {
            let change = &event.changes[0];
            assert_eq!(change.old_value, installed);
            installed = change.new_value.clone();
        }
        assert_eq!(installed, Some(config.get_value().to_string()));
    }

    #[tokio::test]
    async fn test_invalid_content_keeps_previous_document() {
        let service = Arc::new(StubService::default());
        service.push_payload("flags.json", &[("content", r#"{"v":1}"#)], "rk-1");
        service.push_payload("flags.json", &[("content", "{not json")], "rk-2");
        let config = config(&service);

        config.refresh().await.unwrap();
        let err = config.refresh().await.unwrap_err();

        assert!(matches!(err, LoaderError::Content(_)));
        assert_eq!(config.get_property("/v"), Some(Value::from(1)));
        assert_eq!(config.release_key().as_deref(), Some("rk-1"));
    }

    #[tokio::test]
    async fn test_missing_content_is_null() {
        let service = Arc::new(StubService::default());
        service.push_payload("flags.json", &[], "rk-1");
        let config = config(&service);

        config.refresh().await.unwrap();
        assert!(config.get_value().is_null());
    }
}
