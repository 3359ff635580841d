//! Change events emitted by loaders after a refresh.

use std::collections::{BTreeSet, HashMap};

/// What happened to a key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeType {
    Added,
    Modified,
    Deleted,
}

/// A single key-level change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigChange {
    pub key: String,
    pub old_value: Option<String>,
    pub new_value: Option<String>,
    pub change_type: ChangeType,
}

impl ConfigChange {
    /// Classify a transition. Returns `None` when nothing changed.
    pub fn between(
        key: impl Into<String>,
        old_value: Option<String>,
        new_value: Option<String>,
    ) -> Option<Self> {
        let change_type = match (&old_value, &new_value) {
            (None, Some(_)) => ChangeType::Added,
            (Some(_), None) => ChangeType::Deleted,
            (Some(old), Some(new)) if old != new => ChangeType::Modified,
            _ => return None,
        };

        Some(Self {
            key: key.into(),
            old_value,
            new_value,
            change_type,
        })
    }
}

/// All changes applied to one namespace by one refresh.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigChangeEvent {
    pub namespace: String,
    pub changes: Vec<ConfigChange>,
}

impl ConfigChangeEvent {
    pub fn change(&self, key: &str) -> Option<&ConfigChange> {
        self.changes.iter().find(|change| change.key == key)
    }

    pub fn changed_keys(&self) -> impl Iterator<Item = &str> {
        self.changes.iter().map(|change| change.key.as_str())
    }
}

/// Key-by-key diff of two property sets, ordered by key.
pub fn diff_properties(
    old: &HashMap<String, String>,
    new: &HashMap<String, String>,
) -> Vec<ConfigChange> {
    let keys: BTreeSet<&String> = old.keys().chain(new.keys()).collect();

    keys.into_iter()
        .filter_map(|key| {
            ConfigChange::between(key.as_str(), old.get(key).cloned(), new.get(key).cloned())
        })
        .collect()
}
