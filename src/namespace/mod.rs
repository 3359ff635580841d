//! Namespace naming subsystem.
//!
//! # Data Flow
//! ```text
//! raw namespace ("application", "flags.json", "app.properties")
//!     → resolver.rs (suffix match, strip default suffix)
//!     → ResolvedNamespace { base_name, config_type }
//!     → manager picks a loader by config_type
//! ```

pub mod resolver;

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use resolver::{resolve, ResolvedNamespace};

/// Content format of a namespace, as declared by its name suffix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConfigType {
    Properties,
    Xml,
    Json,
    Yml,
    Yaml,
    Txt,
}

impl ConfigType {
    /// Suffix match order. The first match wins.
    pub const ALL: [ConfigType; 6] = [
        ConfigType::Properties,
        ConfigType::Xml,
        ConfigType::Json,
        ConfigType::Yml,
        ConfigType::Yaml,
        ConfigType::Txt,
    ];

    /// The type assumed when a name carries no recognized suffix.
    pub const DEFAULT: ConfigType = ConfigType::Properties;

    pub fn suffix(self) -> &'static str {
        match self {
            ConfigType::Properties => "properties",
            ConfigType::Xml => "xml",
            ConfigType::Json => "json",
            ConfigType::Yml => "yml",
            ConfigType::Yaml => "yaml",
            ConfigType::Txt => "txt",
        }
    }
}

impl fmt::Display for ConfigType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.suffix())
    }
}

/// Errors raised while resolving a namespace name.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NamespaceError {
    #[error("invalid namespace '{0}': name can not be empty")]
    InvalidArgument(String),
}

pub type NamespaceResult<T> = Result<T, NamespaceError>;
