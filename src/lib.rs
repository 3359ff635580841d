//! Runtime configuration sync client for Apollo-style config servers.
//!
//! Namespaces are fetched on first use, cached, and kept fresh by a
//! long-poll loop running in the background.
//!
//! ```no_run
//! use config_sync::{ClientConfig, ConfigManager};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = ClientConfig::new("http://localhost:8080", "orders", "default");
//! let manager = ConfigManager::connect(&config)?;
//!
//! let application = manager.get_config("application", None).await?;
//! if let Some(props) = application.as_properties() {
//!     let timeout = props.get_property_or("timeout", "30");
//!     println!("timeout = {timeout}");
//! }
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod lifecycle;
pub mod loader;
pub mod manager;
pub mod namespace;
pub mod observability;
pub mod remote;
pub mod security;

pub use config::ClientConfig;
pub use loader::{ConfigChangeEvent, ConfigHandle, ConfigLoader, JsonConfig, PropertiesConfig};
pub use manager::{ClientError, ClientResult, ConfigManager};
pub use namespace::ConfigType;
pub use remote::{HttpConfigService, RemoteConfigService};
