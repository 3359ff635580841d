//! Config server protocol.
//!
//! # Data Flow
//! ```text
//! Poll loop / warm-up:
//!     → NotificationRequest (every targeted namespace + last notification id)
//!     → GET /notifications/v2   (server holds until change or timeout)
//!     → Vec<Notification>       (empty on 304)
//!
//! Loader refresh:
//!     → ConfigRequest (namespace, release key, notification id)
//!     → GET /configs/{app}/{cluster}/{namespace}
//!     → Option<ConfigPayload>   (None on 304)
//! ```
//!
//! # Design Decisions
//! - The core depends on the `RemoteConfigService` trait, not on reqwest
//! - Long-poll and plain requests use separate timeouts

pub mod client;
pub mod types;

pub use client::HttpConfigService;
pub use types::{
    ConfigPayload, ConfigRequest, Notification, NotificationRequest, RemoteConfigService,
    RemoteError, RemoteResult, NOTIFICATION_ID_PLACEHOLDER,
};
