//! Lifecycle management for the sync daemon.
//!
//! # Data Flow
//! ```text
//! Signals (signals.rs):
//!     SIGINT/SIGTERM → wait_for_shutdown_signal() returns
//!
//! Shutdown (shutdown.rs):
//!     trigger() → every subscribed watcher task exits
//! ```

pub mod shutdown;
pub mod signals;

pub use shutdown::Shutdown;
