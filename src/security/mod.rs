//! Security subsystem.
//!
//! # Data Flow
//! ```text
//! Outbound request (only when a secret is configured):
//!     → signature.rs (HMAC over timestamp + path/query)
//!     → Authorization + Timestamp headers attached by remote::client
//! ```

pub mod signature;

pub use signature::{AccessHeaders, AccessSigner, SignatureError};
