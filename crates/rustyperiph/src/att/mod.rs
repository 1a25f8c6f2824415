//! Attribute Protocol (ATT) definitions
//!
//! The host stack owns ATT PDU encoding; this module carries the pieces the
//! peripheral needs to talk about attributes: status codes, permissions,
//! MTU limits and the declaration UUIDs used by the attribute table.

pub mod constants;
pub mod error;
pub mod types;

// Re-export the public API
pub use self::constants::*;
pub use self::error::{AttError, AttResult, GattStatus};
pub use self::types::{AttPermissions, EncryptionLevel};
