//! RustyPeriph - BLE GATT peripheral session engine
//!
//! This library implements the policy side of a Bluetooth Low Energy
//! peripheral running on top of an external host stack: it builds and serves a
//! single GATT service, decides every pairing step, reassembles long writes,
//! serializes indications and drives advertising and connection parameters
//! from the host's event stream.
//!
//! Link layer, ATT PDU encoding and pairing cryptography belong to the host
//! stack, reached through the [`HostStack`] trait.

pub mod att;
pub mod config;
pub mod error;
pub mod gap;
pub mod gatt;
pub mod host;
pub mod session;
pub mod smp;

// Re-export common types for convenience
pub use att::{AttError, GattStatus};
pub use config::{ConfigError, PeripheralConfig, PowerLevel};
pub use error::{Error, Result};
pub use gap::{BdAddr, ConnectionIntervalProfile, ConnectionParams};
pub use gatt::{build_schema, AttributeEntry, AttributeSlot, AttributeTable, CccdValue, Uuid};
pub use host::{DataCallback, HostError, HostStack, Peripheral};
pub use session::{
    transition, Command, Connection, HostEvent, LinkState, ServiceState, Session, SessionState,
};
pub use smp::{IoCapability, SecurityDecision, SecurityParameters, SecurityPolicy, SmpError};
