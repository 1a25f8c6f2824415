//! Error types for the rustyperiph library
//!
//! Protocol-level outcomes (bad offsets, unknown handles) are answered with an
//! ATT status and never surface here. These errors cover calls the
//! application makes and commands the host stack refuses.

use crate::att::AttError;
use crate::config::ConfigError;
use crate::host::HostError;
use crate::smp::SmpError;
use std::time::Duration;
use thiserror::Error;

/// Errors returned by the peripheral
#[derive(Error, Debug)]
pub enum Error {
    #[error("Attribute error: {0}")]
    Att(#[from] AttError),

    #[error("Security error: {0}")]
    Smp(#[from] SmpError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Host stack error: {0}")]
    Host(#[from] HostError),

    #[error("No central connected")]
    NotConnected,

    #[error("Indication not confirmed within {0:?}")]
    SendTimeout(Duration),

    #[error("Value of {len} bytes exceeds the usable MTU of {max}")]
    ValueTooLong { len: usize, max: usize },
}

/// Result type for peripheral operations
pub type Result<T> = std::result::Result<T, Error>;
