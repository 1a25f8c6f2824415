//! Start-up configuration

use crate::gap::{ConnectionIntervalProfile, DEVICE_NAME_MAX_LEN};
use crate::session::{BackoffConfig, PREPARE_BUF_MAX_SIZE};
use crate::smp::{generate_passkey, SecurityParameters, SmpError, SMP_DEFAULT_STATIC_PASSKEY};
use std::fmt;
use std::time::Duration;
use thiserror::Error;

/// Longest device name accepted
///
/// The host limit is 32 bytes including a terminator; keep a little slack.
pub const DEVICE_NAME_LIMIT: usize = DEVICE_NAME_MAX_LEN - 3;

/// Configuration errors
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Device name is empty")]
    EmptyDeviceName,

    #[error("Device name is {len} bytes, limit is {max}")]
    DeviceNameTooLong { len: usize, max: usize },

    #[error("Prepare buffer capacity must be non-zero")]
    ZeroPrepareCapacity,

    #[error("Send backoff poll interval must be non-zero")]
    ZeroPollInterval,

    #[error("Security parameters: {0}")]
    Security(#[from] SmpError),
}

/// Radio power profile
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum PowerLevel {
    Minimal,
    #[default]
    Balanced,
    Full,
}

impl PowerLevel {
    /// TX power for the default power type
    pub fn tx_power_dbm(&self) -> i8 {
        match self {
            PowerLevel::Minimal => -12,
            PowerLevel::Balanced => 0,
            PowerLevel::Full => 9,
        }
    }
}

impl fmt::Display for PowerLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} dBm", self.tx_power_dbm())
    }
}

/// Peripheral configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PeripheralConfig {
    /// Name set in the host and advertised
    pub device_name: String,
    /// Confirm pairing on a yes/no display instead of just-works
    pub pairing_with_pin: bool,
    /// Passkey supplied on passkey requests
    pub static_passkey: u32,
    pub power_level: PowerLevel,
    /// Connection parameters requested on every connection
    pub connection_interval: ConnectionIntervalProfile,
    /// Request a resolvable private address before advertising
    pub local_privacy: bool,
    /// Capacity of the prepared write buffer
    pub prepare_buffer_capacity: usize,
    pub send_backoff: BackoffConfig,
    /// Numeric comparison requests are refused for this long after a reject
    pub pairing_quiet_period: Duration,
}

impl Default for PeripheralConfig {
    fn default() -> Self {
        Self {
            device_name: "rustyperiph".to_string(),
            pairing_with_pin: true,
            static_passkey: SMP_DEFAULT_STATIC_PASSKEY,
            power_level: PowerLevel::default(),
            connection_interval: ConnectionIntervalProfile::default(),
            local_privacy: true,
            prepare_buffer_capacity: PREPARE_BUF_MAX_SIZE,
            send_backoff: BackoffConfig::default(),
            pairing_quiet_period: Duration::from_secs(3),
        }
    }
}

impl PeripheralConfig {
    /// Default configuration with the given name
    pub fn new(device_name: impl Into<String>) -> Self {
        Self {
            device_name: device_name.into(),
            ..Self::default()
        }
    }

    /// Replace the static passkey with a random one
    pub fn with_random_passkey(mut self) -> Self {
        self.static_passkey = generate_passkey();
        self
    }

    /// Security parameters installed at start-up
    pub fn security_parameters(&self) -> SecurityParameters {
        SecurityParameters::new(self.pairing_with_pin, self.static_passkey)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_device_name(&self.device_name)?;
        self.security_parameters().validate()?;

        if self.prepare_buffer_capacity == 0 {
            return Err(ConfigError::ZeroPrepareCapacity);
        }
        if self.send_backoff.poll_interval.is_zero() {
            return Err(ConfigError::ZeroPollInterval);
        }
        Ok(())
    }
}

/// Check a device name against the host's limits
pub fn validate_device_name(name: &str) -> Result<(), ConfigError> {
    if name.is_empty() {
        return Err(ConfigError::EmptyDeviceName);
    }
    if name.len() > DEVICE_NAME_LIMIT {
        return Err(ConfigError::DeviceNameTooLong {
            len: name.len(),
            max: DEVICE_NAME_LIMIT,
        });
    }
    Ok(())
}
