use crate::gap::constants::*;
use std::fmt;

/// Own address type used while advertising
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum AddressType {
    Public = 0x00,
    /// Resolvable private address from local privacy
    Random = 0x01,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct BdAddr {
    pub bytes: [u8; 6],
}

impl BdAddr {
    pub fn new(bytes: [u8; 6]) -> Self {
        Self { bytes }
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.bytes
    }
}

impl fmt::Display for BdAddr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:02X}:{:02X}:{:02X}:{:02X}:{:02X}:{:02X}",
            self.bytes[5],
            self.bytes[4],
            self.bytes[3],
            self.bytes[2],
            self.bytes[1],
            self.bytes[0]
        )
    }
}

/// Connection parameters requested from the central (link-layer units)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConnectionParams {
    /// Minimum connection interval, 1.25 ms units
    pub min_interval: u16,
    /// Maximum connection interval, 1.25 ms units
    pub max_interval: u16,
    /// Peripheral latency in connection events
    pub latency: u16,
    /// Supervision timeout, 10 ms units
    pub supervision_timeout: u16,
}

impl ConnectionParams {
    /// Check the link-layer constraints on the parameter set.
    ///
    /// The supervision timeout must exceed `(1 + latency) * max_interval * 2`.
    pub fn is_valid(&self) -> bool {
        if self.min_interval < LE_CONN_INTERVAL_LOWEST
            || self.max_interval > LE_CONN_INTERVAL_HIGHEST
            || self.min_interval > self.max_interval
            || self.latency > LE_CONN_LATENCY_HIGHEST
            || self.supervision_timeout < LE_SUPERVISION_TIMEOUT_LOWEST
            || self.supervision_timeout > LE_SUPERVISION_TIMEOUT_HIGHEST
        {
            return false;
        }

        // interval is 1.25 ms units, timeout 10 ms units: compare in 0.25 ms
        let timeout = u32::from(self.supervision_timeout) * 40;
        let min_timeout = (1 + u32::from(self.latency)) * u32::from(self.max_interval) * 5 * 2;
        timeout > min_timeout
    }
}

/// Connection interval profile applied to every connection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ConnectionIntervalProfile {
    /// 7.5 - 15 ms
    #[default]
    Fast,
    /// 30 - 50 ms
    Faster,
    /// 100 - 125 ms
    Slow,
    /// 3 s
    Slower,
}

impl ConnectionIntervalProfile {
    /// Concrete link-layer parameters for this profile
    pub fn params(&self) -> ConnectionParams {
        let (min_interval, max_interval, supervision_timeout) = match self {
            ConnectionIntervalProfile::Fast => (0x0006, 0x000C, LE_SUPERVISION_TIMEOUT),
            ConnectionIntervalProfile::Faster => (0x0018, 0x0028, LE_SUPERVISION_TIMEOUT),
            ConnectionIntervalProfile::Slow => (0x0050, 0x0064, LE_SUPERVISION_TIMEOUT),
            ConnectionIntervalProfile::Slower => (0x0960, 0x0960, LE_SUPERVISION_TIMEOUT_SLOW),
        };

        ConnectionParams {
            min_interval,
            max_interval,
            latency: 0,
            supervision_timeout,
        }
    }
}

impl fmt::Display for ConnectionIntervalProfile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConnectionIntervalProfile::Fast => write!(f, "fast"),
            ConnectionIntervalProfile::Faster => write!(f, "faster"),
            ConnectionIntervalProfile::Slow => write!(f, "slow"),
            ConnectionIntervalProfile::Slower => write!(f, "slower"),
        }
    }
}

/// Advertising parameters handed to the host when advertising starts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AdvertisingParams {
    /// Minimum advertising interval, 0.625 ms units
    pub interval_min: u16,
    /// Maximum advertising interval, 0.625 ms units
    pub interval_max: u16,
    pub adv_type: u8,
    pub own_address_type: AddressType,
    pub channel_map: u8,
    pub filter_policy: u8,
}

impl Default for AdvertisingParams {
    fn default() -> Self {
        Self {
            interval_min: ADV_INTERVAL_MIN,
            interval_max: ADV_INTERVAL_MAX,
            adv_type: ADV_IND,
            own_address_type: AddressType::Public,
            channel_map: ADV_CHANNEL_ALL,
            filter_policy: ADV_FILTER_ALLOW_ANY,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bd_addr_display() {
        let addr = BdAddr::new([0x55, 0x44, 0x33, 0x22, 0x11, 0x00]);
        assert_eq!(addr.to_string(), "00:11:22:33:44:55");
    }

    #[test]
    fn test_interval_profiles_are_valid() {
        for profile in [
            ConnectionIntervalProfile::Fast,
            ConnectionIntervalProfile::Faster,
            ConnectionIntervalProfile::Slow,
            ConnectionIntervalProfile::Slower,
        ] {
            assert!(profile.params().is_valid(), "{} profile is invalid", profile);
        }
    }

    #[test]
    fn test_interval_profile_values() {
        let fast = ConnectionIntervalProfile::Fast.params();
        assert_eq!((fast.min_interval, fast.max_interval), (0x0006, 0x000C));
        assert_eq!(fast.supervision_timeout, 400);

        let slower = ConnectionIntervalProfile::Slower.params();
        assert_eq!((slower.min_interval, slower.max_interval), (0x0960, 0x0960));
        assert_eq!(slower.latency, 0);
    }

    #[test]
    fn test_timeout_too_short_is_rejected() {
        let params = ConnectionParams {
            min_interval: 0x0960,
            max_interval: 0x0960,
            latency: 0,
            supervision_timeout: 400,
        };
        assert!(!params.is_valid());
    }
}
