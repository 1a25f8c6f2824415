//! Common types for the peripheral's GATT service
//!
//! UUIDs, characteristic properties and the client configuration value.

use crate::att::{CCCD_INDICATE, CCCD_NOTIFY};
use bitflags::bitflags;
use byteorder::{ByteOrder, LittleEndian};
use std::fmt;

/// UUID for GATT attributes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Uuid {
    /// 16-bit SIG or vendor short UUID
    Uuid16(u16),
    /// 128-bit UUID, little-endian
    Uuid128([u8; 16]),
}

impl Uuid {
    /// Little-endian bytes of this UUID
    pub fn as_bytes(&self) -> Vec<u8> {
        match self {
            Uuid::Uuid16(uuid) => uuid.to_le_bytes().to_vec(),
            Uuid::Uuid128(uuid) => uuid.to_vec(),
        }
    }
}

impl From<u16> for Uuid {
    fn from(uuid: u16) -> Self {
        Uuid::Uuid16(uuid)
    }
}

impl fmt::Display for Uuid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Uuid::Uuid16(uuid) => write!(f, "{:04x}", uuid),
            Uuid::Uuid128(uuid) => {
                write!(
                    f,
                    "{:02x}{:02x}{:02x}{:02x}-{:02x}{:02x}-{:02x}{:02x}-{:02x}{:02x}-{:02x}{:02x}{:02x}{:02x}{:02x}{:02x}",
                    uuid[15], uuid[14], uuid[13], uuid[12],
                    uuid[11], uuid[10],
                    uuid[9], uuid[8],
                    uuid[7], uuid[6],
                    uuid[5], uuid[4], uuid[3], uuid[2], uuid[1], uuid[0]
                )
            }
        }
    }
}

bitflags! {
    /// Characteristic properties carried in the characteristic declaration
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct CharacteristicProperty: u8 {
        const BROADCAST = 0x01;
        const READ = 0x02;
        const WRITE_WITHOUT_RESPONSE = 0x04;
        const WRITE = 0x08;
        const NOTIFY = 0x10;
        const INDICATE = 0x20;
        const AUTHENTICATED_SIGNED_WRITES = 0x40;
        const EXTENDED_PROPERTIES = 0x80;
    }
}

/// Value written by the central to the client characteristic configuration descriptor
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CccdValue {
    /// 0x0000
    Disable,
    /// 0x0001
    Notify,
    /// 0x0002
    Indicate,
    /// Anything else, including both bits set
    Unknown(u16),
}

impl CccdValue {
    /// Decode a descriptor write. Only two byte values are valid.
    pub fn parse(value: &[u8]) -> Option<Self> {
        if value.len() != 2 {
            return None;
        }

        Some(match LittleEndian::read_u16(value) {
            0x0000 => CccdValue::Disable,
            CCCD_NOTIFY => CccdValue::Notify,
            CCCD_INDICATE => CccdValue::Indicate,
            other => CccdValue::Unknown(other),
        })
    }
}
