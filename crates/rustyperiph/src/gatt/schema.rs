//! Static description of the peripheral's single primary service
//!
//! One service with three characteristics:
//!
//! - read-write (notifiable, with a client configuration descriptor)
//! - read-only
//! - write-only
//!
//! Handles are not known here. The host stack assigns them when it creates
//! the table and reports them back in schema order.

use super::types::{CharacteristicProperty, Uuid};
use crate::att::{
    AttPermissions, CHARACTERISTIC_UUID, CLIENT_CHAR_CONFIG_UUID, MAX_CHAR_VALUE_LEN,
    PRIMARY_SERVICE_UUID,
};

/// UUID of the primary service
pub const SERVICE_UUID: u16 = 0x00BB;
/// UUID of the read-only characteristic
pub const CHAR_UUID_READ: u16 = 0xBB01;
/// UUID of the write-only characteristic
pub const CHAR_UUID_WRITE: u16 = 0xBB02;
/// UUID of the read-write characteristic
pub const CHAR_UUID_READ_WRITE: u16 = 0xBB03;

/// Initial value of every characteristic
pub const INITIAL_CHAR_VALUE: [u8; 4] = [0x11, 0x22, 0x33, 0x44];

/// Number of entries in the schema
pub const SCHEMA_LEN: usize = 8;

/// What an entry is within the service
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AttributeRole {
    Service,
    CharDeclaration,
    CharValue,
    CharConfigDescriptor,
}

/// Position of each entry in the schema.
///
/// The host reports handles in this order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum AttributeSlot {
    Service = 0,
    ReadWriteDeclaration = 1,
    ReadWriteValue = 2,
    ReadWriteConfig = 3,
    ReadDeclaration = 4,
    ReadValue = 5,
    WriteDeclaration = 6,
    WriteValue = 7,
}

impl AttributeSlot {
    /// Index into the schema
    pub fn index(self) -> usize {
        self as usize
    }
}

/// One attribute of the service
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttributeEntry {
    /// Position in the schema
    pub slot: AttributeSlot,
    /// Handle assigned by the host, `None` until the table is created
    pub handle: Option<u16>,
    pub role: AttributeRole,
    /// Attribute type
    pub uuid: Uuid,
    pub permissions: AttPermissions,
    /// Largest value the attribute may hold
    pub max_length: usize,
    /// Current value; its length is the attribute's current length
    pub value: Vec<u8>,
}

impl AttributeEntry {
    fn new(
        slot: AttributeSlot,
        role: AttributeRole,
        uuid: u16,
        permissions: AttPermissions,
        max_length: usize,
        value: Vec<u8>,
    ) -> Self {
        Self {
            slot,
            handle: None,
            role,
            uuid: Uuid::Uuid16(uuid),
            permissions,
            max_length,
            value,
        }
    }

    fn declaration(slot: AttributeSlot, properties: CharacteristicProperty) -> Self {
        Self::new(
            slot,
            AttributeRole::CharDeclaration,
            CHARACTERISTIC_UUID,
            AttPermissions::read_only(),
            1,
            vec![properties.bits()],
        )
    }

    fn characteristic(slot: AttributeSlot, uuid: u16, permissions: AttPermissions) -> Self {
        Self::new(
            slot,
            AttributeRole::CharValue,
            uuid,
            permissions,
            MAX_CHAR_VALUE_LEN as usize,
            INITIAL_CHAR_VALUE.to_vec(),
        )
    }

    /// Current length of the value
    pub fn current_length(&self) -> usize {
        self.value.len()
    }
}

/// Build the ordered attribute list for the service
pub fn build_schema() -> Vec<AttributeEntry> {
    vec![
        AttributeEntry::new(
            AttributeSlot::Service,
            AttributeRole::Service,
            PRIMARY_SERVICE_UUID,
            AttPermissions::read_only(),
            2,
            SERVICE_UUID.to_le_bytes().to_vec(),
        ),
        AttributeEntry::declaration(
            AttributeSlot::ReadWriteDeclaration,
            CharacteristicProperty::READ | CharacteristicProperty::WRITE | CharacteristicProperty::NOTIFY,
        ),
        AttributeEntry::characteristic(
            AttributeSlot::ReadWriteValue,
            CHAR_UUID_READ_WRITE,
            AttPermissions::read_write(),
        ),
        AttributeEntry::new(
            AttributeSlot::ReadWriteConfig,
            AttributeRole::CharConfigDescriptor,
            CLIENT_CHAR_CONFIG_UUID,
            AttPermissions::read_write(),
            2,
            vec![0x00, 0x00],
        ),
        AttributeEntry::declaration(AttributeSlot::ReadDeclaration, CharacteristicProperty::READ),
        AttributeEntry::characteristic(
            AttributeSlot::ReadValue,
            CHAR_UUID_READ,
            AttPermissions::read_only(),
        ),
        AttributeEntry::declaration(AttributeSlot::WriteDeclaration, CharacteristicProperty::WRITE),
        AttributeEntry::characteristic(
            AttributeSlot::WriteValue,
            CHAR_UUID_WRITE,
            AttPermissions::write_only(),
        ),
    ]
}
