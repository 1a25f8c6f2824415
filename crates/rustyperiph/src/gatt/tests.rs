//! Unit tests for the attribute schema and table

use crate::att::{AttError, AttPermissions, CHARACTERISTIC_UUID, PRIMARY_SERVICE_UUID};
use crate::gatt::{
    build_schema, AttributeRole, AttributeSlot, AttributeTable, CharacteristicProperty, Uuid,
    CHAR_UUID_READ_WRITE, INITIAL_CHAR_VALUE, SCHEMA_LEN,
};

const HANDLES: [u16; SCHEMA_LEN] = [40, 41, 42, 43, 44, 45, 46, 47];

fn ready_table() -> AttributeTable {
    let mut table = AttributeTable::new();
    table.install_handles(&HANDLES).unwrap();
    table
}

#[test]
fn test_schema_is_deterministic() {
    assert_eq!(build_schema(), build_schema());
    assert_eq!(build_schema().len(), SCHEMA_LEN);
}

#[test]
fn test_schema_layout() {
    let schema = build_schema();

    let roles: Vec<AttributeRole> = schema.iter().map(|e| e.role).collect();
    assert_eq!(
        roles,
        vec![
            AttributeRole::Service,
            AttributeRole::CharDeclaration,
            AttributeRole::CharValue,
            AttributeRole::CharConfigDescriptor,
            AttributeRole::CharDeclaration,
            AttributeRole::CharValue,
            AttributeRole::CharDeclaration,
            AttributeRole::CharValue,
        ]
    );

    for (index, entry) in schema.iter().enumerate() {
        assert_eq!(entry.slot.index(), index);
        assert_eq!(entry.handle, None);
        assert_eq!(entry.current_length(), entry.value.len());
    }

    assert_eq!(schema[0].uuid, Uuid::Uuid16(PRIMARY_SERVICE_UUID));
    assert_eq!(schema[0].value, vec![0xBB, 0x00]);
    assert_eq!(schema[1].uuid, Uuid::Uuid16(CHARACTERISTIC_UUID));
    assert_eq!(
        schema[1].value,
        vec![(CharacteristicProperty::READ | CharacteristicProperty::WRITE | CharacteristicProperty::NOTIFY).bits()]
    );
    assert_eq!(schema[2].uuid, Uuid::Uuid16(CHAR_UUID_READ_WRITE));
    assert_eq!(schema[2].value, INITIAL_CHAR_VALUE.to_vec());
    assert_eq!(schema[2].max_length, 500);
    assert_eq!(schema[3].value, vec![0x00, 0x00]);

    assert_eq!(schema[2].permissions, AttPermissions::read_write());
    assert_eq!(schema[5].permissions, AttPermissions::read_only());
    assert_eq!(schema[7].permissions, AttPermissions::write_only());
}

#[test]
fn test_handle_for_before_creation() {
    let table = AttributeTable::new();
    assert!(!table.is_ready());
    assert_eq!(
        table.handle_for(AttributeSlot::ReadWriteConfig),
        Err(AttError::SchemaNotReady)
    );
}

#[test]
fn test_handle_count_mismatch_installs_nothing() {
    let mut table = AttributeTable::new();
    let err = table.install_handles(&HANDLES[..7]).unwrap_err();
    assert_eq!(err, AttError::HandleCountMismatch { expected: 8, returned: 7 });
    assert!(!table.is_ready());
    assert_eq!(table.handle_for(AttributeSlot::Service), Err(AttError::SchemaNotReady));
}

#[test]
fn test_duplicate_handles_install_nothing() {
    let mut table = AttributeTable::new();
    let err = table.install_handles(&[40; SCHEMA_LEN]).unwrap_err();
    assert_eq!(err, AttError::DuplicateHandle(40));
    assert!(!table.is_ready());
    assert_eq!(table.handle_for(AttributeSlot::Service), Err(AttError::SchemaNotReady));

    // A repeat anywhere in the list is caught, and an installed table is kept
    let mut table = ready_table();
    let err = table
        .install_handles(&[50, 51, 52, 53, 54, 55, 56, 53])
        .unwrap_err();
    assert_eq!(err, AttError::DuplicateHandle(53));
    assert_eq!(table.handle_for(AttributeSlot::WriteValue), Ok(47));
    assert_eq!(table.entry(47).unwrap().slot, AttributeSlot::WriteValue);
}

#[test]
fn test_handle_for_after_creation() {
    let table = ready_table();
    assert_eq!(table.handle_for(AttributeSlot::Service), Ok(40));
    assert_eq!(table.handle_for(AttributeSlot::ReadWriteConfig), Ok(43));
    assert_eq!(table.handle_for(AttributeSlot::WriteValue), Ok(47));
    assert_eq!(table.entry(42).unwrap().slot, AttributeSlot::ReadWriteValue);
}

#[test]
fn test_read_with_offset_and_limit() {
    let table = ready_table();
    assert_eq!(table.read(42, 0, 20).unwrap(), INITIAL_CHAR_VALUE.to_vec());
    assert_eq!(table.read(42, 1, 2).unwrap(), vec![0x22, 0x33]);
    assert_eq!(table.read(42, 4, 20).unwrap(), Vec::<u8>::new());
    assert_eq!(table.read(42, 5, 20), Err(AttError::InvalidOffset(5)));
    assert_eq!(table.read(99, 0, 20), Err(AttError::InvalidHandle(99)));
    assert_eq!(table.read(47, 0, 20), Err(AttError::ReadNotPermitted(47)));
}

#[test]
fn test_write_rules() {
    let mut table = ready_table();

    table.write(42, &[1, 2, 3]).unwrap();
    assert_eq!(table.value(AttributeSlot::ReadWriteValue), &[1, 2, 3]);

    assert_eq!(table.write(41, &[0]).unwrap_err(), AttError::WriteNotPermitted(41));
    assert_eq!(table.write(45, &[0]).unwrap_err(), AttError::WriteNotPermitted(45));
    assert_eq!(table.write(100, &[0]).unwrap_err(), AttError::InvalidHandle(100));
    assert_eq!(
        table.write(42, &[0u8; 501]).unwrap_err(),
        AttError::InvalidAttributeValueLength { len: 501, max: 500 }
    );
    assert_eq!(table.value(AttributeSlot::ReadWriteValue), &[1, 2, 3]);
}

#[test]
fn test_set_value_from_application() {
    let mut table = ready_table();
    table.set_value(AttributeSlot::ReadWriteValue, b"hello").unwrap();
    assert_eq!(table.read(42, 0, 20).unwrap(), b"hello".to_vec());
}
