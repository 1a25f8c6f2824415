//! GATT service exposed by the peripheral
//!
//! The schema describes the service statically; the table holds the runtime
//! handles and value buffers once the host stack has created it.

pub mod schema;
pub mod table;
pub mod types;

#[cfg(test)]
mod tests;

pub use schema::{
    build_schema, AttributeEntry, AttributeRole, AttributeSlot, CHAR_UUID_READ,
    CHAR_UUID_READ_WRITE, CHAR_UUID_WRITE, INITIAL_CHAR_VALUE, SCHEMA_LEN, SERVICE_UUID,
};
pub use table::AttributeTable;
pub use types::{CccdValue, CharacteristicProperty, Uuid};
