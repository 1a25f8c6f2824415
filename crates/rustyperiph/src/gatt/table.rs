//! Runtime attribute table
//!
//! Holds the schema entries once the host has created them, maps handles back
//! to entries and owns the mutable value buffers.

use super::schema::{build_schema, AttributeEntry, AttributeRole, AttributeSlot, SCHEMA_LEN};
use crate::att::{AttError, AttResult};
use log::{debug, trace};
use std::collections::BTreeMap;

/// Attribute table
#[derive(Debug, Clone)]
pub struct AttributeTable {
    /// Entries in schema order
    entries: Vec<AttributeEntry>,
    /// Map of handles to schema index
    by_handle: BTreeMap<u16, usize>,
}

impl Default for AttributeTable {
    fn default() -> Self {
        Self::new()
    }
}

impl AttributeTable {
    /// Create a table from the schema, no handles assigned yet
    pub fn new() -> Self {
        Self {
            entries: build_schema(),
            by_handle: BTreeMap::new(),
        }
    }

    /// Schema entries in order
    pub fn entries(&self) -> &[AttributeEntry] {
        &self.entries
    }

    /// Whether the host has reported handles for every entry
    pub fn is_ready(&self) -> bool {
        !self.by_handle.is_empty()
    }

    /// Install the handles reported by the host.
    ///
    /// The count must match the schema exactly and every handle must be
    /// distinct. On error nothing is installed.
    pub fn install_handles(&mut self, handles: &[u16]) -> AttResult<()> {
        if handles.len() != SCHEMA_LEN {
            return Err(AttError::HandleCountMismatch {
                expected: SCHEMA_LEN,
                returned: handles.len(),
            });
        }

        let mut by_handle = BTreeMap::new();
        for (index, &handle) in handles.iter().enumerate() {
            if by_handle.insert(handle, index).is_some() {
                return Err(AttError::DuplicateHandle(handle));
            }
        }

        for (entry, &handle) in self.entries.iter_mut().zip(handles) {
            entry.handle = Some(handle);
        }
        self.by_handle = by_handle;

        debug!("Attribute table installed, handles {:?}", handles);
        Ok(())
    }

    /// Handle of a schema slot, only valid after the table is created
    pub fn handle_for(&self, slot: AttributeSlot) -> AttResult<u16> {
        self.entries[slot.index()].handle.ok_or(AttError::SchemaNotReady)
    }

    /// Look up the entry behind a handle
    pub fn entry(&self, handle: u16) -> AttResult<&AttributeEntry> {
        self.by_handle
            .get(&handle)
            .map(|&index| &self.entries[index])
            .ok_or(AttError::InvalidHandle(handle))
    }

    /// Value of a slot
    pub fn value(&self, slot: AttributeSlot) -> &[u8] {
        &self.entries[slot.index()].value
    }

    /// Read `value[offset..]`, truncated to `max_len`
    pub fn read(&self, handle: u16, offset: u16, max_len: usize) -> AttResult<Vec<u8>> {
        let entry = self.entry(handle)?;
        if !entry.permissions.can_read() {
            return Err(AttError::ReadNotPermitted(handle));
        }

        let len = entry.current_length();
        if usize::from(offset) > len {
            return Err(AttError::InvalidOffset(offset));
        }

        let offset = usize::from(offset);
        let end = len.min(offset + max_len);
        trace!("Read handle {} offset {} -> {} bytes", handle, offset, end - offset);
        Ok(entry.value[offset..end].to_vec())
    }

    /// Replace the value behind a handle.
    ///
    /// Only characteristic values and the configuration descriptor are writable.
    pub fn write(&mut self, handle: u16, value: &[u8]) -> AttResult<&AttributeEntry> {
        let index = *self
            .by_handle
            .get(&handle)
            .ok_or(AttError::InvalidHandle(handle))?;
        let entry = &mut self.entries[index];

        let writable = matches!(
            entry.role,
            AttributeRole::CharValue | AttributeRole::CharConfigDescriptor
        );
        if !writable || !entry.permissions.can_write() {
            return Err(AttError::WriteNotPermitted(handle));
        }

        if value.len() > entry.max_length {
            return Err(AttError::InvalidAttributeValueLength {
                len: value.len(),
                max: entry.max_length,
            });
        }

        entry.value = value.to_vec();
        Ok(entry)
    }

    /// Store a value for a slot on behalf of the local application
    pub fn set_value(&mut self, slot: AttributeSlot, value: &[u8]) -> AttResult<()> {
        let entry = &mut self.entries[slot.index()];
        if value.len() > entry.max_length {
            return Err(AttError::InvalidAttributeValueLength {
                len: value.len(),
                max: entry.max_length,
            });
        }

        entry.value = value.to_vec();
        Ok(())
    }
}
