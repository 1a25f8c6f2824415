//! Type definitions for attribute access
use super::constants::*;
use bitflags::bitflags;

bitflags! {
    /// ATT permission flags attached to every table entry
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct AttPermissions: u16 {
        const READ = ATT_PERM_READ;
        const READ_ENCRYPTED = ATT_PERM_READ_ENCRYPTED;
        const READ_ENC_MITM = ATT_PERM_READ_ENC_MITM;
        const WRITE = ATT_PERM_WRITE;
        const WRITE_ENCRYPTED = ATT_PERM_WRITE_ENCRYPTED;
        const WRITE_ENC_MITM = ATT_PERM_WRITE_ENC_MITM;
    }
}

impl AttPermissions {
    /// Create read-only permissions
    pub fn read_only() -> Self {
        Self::READ
    }

    /// Create write-only permissions
    pub fn write_only() -> Self {
        Self::WRITE
    }

    /// Create read-write permissions
    pub fn read_write() -> Self {
        Self::READ | Self::WRITE
    }

    /// Check if read is permitted
    pub fn can_read(&self) -> bool {
        self.intersects(Self::READ | Self::READ_ENCRYPTED | Self::READ_ENC_MITM)
    }

    /// Check if write is permitted
    pub fn can_write(&self) -> bool {
        self.intersects(Self::WRITE | Self::WRITE_ENCRYPTED | Self::WRITE_ENC_MITM)
    }
}

/// Link encryption required on connect
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum EncryptionLevel {
    /// Encryption without MITM protection
    Encrypt,
    /// Encryption without MITM protection, pairing without bonding
    EncryptNoMitm,
    /// Encryption with MITM protection
    EncryptMitm,
}
