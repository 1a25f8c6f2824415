//! Status codes and errors for attribute access
use super::constants::*;
use thiserror::Error;

/// Status carried by read and write responses
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GattStatus {
    /// Request succeeded
    Ok,
    /// Handle does not name an attribute in the table
    InvalidHandle,
    /// Attribute cannot be read
    ReadNotPermitted,
    /// Attribute cannot be written
    WriteNotPermitted,
    /// Malformed request
    InvalidPdu,
    /// Link is not authenticated
    InsufficientAuthentication,
    /// Request not supported by this server
    RequestNotSupported,
    /// Offset past the end of the value or the prepare buffer
    InvalidOffset,
    /// Prepare queue full
    PrepareQueueFull,
    /// Attribute not found
    AttributeNotFound,
    /// Value length exceeds what the attribute or buffer holds
    InvalidAttributeValueLength,
    /// Unlikely error
    Unlikely,
    /// Link is not encrypted
    InsufficientEncryption,
    /// Out of memory for the request
    InsufficientResources,
    /// Value is well formed but not acceptable
    ValueNotAllowed,
    /// Any other status reported by the host
    Other(u8),
}

impl GattStatus {
    /// Whether this status reports success
    pub fn is_ok(&self) -> bool {
        matches!(self, GattStatus::Ok)
    }
}

impl From<u8> for GattStatus {
    fn from(code: u8) -> Self {
        match code {
            ATT_STATUS_OK => GattStatus::Ok,
            ATT_ERROR_INVALID_HANDLE => GattStatus::InvalidHandle,
            ATT_ERROR_READ_NOT_PERMITTED => GattStatus::ReadNotPermitted,
            ATT_ERROR_WRITE_NOT_PERMITTED => GattStatus::WriteNotPermitted,
            ATT_ERROR_INVALID_PDU => GattStatus::InvalidPdu,
            ATT_ERROR_INSUFFICIENT_AUTHENTICATION => GattStatus::InsufficientAuthentication,
            ATT_ERROR_REQUEST_NOT_SUPPORTED => GattStatus::RequestNotSupported,
            ATT_ERROR_INVALID_OFFSET => GattStatus::InvalidOffset,
            ATT_ERROR_PREPARE_QUEUE_FULL => GattStatus::PrepareQueueFull,
            ATT_ERROR_ATTRIBUTE_NOT_FOUND => GattStatus::AttributeNotFound,
            ATT_ERROR_INVALID_ATTRIBUTE_VALUE_LENGTH => GattStatus::InvalidAttributeValueLength,
            ATT_ERROR_UNLIKELY => GattStatus::Unlikely,
            ATT_ERROR_INSUFFICIENT_ENCRYPTION => GattStatus::InsufficientEncryption,
            ATT_ERROR_INSUFFICIENT_RESOURCES => GattStatus::InsufficientResources,
            ATT_ERROR_VALUE_NOT_ALLOWED => GattStatus::ValueNotAllowed,
            other => GattStatus::Other(other),
        }
    }
}

impl From<GattStatus> for u8 {
    fn from(status: GattStatus) -> Self {
        match status {
            GattStatus::Ok => ATT_STATUS_OK,
            GattStatus::InvalidHandle => ATT_ERROR_INVALID_HANDLE,
            GattStatus::ReadNotPermitted => ATT_ERROR_READ_NOT_PERMITTED,
            GattStatus::WriteNotPermitted => ATT_ERROR_WRITE_NOT_PERMITTED,
            GattStatus::InvalidPdu => ATT_ERROR_INVALID_PDU,
            GattStatus::InsufficientAuthentication => ATT_ERROR_INSUFFICIENT_AUTHENTICATION,
            GattStatus::RequestNotSupported => ATT_ERROR_REQUEST_NOT_SUPPORTED,
            GattStatus::InvalidOffset => ATT_ERROR_INVALID_OFFSET,
            GattStatus::PrepareQueueFull => ATT_ERROR_PREPARE_QUEUE_FULL,
            GattStatus::AttributeNotFound => ATT_ERROR_ATTRIBUTE_NOT_FOUND,
            GattStatus::InvalidAttributeValueLength => ATT_ERROR_INVALID_ATTRIBUTE_VALUE_LENGTH,
            GattStatus::Unlikely => ATT_ERROR_UNLIKELY,
            GattStatus::InsufficientEncryption => ATT_ERROR_INSUFFICIENT_ENCRYPTION,
            GattStatus::InsufficientResources => ATT_ERROR_INSUFFICIENT_RESOURCES,
            GattStatus::ValueNotAllowed => ATT_ERROR_VALUE_NOT_ALLOWED,
            GattStatus::Other(code) => code,
        }
    }
}

/// Errors raised while building or querying the attribute table
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum AttError {
    #[error("Attribute table has not been created by the host yet")]
    SchemaNotReady,

    #[error("Host returned {returned} handles, schema has {expected} entries")]
    HandleCountMismatch { expected: usize, returned: usize },

    #[error("Host returned handle {0} more than once")]
    DuplicateHandle(u16),

    #[error("Host failed to create the attribute table: {0:?}")]
    TableCreationFailed(GattStatus),

    #[error("Invalid handle: {0}")]
    InvalidHandle(u16),

    #[error("Invalid offset: {0}")]
    InvalidOffset(u16),

    #[error("Value of {len} bytes exceeds attribute maximum of {max}")]
    InvalidAttributeValueLength { len: usize, max: usize },

    #[error("Read not permitted on handle {0}")]
    ReadNotPermitted(u16),

    #[error("Write not permitted on handle {0}")]
    WriteNotPermitted(u16),
}

impl AttError {
    /// Status to report to the peer for this error
    pub fn to_status(&self) -> GattStatus {
        match self {
            AttError::SchemaNotReady => GattStatus::AttributeNotFound,
            AttError::HandleCountMismatch { .. } | AttError::DuplicateHandle(_) => {
                GattStatus::Unlikely
            }
            AttError::TableCreationFailed(status) => *status,
            AttError::InvalidHandle(_) => GattStatus::InvalidHandle,
            AttError::InvalidOffset(_) => GattStatus::InvalidOffset,
            AttError::InvalidAttributeValueLength { .. } => {
                GattStatus::InvalidAttributeValueLength
            }
            AttError::ReadNotPermitted(_) => GattStatus::ReadNotPermitted,
            AttError::WriteNotPermitted(_) => GattStatus::WriteNotPermitted,
        }
    }
}

/// ATT Result type
pub type AttResult<T> = Result<T, AttError>;
