//! ATT constants used by the peripheral

// ATT status codes reported back to the host stack in responses
pub const ATT_STATUS_OK: u8 = 0x00;
pub const ATT_ERROR_INVALID_HANDLE: u8 = 0x01;
pub const ATT_ERROR_READ_NOT_PERMITTED: u8 = 0x02;
pub const ATT_ERROR_WRITE_NOT_PERMITTED: u8 = 0x03;
pub const ATT_ERROR_INVALID_PDU: u8 = 0x04;
pub const ATT_ERROR_INSUFFICIENT_AUTHENTICATION: u8 = 0x05;
pub const ATT_ERROR_REQUEST_NOT_SUPPORTED: u8 = 0x06;
pub const ATT_ERROR_INVALID_OFFSET: u8 = 0x07;
pub const ATT_ERROR_PREPARE_QUEUE_FULL: u8 = 0x09;
pub const ATT_ERROR_ATTRIBUTE_NOT_FOUND: u8 = 0x0A;
pub const ATT_ERROR_INVALID_ATTRIBUTE_VALUE_LENGTH: u8 = 0x0D;
pub const ATT_ERROR_UNLIKELY: u8 = 0x0E;
pub const ATT_ERROR_INSUFFICIENT_ENCRYPTION: u8 = 0x0F;
pub const ATT_ERROR_INSUFFICIENT_RESOURCES: u8 = 0x11;
pub const ATT_ERROR_VALUE_NOT_ALLOWED: u8 = 0x13;

// ATT attribute permission flags
pub const ATT_PERM_READ: u16 = 0x0001;
pub const ATT_PERM_READ_ENCRYPTED: u16 = 0x0002;
pub const ATT_PERM_READ_ENC_MITM: u16 = 0x0004;
pub const ATT_PERM_WRITE: u16 = 0x0010;
pub const ATT_PERM_WRITE_ENCRYPTED: u16 = 0x0020;
pub const ATT_PERM_WRITE_ENC_MITM: u16 = 0x0040;

/// MTU before the exchange
pub const ATT_DEFAULT_MTU: u16 = 23;

/// Opcode (1) + handle (2)
pub const ATT_MTU_HEADER_SIZE: u16 = 3;

/// Read responses carry only the opcode
pub const ATT_READ_RSP_HEADER_SIZE: u16 = 1;

/// Usable characteristic payload before MTU exchange
pub const DEFAULT_CHAR_MTU: u16 = ATT_DEFAULT_MTU - ATT_MTU_HEADER_SIZE;

/// Largest characteristic value the peripheral accepts or serves
pub const MAX_CHAR_VALUE_LEN: u16 = 500;

/// Local MTU requested from the host stack at start-up
pub const LOCAL_MTU: u16 = MAX_CHAR_VALUE_LEN + ATT_MTU_HEADER_SIZE;

/// Execute write flag to commit the queue; any other flag cancels it
pub const ATT_EXEC_WRITE_COMMIT: u8 = 0x01;

// Declaration and descriptor UUIDs
pub const PRIMARY_SERVICE_UUID: u16 = 0x2800;
pub const CHARACTERISTIC_UUID: u16 = 0x2803;
pub const CLIENT_CHAR_CONFIG_UUID: u16 = 0x2902;

// Client characteristic configuration bits
pub const CCCD_NOTIFY: u16 = 0x0001;
pub const CCCD_INDICATE: u16 = 0x0002;
