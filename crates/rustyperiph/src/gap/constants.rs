// Advertising Data Types
pub const ADV_TYPE_FLAGS: u8 = 0x01;
pub const ADV_TYPE_128BIT_SERVICE_UUID_COMPLETE: u8 = 0x07;
pub const ADV_TYPE_SHORT_LOCAL_NAME: u8 = 0x08;
pub const ADV_TYPE_COMPLETE_LOCAL_NAME: u8 = 0x09;
pub const ADV_TYPE_TX_POWER_LEVEL: u8 = 0x0A;
pub const ADV_TYPE_SLAVE_CONN_INTERVAL_RANGE: u8 = 0x12;
pub const ADV_TYPE_MANUFACTURER_SPECIFIC: u8 = 0xFF;

// Advertising flags
pub const ADV_FLAG_GENERAL_DISC: u8 = 0x02;
pub const ADV_FLAG_BREDR_NOT_SUPPORTED: u8 = 0x04;

/// Legacy advertising and scan response payload limit
pub const ADV_PAYLOAD_MAX_LEN: usize = 31;

/// Longest device name the host accepts (NUL terminator included)
pub const DEVICE_NAME_MAX_LEN: usize = 32;

/// Longest name that still fits the advertisement next to flags and service UUID
pub const ADV_NAME_MAX_LEN: usize = ADV_PAYLOAD_MAX_LEN - 3 - 18 - 2;

// Advertising parameters (0.625 ms units)
pub const ADV_INTERVAL_MIN: u16 = 0x0020; // 20 ms
pub const ADV_INTERVAL_MAX: u16 = 0x0040; // 40 ms

// Advertising types
pub const ADV_IND: u8 = 0x00;

// Channel map: 37, 38 and 39
pub const ADV_CHANNEL_ALL: u8 = 0x07;

// Filter policy: allow scan and connect from any
pub const ADV_FILTER_ALLOW_ANY: u8 = 0x00;

// Preferred connection interval advertised in the scan response (1.25 ms units)
pub const ADV_CONN_INTERVAL_MIN: u16 = 0x0006; // 7.5 ms
pub const ADV_CONN_INTERVAL_MAX: u16 = 0x000C; // 15 ms

// LE Connection parameter limits (1.25 ms units)
pub const LE_CONN_INTERVAL_LOWEST: u16 = 0x0006;
pub const LE_CONN_INTERVAL_HIGHEST: u16 = 0x0C80;
pub const LE_CONN_LATENCY_HIGHEST: u16 = 0x01F3;

// Supervision timeout (10 ms units)
pub const LE_SUPERVISION_TIMEOUT: u16 = 400; // 4 s
pub const LE_SUPERVISION_TIMEOUT_SLOW: u16 = 700; // 7 s
pub const LE_SUPERVISION_TIMEOUT_LOWEST: u16 = 0x000A;
pub const LE_SUPERVISION_TIMEOUT_HIGHEST: u16 = 0x0C80;

/// Manufacturer data carried in the scan response
pub const MANUFACTURER_DATA_LEN: usize = 15;
pub const MANUFACTURER_DATA_PREFIX: &[u8] = b"DORIT";

/// 128-bit UUID advertised for the service (little-endian, 0x00BB at bytes 12..14)
pub const ADV_SERVICE_UUID: [u8; 16] = [
    0x55, 0xE4, 0x05, 0xD2, 0xAF, 0x9F, 0xA9, 0x8F, 0xE5, 0x4A, 0x7D, 0x00, 0xBB, 0x00, 0x00, 0x00,
];
