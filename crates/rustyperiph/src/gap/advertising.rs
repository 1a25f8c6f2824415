//! Advertising and scan response payloads
//!
//! Payloads are built as raw AD structures (`length`, `type`, `data`) and
//! handed to the host stack as opaque bytes.

use crate::gap::constants::*;
use crate::gatt::Uuid;
use bitflags::bitflags;
use thiserror::Error;

/// Errors raised while building an advertising payload
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum AdvertisingError {
    #[error("AD structure of {needed} bytes does not fit, {remaining} bytes left")]
    PayloadTooLong { needed: usize, remaining: usize },

    #[error("AD structure data too long: {0} bytes")]
    FieldTooLong(usize),
}

bitflags! {
    /// Payload configurations still waiting for the host's completion event.
    ///
    /// Advertising may only start once both bits are clear.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct AdvConfigPending: u8 {
        const ADVERTISEMENT = 1 << 0;
        const SCAN_RESPONSE = 1 << 1;
    }
}

/// A legacy (31 byte) advertising or scan response payload
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AdvertisingData {
    bytes: Vec<u8>,
}

impl AdvertisingData {
    /// Create an empty payload
    pub fn new() -> Self {
        Self { bytes: Vec::with_capacity(ADV_PAYLOAD_MAX_LEN) }
    }

    /// Bytes left for further AD structures
    pub fn remaining(&self) -> usize {
        ADV_PAYLOAD_MAX_LEN - self.bytes.len()
    }

    /// Append one AD structure
    pub fn push(&mut self, ad_type: u8, data: &[u8]) -> Result<(), AdvertisingError> {
        if data.len() > ADV_PAYLOAD_MAX_LEN - 2 {
            return Err(AdvertisingError::FieldTooLong(data.len()));
        }

        let needed = data.len() + 2;
        if needed > self.remaining() {
            return Err(AdvertisingError::PayloadTooLong {
                needed,
                remaining: self.remaining(),
            });
        }

        // length covers the type byte and the data
        self.bytes.push((data.len() + 1) as u8);
        self.bytes.push(ad_type);
        self.bytes.extend_from_slice(data);
        Ok(())
    }

    /// Append the device name, shortening it to whatever space is left
    pub fn push_name(&mut self, name: &str) -> Result<(), AdvertisingError> {
        let name = name.as_bytes();
        let room = self.remaining().saturating_sub(2);
        if room == 0 {
            return Err(AdvertisingError::PayloadTooLong {
                needed: name.len() + 2,
                remaining: self.remaining(),
            });
        }

        if name.len() <= room {
            self.push(ADV_TYPE_COMPLETE_LOCAL_NAME, name)
        } else {
            self.push(ADV_TYPE_SHORT_LOCAL_NAME, &name[..room])
        }
    }

    /// Raw payload bytes
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

/// Build the advertisement: flags, the service UUID and the (possibly shortened) name
pub fn build_advertisement(device_name: &str) -> Result<AdvertisingData, AdvertisingError> {
    let mut data = AdvertisingData::new();
    data.push(ADV_TYPE_FLAGS, &[ADV_FLAG_GENERAL_DISC | ADV_FLAG_BREDR_NOT_SUPPORTED])?;
    data.push(ADV_TYPE_128BIT_SERVICE_UUID_COMPLETE, &Uuid::Uuid128(ADV_SERVICE_UUID).as_bytes())?;
    data.push_name(device_name)?;
    Ok(data)
}

/// Build the scan response: TX power, preferred connection interval and manufacturer data
pub fn build_scan_response(tx_power_dbm: i8) -> Result<AdvertisingData, AdvertisingError> {
    let mut data = AdvertisingData::new();
    data.push(ADV_TYPE_TX_POWER_LEVEL, &[tx_power_dbm as u8])?;

    let range = [ADV_CONN_INTERVAL_MIN.to_le_bytes(), ADV_CONN_INTERVAL_MAX.to_le_bytes()].concat();
    data.push(ADV_TYPE_SLAVE_CONN_INTERVAL_RANGE, &range)?;

    let mut manufacturer = [0u8; MANUFACTURER_DATA_LEN];
    manufacturer[..MANUFACTURER_DATA_PREFIX.len()].copy_from_slice(MANUFACTURER_DATA_PREFIX);
    data.push(ADV_TYPE_MANUFACTURER_SPECIFIC, &manufacturer)?;

    Ok(data)
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Split a payload into (type, data) tuples
    fn parse_advertising_data(data: &[u8]) -> Vec<(u8, Vec<u8>)> {
        let mut result = Vec::new();
        let mut i = 0;

        while i < data.len() {
            let length = data[i] as usize;
            if length == 0 || i + length >= data.len() {
                break;
            }

            let ad_type = data[i + 1];
            let ad_data = data[i + 2..i + 1 + length].to_vec();

            result.push((ad_type, ad_data));

            i += 1 + length;
        }

        result
    }

    #[test]
    fn test_advertisement_layout() {
        let adv = build_advertisement("Peri").unwrap();
        assert!(adv.len() <= ADV_PAYLOAD_MAX_LEN);

        let fields = parse_advertising_data(adv.as_bytes());
        assert_eq!(fields[0], (ADV_TYPE_FLAGS, vec![0x06]));
        assert_eq!(fields[1], (ADV_TYPE_128BIT_SERVICE_UUID_COMPLETE, ADV_SERVICE_UUID.to_vec()));
        assert_eq!(fields[2], (ADV_TYPE_COMPLETE_LOCAL_NAME, b"Peri".to_vec()));
    }

    #[test]
    fn test_long_name_is_shortened() {
        let adv = build_advertisement("A very long peripheral name").unwrap();
        assert_eq!(adv.len(), ADV_PAYLOAD_MAX_LEN);

        let fields = parse_advertising_data(adv.as_bytes());
        let (ad_type, name) = &fields[2];
        assert_eq!(*ad_type, ADV_TYPE_SHORT_LOCAL_NAME);
        assert_eq!(name.len(), ADV_NAME_MAX_LEN);
        assert_eq!(name.as_slice(), b"A very l");
    }

    #[test]
    fn test_scan_response_layout() {
        let rsp = build_scan_response(9).unwrap();
        assert!(rsp.len() <= ADV_PAYLOAD_MAX_LEN);

        let fields = parse_advertising_data(rsp.as_bytes());
        assert_eq!(fields[0], (ADV_TYPE_TX_POWER_LEVEL, vec![9]));
        assert_eq!(fields[1], (ADV_TYPE_SLAVE_CONN_INTERVAL_RANGE, vec![0x06, 0x00, 0x0C, 0x00]));
        assert_eq!(fields[2].0, ADV_TYPE_MANUFACTURER_SPECIFIC);
        assert_eq!(fields[2].1.len(), MANUFACTURER_DATA_LEN);
        assert!(fields[2].1.starts_with(b"DORIT"));
    }

    #[test]
    fn test_push_rejects_overflow() {
        let mut data = AdvertisingData::new();
        data.push(ADV_TYPE_MANUFACTURER_SPECIFIC, &[0u8; 20]).unwrap();
        let err = data.push(ADV_TYPE_MANUFACTURER_SPECIFIC, &[0u8; 10]).unwrap_err();
        assert_eq!(err, AdvertisingError::PayloadTooLong { needed: 12, remaining: 9 });
    }

    #[test]
    fn test_pending_mask() {
        let mut pending = AdvConfigPending::all();
        pending.remove(AdvConfigPending::ADVERTISEMENT);
        assert!(!pending.is_empty());
        pending.remove(AdvConfigPending::SCAN_RESPONSE);
        assert!(pending.is_empty());
    }
}
