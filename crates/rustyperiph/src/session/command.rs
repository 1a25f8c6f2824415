//! Commands issued by the session

use crate::att::{EncryptionLevel, GattStatus};
use crate::gap::{AdvertisingData, AdvertisingParams, BdAddr, ConnectionParams};
use crate::gatt::AttributeEntry;
use crate::smp::{IoCapability, SecurityParameters};

/// Work requested by the session.
///
/// Most commands go to the host stack. [`DeliverData`](Command::DeliverData),
/// [`ReportCongestion`](Command::ReportCongestion) and
/// [`ReportBondedDevices`](Command::ReportBondedDevices) are handled on the
/// application side.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    SetDeviceName(String),
    /// TX power in dBm
    SetTxPower(i8),
    SetSecurityParameters(SecurityParameters),
    SetIoCapability(IoCapability),
    SetLocalMtu(u16),
    RegisterApplication,
    UnregisterApplication,
    ConfigureLocalPrivacy(bool),
    ConfigureAdvertisement(AdvertisingData),
    ConfigureScanResponse(AdvertisingData),
    StartAdvertising(AdvertisingParams),
    StopAdvertising,
    CreateAttributeTable(Vec<AttributeEntry>),
    /// Start the service behind its declaration handle
    StartService(u16),
    SendReadResponse {
        conn_id: u16,
        trans_id: u32,
        handle: u16,
        status: GattStatus,
        value: Vec<u8>,
    },
    /// Prepared writes echo their offset and value back
    SendWriteResponse {
        conn_id: u16,
        trans_id: u32,
        handle: u16,
        status: GattStatus,
        offset: u16,
        value: Vec<u8>,
    },
    SendNotification { conn_id: u16, handle: u16, value: Vec<u8> },
    SendIndication { conn_id: u16, handle: u16, value: Vec<u8> },
    UpdateConnectionParameters { peer: BdAddr, params: ConnectionParams },
    SetEncryption { peer: BdAddr, level: EncryptionLevel },
    ConfirmPairing { peer: BdAddr, accept: bool },
    SupplyPasskey { peer: BdAddr, accept: bool, passkey: u32 },
    SecurityResponse { peer: BdAddr, accept: bool },
    Disconnect(BdAddr),
    /// Value written by the central, for the application
    DeliverData(Vec<u8>),
    /// Congestion status, for the application
    ReportCongestion(bool),
    /// Log the bonded device list
    ReportBondedDevices,
}

impl Command {
    /// Whether this command is handled by the application rather than the host
    pub fn is_local(&self) -> bool {
        matches!(
            self,
            Command::DeliverData(_) | Command::ReportCongestion(_) | Command::ReportBondedDevices
        )
    }

    /// Short name for logging
    pub fn name(&self) -> &'static str {
        match self {
            Command::SetDeviceName(_) => "SetDeviceName",
            Command::SetTxPower(_) => "SetTxPower",
            Command::SetSecurityParameters(_) => "SetSecurityParameters",
            Command::SetIoCapability(_) => "SetIoCapability",
            Command::SetLocalMtu(_) => "SetLocalMtu",
            Command::RegisterApplication => "RegisterApplication",
            Command::UnregisterApplication => "UnregisterApplication",
            Command::ConfigureLocalPrivacy(_) => "ConfigureLocalPrivacy",
            Command::ConfigureAdvertisement(_) => "ConfigureAdvertisement",
            Command::ConfigureScanResponse(_) => "ConfigureScanResponse",
            Command::StartAdvertising(_) => "StartAdvertising",
            Command::StopAdvertising => "StopAdvertising",
            Command::CreateAttributeTable(_) => "CreateAttributeTable",
            Command::StartService(_) => "StartService",
            Command::SendReadResponse { .. } => "SendReadResponse",
            Command::SendWriteResponse { .. } => "SendWriteResponse",
            Command::SendNotification { .. } => "SendNotification",
            Command::SendIndication { .. } => "SendIndication",
            Command::UpdateConnectionParameters { .. } => "UpdateConnectionParameters",
            Command::SetEncryption { .. } => "SetEncryption",
            Command::ConfirmPairing { .. } => "ConfirmPairing",
            Command::SupplyPasskey { .. } => "SupplyPasskey",
            Command::SecurityResponse { .. } => "SecurityResponse",
            Command::Disconnect(_) => "Disconnect",
            Command::DeliverData(_) => "DeliverData",
            Command::ReportCongestion(_) => "ReportCongestion",
            Command::ReportBondedDevices => "ReportBondedDevices",
        }
    }
}
