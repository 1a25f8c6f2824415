//! Events delivered by the host stack

use crate::att::GattStatus;
use crate::gap::BdAddr;

/// An event from the host stack, in the order the stack reports them
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HostEvent {
    /// Application registration finished
    RegisterComplete { status: GattStatus },
    /// Local privacy (resolvable private address) configured
    LocalPrivacyConfigured { status: GattStatus },
    /// Advertisement payload accepted
    AdvertisementConfigured { status: GattStatus },
    /// Scan response payload accepted
    ScanResponseConfigured { status: GattStatus },
    AdvertisingStarted { status: GattStatus },
    AdvertisingStopped { status: GattStatus },
    /// Attribute table created; one handle per schema entry, in schema order
    AttributeTableCreated { status: GattStatus, handles: Vec<u16> },
    ServiceStarted { status: GattStatus },
    Connect { peer: BdAddr, conn_id: u16 },
    Disconnect { peer: BdAddr, reason: u8 },
    Read {
        conn_id: u16,
        trans_id: u32,
        handle: u16,
        offset: u16,
    },
    Write {
        conn_id: u16,
        trans_id: u32,
        handle: u16,
        value: Vec<u8>,
        offset: u16,
        is_prepared: bool,
        need_response: bool,
    },
    /// Execute (`ATT_EXEC_WRITE_COMMIT`) or cancel the prepared write queue
    ExecuteWrite { conn_id: u16, trans_id: u32, flag: u8 },
    /// Confirmation of the last indication
    Confirm { status: GattStatus },
    MtuNegotiated { conn_id: u16, mtu: u16 },
    Congestion { congested: bool },
    ConnParamsUpdated {
        status: GattStatus,
        min_interval: u16,
        max_interval: u16,
        conn_interval: u16,
        latency: u16,
        timeout: u16,
    },
    NumericComparisonRequest { peer: BdAddr, passkey: u32 },
    PasskeyRequest { peer: BdAddr },
    SecurityRequest { peer: BdAddr },
    PasskeyNotification { peer: BdAddr, passkey: u32 },
    AuthComplete {
        peer: BdAddr,
        success: bool,
        fail_reason: u8,
    },
    /// Key shared with the peer during pairing
    KeyExchanged { key_type: u8 },
    BondRemoved { peer: BdAddr, status: GattStatus },
}
