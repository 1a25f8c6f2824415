//! Session state owned by the state machine

use super::flow::{FlowController, SendGate};
use super::reassembler::PreparedWriteBuffer;
use crate::att::DEFAULT_CHAR_MTU;
use crate::config::PeripheralConfig;
use crate::gap::{AdvConfigPending, BdAddr};
use crate::gatt::AttributeTable;
use crate::smp::SecurityPolicy;
use std::sync::Arc;
use std::time::Instant;

/// Radio-facing lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LinkState {
    #[default]
    Idle,
    Advertising,
    Connected,
}

/// Lifecycle of the GATT service
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ServiceState {
    #[default]
    NotCreated,
    /// Table requested, waiting for handles and start
    Creating,
    Started,
    /// Table creation failed or handle count mismatched; never retried
    Failed,
}

/// The single active connection
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Connection {
    pub conn_id: u16,
    pub peer: BdAddr,
    /// Set once pairing with this peer succeeds
    pub encrypted: bool,
    /// Usable characteristic payload on this link
    pub negotiated_mtu: u16,
    pub notifications_enabled: bool,
}

impl Connection {
    pub fn new(conn_id: u16, peer: BdAddr) -> Self {
        Self {
            conn_id,
            peer,
            encrypted: false,
            negotiated_mtu: DEFAULT_CHAR_MTU,
            notifications_enabled: false,
        }
    }
}

/// Everything the event handlers read and mutate
#[derive(Debug)]
pub struct SessionState {
    pub config: PeripheralConfig,
    pub link: LinkState,
    pub service: ServiceState,
    pub registered: bool,
    /// Payload configurations still waiting on the host
    pub adv_pending: AdvConfigPending,
    pub connection: Option<Connection>,
    pub table: AttributeTable,
    pub security: SecurityPolicy,
    pub prepare: PreparedWriteBuffer,
    /// Target of the pending prepared write
    pub prepared_handle: Option<u16>,
    /// Indication gate, shared with senders
    pub flow: FlowController,
    /// Numeric comparison requests are refused until then
    pub quiet_until: Option<Instant>,
}

impl SessionState {
    pub fn new(config: PeripheralConfig) -> Self {
        let security = SecurityPolicy::new(&config.security_parameters());
        let prepare = PreparedWriteBuffer::new(config.prepare_buffer_capacity);
        let flow = FlowController::new(Arc::new(SendGate::new()), config.send_backoff);
        Self {
            config,
            link: LinkState::Idle,
            service: ServiceState::NotCreated,
            registered: false,
            adv_pending: AdvConfigPending::empty(),
            connection: None,
            table: AttributeTable::new(),
            security,
            prepare,
            prepared_handle: None,
            flow,
            quiet_until: None,
        }
    }

    /// Whether `peer` is the connected central
    pub fn is_connected_to(&self, peer: &BdAddr) -> bool {
        self.connection.as_ref().map_or(false, |c| c.peer == *peer)
    }
}
