//! Session state machine
//!
//! Every host event goes through [`transition`], which updates the session
//! state and returns the commands to issue. Handlers never block.

use super::command::Command;
use super::event::HostEvent;
use super::flow::FlowController;
use super::reassembler::CommitOutcome;
use super::state::{Connection, LinkState, ServiceState, SessionState};
use crate::att::{
    AttError, EncryptionLevel, GattStatus, ATT_EXEC_WRITE_COMMIT, ATT_MTU_HEADER_SIZE,
    ATT_READ_RSP_HEADER_SIZE, DEFAULT_CHAR_MTU, LOCAL_MTU, MAX_CHAR_VALUE_LEN,
};
use crate::config::{validate_device_name, ConfigError, PeripheralConfig};
use crate::error::{Error, Result};
use crate::gap::{
    build_advertisement, build_scan_response, AddressType, AdvConfigPending, AdvertisingParams,
    BdAddr, ADV_SERVICE_UUID,
};
use crate::gatt::{build_schema, AttributeRole, AttributeSlot, AttributeTable, CccdValue, Uuid};
use crate::smp::{PasskeyDecision, SecurityDecision};
use log::{debug, error, info, trace, warn};
use std::time::Instant;

/// Apply one event to the session state
pub fn transition(
    mut state: SessionState,
    event: &HostEvent,
    now: Instant,
) -> (SessionState, Vec<Command>) {
    let commands = step(&mut state, event, now);
    (state, commands)
}

fn step(state: &mut SessionState, event: &HostEvent, now: Instant) -> Vec<Command> {
    trace!("Host event: {:?}", event);

    match event {
        HostEvent::RegisterComplete { status } => on_register_complete(state, *status),
        HostEvent::LocalPrivacyConfigured { status } => {
            if !status.is_ok() {
                error!("Local privacy configuration failed: {:?}", status);
                return Vec::new();
            }
            configure_advertising(state)
        }
        HostEvent::AdvertisementConfigured { status } => {
            on_payload_configured(state, AdvConfigPending::ADVERTISEMENT, *status)
        }
        HostEvent::ScanResponseConfigured { status } => {
            on_payload_configured(state, AdvConfigPending::SCAN_RESPONSE, *status)
        }
        HostEvent::AdvertisingStarted { status } => {
            if status.is_ok() && state.service == ServiceState::Failed {
                warn!("Advertising started for a failed service, stopping it");
                if state.link == LinkState::Advertising {
                    state.link = LinkState::Idle;
                }
                return vec![Command::StopAdvertising];
            }
            if status.is_ok() {
                info!("Advertising started");
                if state.link != LinkState::Connected {
                    state.link = LinkState::Advertising;
                }
            } else {
                error!("Advertising start failed: {:?}", status);
                if state.link == LinkState::Advertising {
                    state.link = LinkState::Idle;
                }
            }
            Vec::new()
        }
        HostEvent::AdvertisingStopped { status } => {
            if status.is_ok() {
                info!("Advertising stopped");
                if state.link == LinkState::Advertising {
                    state.link = LinkState::Idle;
                }
            } else {
                error!("Advertising stop failed: {:?}", status);
            }
            Vec::new()
        }
        HostEvent::AttributeTableCreated { status, handles } => {
            on_table_created(state, *status, handles)
        }
        HostEvent::ServiceStarted { status } => {
            if state.service == ServiceState::Failed {
                warn!("Ignoring service start for a failed attribute table");
            } else if status.is_ok() {
                info!("Service started");
                state.service = ServiceState::Started;
            } else {
                error!("Service start failed: {:?}", status);
                return fail_service(state);
            }
            Vec::new()
        }
        HostEvent::Connect { peer, conn_id } => on_connect(state, *peer, *conn_id),
        HostEvent::Disconnect { peer, reason } => on_disconnect(state, *peer, *reason),
        HostEvent::Read {
            conn_id,
            trans_id,
            handle,
            offset,
        } => on_read(state, *conn_id, *trans_id, *handle, *offset),
        HostEvent::Write {
            conn_id,
            trans_id,
            handle,
            value,
            offset,
            is_prepared,
            need_response,
        } => {
            if *is_prepared {
                on_prepare_write(state, *conn_id, *trans_id, *handle, value, *offset, *need_response)
            } else {
                on_write(state, *conn_id, *trans_id, *handle, value, *need_response)
            }
        }
        HostEvent::ExecuteWrite {
            conn_id,
            trans_id,
            flag,
        } => on_execute_write(state, *conn_id, *trans_id, *flag),
        HostEvent::Confirm { status } => {
            state.flow.on_confirm(*status);
            Vec::new()
        }
        HostEvent::MtuNegotiated { conn_id, mtu } => {
            let usable = (*mtu).min(MAX_CHAR_VALUE_LEN).saturating_sub(ATT_MTU_HEADER_SIZE);
            match state.connection.as_mut() {
                Some(conn) if conn.conn_id == *conn_id => {
                    info!("MTU {} negotiated, {} bytes usable", mtu, usable);
                    conn.negotiated_mtu = usable;
                }
                _ => warn!("MTU event for unknown connection {}", conn_id),
            }
            Vec::new()
        }
        HostEvent::Congestion { congested } => {
            if *congested {
                warn!("Link congested");
            } else {
                debug!("Link congestion cleared");
            }
            vec![Command::ReportCongestion(*congested)]
        }
        HostEvent::ConnParamsUpdated {
            status,
            min_interval,
            max_interval,
            conn_interval,
            latency,
            timeout,
        } => {
            info!(
                "Connection parameters updated: status {:?}, min {}, max {}, interval {}, latency {}, timeout {}",
                status, min_interval, max_interval, conn_interval, latency, timeout
            );
            Vec::new()
        }
        HostEvent::NumericComparisonRequest { peer, passkey } => {
            on_numeric_comparison(state, *peer, *passkey, now)
        }
        HostEvent::PasskeyRequest { peer } => match state.security.on_passkey_request(*peer) {
            PasskeyDecision::Accept(passkey) => vec![Command::SupplyPasskey {
                peer: *peer,
                accept: true,
                passkey,
            }],
            PasskeyDecision::Reject => {
                let mut commands = vec![Command::SupplyPasskey {
                    peer: *peer,
                    accept: false,
                    passkey: 0,
                }];
                commands.extend(reject_link(state, *peer));
                commands
            }
        },
        HostEvent::SecurityRequest { peer } => {
            let decision = state.security.on_security_request(*peer);
            let accept = decision == SecurityDecision::Accept;
            let mut commands = vec![Command::SecurityResponse { peer: *peer, accept }];
            if !accept {
                commands.extend(reject_link(state, *peer));
            }
            commands
        }
        HostEvent::PasskeyNotification { peer, passkey } => {
            match state.security.on_passkey_notification(*peer, *passkey) {
                SecurityDecision::Accept => Vec::new(),
                SecurityDecision::Reject => reject_link(state, *peer),
            }
        }
        HostEvent::AuthComplete {
            peer,
            success,
            fail_reason,
        } => {
            state.security.on_auth_complete(*peer, *success, *fail_reason);
            if !*success {
                return Vec::new();
            }
            if let Some(conn) = state.connection.as_mut().filter(|c| c.peer == *peer) {
                conn.encrypted = true;
            }
            vec![Command::ReportBondedDevices]
        }
        HostEvent::KeyExchanged { key_type } => {
            info!("Key exchanged, type {}", key_type);
            Vec::new()
        }
        HostEvent::BondRemoved { peer, status } => {
            info!("Bond with {} removed, status {:?}", peer, status);
            Vec::new()
        }
    }
}

fn on_register_complete(state: &mut SessionState, status: GattStatus) -> Vec<Command> {
    if !status.is_ok() {
        error!("Application registration failed: {:?}", status);
        return Vec::new();
    }

    info!("Application registered");
    state.registered = true;

    let mut commands = if state.config.local_privacy {
        vec![Command::ConfigureLocalPrivacy(true)]
    } else {
        configure_advertising(state)
    };

    state.service = ServiceState::Creating;
    commands.push(Command::CreateAttributeTable(build_schema()));
    commands
}

/// Build both payloads and mark them pending
fn configure_advertising(state: &mut SessionState) -> Vec<Command> {
    let advertisement = match build_advertisement(&state.config.device_name) {
        Ok(data) => data,
        Err(e) => {
            error!("Advertisement payload: {}", e);
            return Vec::new();
        }
    };
    let scan_response = match build_scan_response(state.config.power_level.tx_power_dbm()) {
        Ok(data) => data,
        Err(e) => {
            error!("Scan response payload: {}", e);
            return Vec::new();
        }
    };

    debug!(
        "Advertisement for service {}: {}",
        Uuid::Uuid128(ADV_SERVICE_UUID),
        hex::encode(advertisement.as_bytes())
    );
    debug!("Scan response: {}", hex::encode(scan_response.as_bytes()));

    state.adv_pending = AdvConfigPending::all();
    vec![
        Command::ConfigureAdvertisement(advertisement),
        Command::ConfigureScanResponse(scan_response),
    ]
}

fn on_payload_configured(
    state: &mut SessionState,
    which: AdvConfigPending,
    status: GattStatus,
) -> Vec<Command> {
    if !status.is_ok() {
        error!("{:?} configuration failed: {:?}", which, status);
        return Vec::new();
    }

    state.adv_pending.remove(which);
    maybe_start_advertising(state)
}

fn maybe_start_advertising(state: &mut SessionState) -> Vec<Command> {
    if !state.adv_pending.is_empty() {
        trace!("Waiting for {:?}", state.adv_pending);
        return Vec::new();
    }
    if state.connection.is_some() {
        debug!("Connected, not advertising");
        return Vec::new();
    }
    if state.service == ServiceState::Failed {
        warn!("Service failed, not advertising");
        return Vec::new();
    }

    let mut params = AdvertisingParams::default();
    if state.config.local_privacy {
        params.own_address_type = AddressType::Random;
    }
    vec![Command::StartAdvertising(params)]
}

fn on_table_created(state: &mut SessionState, status: GattStatus, handles: &[u16]) -> Vec<Command> {
    if !status.is_ok() {
        error!("Attribute table creation failed: {}", AttError::TableCreationFailed(status));
        return fail_service(state);
    }

    if let Err(e) = state.table.install_handles(handles) {
        error!("Fatal configuration error: {}", e);
        return fail_service(state);
    }

    match state.table.handle_for(AttributeSlot::Service) {
        Ok(handle) => {
            info!("Attribute table created, {} handles", handles.len());
            vec![Command::StartService(handle)]
        }
        Err(e) => {
            error!("Attribute table: {}", e);
            fail_service(state)
        }
    }
}

/// The service stays invisible: drop any link and stop advertising
fn fail_service(state: &mut SessionState) -> Vec<Command> {
    state.service = ServiceState::Failed;

    let mut commands = Vec::new();
    if let Some(peer) = teardown(state) {
        commands.push(Command::Disconnect(peer));
    }
    if state.link == LinkState::Advertising || !state.adv_pending.is_empty() {
        state.adv_pending = AdvConfigPending::empty();
        commands.push(Command::StopAdvertising);
    }
    state.link = LinkState::Idle;
    commands
}

fn on_connect(state: &mut SessionState, peer: BdAddr, conn_id: u16) -> Vec<Command> {
    if state.service == ServiceState::Failed {
        warn!("Connection from {} refused, service failed", peer);
        return vec![Command::Disconnect(peer)];
    }
    if let Some(current) = &state.connection {
        warn!(
            "Connection from {} while connected to {}, disconnecting it",
            peer, current.peer
        );
        return vec![Command::Disconnect(peer)];
    }

    info!("Connected to {} (conn_id {})", peer, conn_id);
    state.connection = Some(Connection::new(conn_id, peer));
    state.link = LinkState::Connected;

    let profile = state.config.connection_interval;
    debug!("Requesting {} connection interval profile", profile);
    vec![
        Command::SetEncryption {
            peer,
            level: EncryptionLevel::EncryptMitm,
        },
        Command::UpdateConnectionParameters {
            peer,
            params: profile.params(),
        },
    ]
}

fn on_disconnect(state: &mut SessionState, peer: BdAddr, reason: u8) -> Vec<Command> {
    match &state.connection {
        Some(current) if current.peer != peer => {
            debug!("Disconnect of {} (reason 0x{:02x}), still connected to {}", peer, reason, current.peer);
            return Vec::new();
        }
        Some(_) => {
            info!("Disconnected from {}, reason 0x{:02x}", peer, reason);
            teardown(state);
        }
        None => debug!("Disconnect of {} after teardown, reason 0x{:02x}", peer, reason),
    }

    state.link = LinkState::Idle;
    maybe_start_advertising(state)
}

/// Drop every piece of per-connection state.
///
/// Returns the peer that was connected, if any.
fn teardown(state: &mut SessionState) -> Option<BdAddr> {
    state.prepare.reset();
    state.prepared_handle = None;
    state.flow.gate().release();

    let conn = state.connection.take()?;
    if let Err(e) = state.table.set_value(AttributeSlot::ReadWriteConfig, &[0x00, 0x00]) {
        warn!("Resetting client configuration: {}", e);
    }
    if state.link == LinkState::Connected {
        state.link = LinkState::Idle;
    }
    debug!("Connection {} with {} torn down", conn.conn_id, conn.peer);
    Some(conn.peer)
}

/// Deny a security step: tear the link down and disconnect the peer
fn reject_link(state: &mut SessionState, peer: BdAddr) -> Vec<Command> {
    if state.is_connected_to(&peer) {
        teardown(state);
    }
    vec![Command::Disconnect(peer)]
}

fn on_numeric_comparison(
    state: &mut SessionState,
    peer: BdAddr,
    passkey: u32,
    now: Instant,
) -> Vec<Command> {
    let quiet = state.quiet_until.map_or(false, |until| now < until);
    let decision = if quiet {
        error!("Rejecting numeric comparison from {}: quiet period", peer);
        SecurityDecision::Reject
    } else {
        state.security.on_numeric_comparison_request(peer, passkey)
    };

    match decision {
        SecurityDecision::Accept => vec![Command::ConfirmPairing { peer, accept: true }],
        SecurityDecision::Reject => {
            if !quiet {
                state.quiet_until = Some(now + state.config.pairing_quiet_period);
            }
            let mut commands = vec![Command::ConfirmPairing { peer, accept: false }];
            commands.extend(reject_link(state, peer));
            commands
        }
    }
}

/// Longest value a read response can carry: the ATT MTU less the opcode
fn read_response_limit(state: &SessionState) -> usize {
    let usable = state
        .connection
        .as_ref()
        .map_or(DEFAULT_CHAR_MTU, |c| c.negotiated_mtu);
    usize::from(usable + ATT_MTU_HEADER_SIZE - ATT_READ_RSP_HEADER_SIZE)
}

fn on_read(state: &mut SessionState, conn_id: u16, trans_id: u32, handle: u16, offset: u16) -> Vec<Command> {
    let (status, value) = match state.table.read(handle, offset, read_response_limit(state)) {
        Ok(value) => (GattStatus::Ok, value),
        Err(e) => {
            warn!("Read of handle {} rejected: {}", handle, e);
            (e.to_status(), Vec::new())
        }
    };

    vec![Command::SendReadResponse {
        conn_id,
        trans_id,
        handle,
        status,
        value,
    }]
}

fn on_write(
    state: &mut SessionState,
    conn_id: u16,
    trans_id: u32,
    handle: u16,
    value: &[u8],
    need_response: bool,
) -> Vec<Command> {
    debug!("Write handle {}: {}", handle, hex::encode(value));

    let mut commands = Vec::new();
    let is_cccd = state.table.handle_for(AttributeSlot::ReadWriteConfig) == Ok(handle);
    let status = if is_cccd {
        on_cccd_write(state, handle, value)
    } else {
        match state.table.write(handle, value) {
            Ok(entry) => {
                if entry.role == AttributeRole::CharValue {
                    commands.push(Command::DeliverData(value.to_vec()));
                }
                GattStatus::Ok
            }
            Err(e) => {
                warn!("Write to handle {} rejected: {}", handle, e);
                e.to_status()
            }
        }
    };

    if need_response {
        commands.push(Command::SendWriteResponse {
            conn_id,
            trans_id,
            handle,
            status,
            offset: 0,
            value: Vec::new(),
        });
    }
    commands
}

fn on_cccd_write(state: &mut SessionState, handle: u16, value: &[u8]) -> GattStatus {
    let Some(cccd) = CccdValue::parse(value) else {
        warn!("Client configuration write of {} bytes rejected", value.len());
        return GattStatus::InvalidAttributeValueLength;
    };

    let enabled = match cccd {
        CccdValue::Notify => {
            info!("Notifications enabled");
            Some(true)
        }
        CccdValue::Disable => {
            info!("Notifications disabled");
            Some(false)
        }
        CccdValue::Indicate => {
            info!("Indications requested");
            None
        }
        CccdValue::Unknown(bits) => {
            warn!("Unknown client configuration value 0x{:04x}", bits);
            return GattStatus::Ok;
        }
    };

    if let Err(e) = state.table.write(handle, value) {
        warn!("Storing client configuration: {}", e);
    }
    if let (Some(enabled), Some(conn)) = (enabled, state.connection.as_mut()) {
        conn.notifications_enabled = enabled;
    }
    GattStatus::Ok
}

fn on_prepare_write(
    state: &mut SessionState,
    conn_id: u16,
    trans_id: u32,
    handle: u16,
    value: &[u8],
    offset: u16,
    need_response: bool,
) -> Vec<Command> {
    let status = match prepared_target_status(state, handle) {
        GattStatus::Ok => {
            let status = state.prepare.accept_fragment(offset, value, need_response);
            if status.is_ok() {
                state.prepared_handle = Some(handle);
            }
            status
        }
        status => {
            warn!("Prepared write to handle {} rejected: {:?}", handle, status);
            state.prepare.reset();
            status
        }
    };

    if !status.is_ok() {
        state.prepared_handle = None;
    }

    if !need_response {
        return Vec::new();
    }
    vec![Command::SendWriteResponse {
        conn_id,
        trans_id,
        handle,
        status,
        offset,
        value: value.to_vec(),
    }]
}

/// Check that a prepared write may target `handle`
fn prepared_target_status(state: &SessionState, handle: u16) -> GattStatus {
    let entry = match state.table.entry(handle) {
        Ok(entry) => entry,
        Err(e) => return e.to_status(),
    };
    if entry.role != AttributeRole::CharValue || !entry.permissions.can_write() {
        return GattStatus::WriteNotPermitted;
    }
    match state.prepared_handle {
        Some(pending) if pending != handle => GattStatus::RequestNotSupported,
        _ => GattStatus::Ok,
    }
}

fn on_execute_write(state: &mut SessionState, conn_id: u16, trans_id: u32, flag: u8) -> Vec<Command> {
    let execute = flag == ATT_EXEC_WRITE_COMMIT;
    let handle = state.prepared_handle.take();
    let mut commands = Vec::new();

    match state.prepare.commit(execute) {
        CommitOutcome::Committed(value) => {
            info!("Prepared write committed, {} bytes", value.len());
            debug!("Prepared value: {}", hex::encode(&value));
            if let Some(handle) = handle {
                if let Err(e) = state.table.write(handle, &value) {
                    warn!("Prepared value not stored on handle {}: {}", handle, e);
                }
            }
            commands.push(Command::DeliverData(value));
        }
        CommitOutcome::Cancelled => info!("Prepared write cancelled"),
        CommitOutcome::Empty => debug!("Execute write with nothing queued"),
    }

    commands.push(Command::SendWriteResponse {
        conn_id,
        trans_id,
        handle: handle.unwrap_or_default(),
        status: GattStatus::Ok,
        offset: 0,
        value: Vec::new(),
    });
    commands
}

/// The peripheral session: state plus the operations the application drives
#[derive(Debug)]
pub struct Session {
    state: SessionState,
}

impl Session {
    pub fn new(config: PeripheralConfig) -> std::result::Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            state: SessionState::new(config),
        })
    }

    /// Flow controller sharing this session's indication gate
    pub fn flow(&self) -> &FlowController {
        &self.state.flow
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn link(&self) -> LinkState {
        self.state.link
    }

    pub fn service_state(&self) -> ServiceState {
        self.state.service
    }

    pub fn connection(&self) -> Option<&Connection> {
        self.state.connection.as_ref()
    }

    pub fn notifications_enabled(&self) -> bool {
        self.state
            .connection
            .as_ref()
            .map_or(false, |c| c.notifications_enabled)
    }

    pub fn table(&self) -> &AttributeTable {
        &self.state.table
    }

    /// Commands that bring the peripheral up
    pub fn start(&mut self) -> Vec<Command> {
        let config = &self.state.config;
        info!(
            "Starting peripheral '{}' at {}, {} connection interval",
            config.device_name, config.power_level, config.connection_interval
        );

        let security = config.security_parameters();
        debug!(
            "Security: auth_req 0x{:02x}, io {} (0x{:02x}), keys 0x{:02x}/0x{:02x}",
            security.auth_req.to_u8(),
            security.io_capability,
            security.io_capability.to_u8(),
            security.init_keys.to_u8(),
            security.rsp_keys.to_u8()
        );

        vec![
            Command::SetDeviceName(config.device_name.clone()),
            Command::SetTxPower(config.power_level.tx_power_dbm()),
            Command::SetSecurityParameters(security),
            Command::SetLocalMtu(LOCAL_MTU),
            Command::RegisterApplication,
        ]
    }

    /// Commands that take the peripheral down
    pub fn stop(&mut self) -> Vec<Command> {
        let state = &mut self.state;
        let mut commands = Vec::new();

        if let Some(peer) = teardown(state) {
            commands.push(Command::Disconnect(peer));
        }
        if state.link == LinkState::Advertising {
            commands.push(Command::StopAdvertising);
        }
        if state.registered {
            commands.push(Command::UnregisterApplication);
        }

        state.link = LinkState::Idle;
        state.registered = false;
        state.service = ServiceState::NotCreated;
        state.adv_pending = AdvConfigPending::empty();
        state.table = AttributeTable::new();
        info!("Peripheral stopped");
        commands
    }

    /// Handle a host event now
    pub fn handle(&mut self, event: &HostEvent) -> Vec<Command> {
        self.handle_at(event, Instant::now())
    }

    /// Handle a host event at the given time
    pub fn handle_at(&mut self, event: &HostEvent, now: Instant) -> Vec<Command> {
        step(&mut self.state, event, now)
    }

    /// Allow pairing, optionally with a PIN, under a (new) device name
    pub fn start_pairing(&mut self, name: &str, with_pin: bool) -> std::result::Result<Vec<Command>, ConfigError> {
        validate_device_name(name)?;

        let state = &mut self.state;
        state.config.device_name = name.to_string();
        state.config.pairing_with_pin = with_pin;
        let io_capability = state.security.set_pairing_mode(true, with_pin);

        let mut commands = vec![
            Command::SetDeviceName(name.to_string()),
            Command::SetIoCapability(io_capability),
        ];
        commands.extend(configure_advertising(state));
        Ok(commands)
    }

    /// Disallow pairing
    pub fn stop_pairing(&mut self) -> Vec<Command> {
        let io_capability = self.state.security.set_pairing_mode(false, true);
        vec![Command::SetIoCapability(io_capability)]
    }

    /// Store `value` in the read-write characteristic and build the send command
    pub fn prepare_send(&mut self, value: &[u8], use_confirmation: bool) -> Result<Command> {
        let state = &mut self.state;
        let conn = state.connection.as_ref().ok_or(Error::NotConnected)?;

        let max = usize::from(conn.negotiated_mtu);
        if value.len() > max {
            return Err(Error::ValueTooLong { len: value.len(), max });
        }
        let conn_id = conn.conn_id;

        let handle = state.table.handle_for(AttributeSlot::ReadWriteValue)?;
        state.table.set_value(AttributeSlot::ReadWriteValue, value)?;

        let value = value.to_vec();
        Ok(if use_confirmation {
            Command::SendIndication { conn_id, handle, value }
        } else {
            Command::SendNotification { conn_id, handle, value }
        })
    }
}
