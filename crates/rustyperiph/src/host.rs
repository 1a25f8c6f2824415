//! Host stack seam and the peripheral driver
//!
//! The host stack delivers events through [`Peripheral::dispatch`] and
//! executes the commands the session produces. Application data goes out
//! through the registered callbacks.

use crate::config::PeripheralConfig;
use crate::error::Result;
use crate::gap::BdAddr;
use crate::session::{Command, HostEvent, Session};
use log::{debug, error, info, warn};
use std::sync::{Arc, Mutex, MutexGuard};
use thiserror::Error;

/// Errors reported by the host stack
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum HostError {
    #[error("{command} failed with code {code}")]
    CommandFailed { command: String, code: i32 },

    #[error("Host stack unavailable: {0}")]
    Unavailable(String),
}

/// Outbound side of the BLE host stack
pub trait HostStack: Send + Sync {
    /// Issue one command. Must not block on the peer.
    fn execute(&self, command: &Command) -> std::result::Result<(), HostError>;

    /// Devices the stack holds bonding keys for
    fn bonded_devices(&self) -> std::result::Result<Vec<BdAddr>, HostError>;

    /// Forget the bond with `peer`
    fn remove_bond(&self, peer: &BdAddr) -> std::result::Result<(), HostError>;
}

/// Callback for values written by the central
pub type DataCallback = Arc<Mutex<dyn FnMut(&[u8]) + Send + 'static>>;

/// Callback for congestion changes
pub type CongestionCallback = Arc<Mutex<dyn FnMut(bool) + Send + 'static>>;

/// BLE peripheral driven by host stack events
pub struct Peripheral<H: HostStack> {
    host: H,
    session: Mutex<Session>,
    data_callback: Mutex<Option<DataCallback>>,
    congestion_callback: Mutex<Option<CongestionCallback>>,
}

fn lock<T: ?Sized>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl<H: HostStack> Peripheral<H> {
    /// Create a peripheral over `host`
    pub fn new(host: H, config: PeripheralConfig) -> Result<Self> {
        Ok(Self {
            host,
            session: Mutex::new(Session::new(config)?),
            data_callback: Mutex::new(None),
            congestion_callback: Mutex::new(None),
        })
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    /// Set the callback for values written by the central
    pub fn set_data_callback<F>(&self, callback: F)
    where
        F: FnMut(&[u8]) + Send + 'static,
    {
        *lock(&self.data_callback) = Some(Arc::new(Mutex::new(callback)));
    }

    /// Set the callback for congestion changes
    pub fn set_congestion_callback<F>(&self, callback: F)
    where
        F: FnMut(bool) + Send + 'static,
    {
        *lock(&self.congestion_callback) = Some(Arc::new(Mutex::new(callback)));
    }

    /// Run `f` against the session
    pub fn with_session<R>(&self, f: impl FnOnce(&Session) -> R) -> R {
        let session = lock(&self.session);
        f(&session)
    }

    /// Bring the peripheral up
    pub fn start(&self) -> Result<()> {
        let commands = lock(&self.session).start();
        self.execute_all(commands)
    }

    /// Take the peripheral down
    pub fn stop(&self) -> Result<()> {
        let commands = lock(&self.session).stop();
        self.execute_all(commands)
    }

    /// Handle one host event.
    ///
    /// Events are handled one at a time; commands are issued after the
    /// session lock is released.
    pub fn dispatch(&self, event: HostEvent) -> Result<()> {
        let commands = lock(&self.session).handle(&event);
        self.execute_all(commands)
    }

    /// Allow pairing under `name`
    pub fn start_pairing(&self, name: &str, with_pin: bool) -> Result<()> {
        let commands = lock(&self.session).start_pairing(name, with_pin)?;
        self.execute_all(commands)
    }

    /// Disallow pairing
    pub fn stop_pairing(&self) -> Result<()> {
        let commands = lock(&self.session).stop_pairing();
        self.execute_all(commands)
    }

    /// Send `value` to the central.
    ///
    /// With `use_confirmation` the value goes out as an indication and waits,
    /// with bounded backoff, for the previous one to be confirmed.
    pub fn send(&self, value: &[u8], use_confirmation: bool) -> Result<()> {
        let flow = lock(&self.session).flow().clone();
        flow.send_with_backoff(use_confirmation, || {
            let command = lock(&self.session).prepare_send(value, use_confirmation)?;
            self.execute(command)
        })
    }

    /// Bonded devices, as held by the host
    pub fn list_bonded(&self) -> Result<Vec<BdAddr>> {
        Ok(self.host.bonded_devices()?)
    }

    /// Remove every bond. Returns how many were removed.
    pub fn clear_all_bonded(&self) -> Result<usize> {
        let devices = self.host.bonded_devices()?;
        if devices.is_empty() {
            info!("No bonded devices to remove");
            return Ok(0);
        }

        for peer in &devices {
            self.host.remove_bond(peer)?;
            debug!("Removed bond with {}", peer);
        }
        info!("Removed {} bonded devices", devices.len());
        Ok(devices.len())
    }

    fn execute_all(&self, commands: Vec<Command>) -> Result<()> {
        let mut first_error = None;
        for command in commands {
            if let Err(e) = self.execute(command) {
                error!("{}", e);
                first_error.get_or_insert(e);
            }
        }
        first_error.map_or(Ok(()), Err)
    }

    fn execute(&self, command: Command) -> Result<()> {
        if !command.is_local() {
            debug!("Host command {}", command.name());
        }
        match command {
            Command::DeliverData(data) => {
                let callback = lock(&self.data_callback).clone();
                match callback {
                    Some(callback) => {
                        let mut callback = lock(&*callback);
                        (*callback)(&data);
                    }
                    None => warn!("No data callback, dropping {} bytes", data.len()),
                }
                Ok(())
            }
            Command::ReportCongestion(congested) => {
                let callback = lock(&self.congestion_callback).clone();
                if let Some(callback) = callback {
                    let mut callback = lock(&*callback);
                    (*callback)(congested);
                }
                Ok(())
            }
            Command::ReportBondedDevices => {
                let devices = self.host.bonded_devices()?;
                info!("Bonded devices: {}", devices.len());
                for peer in &devices {
                    info!("  {} ({})", peer, hex::encode(peer.as_slice()));
                }
                Ok(())
            }
            command => {
                self.host.execute(&command)?;
                Ok(())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::att::GattStatus;
    use crate::error::Error;
    use crate::session::BackoffConfig;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::thread;
    use std::time::Duration;

    const PEER: BdAddr = BdAddr {
        bytes: [0xA1, 0xA2, 0xA3, 0xA4, 0xA5, 0xA6],
    };

    /// Host stack that records every command
    #[derive(Default)]
    struct MockHost {
        commands: Mutex<Vec<Command>>,
        bonded: Mutex<Vec<BdAddr>>,
        fail: AtomicBool,
    }

    impl MockHost {
        fn commands(&self) -> Vec<Command> {
            self.commands.lock().unwrap().clone()
        }

        fn sent_count(&self) -> usize {
            self.commands()
                .iter()
                .filter(|c| matches!(c, Command::SendIndication { .. } | Command::SendNotification { .. }))
                .count()
        }
    }

    impl HostStack for MockHost {
        fn execute(&self, command: &Command) -> std::result::Result<(), HostError> {
            if self.fail.load(Ordering::SeqCst) {
                return Err(HostError::CommandFailed {
                    command: command.name().to_string(),
                    code: -1,
                });
            }
            self.commands.lock().unwrap().push(command.clone());
            Ok(())
        }

        fn bonded_devices(&self) -> std::result::Result<Vec<BdAddr>, HostError> {
            Ok(self.bonded.lock().unwrap().clone())
        }

        fn remove_bond(&self, peer: &BdAddr) -> std::result::Result<(), HostError> {
            self.bonded.lock().unwrap().retain(|p| p != peer);
            Ok(())
        }
    }

    fn test_config() -> PeripheralConfig {
        PeripheralConfig {
            local_privacy: false,
            send_backoff: BackoffConfig {
                poll_interval: Duration::from_millis(5),
                max_wait: Duration::from_millis(40),
            },
            ..PeripheralConfig::new("Periph")
        }
    }

    fn connected_peripheral(config: PeripheralConfig) -> Peripheral<MockHost> {
        let peripheral = Peripheral::new(MockHost::default(), config).unwrap();
        peripheral.start().unwrap();
        let ok = GattStatus::Ok;
        for event in [
            HostEvent::RegisterComplete { status: ok },
            HostEvent::AdvertisementConfigured { status: ok },
            HostEvent::ScanResponseConfigured { status: ok },
            HostEvent::AttributeTableCreated {
                status: ok,
                handles: (40..48).collect(),
            },
            HostEvent::ServiceStarted { status: ok },
            HostEvent::Connect { peer: PEER, conn_id: 1 },
        ] {
            peripheral.dispatch(event).unwrap();
        }
        peripheral
    }

    #[test]
    fn test_start_reaches_host() {
        let peripheral = Peripheral::new(MockHost::default(), test_config()).unwrap();
        peripheral.start().unwrap();

        let commands = peripheral.host().commands();
        assert_eq!(commands.len(), 5);
        assert_eq!(commands[4], Command::RegisterApplication);
    }

    #[test]
    fn test_dispatch_issues_commands() {
        let peripheral = connected_peripheral(test_config());
        let commands = peripheral.host().commands();

        assert!(commands.contains(&Command::StartService(40)));
        assert!(commands.iter().any(|c| matches!(c, Command::StartAdvertising(_))));
        assert!(commands.iter().any(|c| matches!(c, Command::SetEncryption { .. })));
        assert!(commands.iter().all(|c| !c.is_local()));
    }

    #[test]
    fn test_written_data_reaches_callback() {
        let peripheral = connected_peripheral(test_config());
        let received = Arc::new(Mutex::new(Vec::new()));
        let sink = received.clone();
        peripheral.set_data_callback(move |data| sink.lock().unwrap().extend_from_slice(data));

        peripheral
            .dispatch(HostEvent::Write {
                conn_id: 1,
                trans_id: 1,
                handle: 42,
                value: b"ping".to_vec(),
                offset: 0,
                is_prepared: false,
                need_response: true,
            })
            .unwrap();

        assert_eq!(*received.lock().unwrap(), b"ping");
        assert!(peripheral
            .host()
            .commands()
            .iter()
            .any(|c| matches!(c, Command::SendWriteResponse { status: GattStatus::Ok, .. })));
    }

    #[test]
    fn test_congestion_reaches_callback() {
        let peripheral = connected_peripheral(test_config());
        let congested = Arc::new(AtomicBool::new(false));
        let flag = congested.clone();
        peripheral.set_congestion_callback(move |c| flag.store(c, Ordering::SeqCst));

        peripheral
            .dispatch(HostEvent::Congestion { congested: true })
            .unwrap();
        assert!(congested.load(Ordering::SeqCst));
    }

    #[test]
    fn test_indication_waits_for_confirm() {
        let peripheral = connected_peripheral(test_config());

        peripheral.send(b"one", true).unwrap();
        assert_eq!(peripheral.host().sent_count(), 1);

        let result = peripheral.send(b"two", true);
        assert!(matches!(result, Err(Error::SendTimeout(_))));
        assert_eq!(peripheral.host().sent_count(), 1);

        peripheral
            .dispatch(HostEvent::Confirm {
                status: GattStatus::Ok,
            })
            .unwrap();
        peripheral.send(b"three", true).unwrap();
        assert_eq!(peripheral.host().sent_count(), 2);
    }

    #[test]
    fn test_notifications_ignore_gate() {
        let peripheral = connected_peripheral(test_config());

        peripheral.send(b"one", true).unwrap();
        peripheral.send(b"two", false).unwrap();
        peripheral.send(b"three", false).unwrap();
        assert_eq!(peripheral.host().sent_count(), 3);
    }

    #[test]
    fn test_confirm_from_another_thread() {
        let config = PeripheralConfig {
            send_backoff: BackoffConfig {
                poll_interval: Duration::from_millis(5),
                max_wait: Duration::from_secs(2),
            },
            ..test_config()
        };
        let peripheral = Arc::new(connected_peripheral(config));
        peripheral.send(b"one", true).unwrap();

        let confirmer = peripheral.clone();
        let handle = thread::spawn(move || {
            thread::sleep(Duration::from_millis(20));
            confirmer
                .dispatch(HostEvent::Confirm {
                    status: GattStatus::Ok,
                })
                .unwrap();
        });

        peripheral.send(b"two", true).unwrap();
        handle.join().unwrap();
        assert_eq!(peripheral.host().sent_count(), 2);
    }

    #[test]
    fn test_host_error_releases_gate() {
        let peripheral = connected_peripheral(test_config());
        peripheral.host().fail.store(true, Ordering::SeqCst);

        let result = peripheral.send(b"lost", true);
        assert!(matches!(result, Err(Error::Host(_))));
        assert!(!peripheral.with_session(|s| s.flow().gate().is_busy()));

        peripheral.host().fail.store(false, Ordering::SeqCst);
        peripheral.send(b"retry", true).unwrap();
    }

    #[test]
    fn test_send_without_connection() {
        let peripheral = Peripheral::new(MockHost::default(), test_config()).unwrap();

        let result = peripheral.send(b"data", true);
        assert!(matches!(result, Err(Error::NotConnected)));
        assert!(!peripheral.with_session(|s| s.flow().gate().is_busy()));
    }

    #[test]
    fn test_bonded_devices() {
        let peripheral = Peripheral::new(MockHost::default(), test_config()).unwrap();
        let other = BdAddr::new([1, 2, 3, 4, 5, 6]);
        *peripheral.host().bonded.lock().unwrap() = vec![PEER, other];

        assert_eq!(peripheral.list_bonded().unwrap(), vec![PEER, other]);
        assert_eq!(peripheral.clear_all_bonded().unwrap(), 2);
        assert!(peripheral.list_bonded().unwrap().is_empty());
        assert_eq!(peripheral.clear_all_bonded().unwrap(), 0);
    }

    #[test]
    fn test_auth_complete_lists_bonds_locally() {
        let peripheral = connected_peripheral(test_config());
        peripheral.host().bonded.lock().unwrap().push(PEER);

        peripheral
            .dispatch(HostEvent::AuthComplete {
                peer: PEER,
                success: true,
                fail_reason: 0,
            })
            .unwrap();

        assert!(!peripheral
            .host()
            .commands()
            .contains(&Command::ReportBondedDevices));
        assert!(peripheral.with_session(|s| s.connection().map_or(false, |c| c.encrypted)));
    }

    #[test]
    fn test_failed_command_does_not_stop_the_rest() {
        let peripheral = Peripheral::new(MockHost::default(), test_config()).unwrap();
        peripheral.host().fail.store(true, Ordering::SeqCst);

        let result = peripheral.start();
        assert!(matches!(result, Err(Error::Host(HostError::CommandFailed { .. }))));
        assert!(peripheral.host().commands().is_empty());
    }
}
