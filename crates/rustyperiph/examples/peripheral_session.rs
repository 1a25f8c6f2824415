//! Example driving a peripheral session with a scripted host stack
//!
//! The host stack here only prints the commands it receives. Events are fed
//! in the order a real stack would report them for one central that
//! connects, writes a long value and disconnects.

use std::sync::Mutex;
use rustyperiph::{BdAddr, Command, GattStatus, HostError, HostEvent, HostStack, Peripheral, PeripheralConfig};

struct PrintingHost {
    bonded: Mutex<Vec<BdAddr>>,
}

impl HostStack for PrintingHost {
    fn execute(&self, command: &Command) -> Result<(), HostError> {
        match command {
            Command::ConfigureAdvertisement(data) | Command::ConfigureScanResponse(data) => {
                println!("-> {} ({} bytes)", command.name(), data.len());
            }
            Command::SendWriteResponse { handle, status, .. } => {
                println!("-> {} handle {} {:?}", command.name(), handle, status);
            }
            _ => println!("-> {}", command.name()),
        }
        Ok(())
    }

    fn bonded_devices(&self) -> Result<Vec<BdAddr>, HostError> {
        Ok(self.bonded.lock().map_err(|e| HostError::Unavailable(e.to_string()))?.clone())
    }

    fn remove_bond(&self, peer: &BdAddr) -> Result<(), HostError> {
        let mut bonded = self.bonded.lock().map_err(|e| HostError::Unavailable(e.to_string()))?;
        bonded.retain(|p| p != peer);
        Ok(())
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let host = PrintingHost {
        bonded: Mutex::new(Vec::new()),
    };
    let peripheral = Peripheral::new(host, PeripheralConfig::new("RustyPeriph"))?;

    peripheral.set_data_callback(|data| {
        println!("Received {} bytes: {}", data.len(), String::from_utf8_lossy(data));
    });

    peripheral.start()?;
    peripheral.start_pairing("RustyPeriph", true)?;

    let ok = GattStatus::Ok;
    let peer = BdAddr::new([0x66, 0x55, 0x44, 0x33, 0x22, 0x11]);
    let events = vec![
        HostEvent::RegisterComplete { status: ok },
        HostEvent::LocalPrivacyConfigured { status: ok },
        HostEvent::AdvertisementConfigured { status: ok },
        HostEvent::ScanResponseConfigured { status: ok },
        HostEvent::AttributeTableCreated {
            status: ok,
            handles: (40..48).collect(),
        },
        HostEvent::ServiceStarted { status: ok },
        HostEvent::AdvertisingStarted { status: ok },
        HostEvent::Connect { peer, conn_id: 0 },
        HostEvent::MtuNegotiated { conn_id: 0, mtu: 185 },
        HostEvent::NumericComparisonRequest { peer, passkey: 123456 },
        HostEvent::AuthComplete {
            peer,
            success: true,
            fail_reason: 0,
        },
        // Enable notifications
        HostEvent::Write {
            conn_id: 0,
            trans_id: 1,
            handle: 43,
            value: vec![0x01, 0x00],
            offset: 0,
            is_prepared: false,
            need_response: true,
        },
        HostEvent::Write {
            conn_id: 0,
            trans_id: 2,
            handle: 42,
            value: b"Hello from a ".to_vec(),
            offset: 0,
            is_prepared: true,
            need_response: true,
        },
        HostEvent::Write {
            conn_id: 0,
            trans_id: 3,
            handle: 42,
            value: b"long write".to_vec(),
            offset: 13,
            is_prepared: true,
            need_response: true,
        },
        HostEvent::ExecuteWrite {
            conn_id: 0,
            trans_id: 4,
            flag: 1,
        },
    ];

    for event in events {
        peripheral.dispatch(event)?;
    }

    peripheral.send(b"notification", false)?;
    println!(
        "Notifications enabled: {}",
        peripheral.with_session(|s| s.notifications_enabled())
    );

    peripheral.dispatch(HostEvent::Disconnect { peer, reason: 0x13 })?;
    peripheral.stop_pairing()?;
    peripheral.stop()?;
    println!("Peripheral stopped");

    Ok(())
}
