//! Outbound notification flow control
//!
//! Indications are serialized through a single in-flight flag. The flag is
//! taken when an indication goes out and released by the peer's confirmation,
//! whatever its status. Notifications need no confirmation and bypass it.

use crate::att::GattStatus;
use crate::error::{Error, Result};
use log::{debug, trace, warn};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

/// Single in-flight guard shared between the event path and senders
#[derive(Debug, Default)]
pub struct SendGate {
    in_flight: AtomicBool,
}

impl SendGate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Take the gate if it is clear
    pub fn try_acquire(&self) -> bool {
        self.in_flight
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }

    /// Clear the gate
    pub fn release(&self) {
        self.in_flight.store(false, Ordering::Release);
    }

    pub fn is_busy(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }
}

/// Result of a single send attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SendStatus {
    Sent,
    /// An indication is still waiting for its confirmation
    Busy,
}

/// Polling schedule used while the gate is busy
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BackoffConfig {
    /// Delay between attempts
    pub poll_interval: Duration,
    /// Give up after this long
    pub max_wait: Duration,
}

impl Default for BackoffConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_millis(100),
            max_wait: Duration::from_secs(3),
        }
    }
}

/// Sends values through the gate
#[derive(Debug, Clone)]
pub struct FlowController {
    gate: Arc<SendGate>,
    backoff: BackoffConfig,
}

impl FlowController {
    pub fn new(gate: Arc<SendGate>, backoff: BackoffConfig) -> Self {
        Self { gate, backoff }
    }

    pub fn gate(&self) -> &Arc<SendGate> {
        &self.gate
    }

    /// Attempt one send.
    ///
    /// With `use_confirmation` the gate must be clear; it stays taken until
    /// [`on_confirm`](Self::on_confirm). If `send` fails the gate is released
    /// again since no confirmation will ever arrive.
    pub fn try_send<F>(&self, use_confirmation: bool, send: F) -> Result<SendStatus>
    where
        F: FnOnce() -> Result<()>,
    {
        if use_confirmation && !self.gate.try_acquire() {
            trace!("Send gate busy");
            return Ok(SendStatus::Busy);
        }

        match send() {
            Ok(()) => Ok(SendStatus::Sent),
            Err(e) => {
                if use_confirmation {
                    self.gate.release();
                }
                Err(e)
            }
        }
    }

    /// Retry [`try_send`](Self::try_send) until it goes out or `max_wait` passes
    pub fn send_with_backoff<F>(&self, use_confirmation: bool, mut send: F) -> Result<()>
    where
        F: FnMut() -> Result<()>,
    {
        let start = Instant::now();
        loop {
            if self.try_send(use_confirmation, &mut send)? == SendStatus::Sent {
                return Ok(());
            }

            let waited = start.elapsed();
            if waited >= self.backoff.max_wait {
                warn!("Indication not confirmed after {:?}, giving up", waited);
                return Err(Error::SendTimeout(self.backoff.max_wait));
            }

            thread::sleep(self.backoff.poll_interval.min(self.backoff.max_wait - waited));
        }
    }

    /// Confirmation from the peer. Any status clears the gate.
    pub fn on_confirm(&self, status: GattStatus) {
        if status.is_ok() {
            debug!("Indication confirmed");
        } else {
            warn!("Indication confirm failed with {:?}, assuming lost", status);
        }
        self.gate.release();
    }
}
