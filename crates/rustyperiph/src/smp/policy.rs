//! Pairing policy
//!
//! The host stack runs the pairing protocol itself. This module only decides
//! whether each security step is allowed. A rejected step always ends the
//! link: the caller disconnects the peer as well as denying the step.

use super::types::{AuthRequirements, IoCapability, SecurityParameters};
use crate::gap::BdAddr;
use log::{error, info, warn};

/// Process-wide pairing configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PairingPolicy {
    /// Whether a new pairing may take place
    pub pairing_allowed: bool,
    pub io_capability: IoCapability,
    /// Passkey supplied on passkey requests
    pub static_passkey: u32,
    pub auth_req: AuthRequirements,
}

/// Outcome of a security event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SecurityDecision {
    Accept,
    /// Deny the step and disconnect the peer
    Reject,
}

/// Outcome of a passkey request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PasskeyDecision {
    Accept(u32),
    /// Deny the request and disconnect the peer
    Reject,
}

/// Security policy consulted by every security event handler
#[derive(Debug, Clone)]
pub struct SecurityPolicy {
    policy: PairingPolicy,
    /// Peer that last passed numeric comparison
    paired_peer: Option<BdAddr>,
}

impl SecurityPolicy {
    /// Create a policy from the start-up security parameters.
    ///
    /// Pairing starts out disallowed.
    pub fn new(params: &SecurityParameters) -> Self {
        Self {
            policy: PairingPolicy {
                pairing_allowed: false,
                io_capability: params.io_capability,
                static_passkey: params.static_passkey,
                auth_req: params.auth_req,
            },
            paired_peer: None,
        }
    }

    /// Current pairing configuration
    pub fn policy(&self) -> &PairingPolicy {
        &self.policy
    }

    pub fn pairing_allowed(&self) -> bool {
        self.policy.pairing_allowed
    }

    /// Peer accepted by the last numeric comparison
    pub fn paired_peer(&self) -> Option<BdAddr> {
        self.paired_peer
    }

    /// Update the pairing mode.
    ///
    /// Takes effect on the next security event; an already negotiated link is
    /// left alone. Returns the IO capability to install in the host.
    pub fn set_pairing_mode(&mut self, allowed: bool, require_passkey: bool) -> IoCapability {
        self.policy.pairing_allowed = allowed;
        self.policy.io_capability = IoCapability::for_pin(require_passkey);
        info!(
            "Pairing {} (IO capability: {})",
            if allowed { "allowed" } else { "disallowed" },
            self.policy.io_capability
        );
        self.policy.io_capability
    }

    pub fn on_numeric_comparison_request(&mut self, peer: BdAddr, passkey: u32) -> SecurityDecision {
        if !self.policy.pairing_allowed {
            error!("Rejecting numeric comparison from {}: pairing not allowed", peer);
            return SecurityDecision::Reject;
        }

        self.paired_peer = Some(peer);
        info!("Accepting numeric comparison from {}, number {:06}", peer, passkey);
        SecurityDecision::Accept
    }

    pub fn on_passkey_request(&self, peer: BdAddr) -> PasskeyDecision {
        if !self.policy.pairing_allowed {
            error!("Rejecting passkey request from {}: pairing not allowed", peer);
            return PasskeyDecision::Reject;
        }

        info!("Supplying passkey to {}", peer);
        PasskeyDecision::Accept(self.policy.static_passkey)
    }

    pub fn on_security_request(&self, peer: BdAddr) -> SecurityDecision {
        if !self.policy.pairing_allowed {
            error!("Rejecting security request from {}: pairing not allowed", peer);
            return SecurityDecision::Reject;
        }

        info!("Accepting security request from {}", peer);
        SecurityDecision::Accept
    }

    pub fn on_passkey_notification(&self, peer: BdAddr, passkey: u32) -> SecurityDecision {
        if !self.policy.pairing_allowed {
            error!("Rejecting passkey notification from {}: pairing not allowed", peer);
            return SecurityDecision::Reject;
        }

        info!("Passkey notification for {}: {:06}", peer, passkey);
        SecurityDecision::Accept
    }

    /// Observe the end of a pairing attempt
    pub fn on_auth_complete(&self, peer: BdAddr, success: bool, fail_reason: u8) {
        if success {
            info!("Authentication with {} complete", peer);
        } else {
            warn!("Authentication with {} failed, reason 0x{:02x}", peer, fail_reason);
        }
    }
}
