//! Security Manager Protocol (SMP) policy
//!
//! Pairing itself, key generation and storage are handled by the host stack.
//! This module holds the parameters the peripheral installs at start-up and
//! the policy that accepts or rejects each security event.

mod constants;
mod policy;
mod types;


// Re-export public API
pub use self::constants::*;
pub use self::policy::{PairingPolicy, PasskeyDecision, SecurityDecision, SecurityPolicy};
pub use self::types::*;
