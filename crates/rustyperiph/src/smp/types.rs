//! Type definitions for the Security Manager Protocol
use super::constants::*;
use std::fmt;
use thiserror::Error;

/// SMP Error types
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SmpError {
    #[error("Passkey {0} has more than six digits")]
    InvalidPasskey(u32),

    #[error("Encryption key size {0} outside 7..=16")]
    InvalidKeySize(u8),
}

/// Result type for SMP operations
pub type SmpResult<T> = Result<T, SmpError>;

/// IO Capability types for pairing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IoCapability {
    /// Display with yes/no capability
    DisplayYesNo,
    /// No input, no output
    NoInputNoOutput,
}

impl IoCapability {
    /// Convert to u8 value for protocol
    pub fn to_u8(&self) -> u8 {
        match self {
            IoCapability::DisplayYesNo => SMP_IO_CAPABILITY_DISPLAY_YES_NO,
            IoCapability::NoInputNoOutput => SMP_IO_CAPABILITY_NO_INPUT_NO_OUTPUT,
        }
    }

    /// Capability advertised for the pairing mode: a yes/no display when a PIN
    /// is confirmed on the device, nothing otherwise
    pub fn for_pin(with_pin: bool) -> Self {
        if with_pin {
            IoCapability::DisplayYesNo
        } else {
            IoCapability::NoInputNoOutput
        }
    }
}

impl fmt::Display for IoCapability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IoCapability::DisplayYesNo => write!(f, "Display Yes/No"),
            IoCapability::NoInputNoOutput => write!(f, "No Input No Output"),
        }
    }
}

/// Authentication requirements
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthRequirements {
    /// Whether bonding is required
    pub bonding: bool,
    /// Whether MITM protection is required
    pub mitm: bool,
    /// Whether Secure Connections is required
    pub secure_connections: bool,
    /// Whether keypress notifications are required
    pub keypress_notifications: bool,
    /// Whether CT2 feature is supported
    pub ct2: bool,
}

impl AuthRequirements {
    /// Secure connections with MITM protection and bonding
    pub fn secure() -> Self {
        Self {
            bonding: true,
            mitm: true,
            secure_connections: true,
            keypress_notifications: false,
            ct2: false,
        }
    }

    /// Convert to u8 value for protocol
    pub fn to_u8(&self) -> u8 {
        let mut value = 0;

        if self.bonding {
            value |= SMP_AUTH_REQ_BONDING;
        }

        if self.mitm {
            value |= SMP_AUTH_REQ_MITM;
        }

        if self.secure_connections {
            value |= SMP_AUTH_REQ_SC;
        }

        if self.keypress_notifications {
            value |= SMP_AUTH_REQ_KEYPRESS;
        }

        if self.ct2 {
            value |= SMP_AUTH_REQ_CT2;
        }

        value
    }
}

impl Default for AuthRequirements {
    fn default() -> Self {
        Self::secure()
    }
}

/// Key distribution preferences
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyDistribution {
    /// Encryption key (LTK, EDIV, RAND)
    pub encryption_key: bool,
    /// Identity key (IRK, public address)
    pub identity_key: bool,
    /// Signing key (CSRK)
    pub signing_key: bool,
    /// Link key derivation
    pub link_key: bool,
}

impl KeyDistribution {
    /// Encryption and identity keys only
    pub fn enc_and_id() -> Self {
        Self {
            encryption_key: true,
            identity_key: true,
            signing_key: false,
            link_key: false,
        }
    }

    /// Convert to u8 value for protocol
    pub fn to_u8(&self) -> u8 {
        let mut value = 0;
        if self.encryption_key {
            value |= SMP_KEY_DIST_ENC_KEY;
        }
        if self.identity_key {
            value |= SMP_KEY_DIST_ID_KEY;
        }
        if self.signing_key {
            value |= SMP_KEY_DIST_SIGN_KEY;
        }
        if self.link_key {
            value |= SMP_KEY_DIST_LINK_KEY;
        }
        value
    }
}

/// Security parameters installed in the host stack at start-up
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SecurityParameters {
    pub auth_req: AuthRequirements,
    pub io_capability: IoCapability,
    /// Maximum encryption key size in bytes
    pub max_key_size: u8,
    /// Keys the initiator distributes
    pub init_keys: KeyDistribution,
    /// Keys the responder distributes
    pub rsp_keys: KeyDistribution,
    /// Passkey used for passkey entry
    pub static_passkey: u32,
    /// Reject peers whose auth requirements differ from ours
    pub only_accept_specified_auth: bool,
    /// Out of band data support
    pub oob_support: bool,
}

impl SecurityParameters {
    pub fn new(with_pin: bool, static_passkey: u32) -> Self {
        Self {
            auth_req: AuthRequirements::secure(),
            io_capability: IoCapability::for_pin(with_pin),
            max_key_size: SMP_MAX_ENCRYPTION_KEY_SIZE,
            init_keys: KeyDistribution::enc_and_id(),
            rsp_keys: KeyDistribution::enc_and_id(),
            static_passkey,
            only_accept_specified_auth: false,
            oob_support: false,
        }
    }

    /// Check ranges before the parameters reach the host
    pub fn validate(&self) -> SmpResult<()> {
        if self.static_passkey > SMP_PASSKEY_MAX {
            return Err(SmpError::InvalidPasskey(self.static_passkey));
        }
        if !(SMP_MIN_ENCRYPTION_KEY_SIZE..=SMP_MAX_ENCRYPTION_KEY_SIZE).contains(&self.max_key_size) {
            return Err(SmpError::InvalidKeySize(self.max_key_size));
        }
        Ok(())
    }
}

impl Default for SecurityParameters {
    fn default() -> Self {
        Self::new(true, SMP_DEFAULT_STATIC_PASSKEY)
    }
}

/// Generate a random six digit passkey
pub fn generate_passkey() -> u32 {
    rand::random::<u32>() % (SMP_PASSKEY_MAX + 1)
}
