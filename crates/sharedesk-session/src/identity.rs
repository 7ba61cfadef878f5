//! Minting session identities.

use rand::TryRngCore;
use rand::rngs::OsRng;
use sharedesk_protocol::SessionId;

use crate::SessionError;

/// Produces unique, opaque session identifiers.
///
/// Minting may fail (for example when the OS entropy source is
/// unavailable); the error is returned from
/// [`SessionManager::authenticate`](crate::SessionManager::authenticate)
/// unchanged.
pub trait IdentityMinter: Send + Sync + 'static {
    /// Returns a fresh identifier.
    fn mint(&self) -> Result<SessionId, SessionError>;
}

/// Mints IDs from the OS random number generator, hex-encoded.
///
/// With the default 16 bytes that is 128 bits of entropy in a
/// 32-character string, so collisions are not a practical concern.
#[derive(Debug, Clone, Copy)]
pub struct RandomMinter {
    bytes: usize,
}

impl RandomMinter {
    /// A minter producing IDs from `bytes` random bytes (`2 * bytes` hex
    /// characters).
    pub fn new(bytes: usize) -> Self {
        Self { bytes }
    }
}

impl Default for RandomMinter {
    fn default() -> Self {
        Self::new(16)
    }
}

impl IdentityMinter for RandomMinter {
    fn mint(&self) -> Result<SessionId, SessionError> {
        let mut buf = vec![0u8; self.bytes];
        OsRng.try_fill_bytes(&mut buf).map_err(|e| {
            SessionError::IdentityAllocationFailed(e.to_string())
        })?;
        let id: String = buf.iter().map(|b| format!("{b:02x}")).collect();
        Ok(SessionId::new(id))
    }
}
