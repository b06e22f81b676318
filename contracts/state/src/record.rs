use crate::error::StateError;
use borsh::BorshDeserialize;
use sha2::{Digest, Sha256};

pub const DISCRIMINATOR_LEN: usize = 8;

/// `sha256("<namespace>:<name>")[..8]`, the scheme the program uses for both
/// account and instruction discriminators.
pub fn sighash(namespace: &str, name: &str) -> [u8; DISCRIMINATOR_LEN] {
    let preimage = format!("{}:{}", namespace, name);
    let digest = Sha256::digest(preimage.as_bytes());
    let mut out = [0u8; DISCRIMINATOR_LEN];
    out.copy_from_slice(&digest[..DISCRIMINATOR_LEN]);
    out
}

/// A program-owned account with a discriminator-prefixed borsh body.
pub trait AccountRecord: BorshDeserialize + Sized {
    /// Type name the discriminator is derived from.
    const NAME: &'static str;

    fn discriminator() -> [u8; DISCRIMINATOR_LEN] {
        sighash("account", Self::NAME)
    }

    /// Decode from raw account data.
    ///
    /// Accounts are allocated at a fixed maximum size, so trailing bytes
    /// after the body are ignored.
    fn load(data: &[u8]) -> Result<Self, StateError> {
        if data.len() < DISCRIMINATOR_LEN {
            return Err(StateError::AccountDataTooSmall {
                expected: DISCRIMINATOR_LEN,
                actual: data.len(),
            });
        }
        if data[..DISCRIMINATOR_LEN] != Self::discriminator() {
            return Err(StateError::InvalidDiscriminator(Self::NAME));
        }
        let mut body = &data[DISCRIMINATOR_LEN..];
        Self::deserialize(&mut body).map_err(|e| StateError::Decode {
            name: Self::NAME,
            reason: e.to_string(),
        })
    }
}
