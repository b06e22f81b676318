//! Subscription Manager State Module
//!
//! Account layouts owned by the subscription manager program, exactly as the
//! program writes them: an 8-byte discriminator followed by a borsh body.
//! Off-chain consumers decode these records but never write them.

pub mod error;
pub mod plan;
pub mod record;
pub mod subscription;

pub use error::StateError;
pub use plan::Plan;
pub use record::{sighash, AccountRecord, DISCRIMINATOR_LEN};
pub use subscription::Subscription;

/// Instruction discriminator for the program's `charge` instruction.
pub fn charge_discriminator() -> [u8; DISCRIMINATOR_LEN] {
    sighash("global", "charge")
}
