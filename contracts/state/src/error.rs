use thiserror::Error;

/// Errors raised while decoding program-owned account data.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum StateError {
    /// Account data shorter than the discriminator
    #[error("account data too small: {actual} bytes, need at least {expected}")]
    AccountDataTooSmall { expected: usize, actual: usize },

    /// Discriminator does not match the expected account type
    #[error("discriminator mismatch for {0}")]
    InvalidDiscriminator(&'static str),

    /// Body failed to decode
    #[error("failed to decode {name}: {reason}")]
    Decode { name: &'static str, reason: String },
}
