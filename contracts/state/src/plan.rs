use crate::record::AccountRecord;
use borsh::{BorshDeserialize, BorshSerialize};

/// A creator's billing plan.
///
/// PDA Seeds: ["plan", creator]
#[derive(Debug, Clone, PartialEq, Eq, BorshSerialize, BorshDeserialize)]
pub struct Plan {
    /// Plan owner and payee
    pub creator: [u8; 32],

    /// Display name (at most 50 bytes on-chain)
    pub name: String,

    /// Settlement token mint
    pub token_mint: [u8; 32],

    /// Price per interval, in the mint's smallest unit
    pub price: u64,

    /// Billing interval in seconds
    pub interval: i64,

    pub subscriber_count: u32,

    pub bump: u8,

    pub created_at: i64,

    /// Paused plans reject charges
    pub is_active: bool,
}

impl AccountRecord for Plan {
    const NAME: &'static str = "Plan";
}

impl Plan {
    /// Fixed allocation the program reserves for a plan account.
    pub const SPACE: usize = 8 + 32 + (4 + 50) + 32 + 8 + 8 + 4 + 1 + 8 + 1;
}
