use crate::record::AccountRecord;
use borsh::{BorshDeserialize, BorshSerialize};

/// A subscriber's enrollment in one plan.
///
/// The program names this account type `Subscriber`.
///
/// PDA Seeds: ["subscriber", subscriber, plan]
#[derive(Debug, Clone, PartialEq, Eq, BorshSerialize, BorshDeserialize)]
pub struct Subscription {
    pub subscriber: [u8; 32],

    /// Plan account address
    pub plan: [u8; 32],

    pub bump: u8,

    pub is_active: bool,

    pub last_charged_at: i64,

    /// `last_charged_at + plan.interval` once charged at least once
    pub next_charge_at: i64,

    pub created_at: i64,
}

impl AccountRecord for Subscription {
    const NAME: &'static str = "Subscriber";
}

impl Subscription {
    pub const SPACE: usize = 8 + 32 + 32 + 1 + 1 + 8 + 8 + 8;
}
