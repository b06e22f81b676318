use serde::{Serialize, Serializer};
use solana_sdk::pubkey::Pubkey;
use subscription_state::{Plan, Subscription};

/// A decoded plan account.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlanRecord {
    pub address: Pubkey,
    pub creator: Pubkey,
    pub token_mint: Pubkey,
    /// Smallest token unit
    pub price: u64,
    /// Seconds
    pub interval: i64,
    pub name: String,
    pub is_active: bool,
}

impl PlanRecord {
    pub fn from_state(address: Pubkey, plan: Plan) -> Self {
        Self {
            address,
            creator: Pubkey::new_from_array(plan.creator),
            token_mint: Pubkey::new_from_array(plan.token_mint),
            price: plan.price,
            interval: plan.interval,
            name: plan.name,
            is_active: plan.is_active,
        }
    }
}

/// A decoded subscription account, keyed by its own address.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubscriptionRecord {
    pub address: Pubkey,
    pub subscriber: Pubkey,
    pub plan: Pubkey,
    pub is_active: bool,
    pub created_at: i64,
    pub last_charged_at: i64,
    pub next_charge_at: i64,
}

impl SubscriptionRecord {
    pub fn from_state(address: Pubkey, sub: Subscription) -> Self {
        Self {
            address,
            subscriber: Pubkey::new_from_array(sub.subscriber),
            plan: Pubkey::new_from_array(sub.plan),
            is_active: sub.is_active,
            created_at: sub.created_at,
            last_charged_at: sub.last_charged_at,
            next_charge_at: sub.next_charge_at,
        }
    }
}

/// Addresses a charge touches, derived independently of the ledger.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChargeAddresses {
    /// Delegation authority PDA
    pub delegate: Pubkey,
    pub subscriber_token_account: Pubkey,
    pub creator_token_account: Pubkey,
    /// Only needed by setup flows; charges read it from the listing
    pub subscription: Pubkey,
}

/// The parts of an SPL token account the pre-flight check looks at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TokenAccountInfo {
    pub mint: Pubkey,
    pub owner: Pubkey,
    pub amount: u64,
    pub delegate: Option<Pubkey>,
    pub delegated_amount: u64,
}

/// Emitted when a subscription is selected as due.
///
/// Field names match the notifier's `/subscription-due` request body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DueEvent {
    #[serde(serialize_with = "as_base58")]
    pub subscriber: Pubkey,

    #[serde(rename = "subscriptionPDA", serialize_with = "as_base58")]
    pub subscription: Pubkey,

    #[serde(rename = "planPDA", serialize_with = "as_base58")]
    pub plan: Pubkey,

    #[serde(rename = "amount")]
    pub amount_due: u64,
}

impl DueEvent {
    pub fn new(sub: &SubscriptionRecord, plan: &PlanRecord) -> Self {
        Self {
            subscriber: sub.subscriber,
            subscription: sub.address,
            plan: plan.address,
            amount_due: plan.price,
        }
    }
}

pub(crate) fn as_base58<S: Serializer>(key: &Pubkey, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.collect_str(key)
}
