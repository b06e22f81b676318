use crate::core::connection::LedgerConnection;
use crate::core::constants::{
    ASSOCIATED_TOKEN_PROGRAM_ID, DELEGATE_SEED, PLAN_SEED, SUBSCRIPTION_SEED, TOKEN_PROGRAM_ID,
};
use crate::error::{CrankError, Result};
use crate::types::{ChargeAddresses, PlanRecord, TokenAccountInfo};
use solana_sdk::pubkey::Pubkey;
use subscription_state::{AccountRecord, Plan};

//=============================================================================
// PDA Derivation Helpers
//=============================================================================

fn try_derive(seeds: &[&[u8]], program_id: &Pubkey, what: &str) -> Result<Pubkey> {
    Pubkey::try_find_program_address(seeds, program_id)
        .map(|(address, _)| address)
        .ok_or_else(|| CrankError::InvalidAddressInput(format!("no viable bump for {}", what)))
}

fn require_set(key: &Pubkey, what: &str) -> Result<()> {
    if *key == Pubkey::default() {
        return Err(CrankError::InvalidAddressInput(format!("{} is unset", what)));
    }
    Ok(())
}

/// Derive the delegation authority PDA for a subscriber
pub fn derive_delegate_pda(program_id: &Pubkey, subscriber: &Pubkey) -> Result<Pubkey> {
    require_set(subscriber, "subscriber")?;
    try_derive(&[DELEGATE_SEED, subscriber.as_ref()], program_id, "delegate")
}

/// Derive the subscription PDA for a (subscriber, plan) pair
pub fn derive_subscription_pda(
    program_id: &Pubkey,
    subscriber: &Pubkey,
    plan: &Pubkey,
) -> Result<Pubkey> {
    require_set(subscriber, "subscriber")?;
    require_set(plan, "plan")?;
    try_derive(
        &[SUBSCRIPTION_SEED, subscriber.as_ref(), plan.as_ref()],
        program_id,
        "subscription",
    )
}

/// Derive the plan PDA from its creator
pub fn derive_plan_pda(program_id: &Pubkey, creator: &Pubkey) -> Result<Pubkey> {
    require_set(creator, "creator")?;
    try_derive(&[PLAN_SEED, creator.as_ref()], program_id, "plan")
}

/// Derive the associated token account of `owner` for `mint`
pub fn derive_associated_token_address(owner: &Pubkey, mint: &Pubkey) -> Result<Pubkey> {
    require_set(owner, "token owner")?;
    require_set(mint, "token mint")?;
    try_derive(
        &[owner.as_ref(), TOKEN_PROGRAM_ID.as_ref(), mint.as_ref()],
        &ASSOCIATED_TOKEN_PROGRAM_ID,
        "associated token account",
    )
}

/// Every address a charge needs. Pure: identical inputs give identical output.
pub fn derive_charge_addresses(
    program_id: &Pubkey,
    subscriber: &Pubkey,
    plan: &Pubkey,
    token_mint: &Pubkey,
    creator: &Pubkey,
) -> Result<ChargeAddresses> {
    Ok(ChargeAddresses {
        delegate: derive_delegate_pda(program_id, subscriber)?,
        subscriber_token_account: derive_associated_token_address(subscriber, token_mint)?,
        creator_token_account: derive_associated_token_address(creator, token_mint)?,
        subscription: derive_subscription_pda(program_id, subscriber, plan)?,
    })
}

//=============================================================================
// Account Fetching & Parsing
//=============================================================================

/// Fetch and decode a plan account owned by `program_id`.
pub async fn fetch_plan(
    connection: &impl LedgerConnection,
    program_id: &Pubkey,
    address: &Pubkey,
) -> Result<PlanRecord> {
    let account = connection
        .get_account(address)
        .await
        .map_err(|_| CrankError::PlanUnavailable(*address))?
        .filter(|account| account.owner == *program_id)
        .ok_or(CrankError::PlanUnavailable(*address))?;

    let plan = Plan::load(&account.data)?;
    Ok(PlanRecord::from_state(*address, plan))
}

pub const TOKEN_ACCOUNT_LEN: usize = 165;

/// Parse SPL token account data
///
/// # Layout
/// ```text
/// [0..32]    mint
/// [32..64]   owner
/// [64..72]   amount: u64
/// [72..76]   delegate option tag: u32
/// [76..108]  delegate
/// [108]      state (0 = uninitialized)
/// [109..121] is_native
/// [121..129] delegated_amount: u64
/// [129..165] close_authority
/// ```
pub fn parse_token_account(data: &[u8]) -> Option<TokenAccountInfo> {
    if data.len() < TOKEN_ACCOUNT_LEN || data[108] == 0 {
        return None;
    }

    let mint = Pubkey::try_from(&data[0..32]).ok()?;
    let owner = Pubkey::try_from(&data[32..64]).ok()?;
    let amount = u64::from_le_bytes(data[64..72].try_into().ok()?);
    let delegate = match u32::from_le_bytes(data[72..76].try_into().ok()?) {
        0 => None,
        1 => Some(Pubkey::try_from(&data[76..108]).ok()?),
        _ => return None,
    };
    let delegated_amount = u64::from_le_bytes(data[121..129].try_into().ok()?);

    Some(TokenAccountInfo {
        mint,
        owner,
        amount,
        delegate,
        delegated_amount,
    })
}

/// Fetch a token account; `Ok(None)` when it does not exist or is not a
/// valid initialized token account.
pub async fn fetch_token_account(
    connection: &impl LedgerConnection,
    address: &Pubkey,
) -> Result<Option<TokenAccountInfo>> {
    let account = connection
        .get_account(address)
        .await
        .map_err(|e| CrankError::TransportFailure(e.to_string()))?;

    Ok(account.and_then(|a| {
        if a.owner != TOKEN_PROGRAM_ID {
            return None;
        }
        parse_token_account(&a.data)
    }))
}

/// Serialize a token account the way the token program lays it out.
pub fn pack_token_account(info: &TokenAccountInfo) -> Vec<u8> {
    let mut data = vec![0u8; TOKEN_ACCOUNT_LEN];
    data[0..32].copy_from_slice(info.mint.as_ref());
    data[32..64].copy_from_slice(info.owner.as_ref());
    data[64..72].copy_from_slice(&info.amount.to_le_bytes());
    if let Some(delegate) = info.delegate {
        data[72..76].copy_from_slice(&1u32.to_le_bytes());
        data[76..108].copy_from_slice(delegate.as_ref());
    }
    data[108] = 1; // initialized
    data[121..129].copy_from_slice(&info.delegated_amount.to_le_bytes());
    data
}
