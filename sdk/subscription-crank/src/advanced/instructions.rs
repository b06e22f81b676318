use crate::core::constants::TOKEN_PROGRAM_ID;
use crate::types::{ChargeAddresses, PlanRecord, SubscriptionRecord};
use solana_sdk::instruction::{AccountMeta, Instruction};
use solana_sdk::pubkey::Pubkey;
use solana_sdk::system_program;
use subscription_state::charge_discriminator;

/// Build the program's `charge` instruction.
///
/// Account order matches the program's `Charge` context:
/// [Subscriber, CrankOperator, Subscription, Plan, Delegate, CreatorAta,
///  SubscriberAta, SystemProgram, TokenProgram].
pub fn charge(
    program_id: &Pubkey,
    operator: &Pubkey,
    subscription: &SubscriptionRecord,
    plan: &PlanRecord,
    addresses: &ChargeAddresses,
) -> Instruction {
    let accounts = vec![
        AccountMeta::new_readonly(subscription.subscriber, false),
        AccountMeta::new(*operator, true),
        AccountMeta::new(subscription.address, false),
        AccountMeta::new(plan.address, false),
        AccountMeta::new_readonly(addresses.delegate, false),
        AccountMeta::new(addresses.creator_token_account, false),
        AccountMeta::new(addresses.subscriber_token_account, false),
        AccountMeta::new_readonly(system_program::id(), false),
        AccountMeta::new_readonly(TOKEN_PROGRAM_ID, false),
    ];

    Instruction {
        program_id: *program_id,
        accounts,
        data: charge_discriminator().to_vec(),
    }
}
