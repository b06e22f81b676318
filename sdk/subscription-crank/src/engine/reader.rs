use crate::core::connection::LedgerConnection;
use crate::error::{CrankError, Result};
use crate::types::{PlanRecord, SubscriptionRecord};
use crate::utils;
use futures::stream::{self, StreamExt};
use log::{debug, warn};
use solana_sdk::pubkey::Pubkey;
use std::collections::{HashMap, HashSet};
use subscription_state::{AccountRecord, Subscription};

/// A subscription as discovered by the bulk listing, paired with its plan.
#[derive(Debug, Clone)]
pub struct ListedSubscription {
    /// Discovery order within the pass
    pub position: usize,
    pub subscription: SubscriptionRecord,
    /// `None` when the plan could not be fetched or decoded
    pub plan: Option<PlanRecord>,
}

/// A listed account that carried the subscription discriminator but did not decode.
#[derive(Debug, Clone)]
pub struct UndecodableRecord {
    pub position: usize,
    pub address: Pubkey,
    pub reason: String,
}

/// Everything read at the start of a pass.
#[derive(Debug, Clone, Default)]
pub struct AccountSnapshot {
    pub subscriptions: Vec<ListedSubscription>,
    pub undecodable: Vec<UndecodableRecord>,
}

impl AccountSnapshot {
    pub fn len(&self) -> usize {
        self.subscriptions.len() + self.undecodable.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Read every subscription owned by `program_id` and the plans they reference.
///
/// Each distinct plan is fetched once, up to `max_concurrency` at a time.
/// Only a failed bulk listing is an error; a plan that cannot be loaded
/// leaves `plan: None` on the subscriptions referencing it.
pub async fn read_snapshot(
    connection: &impl LedgerConnection,
    program_id: &Pubkey,
    max_concurrency: usize,
) -> Result<AccountSnapshot> {
    let listed = connection
        .list_program_accounts(program_id, &Subscription::discriminator())
        .await
        .map_err(|e| CrankError::ReadFailure(e.to_string()))?;

    debug!("Listed {} subscription accounts", listed.len());

    let mut snapshot = AccountSnapshot::default();
    let mut decoded = Vec::with_capacity(listed.len());

    for (position, (address, account)) in listed.into_iter().enumerate() {
        match Subscription::load(&account.data) {
            Ok(sub) => decoded.push((position, SubscriptionRecord::from_state(address, sub))),
            Err(e) => {
                warn!("Subscription {} does not decode: {}", address, e);
                snapshot.undecodable.push(UndecodableRecord {
                    position,
                    address,
                    reason: format!("invalid account data: {}", e),
                });
            },
        }
    }

    let mut seen = HashSet::new();
    let plan_keys: Vec<Pubkey> = decoded
        .iter()
        .map(|(_, sub)| sub.plan)
        .filter(|key| seen.insert(*key))
        .collect();

    let plans: HashMap<Pubkey, Option<PlanRecord>> = stream::iter(plan_keys)
        .map(|key| async move {
            match utils::fetch_plan(connection, program_id, &key).await {
                Ok(plan) => (key, Some(plan)),
                Err(e) => {
                    warn!("Plan {} unavailable: {}", key, e);
                    (key, None)
                },
            }
        })
        .buffer_unordered(max_concurrency.max(1))
        .collect()
        .await;

    snapshot.subscriptions = decoded
        .into_iter()
        .map(|(position, subscription)| {
            let plan = plans.get(&subscription.plan).cloned().flatten();
            ListedSubscription {
                position,
                subscription,
                plan,
            }
        })
        .collect();

    Ok(snapshot)
}
