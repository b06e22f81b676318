use crate::engine::reader::ListedSubscription;
use crate::types::{PlanRecord, SubscriptionRecord};
use std::fmt;

/// Why a listed subscription is not charged this pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    Inactive,
    /// Seconds until `next_charge_at`; zero when due exactly now
    NotYetDue { remaining: i64 },
    PlanUnavailable,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Inactive => f.write_str("inactive"),
            Self::NotYetDue { remaining } => write!(f, "not yet due, Δ={}", remaining),
            Self::PlanUnavailable => f.write_str("plan unavailable"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct DueItem {
    pub position: usize,
    pub subscription: SubscriptionRecord,
    pub plan: PlanRecord,
}

#[derive(Debug, Clone)]
pub struct SkippedItem {
    pub position: usize,
    pub subscription: SubscriptionRecord,
    pub reason: SkipReason,
}

/// Partition of a snapshot at one instant. Both halves keep discovery order.
#[derive(Debug, Clone, Default)]
pub struct Selection {
    pub due: Vec<DueItem>,
    pub skipped: Vec<SkippedItem>,
}

/// Strictly past `next_charge_at`; a subscription is not due at the exact
/// second it becomes chargeable.
pub fn is_due(now: i64, subscription: &SubscriptionRecord) -> bool {
    subscription.is_active && subscription.next_charge_at < now
}

/// `Ok(())` when due, otherwise the reason it is skipped.
pub fn classify(
    now: i64,
    subscription: &SubscriptionRecord,
    plan: Option<&PlanRecord>,
) -> Result<(), SkipReason> {
    if !subscription.is_active {
        return Err(SkipReason::Inactive);
    }
    if plan.is_none() {
        return Err(SkipReason::PlanUnavailable);
    }
    if !is_due(now, subscription) {
        return Err(SkipReason::NotYetDue {
            remaining: subscription.next_charge_at.saturating_sub(now),
        });
    }
    Ok(())
}

pub fn select(now: i64, listed: Vec<ListedSubscription>) -> Selection {
    let mut selection = Selection::default();

    for entry in listed {
        let ListedSubscription {
            position,
            subscription,
            plan,
        } = entry;

        match (classify(now, &subscription, plan.as_ref()), plan) {
            (Ok(()), Some(plan)) => selection.due.push(DueItem {
                position,
                subscription,
                plan,
            }),
            (Err(reason), _) => selection.skipped.push(SkippedItem {
                position,
                subscription,
                reason,
            }),
            (Ok(()), None) => selection.skipped.push(SkippedItem {
                position,
                subscription,
                reason: SkipReason::PlanUnavailable,
            }),
        }
    }

    selection
}
