use crate::engine::executor::ChargeOutcome;
use crate::types::as_base58;
use serde::Serialize;
use solana_sdk::pubkey::Pubkey;

/// Exit contract with whatever scheduled the pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PassStatus {
    Success,
    /// Some subscriptions failed, or the pass was cancelled
    PartialFailure,
    /// The bulk read failed; nothing was processed
    WholePassFailure,
}

impl PassStatus {
    pub fn exit_code(self) -> u8 {
        match self {
            Self::Success => 0,
            Self::PartialFailure => 1,
            Self::WholePassFailure => 2,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum EntryOutcome {
    Charged { signature: String },
    Declined { reason: String },
    Skipped { reason: String },
    Failed { reason: String },
    /// Not started before the pass was cancelled
    Unprocessed,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReportEntry {
    #[serde(serialize_with = "as_base58")]
    pub subscription: Pubkey,

    #[serde(flatten)]
    pub outcome: EntryOutcome,

    #[serde(skip)]
    position: usize,
}

impl ReportEntry {
    pub fn reason(&self) -> Option<&str> {
        match &self.outcome {
            EntryOutcome::Declined { reason }
            | EntryOutcome::Skipped { reason }
            | EntryOutcome::Failed { reason } => Some(reason),
            _ => None,
        }
    }
}

/// Summary of one pass. Built locally, surfaced once, never persisted.
///
/// Every checked subscription appears in exactly one of charged, declined,
/// skipped, failed or unprocessed.
#[derive(Debug, Clone, Serialize)]
pub struct PassReport {
    /// The `now` every due decision in this pass was made against
    pub now: i64,
    pub checked: usize,
    pub due: usize,
    pub charged: usize,
    pub declined: usize,
    pub skipped: usize,
    pub failed: usize,
    pub unprocessed: usize,
    pub cancelled: bool,
    pub completed: bool,
    /// Set when the bulk read failed
    pub read_failure: Option<String>,
    pub entries: Vec<ReportEntry>,
}

impl PassReport {
    pub fn new(now: i64) -> Self {
        Self {
            now,
            checked: 0,
            due: 0,
            charged: 0,
            declined: 0,
            skipped: 0,
            failed: 0,
            unprocessed: 0,
            cancelled: false,
            completed: false,
            read_failure: None,
            entries: Vec::new(),
        }
    }

    pub fn read_failed(now: i64, reason: impl Into<String>) -> Self {
        Self {
            read_failure: Some(reason.into()),
            ..Self::new(now)
        }
    }

    pub fn status(&self) -> PassStatus {
        if self.read_failure.is_some() {
            PassStatus::WholePassFailure
        } else if self.failed > 0 || self.cancelled || !self.completed {
            PassStatus::PartialFailure
        } else {
            PassStatus::Success
        }
    }

    pub fn failures(&self) -> impl Iterator<Item = &ReportEntry> {
        self.entries
            .iter()
            .filter(|e| matches!(e.outcome, EntryOutcome::Failed { .. }))
    }

    pub fn declines(&self) -> impl Iterator<Item = &ReportEntry> {
        self.entries
            .iter()
            .filter(|e| matches!(e.outcome, EntryOutcome::Declined { .. }))
    }

    pub fn entry(&self, subscription: &Pubkey) -> Option<&ReportEntry> {
        self.entries.iter().find(|e| e.subscription == *subscription)
    }

    pub(crate) fn record_skip(&mut self, position: usize, subscription: Pubkey, reason: String) {
        self.checked += 1;
        self.skipped += 1;
        self.push(position, subscription, EntryOutcome::Skipped { reason });
    }

    pub(crate) fn record_failure(&mut self, position: usize, subscription: Pubkey, reason: String) {
        self.checked += 1;
        self.failed += 1;
        self.push(position, subscription, EntryOutcome::Failed { reason });
    }

    pub(crate) fn record_charge(
        &mut self,
        position: usize,
        subscription: Pubkey,
        outcome: ChargeOutcome,
    ) {
        self.checked += 1;
        let outcome = match outcome {
            ChargeOutcome::Charged(signature) => {
                self.charged += 1;
                EntryOutcome::Charged {
                    signature: signature.to_string(),
                }
            },
            ChargeOutcome::Declined(rejection) => {
                self.declined += 1;
                EntryOutcome::Declined {
                    reason: rejection.reason().to_string(),
                }
            },
            ChargeOutcome::Failed(e) => {
                self.failed += 1;
                EntryOutcome::Failed {
                    reason: e.to_string(),
                }
            },
        };
        self.push(position, subscription, outcome);
    }

    pub(crate) fn record_unprocessed(&mut self, position: usize, subscription: Pubkey) {
        self.checked += 1;
        self.unprocessed += 1;
        self.push(position, subscription, EntryOutcome::Unprocessed);
    }

    /// Restore discovery order and settle completion.
    pub(crate) fn finish(&mut self, cancelled: bool) {
        self.entries.sort_by_key(|e| e.position);
        self.cancelled = cancelled;
        self.completed = !cancelled && self.unprocessed == 0;
    }

    fn push(&mut self, position: usize, subscription: Pubkey, outcome: EntryOutcome) {
        self.entries.push(ReportEntry {
            subscription,
            outcome,
            position,
        });
    }
}
