use solana_sdk::pubkey::Pubkey;
use subscription_state::StateError;
use thiserror::Error;

/// Crank error taxonomy.
///
/// Only `ReadFailure` aborts a pass. Everything else is caught at the
/// per-subscription boundary and folded into the pass report.
#[derive(Debug, Error)]
pub enum CrankError {
    /// Bulk listing of subscription records failed
    #[error("Read failure: {0}")]
    ReadFailure(String),

    /// Plan referenced by a subscription could not be loaded
    #[error("Plan unavailable: {0}")]
    PlanUnavailable(Pubkey),

    /// Identifier unusable for address derivation
    #[error("Invalid address input: {0}")]
    InvalidAddressInput(String),

    /// Business-rule rejection, retried naturally on the next pass
    #[error("Declined: {0}")]
    Declined(ChargeRejection),

    /// Submission could not be delivered or confirmed
    #[error("Transport failure: {0}")]
    TransportFailure(String),

    /// Ledger refused the charge for a reason that is not a business rule
    #[error("Submission failed: {0}")]
    SubmissionFailed(String),

    /// Account data failed to decode
    #[error("Invalid account data: {0}")]
    InvalidAccountData(#[from] StateError),

    /// Operator could not sign
    #[error("Signing error: {0}")]
    Signing(String),

    /// Bad or missing configuration value
    #[error("Configuration error: {0}")]
    Config(String),
}

/// Result type alias for crank operations
pub type Result<T> = std::result::Result<T, CrankError>;

/// Typed reasons the ledger (or the pre-flight check) refuses a charge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChargeRejection {
    DelegationExhausted,
    InsufficientFunds,
    MissingTokenAccount,
    PlanPaused,
    SubscriptionInactive,
    NotYetDue,
}

impl ChargeRejection {
    pub fn reason(&self) -> &'static str {
        match self {
            Self::DelegationExhausted => "delegation ceiling exhausted",
            Self::InsufficientFunds => "insufficient balance",
            Self::MissingTokenAccount => "missing token account",
            Self::PlanPaused => "plan paused",
            Self::SubscriptionInactive => "inactive",
            Self::NotYetDue => "not yet due",
        }
    }
}

impl std::fmt::Display for ChargeRejection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.reason())
    }
}

/// Outcome of a failed submission, as reported by the ledger connection.
#[derive(Debug, Error)]
pub enum SubmitError {
    #[error("rejected: {0}")]
    Rejected(ChargeRejection),

    #[error("transport: {0}")]
    Transport(String),

    /// Evaluated and refused by the ledger without a typed business code
    #[error("failed: {0}")]
    Failed(String),
}

impl From<SubmitError> for CrankError {
    fn from(e: SubmitError) -> Self {
        match e {
            SubmitError::Rejected(r) => CrankError::Declined(r),
            SubmitError::Transport(msg) => CrankError::TransportFailure(msg),
            SubmitError::Failed(msg) => CrankError::SubmissionFailed(msg),
        }
    }
}
