pub mod advanced;
pub mod core;
pub mod engine;
pub mod error;
pub mod types;
pub mod utils;

pub use crate::core::config::CrankConfig;
pub use crate::core::connection::LedgerConnection;
pub use crate::core::rpc::RpcLedger;
pub use crate::core::signer::CrankSigner;
pub use crate::engine::{CrankLoop, PassReport, PassStatus};
pub use crate::error::{ChargeRejection, CrankError, Result, SubmitError};
pub use crate::types::{ChargeAddresses, DueEvent, PlanRecord, SubscriptionRecord};
pub use crate::utils::{
    derive_associated_token_address, derive_charge_addresses, derive_delegate_pda,
    derive_plan_pda, derive_subscription_pda,
};

pub mod state {
    pub use subscription_state::{AccountRecord, Plan, Subscription};
}
