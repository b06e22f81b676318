use crate::core::config::CrankConfig;
use crate::core::connection::LedgerConnection;
use crate::error::{ChargeRejection, SubmitError};
use async_trait::async_trait;
use solana_client::client_error::ClientError;
use solana_client::nonblocking::rpc_client::RpcClient;
use solana_client::rpc_config::RpcProgramAccountsConfig;
use solana_client::rpc_filter::{Memcmp, RpcFilterType};
use solana_sdk::account::Account;
use solana_sdk::hash::Hash;
use solana_sdk::instruction::InstructionError;
use solana_sdk::pubkey::Pubkey;
use solana_sdk::signature::Signature;
use solana_sdk::transaction::{Transaction, TransactionError};
use std::error::Error;

// Program error codes (custom errors start at 6000)
const ERR_PLAN_INACTIVE: u32 = 6001;
const ERR_SUBSCRIPTION_INACTIVE: u32 = 6002;
const ERR_NOT_TIME_YET: u32 = 6003;
const ERR_SUBSCRIPTION_NOT_ACTIVE: u32 = 6004;
// Framework: account not initialized
const ERR_ACCOUNT_NOT_INITIALIZED: u32 = 3012;
// SPL token program
const TOKEN_ERR_INSUFFICIENT_FUNDS: u32 = 1;
const TOKEN_ERR_OWNER_MISMATCH: u32 = 4;

/// [`LedgerConnection`] backed by a JSON-RPC node.
pub struct RpcLedger {
    client: RpcClient,
}

impl RpcLedger {
    pub fn new(config: &CrankConfig) -> Self {
        Self {
            client: RpcClient::new_with_commitment(config.rpc_url.clone(), config.commitment),
        }
    }

    pub fn from_client(client: RpcClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl LedgerConnection for RpcLedger {
    async fn list_program_accounts(
        &self,
        program_id: &Pubkey,
        discriminator: &[u8],
    ) -> Result<Vec<(Pubkey, Account)>, Box<dyn Error + Send + Sync>> {
        let config = RpcProgramAccountsConfig {
            filters: Some(vec![RpcFilterType::Memcmp(Memcmp::new_raw_bytes(
                0,
                discriminator.to_vec(),
            ))]),
            ..Default::default()
        };
        let accounts = self
            .client
            .get_program_accounts_with_config(program_id, config)
            .await?;
        Ok(accounts)
    }

    async fn get_account(
        &self,
        pubkey: &Pubkey,
    ) -> Result<Option<Account>, Box<dyn Error + Send + Sync>> {
        let response = self
            .client
            .get_account_with_commitment(pubkey, self.client.commitment())
            .await?;
        Ok(response.value)
    }

    async fn get_latest_blockhash(&self) -> Result<Hash, Box<dyn Error + Send + Sync>> {
        Ok(self.client.get_latest_blockhash().await?)
    }

    async fn send_transaction(&self, tx: &Transaction) -> Result<Signature, SubmitError> {
        self.client
            .send_and_confirm_transaction(tx)
            .await
            .map_err(classify_client_error)
    }
}

/// Errors carrying a transaction error were evaluated by the ledger (either in
/// preflight simulation or on confirmation); everything else never reached it.
/// An expired blockhash means the transaction never landed.
fn classify_client_error(err: ClientError) -> SubmitError {
    match err.get_transaction_error() {
        Some(TransactionError::BlockhashNotFound) | None => SubmitError::Transport(err.to_string()),
        Some(tx_err) => classify_transaction_error(&tx_err),
    }
}

/// Only the program's and token program's business codes are declines.
/// Anything else (fees, seed constraints, unknown codes) is a failed charge.
pub fn classify_transaction_error(err: &TransactionError) -> SubmitError {
    match err {
        TransactionError::InstructionError(_, InstructionError::Custom(code)) => {
            match business_rejection(*code) {
                Some(rejection) => SubmitError::Rejected(rejection),
                None => SubmitError::Failed(format!("program error {}", code)),
            }
        },
        TransactionError::InsufficientFundsForFee => {
            SubmitError::Failed("operator cannot pay fees".to_string())
        },
        TransactionError::BlockhashNotFound => SubmitError::Transport(err.to_string()),
        other => SubmitError::Failed(other.to_string()),
    }
}

fn business_rejection(code: u32) -> Option<ChargeRejection> {
    let rejection = match code {
        ERR_PLAN_INACTIVE => ChargeRejection::PlanPaused,
        ERR_SUBSCRIPTION_INACTIVE | ERR_SUBSCRIPTION_NOT_ACTIVE => {
            ChargeRejection::SubscriptionInactive
        },
        ERR_NOT_TIME_YET => ChargeRejection::NotYetDue,
        ERR_ACCOUNT_NOT_INITIALIZED => ChargeRejection::MissingTokenAccount,
        TOKEN_ERR_INSUFFICIENT_FUNDS => ChargeRejection::InsufficientFunds,
        TOKEN_ERR_OWNER_MISMATCH => ChargeRejection::DelegationExhausted,
        _ => return None,
    };
    Some(rejection)
}
