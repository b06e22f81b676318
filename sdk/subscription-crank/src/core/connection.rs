use crate::error::SubmitError;
use async_trait::async_trait;
use solana_sdk::account::Account;
use solana_sdk::hash::Hash;
use solana_sdk::pubkey::Pubkey;
use solana_sdk::signature::Signature;
use solana_sdk::transaction::Transaction;
use std::error::Error;

/// Everything the crank needs from the ledger.
///
/// The ledger validates and executes charges; the crank only reads state and
/// submits instructions through this seam.
#[async_trait]
pub trait LedgerConnection: Send + Sync {
    /// All accounts owned by `program_id` whose data starts with `discriminator`.
    async fn list_program_accounts(
        &self,
        program_id: &Pubkey,
        discriminator: &[u8],
    ) -> Result<Vec<(Pubkey, Account)>, Box<dyn Error + Send + Sync>>;

    async fn get_account(
        &self,
        pubkey: &Pubkey,
    ) -> Result<Option<Account>, Box<dyn Error + Send + Sync>>;

    async fn get_latest_blockhash(&self) -> Result<Hash, Box<dyn Error + Send + Sync>>;

    /// Submit and wait for confirmation.
    async fn send_transaction(&self, tx: &Transaction) -> Result<Signature, SubmitError>;
}

#[async_trait]
impl<T: LedgerConnection + ?Sized> LedgerConnection for std::sync::Arc<T> {
    async fn list_program_accounts(
        &self,
        program_id: &Pubkey,
        discriminator: &[u8],
    ) -> Result<Vec<(Pubkey, Account)>, Box<dyn Error + Send + Sync>> {
        (**self).list_program_accounts(program_id, discriminator).await
    }

    async fn get_account(
        &self,
        pubkey: &Pubkey,
    ) -> Result<Option<Account>, Box<dyn Error + Send + Sync>> {
        (**self).get_account(pubkey).await
    }

    async fn get_latest_blockhash(&self) -> Result<Hash, Box<dyn Error + Send + Sync>> {
        (**self).get_latest_blockhash().await
    }

    async fn send_transaction(&self, tx: &Transaction) -> Result<Signature, SubmitError> {
        (**self).send_transaction(tx).await
    }
}
