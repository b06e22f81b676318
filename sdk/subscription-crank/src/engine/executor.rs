use crate::advanced::instructions;
use crate::core::connection::LedgerConnection;
use crate::core::signer::CrankSigner;
use crate::error::{ChargeRejection, CrankError};
use crate::types::{ChargeAddresses, PlanRecord, SubscriptionRecord, TokenAccountInfo};
use crate::utils;
use log::{debug, error, info, warn};
use solana_sdk::message::Message;
use solana_sdk::pubkey::Pubkey;
use solana_sdk::signature::Signature;
use solana_sdk::transaction::Transaction;

/// Result of one charge attempt.
#[derive(Debug)]
pub enum ChargeOutcome {
    /// Ledger accepted the charge
    Charged(Signature),
    /// Business-rule refusal; the subscription stays due for the next pass
    Declined(ChargeRejection),
    /// Anything else: transport, signing, bad identifiers
    Failed(CrankError),
}

impl From<CrankError> for ChargeOutcome {
    fn from(e: CrankError) -> Self {
        match e {
            CrankError::Declined(rejection) => ChargeOutcome::Declined(rejection),
            other => ChargeOutcome::Failed(other),
        }
    }
}

/// Drives a single charge submission for one due subscription.
pub struct ChargeExecutor<'a, C, S> {
    connection: &'a C,
    signer: &'a S,
    program_id: Pubkey,
}

impl<'a, C, S> ChargeExecutor<'a, C, S>
where
    C: LedgerConnection,
    S: CrankSigner,
{
    pub fn new(connection: &'a C, signer: &'a S, program_id: Pubkey) -> Self {
        Self {
            connection,
            signer,
            program_id,
        }
    }

    /// Attempt exactly one charge. Never retries.
    pub async fn execute(&self, sub: &SubscriptionRecord, plan: &PlanRecord) -> ChargeOutcome {
        let addresses = match utils::derive_charge_addresses(
            &self.program_id,
            &sub.subscriber,
            &sub.plan,
            &plan.token_mint,
            &plan.creator,
        ) {
            Ok(addresses) => addresses,
            Err(e) => {
                error!("Cannot derive charge addresses for {}: {}", sub.address, e);
                return ChargeOutcome::Failed(e);
            },
        };

        let outcome = match self.try_charge(sub, plan, &addresses).await {
            Ok(signature) => ChargeOutcome::Charged(signature),
            Err(e) => ChargeOutcome::from(e),
        };

        match &outcome {
            ChargeOutcome::Charged(sig) => info!("Charged {}: {}", sub.address, sig),
            ChargeOutcome::Declined(reason) => warn!("Declined {}: {}", sub.address, reason),
            ChargeOutcome::Failed(e) => warn!("Charge of {} failed: {}", sub.address, e),
        }
        outcome
    }

    async fn try_charge(
        &self,
        sub: &SubscriptionRecord,
        plan: &PlanRecord,
        addresses: &ChargeAddresses,
    ) -> Result<Signature, CrankError> {
        if !plan.is_active {
            return Err(CrankError::Declined(ChargeRejection::PlanPaused));
        }

        let subscriber_ata =
            utils::fetch_token_account(self.connection, &addresses.subscriber_token_account)
                .await?;
        let creator_ata =
            utils::fetch_token_account(self.connection, &addresses.creator_token_account).await?;

        let subscriber_ata = match (subscriber_ata, creator_ata) {
            (Some(subscriber_ata), Some(_)) => subscriber_ata,
            _ => return Err(CrankError::Declined(ChargeRejection::MissingTokenAccount)),
        };

        preflight(&subscriber_ata, plan.price, &addresses.delegate).map_err(CrankError::Declined)?;

        let ix = instructions::charge(
            &self.program_id,
            &self.signer.pubkey(),
            sub,
            plan,
            addresses,
        );

        let blockhash = self
            .connection
            .get_latest_blockhash()
            .await
            .map_err(|e| CrankError::TransportFailure(e.to_string()))?;

        let operator = self.signer.pubkey();
        let message = Message::new_with_blockhash(&[ix], Some(&operator), &blockhash);
        let mut tx = Transaction::new_unsigned(message);
        let signature = self
            .signer
            .sign_message(&tx.message_data())
            .await
            .map_err(CrankError::Signing)?;
        tx.signatures = vec![signature];

        debug!("Submitting charge for {} ({} units)", sub.address, plan.price);
        let confirmed = self.connection.send_transaction(&tx).await?;
        Ok(confirmed)
    }
}

/// Refuse charges that the token program is guaranteed to reject.
pub fn preflight(
    subscriber_ata: &TokenAccountInfo,
    price: u64,
    delegate: &Pubkey,
) -> Result<(), ChargeRejection> {
    if subscriber_ata.delegate.as_ref() != Some(delegate) || subscriber_ata.delegated_amount < price
    {
        return Err(ChargeRejection::DelegationExhausted);
    }
    if subscriber_ata.amount < price {
        return Err(ChargeRejection::InsufficientFunds);
    }
    Ok(())
}
