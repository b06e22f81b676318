use async_trait::async_trait;
use solana_sdk::pubkey::Pubkey;
use solana_sdk::signature::{Keypair, Signature, Signer};

/// Abstraction for the crank operator's signing key.
/// This allows the crank to work with:
/// 1. Local Keypairs (operator keypair file)
/// 2. Remote signers (KMS/HSM backed services)
#[async_trait]
pub trait CrankSigner: Send + Sync {
    fn pubkey(&self) -> Pubkey;

    /// Sign serialized message bytes.
    async fn sign_message(&self, message: &[u8]) -> Result<Signature, String>;
}

#[async_trait]
impl CrankSigner for Keypair {
    fn pubkey(&self) -> Pubkey {
        Signer::pubkey(self)
    }

    async fn sign_message(&self, message: &[u8]) -> Result<Signature, String> {
        Signer::try_sign_message(self, message).map_err(|e| e.to_string())
    }
}
