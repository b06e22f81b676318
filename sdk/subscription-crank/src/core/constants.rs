use solana_sdk::pubkey;
use solana_sdk::pubkey::Pubkey;

pub const TOKEN_PROGRAM_ID: Pubkey = pubkey!("TokenkegQfeZyiNwAJbNbGKPFXCWuBvf9Ss623VQ5DA");

pub const ASSOCIATED_TOKEN_PROGRAM_ID: Pubkey =
    pubkey!("ATokenGPvbdGVxr1b2hvZbsiqW5xWH25efTNsLJA8knL");

// PDA seeds, byte-for-byte what the program derives
pub const DELEGATE_SEED: &[u8] = b"delegate";
pub const SUBSCRIPTION_SEED: &[u8] = b"subscriber";
pub const PLAN_SEED: &[u8] = b"plan";

pub const DEFAULT_MAX_CONCURRENCY: usize = 8;
