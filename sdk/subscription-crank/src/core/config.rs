use crate::core::constants::DEFAULT_MAX_CONCURRENCY;
use crate::error::{CrankError, Result};
use solana_sdk::commitment_config::CommitmentConfig;
use solana_sdk::pubkey::Pubkey;
use std::env;
use std::path::PathBuf;
use std::str::FromStr;

pub const DEFAULT_RPC_URL: &str = "http://127.0.0.1:8899";

/// Operator-supplied settings for one crank deployment.
#[derive(Debug, Clone)]
pub struct CrankConfig {
    pub rpc_url: String,

    /// Subscription manager program
    pub program_id: Pubkey,

    /// Operator keypair file, signs and pays for charges
    pub keypair_path: PathBuf,

    pub commitment: CommitmentConfig,

    /// Upper bound on concurrent charge attempts within a pass
    pub max_concurrency: usize,

    /// Where due notifications are spooled for the external notifier
    pub notify_spool: Option<PathBuf>,
}

impl CrankConfig {
    pub fn new(program_id: Pubkey, keypair_path: impl Into<PathBuf>) -> Self {
        Self {
            rpc_url: DEFAULT_RPC_URL.to_string(),
            program_id,
            keypair_path: keypair_path.into(),
            commitment: CommitmentConfig::confirmed(),
            max_concurrency: DEFAULT_MAX_CONCURRENCY,
            notify_spool: None,
        }
    }

    pub fn with_rpc_url(mut self, rpc_url: impl Into<String>) -> Self {
        self.rpc_url = rpc_url.into();
        self
    }

    pub fn with_commitment(mut self, commitment: CommitmentConfig) -> Self {
        self.commitment = commitment;
        self
    }

    /// Values below 1 are clamped to 1.
    pub fn with_max_concurrency(mut self, max_concurrency: usize) -> Self {
        self.max_concurrency = max_concurrency.max(1);
        self
    }

    pub fn with_notify_spool(mut self, path: impl Into<PathBuf>) -> Self {
        self.notify_spool = Some(path.into());
        self
    }

    /// Load from the process environment.
    ///
    /// `PROGRAM_ID` is required; `RPC_URL`, `KEYPAIR`, `CRANK_COMMITMENT`,
    /// `CRANK_MAX_CONCURRENCY` and `CRANK_NOTIFY_SPOOL` are optional.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Same as [`CrankConfig::from_env`] with an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let program_id_str = lookup("PROGRAM_ID")
            .ok_or_else(|| CrankError::Config("PROGRAM_ID is not set".to_string()))?;
        let program_id = Pubkey::from_str(program_id_str.trim())
            .map_err(|e| CrankError::Config(format!("PROGRAM_ID: {}", e)))?;

        let keypair_path = match lookup("KEYPAIR") {
            Some(path) => PathBuf::from(path),
            None => {
                let home = lookup("HOME").ok_or_else(|| {
                    CrankError::Config("KEYPAIR is not set and HOME is unknown".to_string())
                })?;
                PathBuf::from(home).join(".config/solana/id.json")
            },
        };

        let mut config = Self::new(program_id, keypair_path);

        if let Some(url) = lookup("RPC_URL") {
            config.rpc_url = url;
        }

        if let Some(level) = lookup("CRANK_COMMITMENT") {
            config.commitment = parse_commitment(&level)?;
        }

        if let Some(raw) = lookup("CRANK_MAX_CONCURRENCY") {
            let n: usize = raw.trim().parse().map_err(|_| {
                CrankError::Config(format!("CRANK_MAX_CONCURRENCY: not a number: {}", raw))
            })?;
            if n == 0 {
                return Err(CrankError::Config(
                    "CRANK_MAX_CONCURRENCY must be at least 1".to_string(),
                ));
            }
            config.max_concurrency = n;
        }

        if let Some(path) = lookup("CRANK_NOTIFY_SPOOL") {
            config.notify_spool = Some(PathBuf::from(path));
        }

        Ok(config)
    }
}

fn parse_commitment(level: &str) -> Result<CommitmentConfig> {
    match level.trim().to_ascii_lowercase().as_str() {
        "processed" => Ok(CommitmentConfig::processed()),
        "confirmed" => Ok(CommitmentConfig::confirmed()),
        "finalized" => Ok(CommitmentConfig::finalized()),
        other => Err(CrankError::Config(format!(
            "CRANK_COMMITMENT: unknown level {}",
            other
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_applied() {
        let pid = Pubkey::new_unique();
        let config = CrankConfig::from_lookup(lookup_from(&[
            ("PROGRAM_ID", pid.to_string().as_str()),
            ("HOME", "/home/op"),
        ]))
        .unwrap();

        assert_eq!(config.program_id, pid);
        assert_eq!(config.rpc_url, DEFAULT_RPC_URL);
        assert_eq!(
            config.keypair_path,
            PathBuf::from("/home/op/.config/solana/id.json")
        );
        assert_eq!(config.commitment, CommitmentConfig::confirmed());
        assert_eq!(config.max_concurrency, DEFAULT_MAX_CONCURRENCY);
        assert!(config.notify_spool.is_none());
    }

    #[test]
    fn overrides_parsed() {
        let pid = Pubkey::new_unique();
        let config = CrankConfig::from_lookup(lookup_from(&[
            ("PROGRAM_ID", pid.to_string().as_str()),
            ("KEYPAIR", "/keys/crank.json"),
            ("RPC_URL", "https://api.devnet.solana.com"),
            ("CRANK_COMMITMENT", "finalized"),
            ("CRANK_MAX_CONCURRENCY", "32"),
            ("CRANK_NOTIFY_SPOOL", "/var/spool/due.jsonl"),
        ]))
        .unwrap();

        assert_eq!(config.keypair_path, PathBuf::from("/keys/crank.json"));
        assert_eq!(config.rpc_url, "https://api.devnet.solana.com");
        assert_eq!(config.commitment, CommitmentConfig::finalized());
        assert_eq!(config.max_concurrency, 32);
        assert_eq!(
            config.notify_spool,
            Some(PathBuf::from("/var/spool/due.jsonl"))
        );
    }

    #[test]
    fn missing_program_id_rejected() {
        let err = CrankConfig::from_lookup(lookup_from(&[("HOME", "/root")])).unwrap_err();
        assert!(matches!(err, CrankError::Config(_)));
    }

    #[test]
    fn zero_concurrency_rejected() {
        let pid = Pubkey::new_unique();
        let err = CrankConfig::from_lookup(lookup_from(&[
            ("PROGRAM_ID", pid.to_string().as_str()),
            ("KEYPAIR", "/k.json"),
            ("CRANK_MAX_CONCURRENCY", "0"),
        ]))
        .unwrap_err();
        assert!(matches!(err, CrankError::Config(_)));
    }

    #[test]
    fn builder_clamps_concurrency() {
        let config = CrankConfig::new(Pubkey::new_unique(), "/k.json").with_max_concurrency(0);
        assert_eq!(config.max_concurrency, 1);
    }
}
