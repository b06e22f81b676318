// Runs exactly one crank pass and exits with its status:
// 0 success, 1 partial failure, 2 whole-pass failure.
//
// Configuration comes from the environment, see `CrankConfig::from_env`.

use anyhow::{anyhow, Context, Result};
use log::{error, info, warn};
use solana_sdk::signature::read_keypair_file;
use std::process::ExitCode;
use subscription_crank::engine::{DueNotifier, NoopNotifier, SpoolNotifier};
use subscription_crank::{CrankConfig, CrankLoop, PassStatus, RpcLedger};
use tokio::sync::watch;

#[tokio::main]
async fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    match run().await {
        Ok(status) => ExitCode::from(status.exit_code()),
        Err(e) => {
            error!("{:#}", e);
            ExitCode::from(PassStatus::WholePassFailure.exit_code())
        },
    }
}

async fn run() -> Result<PassStatus> {
    let config = CrankConfig::from_env()?;

    let operator = read_keypair_file(&config.keypair_path)
        .map_err(|e| anyhow!("{}", e))
        .with_context(|| format!("reading keypair {}", config.keypair_path.display()))?;

    let notifier: Box<dyn DueNotifier> = match &config.notify_spool {
        Some(path) => Box::new(
            SpoolNotifier::open(path)
                .await
                .with_context(|| format!("opening notification spool {}", path.display()))?,
        ),
        None => Box::new(NoopNotifier),
    };

    info!("RPC: {}", config.rpc_url);
    info!("Program: {}", config.program_id);

    let crank = CrankLoop::new(
        RpcLedger::new(&config),
        operator,
        notifier,
        config.program_id,
    )
    .with_max_concurrency(config.max_concurrency);

    let (cancel_tx, cancel_rx) = watch::channel(false);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupt received, finishing in-flight charges");
            let _ = cancel_tx.send(true);
        }
    });

    let now = subscription_crank::engine::pass::unix_now();
    let report = crank.run_pass_with_cancel(now, cancel_rx).await;

    println!("{}", serde_json::to_string_pretty(&report)?);

    for entry in report.failures() {
        warn!(
            "Failed {}: {}",
            entry.subscription,
            entry.reason().unwrap_or_default()
        );
    }

    Ok(report.status())
}
