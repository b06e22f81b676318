use crate::core::connection::LedgerConnection;
use crate::core::constants::DEFAULT_MAX_CONCURRENCY;
use crate::core::signer::CrankSigner;
use crate::engine::executor::ChargeExecutor;
use crate::engine::notify::DueNotifier;
use crate::engine::reader;
use crate::engine::report::PassReport;
use crate::engine::selector;
use crate::types::DueEvent;
use futures::future;
use futures::stream::{self, StreamExt};
use log::{debug, error, info, warn};
use solana_sdk::pubkey::Pubkey;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};
use tokio::sync::watch;

/// Runs crank passes against one program.
///
/// A pass is read, select, charge, report. Nothing is cached between passes
/// and nothing is retried within one; a subscription whose charge did not
/// land is still due on the next pass. Callers must not run two passes at
/// once against the same program.
pub struct CrankLoop<C, S, N> {
    connection: C,
    signer: S,
    notifier: Arc<N>,
    program_id: Pubkey,
    max_concurrency: usize,
}

impl<C, S, N> CrankLoop<C, S, N>
where
    C: LedgerConnection,
    S: CrankSigner,
    N: DueNotifier + 'static,
{
    pub fn new(connection: C, signer: S, notifier: N, program_id: Pubkey) -> Self {
        Self {
            connection,
            signer,
            notifier: Arc::new(notifier),
            program_id,
            max_concurrency: DEFAULT_MAX_CONCURRENCY,
        }
    }

    pub fn with_max_concurrency(mut self, max_concurrency: usize) -> Self {
        self.max_concurrency = max_concurrency.max(1);
        self
    }

    pub fn connection(&self) -> &C {
        &self.connection
    }

    /// One pass against the wall clock.
    pub async fn run_pass(&self) -> PassReport {
        self.run_pass_at(unix_now()).await
    }

    /// One pass with `now` fixed by the caller.
    pub async fn run_pass_at(&self, now: i64) -> PassReport {
        let (_keep_open, cancel) = watch::channel(false);
        self.run_pass_with_cancel(now, cancel).await
    }

    /// One pass that stops starting new charges once `cancel` reads `true`.
    ///
    /// Charges already in flight finish and are recorded; the rest are
    /// reported as unprocessed and the report is not marked complete.
    pub async fn run_pass_with_cancel(
        &self,
        now: i64,
        cancel: watch::Receiver<bool>,
    ) -> PassReport {
        info!("Crank pass started (now={}, operator={})", now, self.signer.pubkey());

        let snapshot =
            match reader::read_snapshot(&self.connection, &self.program_id, self.max_concurrency)
                .await
            {
                Ok(snapshot) => snapshot,
                Err(e) => {
                    error!("Crank pass aborted: {}", e);
                    return PassReport::read_failed(now, e.to_string());
                },
            };

        info!("Found {} subscriptions", snapshot.len());

        let mut report = PassReport::new(now);

        for bad in snapshot.undecodable {
            report.record_failure(bad.position, bad.address, bad.reason);
        }

        let selection = selector::select(now, snapshot.subscriptions);
        report.due = selection.due.len();

        for skipped in selection.skipped {
            debug!("Skipping {}: {}", skipped.subscription.address, skipped.reason);
            report.record_skip(
                skipped.position,
                skipped.subscription.address,
                skipped.reason.to_string(),
            );
        }

        let pending: Vec<(usize, Pubkey)> = selection
            .due
            .iter()
            .map(|item| (item.position, item.subscription.address))
            .collect();

        let executor = ChargeExecutor::new(&self.connection, &self.signer, self.program_id);
        let executor = &executor;
        let gate = cancel.clone();

        let mut outcomes = stream::iter(selection.due)
            .take_while(move |_| future::ready(!*gate.borrow()))
            .map(|item| async move {
                self.hand_off(DueEvent::new(&item.subscription, &item.plan));
                let outcome = executor.execute(&item.subscription, &item.plan).await;
                (item.position, item.subscription.address, outcome)
            })
            .buffer_unordered(self.max_concurrency);

        let mut processed = HashSet::new();
        while let Some((position, address, outcome)) = outcomes.next().await {
            report.record_charge(position, address, outcome);
            processed.insert(position);
            if *cancel.borrow() {
                debug!("Cancellation requested; draining in-flight charges");
            }
        }
        drop(outcomes);

        for (position, address) in pending {
            if !processed.contains(&position) {
                report.record_unprocessed(position, address);
            }
        }

        let cancelled = *cancel.borrow();
        report.finish(cancelled);

        info!(
            "Crank pass finished: checked={} due={} charged={} declined={} skipped={} failed={} unprocessed={}{}",
            report.checked,
            report.due,
            report.charged,
            report.declined,
            report.skipped,
            report.failed,
            report.unprocessed,
            if cancelled { " (cancelled)" } else { "" },
        );

        report
    }

    /// Deliver a due event in the background; the pass never waits on it.
    fn hand_off(&self, event: DueEvent) {
        let notifier = Arc::clone(&self.notifier);
        tokio::spawn(async move {
            if let Err(e) = notifier.notify(&event).await {
                warn!("Due notification for {} not delivered: {}", event.subscription, e);
            }
        });
    }
}

pub fn unix_now() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs() as i64)
        .unwrap_or_default()
}
