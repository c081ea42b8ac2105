//! Periodic removal of expired verification attempts.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::broadcast;
use tokio::task::JoinHandle;

use unqgate_ledger::LedgerClient;
use unqgate_store::HoldingsStore;
use unqgate_verification::VerificationMachine;

use crate::GateMetrics;

/// Run [`VerificationMachine::sweep_expired`] every `interval` until shutdown.
///
/// A failed sweep is logged and retried on the next tick.
pub fn spawn_sweeper<S, L>(
    machine: Arc<VerificationMachine<S, L>>,
    interval: Duration,
    metrics: Arc<GateMetrics>,
    mut shutdown_rx: broadcast::Receiver<()>,
) -> JoinHandle<()>
where
    S: HoldingsStore + ?Sized + 'static,
    L: LedgerClient + ?Sized + 'static,
{
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        loop {
            tokio::select! {
                biased;
                _ = shutdown_rx.recv() => {
                    tracing::info!("attempt sweeper shutting down");
                    break;
                }
                _ = ticker.tick() => {
                    match machine.sweep_expired() {
                        Ok(report) => metrics.attempts_swept.inc_by(report.deleted as u64),
                        Err(e) => tracing::error!(error = %e, "attempt sweep failed"),
                    }
                }
            }
        }
    })
}
