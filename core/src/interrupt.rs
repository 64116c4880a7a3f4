//! Interrupt bridge
//!
//! Converts the single OS interrupt notification into the in-process shutdown
//! discipline of the active mode. Benchmark runs are hard-cancelled because a
//! partial result is not a valid basis for comparison; load generation is
//! stopped gracefully so workers can drain buffered telemetry. Exactly one
//! discipline is active per process run, selected once at startup.

use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// Mode-selected shutdown discipline
#[derive(Debug, Clone)]
pub enum ShutdownMode {
    /// Immediate, non-drained abort of all work (benchmark mode)
    HardCancel(CancellationToken),
    /// One-shot cooperative stop with a bounded drain window (load mode)
    GracefulStop(broadcast::Sender<()>),
}

/// Fans the first external interrupt into the active [`ShutdownMode`]
///
/// Installed once per run, before any task starts. Repeated interrupts have
/// no additional effect.
pub struct InterruptBridge {
    mode: ShutdownMode,
    fired: Arc<AtomicBool>,
}

impl InterruptBridge {
    /// Build a hard-cancel bridge, returning the shared token to pass to tasks
    pub fn hard_cancel() -> (Self, CancellationToken) {
        let token = CancellationToken::new();
        let bridge = Self {
            mode: ShutdownMode::HardCancel(token.clone()),
            fired: Arc::new(AtomicBool::new(false)),
        };
        (bridge, token)
    }

    /// Build a graceful-stop bridge, returning the broadcast handle
    ///
    /// Workers subscribe via [`broadcast::Sender::subscribe`] before the run
    /// starts; the channel capacity of one is enough for a one-shot signal.
    pub fn graceful_stop() -> (Self, broadcast::Sender<()>) {
        let (stop_tx, _) = broadcast::channel(1);
        let bridge = Self {
            mode: ShutdownMode::GracefulStop(stop_tx.clone()),
            fired: Arc::new(AtomicBool::new(false)),
        };
        (bridge, stop_tx)
    }

    /// Dispatch the shutdown signal for the active mode
    ///
    /// Idempotent: only the first call has an effect.
    pub fn fire(&self) {
        if self.fired.swap(true, Ordering::SeqCst) {
            tracing::debug!("interrupt already dispatched, ignoring");
            return;
        }
        match &self.mode {
            ShutdownMode::HardCancel(token) => {
                tracing::info!("interrupt received, aborting benchmark run");
                token.cancel();
            }
            ShutdownMode::GracefulStop(stop_tx) => {
                tracing::info!("interrupt received, stopping load generation");
                // No receivers only means every worker already exited.
                let _ = stop_tx.send(());
            }
        }
    }

    /// Listen for Ctrl+C and dispatch on the first notification
    pub fn install(self) -> JoinHandle<()> {
        tokio::spawn(async move {
            loop {
                match tokio::signal::ctrl_c().await {
                    Ok(()) => self.fire(),
                    Err(e) => {
                        tracing::error!(error = %e, "failed to listen for interrupt");
                        return;
                    }
                }
            }
        })
    }

    /// Listen on an arbitrary notification future instead of the OS signal
    ///
    /// Used by tests to drive the bridge without delivering a real signal.
    pub fn install_with<F>(self, interrupt: F) -> JoinHandle<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        tokio::spawn(async move {
            interrupt.await;
            self.fire();
        })
    }
}
