// src/pipeline/shutdown.rs

//! Cooperative stop requests for the poll loop.

use tokio::sync::watch;
use tokio::task::JoinHandle;

/// Why the loop was asked to stop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StopReason {
    /// Interrupt signal received; stop gracefully.
    Interrupted,
    /// Something the loop depends on broke; stop and report.
    Failed(String),
}

/// Sending half, handed to whatever watches for stop conditions.
#[derive(Debug)]
pub struct ShutdownTrigger {
    tx: watch::Sender<Option<StopReason>>,
}

/// Receiving half, owned by the loop.
#[derive(Debug, Clone)]
pub struct Shutdown {
    rx: watch::Receiver<Option<StopReason>>,
}

/// Create a connected trigger/receiver pair.
pub fn shutdown_channel() -> (ShutdownTrigger, Shutdown) {
    let (tx, rx) = watch::channel(None);
    (ShutdownTrigger { tx }, Shutdown { rx })
}

impl ShutdownTrigger {
    /// Request a stop. The first reason wins.
    pub fn stop(&self, reason: StopReason) {
        self.tx.send_if_modified(|current| {
            if current.is_some() {
                return false;
            }
            *current = Some(reason);
            true
        });
    }
}

impl Shutdown {
    /// Resolve once a stop is requested. Never resolves if every trigger is dropped first.
    pub async fn wait(&mut self) -> StopReason {
        loop {
            let current = self.rx.borrow_and_update().clone();
            if let Some(reason) = current {
                return reason;
            }
            if self.rx.changed().await.is_err() {
                return std::future::pending().await;
            }
        }
    }
}

/// Turn Ctrl-C into a stop request.
///
/// A listener that cannot be installed is reported as a loop failure.
pub fn listen_for_ctrl_c(trigger: ShutdownTrigger) -> JoinHandle<()> {
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                log::info!("Interrupt received, stopping after the current cycle");
                trigger.stop(StopReason::Interrupted);
            }
            Err(e) => {
                log::error!("Signal listener failed: {}", e);
                trigger.stop(StopReason::Failed(format!("signal listener failed: {e}")));
            }
        }
    })
}
