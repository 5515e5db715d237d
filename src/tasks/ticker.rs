//! Periodic tick background task

use std::{sync::Arc, time::Duration};
use tokio::{sync::watch, task::JoinHandle};
use tracing::{debug, info, warn};

use crate::state::TimerEngine;
use crate::utils::now_millis;

/// How often the engine is advanced. Half a second keeps
/// second-granularity progress from visibly stuttering.
pub const TICK_INTERVAL: Duration = Duration::from_millis(500);

/// Background task that feeds wall-clock ticks to a [`TimerEngine`].
///
/// Dropping the driver signals the task to stop; at most one tick
/// already in flight completes afterwards.
pub struct TickDriver {
    shutdown_tx: watch::Sender<bool>,
    handle: Option<JoinHandle<()>>,
}

impl TickDriver {
    /// Spawns the tick task for `engine` at [`TICK_INTERVAL`].
    pub fn spawn(engine: Arc<TimerEngine>) -> Self {
        let (shutdown_tx, mut shutdown_rx) = watch::channel(false);

        let handle = tokio::spawn(async move {
            info!("Starting timer tick task");
            let mut interval = tokio::time::interval(TICK_INTERVAL);

            loop {
                tokio::select! {
                    biased;

                    // Shutdown signal wins over a tick due at the same instant
                    _ = shutdown_rx.changed() => break,
                    _ = interval.tick() => engine.on_tick(now_millis()),
                }
            }

            debug!("Timer tick task stopped");
        });

        Self {
            shutdown_tx,
            handle: Some(handle),
        }
    }

    /// Signals the tick task to stop without waiting for it.
    pub fn stop(&self) {
        debug!("Stopping timer tick task");
        // The task may already be gone, which is fine.
        let _ = self.shutdown_tx.send(true);
    }

    /// Stops the tick task and waits for it to finish.
    pub async fn shutdown(mut self) {
        self.stop();
        if let Some(handle) = self.handle.take() {
            if let Err(e) = handle.await {
                warn!("Timer tick task ended abnormally: {}", e);
            }
        }
    }
}

impl Drop for TickDriver {
    fn drop(&mut self) {
        let _ = self.shutdown_tx.send(true);
    }
}
