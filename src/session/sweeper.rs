//! Periodic removal of expired bindings.
//!
//! Lookups already ignore expired entries; the sweeper only bounds memory
//! for clients that never come back.

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;
use tokio::time;

use crate::observability::metrics;
use crate::session::store::SessionStore;

pub struct SessionSweeper {
    store: Arc<dyn SessionStore>,
    interval: Duration,
}

impl SessionSweeper {
    pub fn new(store: Arc<dyn SessionStore>, interval: Duration) -> Self {
        Self { store, interval }
    }

    pub async fn run(self, mut shutdown: broadcast::Receiver<()>) {
        if self.interval.is_zero() {
            tracing::info!("Session sweeper disabled");
            return;
        }

        let mut ticker = time::interval(self.interval);
        // The first tick completes immediately.
        ticker.tick().await;

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    let removed = self.store.purge_expired();
                    let active = self.store.len_active();
                    metrics::record_active_sessions(active);
                    if removed > 0 {
                        tracing::debug!(removed, active, "Purged expired sessions");
                    }
                }
                _ = shutdown.recv() => {
                    tracing::info!("Session sweeper received shutdown signal, exiting loop");
                    break;
                }
            }
        }
    }
}
