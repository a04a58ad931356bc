//! Periodic refresh loop driving the fetcher into the dispatcher.

use crate::dispatcher::Dispatcher;
use anyhow::Result;
use metrics::counter;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::MissedTickBehavior;
use tracing::{info, warn};
use upstream::SnctClient;

/// Configuration for the refresh service.
#[derive(Debug, Clone)]
pub struct RefreshConfig {
    /// Pause between refresh cycles. Cycles never overlap: a tick arriving
    /// while a cycle is still in flight is skipped.
    pub interval: Duration,
}

impl Default for RefreshConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(60),
        }
    }
}

/// Runs one refresh cycle at startup, then one per interval, strictly
/// serialized. A shutdown signal stops the loop and may abandon the cycle in
/// flight: the fetch assembles its snapshot locally and only a completed
/// cycle ever reaches `Dispatcher::update`, so nothing partial is written.
pub struct RefreshService {
    dispatcher: Arc<Dispatcher>,
    client: SnctClient,
    config: RefreshConfig,
}

impl RefreshService {
    pub fn new(dispatcher: Arc<Dispatcher>, client: SnctClient, config: RefreshConfig) -> Self {
        Self {
            dispatcher,
            client,
            config,
        }
    }

    /// Run the service (blocking).
    pub async fn run(self: Arc<Self>, mut shutdown_rx: mpsc::Receiver<()>) -> Result<()> {
        info!(
            "starting refresh service, one cycle every {:?}",
            self.config.interval
        );

        // First refresh before the periodic loop. A failure here only delays
        // readiness; the loop below retries every interval.
        tokio::select! {
            biased;

            _ = shutdown_rx.recv() => {
                info!("refresh service received shutdown signal before first cycle");
                return Ok(());
            }
            _ = self.refresh_cycle() => {}
        }

        let mut interval = tokio::time::interval(self.config.interval);
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
        // The first tick completes immediately; the startup cycle already ran.
        interval.tick().await;

        loop {
            tokio::select! {
                biased;

                _ = shutdown_rx.recv() => {
                    info!("refresh service received shutdown signal");
                    break;
                }

                _ = interval.tick() => {}
            }

            tokio::select! {
                biased;

                _ = shutdown_rx.recv() => {
                    info!("refresh service received shutdown signal, abandoning in-flight cycle");
                    break;
                }

                _ = self.refresh_cycle() => {}
            }
        }

        info!("refresh service stopped");
        Ok(())
    }

    /// One cycle: make sure a catalog exists, fetch availability, apply.
    async fn refresh_cycle(&self) {
        if !self.dispatcher.has_catalog() {
            match self.client.fetch_catalog().await {
                Ok(catalog) => self.dispatcher.set_catalog(catalog),
                Err(err) => {
                    warn!("catalog refresh failed, retrying next cycle: {err}");
                    counter!("refresh_cycles_total", "outcome" => "no_catalog").increment(1);
                    return;
                }
            }
        }

        let catalog = self.dispatcher.catalog();
        let snapshot = self.client.fetch_availability(&catalog).await;
        self.dispatcher.update(snapshot);
        counter!("refresh_cycles_total", "outcome" => "ok").increment(1);
    }
}
