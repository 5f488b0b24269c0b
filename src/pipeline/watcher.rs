// src/pipeline/watcher.rs

//! The watcher context and its lifecycle.

use std::sync::Arc;

use chrono::Utc;

use crate::error::{AppError, Result};
use crate::models::Config;
use crate::pipeline::shutdown::{Shutdown, StopReason};
use crate::services::{
    Classifier, Extractor, Fetch, HttpFetcher, Notifier, TelegramNotifier, Throttle, format,
    send_throttled,
};
use crate::storage::SeenStore;

/// How long the watcher keeps polling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunMode {
    /// One cycle, no lifecycle messages.
    Once,
    /// Cycle at the configured interval until asked to stop.
    Forever,
}

/// Everything one poll loop needs, built once at startup.
///
/// The seen-store is owned exclusively by the watcher; nothing else mutates it.
pub struct Watcher {
    pub(super) config: Arc<Config>,
    pub(super) fetcher: Box<dyn Fetch>,
    pub(super) extractor: Extractor,
    pub(super) classifier: Classifier,
    pub(super) notifier: Box<dyn Notifier>,
    pub(super) throttle: Throttle,
    pub(super) store: SeenStore,
}

impl Watcher {
    /// Assemble a watcher from explicit collaborators.
    pub fn new(
        config: Arc<Config>,
        fetcher: Box<dyn Fetch>,
        notifier: Box<dyn Notifier>,
        store: SeenStore,
    ) -> Result<Self> {
        let extractor = Extractor::new(&config.extractor)?;
        let classifier = Classifier::new(&config.classifier);
        let throttle = Throttle::new(config.notifier.send_interval());

        Ok(Self {
            config,
            fetcher,
            extractor,
            classifier,
            notifier,
            throttle,
            store,
        })
    }

    /// Build the production watcher: HTTP fetcher, Telegram notifier, on-disk seen-store.
    pub async fn from_config(config: Config) -> Result<Self> {
        config.validate_notifier()?;

        let fetcher = HttpFetcher::new(&config.http)?;
        let notifier = TelegramNotifier::new(&config.notifier)?;
        let store = SeenStore::load(&config.store.path, config.store.id_normalization).await?;

        Self::new(
            Arc::new(config),
            Box::new(fetcher),
            Box::new(notifier),
            store,
        )
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn store(&self) -> &SeenStore {
        &self.store
    }

    /// Run until `mode` is satisfied or a stop is requested.
    ///
    /// A stop request is only observed while sleeping between cycles, so the
    /// current cycle always finishes its notifications first.
    pub async fn run(&mut self, mode: RunMode, mut shutdown: Shutdown) -> Result<()> {
        if mode == RunMode::Once {
            let report = self.run_cycle().await;
            report.log();
            return Ok(());
        }

        let interval = self.config.watcher.interval();
        log::info!(
            "Watching {} source(s) every {}s",
            self.config.sources.len(),
            interval.as_secs()
        );
        let started = format::started_message(interval.as_secs(), self.config.sources.len());
        self.send_lifecycle(&started).await;

        let reason = loop {
            let report = self.run_cycle().await;
            report.log();

            tokio::select! {
                reason = shutdown.wait() => break reason,
                _ = tokio::time::sleep(interval) => {}
            }
        };

        self.stop(reason).await
    }

    async fn stop(&mut self, reason: StopReason) -> Result<()> {
        let outcome = match &reason {
            StopReason::Interrupted => {
                log::info!("Watcher stopped");
                self.send_lifecycle(&format::stopped_message()).await;
                Ok(())
            }
            StopReason::Failed(message) => {
                log::error!("Watcher failed: {}", message);
                self.send_lifecycle(&format::failed_message(message)).await;
                Err(AppError::Loop(message.clone()))
            }
        };

        if let Err(e) = self.store.persist().await {
            log::error!("Final seen-store write failed: {}", e);
        }
        outcome
    }

    /// Send the connectivity test message. Returns whether it was accepted.
    pub async fn test_notify(&mut self) -> bool {
        let message = format::test_message(Utc::now());
        send_throttled(self.notifier.as_ref(), &mut self.throttle, &message).await
    }

    async fn send_lifecycle(&mut self, message: &str) {
        if !send_throttled(self.notifier.as_ref(), &mut self.throttle, message).await {
            log::warn!("Lifecycle message was not delivered");
        }
    }
}
