// src/pipeline/cycle.rs

//! One fetch → extract → classify → filter → notify → persist pass.

use std::fmt;

use crate::models::{Alert, PersistPolicy, SourceConfig};
use crate::pipeline::Watcher;
use crate::services::{format, send_throttled};

/// Per-source progress, logged at debug level.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Fetching,
    Extracting,
    Classifying,
    Filtering,
    Notifying,
    Persisting,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Phase::Fetching => "fetching",
            Phase::Extracting => "extracting",
            Phase::Classifying => "classifying",
            Phase::Filtering => "filtering",
            Phase::Notifying => "notifying",
            Phase::Persisting => "persisting",
        };
        f.write_str(name)
    }
}

/// Counters for one cycle.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CycleReport {
    pub sources_checked: usize,
    pub fetch_failures: usize,
    pub candidates: usize,
    pub relevant: usize,
    pub new_alerts: usize,
    pub delivered: usize,
    pub failed_deliveries: usize,
    pub persisted: bool,
}

impl CycleReport {
    pub fn log(&self) {
        if self.new_alerts == 0 {
            log::info!(
                "Cycle done: {} source(s), {} candidate(s), {} relevant, nothing new",
                self.sources_checked,
                self.candidates,
                self.relevant
            );
        } else {
            log::info!(
                "Cycle done: {} new alert(s), {} delivered, {} failed",
                self.new_alerts,
                self.delivered,
                self.failed_deliveries
            );
        }
        if self.fetch_failures > 0 {
            log::warn!("{} source(s) could not be fetched", self.fetch_failures);
        }
    }
}

impl Watcher {
    /// Run one cycle over every configured source.
    ///
    /// Never fails: fetch errors skip the source, delivery errors skip the
    /// item, and a failed persist leaves the in-memory set authoritative.
    pub async fn run_cycle(&mut self) -> CycleReport {
        let config = self.config.clone();
        let mut report = CycleReport::default();
        let mut alerts = Vec::new();

        for (index, source) in config.sources.iter().enumerate() {
            report.sources_checked += 1;
            let found = self.check_source(source, &mut report, &mut alerts).await;

            let remaining = config.sources.len() - index - 1;
            if found > 0 && config.watcher.stop_on_first_match && remaining > 0 {
                log::info!(
                    "[{}] yielded {} new item(s); skipping {} remaining source(s) this cycle",
                    source.name,
                    found,
                    remaining
                );
                break;
            }
        }

        report.new_alerts = alerts.len();
        order_for_dispatch(&mut alerts);

        if !alerts.is_empty() {
            log::debug!("{} alert(s): {}", alerts.len(), Phase::Notifying);
        }
        for alert in &alerts {
            let message = format::alert_message(alert);
            if send_throttled(self.notifier.as_ref(), &mut self.throttle, &message).await {
                report.delivered += 1;
            } else {
                report.failed_deliveries += 1;
                log::error!(
                    "Alert not delivered and will not be retried: {}",
                    alert.title()
                );
            }
        }

        let should_persist = match config.watcher.persist {
            PersistPolicy::Always => true,
            PersistPolicy::OnAlert => report.new_alerts > 0,
        };
        if should_persist {
            log::debug!("seen-store: {}", Phase::Persisting);
            match self.store.persist().await {
                Ok(()) => report.persisted = true,
                Err(e) => log::error!("{}", e),
            }
        }

        report
    }

    /// Process one source, pushing its new alerts. Returns how many were new.
    async fn check_source(
        &mut self,
        source: &SourceConfig,
        report: &mut CycleReport,
        alerts: &mut Vec<Alert>,
    ) -> usize {
        log::debug!("[{}] {}", source.name, Phase::Fetching);
        let raw = match self.fetcher.fetch(source).await {
            Ok(raw) => raw,
            Err(e) => {
                report.fetch_failures += 1;
                log::warn!("[{}] skipped this cycle: {}", source.name, e);
                return 0;
            }
        };

        log::debug!("[{}] {}", source.name, Phase::Extracting);
        let candidates = self.extractor.extract(&raw);
        report.candidates += candidates.len();

        log::debug!("[{}] {}", source.name, Phase::Classifying);
        let relevant: Vec<_> = candidates
            .into_iter()
            .filter_map(|c| self.classifier.classify_candidate(c))
            .collect();
        report.relevant += relevant.len();

        // Marking happens here, before any delivery attempt, so a later
        // duplicate in the same cycle is dropped.
        log::debug!("[{}] {}", source.name, Phase::Filtering);
        let mut found = 0;
        for classified in relevant {
            let id = self.store.id_for(source.tag(), &classified.candidate.text);
            if !self.store.is_new(&id) {
                continue;
            }
            self.store.mark_seen(id);
            log::info!(
                "[{}] new {} item: {}",
                source.name,
                classified.tier,
                classified.candidate.text
            );
            alerts.push(Alert::new(classified));
            found += 1;
        }
        found
    }
}

/// Oldest first when every alert carries a publish time; otherwise keep discovery order.
fn order_for_dispatch(alerts: &mut [Alert]) {
    if alerts.iter().all(|a| a.published_at().is_some()) {
        alerts.sort_by_key(|a| a.published_at());
    }
}
