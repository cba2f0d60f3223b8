//! Import status polling and the catalog-changed signal.

use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use tokio_util::sync::CancellationToken;

use crate::catalog::EntityCatalog;
use crate::error::ClassplanResult;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UpdateState {
    Updating,
    Complete,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UpdateSource {
    Book,
    Ods,
}

/// One entry of the catalog's import log (`update.json`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UpdateStatus {
    pub id: u32,
    pub status_str: UpdateState,
    pub start: String,
    #[serde(default)]
    pub end: Option<String>,
    #[serde(default)]
    pub status: i32,
    pub source: UpdateSource,
    /// 0.0 ..= 1.0
    #[serde(default)]
    pub progress: f64,
}

impl UpdateStatus {
    pub fn is_complete(&self) -> bool {
        self.end.is_some() || self.status_str == UpdateState::Complete
    }

    pub fn percent(&self) -> u8 {
        (self.progress.clamp(0.0, 1.0) * 100.0).round() as u8
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum CatalogEvent {
    /// First poll that saw an import running.
    UpdateStarted,
    /// Every poll while the import runs.
    UpdatePending { progress: f64 },
    /// The import finished; cached catalog data is stale.
    UpdateFinished,
}

/// Polls the import log and broadcasts `CatalogEvent`s.
pub struct UpdateMonitor {
    catalog: Arc<EntityCatalog>,
    interval: Duration,
    events: broadcast::Sender<CatalogEvent>,
}

impl UpdateMonitor {
    pub fn new(catalog: Arc<EntityCatalog>, interval: Duration) -> Self {
        let (events, _) = broadcast::channel(32);

        UpdateMonitor {
            catalog,
            interval,
            events,
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<CatalogEvent> {
        self.events.subscribe()
    }

    /// Wire the catalog's cache to this monitor's events.
    pub fn attach_cache(&self, token: CancellationToken) -> tokio::task::JoinHandle<()> {
        self.catalog.listen_for_updates(self.subscribe(), token)
    }

    /// Fetch the status once, emitting events relative to `updating`, the
    /// state seen by the previous poll.
    pub async fn poll_once(&self, updating: &mut bool) -> ClassplanResult<UpdateStatus> {
        let status = self.catalog.fetch_update_status().await?;

        if status.is_complete() {
            if *updating {
                tracing::info!(id = status.id, "Catalog import finished");
                self.emit(CatalogEvent::UpdateFinished);
                *updating = false;
            }
        } else {
            if !*updating {
                tracing::info!(id = status.id, source = ?status.source, "Catalog import running");
                self.emit(CatalogEvent::UpdateStarted);
                *updating = true;
            }
            self.emit(CatalogEvent::UpdatePending {
                progress: status.progress,
            });
        }

        Ok(status)
    }

    /// Poll until `token` is cancelled. Failed polls are logged and retried
    /// on the next tick.
    pub async fn run(&self, token: CancellationToken) {
        let mut ticker = tokio::time::interval(self.interval);
        let mut updating = false;

        loop {
            tokio::select! {
                _ = token.cancelled() => break,
                _ = ticker.tick() => {
                    if let Err(e) = self.poll_once(&mut updating).await {
                        tracing::warn!(error = %e, "Import status poll failed");
                    }
                }
            }
        }
    }

    /// Return as soon as the catalog reports no import in progress.
    /// Returns `None` if cancelled first.
    pub async fn wait_until_ready(
        &self,
        token: CancellationToken,
    ) -> ClassplanResult<Option<UpdateStatus>> {
        let mut updating = false;

        loop {
            let status = self.poll_once(&mut updating).await?;
            if status.is_complete() {
                return Ok(Some(status));
            }

            tokio::select! {
                _ = token.cancelled() => return Ok(None),
                _ = tokio::time::sleep(self.interval) => {}
            }
        }
    }

    fn emit(&self, event: CatalogEvent) {
        // No subscribers is fine.
        let _ = self.events.send(event);
    }
}
