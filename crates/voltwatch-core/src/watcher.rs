// ── Outage watcher ──
//
// Polls the external schedule source, detects changes against the
// last-known-good list, and drives the EventManager: broadcast to
// StatusChanged subscribers, then rebuild the delivery queue.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::error::CoreError;
use crate::events::EventManager;
use crate::messages;
use crate::model::{EnergyState, EventKey, Outage, current_status};

/// The external outage-schedule source. Returns the ordered outage list
/// for the lookahead window; ordering and non-overlap are the source's
/// responsibility.
#[async_trait]
pub trait OutageSource: Send + Sync {
    async fn fetch(&self) -> Result<Vec<Outage>, CoreError>;
}

pub struct OutageWatcher {
    source: Arc<dyn OutageSource>,
    events: EventManager,
    last: Mutex<Option<Vec<Outage>>>,
}

impl OutageWatcher {
    pub fn new(source: Arc<dyn OutageSource>, events: EventManager) -> Self {
        Self {
            source,
            events,
            last: Mutex::new(None),
        }
    }

    /// Fetch the schedule and react to changes.
    ///
    /// Unchanged data is a no-op. On change: store the new list, broadcast
    /// a "schedule changed" and a derived current-status message to
    /// StatusChanged subscribers, and rebuild the delivery queue -- exactly
    /// once per detected change. A fetch failure propagates without
    /// touching the last-known-good snapshot.
    pub async fn update(&self) -> Result<bool, CoreError> {
        let fresh = self.source.fetch().await?;

        {
            let mut last = self.last.lock().await;
            if last.as_deref() == Some(fresh.as_slice()) {
                debug!("outage schedule unchanged");
                return Ok(false);
            }
            *last = Some(fresh.clone());
        }

        info!(outages = fresh.len(), "outage schedule changed");

        self.events
            .notify_event(EventKey::StatusChanged, &messages::schedule_changed())
            .await;

        let state = current_status(Utc::now(), &fresh);
        self.events
            .notify_event(EventKey::StatusChanged, &messages::status_line(&state))
            .await;

        self.events.reschedule(&fresh).await;
        Ok(true)
    }

    /// Last successfully fetched outage list.
    pub async fn latest(&self) -> Option<Vec<Outage>> {
        self.last.lock().await.clone()
    }

    /// Current status derived from the last-known-good list.
    pub async fn current_status(&self) -> EnergyState {
        let last = self.last.lock().await;
        current_status(Utc::now(), last.as_deref().unwrap_or_default())
    }
}

/// Poll the source on `interval`, forever. The first tick fires
/// immediately so startup gets a schedule without waiting an interval.
pub async fn watch_task(
    watcher: Arc<OutageWatcher>,
    interval: Duration,
    cancel: CancellationToken,
) {
    let mut ticker = tokio::time::interval(interval);

    loop {
        tokio::select! {
            biased;
            () = cancel.cancelled() => break,
            _ = ticker.tick() => {
                if let Err(e) = watcher.update().await {
                    warn!(error = %e, "outage poll failed -- keeping last known schedule");
                }
            }
        }
    }

    debug!("outage watcher stopped");
}
