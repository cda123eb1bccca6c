// ── Event manager ──
//
// Owns the subscription store and the delivery queue; holds the Notifier
// boundary. Cheaply cloneable via `Arc` so the watcher, the delivery loop,
// and the command layer share one instance.

use std::collections::BTreeSet;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;
use tracing::{debug, warn};

use crate::config::ScheduleConfig;
use crate::error::CoreError;
use crate::model::{EventKey, NotificationJob, Outage, SubscriberId};
use crate::queue::DeliveryQueue;
use crate::schedule::build_schedule;
use crate::store::SubscriptionStore;

/// The "send one message to one subscriber" capability supplied by the
/// chat transport. Failures are recoverable per recipient; the core logs
/// them and moves on.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send(&self, to: SubscriberId, text: &str) -> Result<(), CoreError>;
}

/// Subscription and notification hub.
#[derive(Clone)]
pub struct EventManager {
    inner: Arc<EventManagerInner>,
}

struct EventManagerInner {
    store: Mutex<SubscriptionStore>,
    queue: Arc<DeliveryQueue>,
    notifier: Arc<dyn Notifier>,
    config: ScheduleConfig,
}

impl EventManager {
    pub fn new(
        store: SubscriptionStore,
        notifier: Arc<dyn Notifier>,
        config: ScheduleConfig,
    ) -> Self {
        Self {
            inner: Arc::new(EventManagerInner {
                store: Mutex::new(store),
                queue: Arc::new(DeliveryQueue::new()),
                notifier,
                config,
            }),
        }
    }

    pub fn queue(&self) -> &Arc<DeliveryQueue> {
        &self.inner.queue
    }

    pub fn config(&self) -> &ScheduleConfig {
        &self.inner.config
    }

    // ── Subscription management ──────────────────────────────────

    pub async fn subscribe(
        &self,
        id: SubscriberId,
        keys: &[EventKey],
    ) -> Result<(), CoreError> {
        self.inner.store.lock().await.subscribe(id, keys)
    }

    pub async fn unsubscribe(
        &self,
        id: SubscriberId,
        keys: Option<&[EventKey]>,
    ) -> Result<(), CoreError> {
        self.inner.store.lock().await.unsubscribe(id, keys)
    }

    pub async fn keys_for(&self, id: SubscriberId) -> BTreeSet<EventKey> {
        self.inner.store.lock().await.keys_for(id)
    }

    pub async fn is_registered(&self, id: SubscriberId) -> bool {
        self.inner.store.lock().await.is_registered(id)
    }

    // ── Notification fan-out ─────────────────────────────────────

    /// Deliver `text` to every subscriber of `key`.
    pub async fn notify_event(&self, key: EventKey, text: &str) {
        let recipients = self.inner.store.lock().await.subscribers_of(key);
        self.fan_out(recipients, text).await;
    }

    /// Deliver `text` to every globally registered subscriber.
    pub async fn notify_all(&self, text: &str) {
        let recipients = self.inner.store.lock().await.all_subscribers();
        self.fan_out(recipients, text).await;
    }

    /// Recompute the delivery queue from the current outage list.
    ///
    /// Atomically replaces the previous generation; a delivery loop blocked
    /// on a stale head is woken through the queue's generation counter.
    pub async fn reschedule(&self, outages: &[Outage]) {
        let now = chrono::Utc::now();
        let jobs = build_schedule(now, outages, &self.inner.config.lead_times);
        debug!(jobs = jobs.len(), outages = outages.len(), "schedule rebuilt");
        self.inner.queue.replace(jobs);
    }

    /// Deliver one due job to its audience.
    ///
    /// Transition jobs (Outage/Restored) also reach StatusChanged
    /// subscribers, so "any status change" is a single subscription.
    pub async fn deliver(&self, job: &NotificationJob) {
        let recipients = {
            let store = self.inner.store.lock().await;
            let mut recipients = store.subscribers_of(job.key);
            if matches!(job.key, EventKey::Outage | EventKey::Restored) {
                recipients.extend(store.subscribers_of(EventKey::StatusChanged));
            }
            recipients
        };
        self.fan_out(recipients, &job.text).await;
    }

    /// Sequential send to each recipient (chat transports rate-limit; do
    /// not batch). One failure never aborts the rest of the fan-out.
    async fn fan_out(&self, recipients: BTreeSet<SubscriberId>, text: &str) {
        for id in recipients {
            if let Err(e) = self.inner.notifier.send(id, text).await {
                warn!(subscriber = %id, error = %e, "notification delivery failed");
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::model::LeadTime;
    use crate::store::MemorySnapshot;
    use crate::testing::RecordingNotifier;

    fn manager(notifier: Arc<RecordingNotifier>) -> EventManager {
        EventManager::new(
            SubscriptionStore::open(Box::new(MemorySnapshot::default())),
            notifier,
            ScheduleConfig::default(),
        )
    }

    #[tokio::test]
    async fn notify_event_reaches_only_that_key() {
        let notifier = Arc::new(RecordingNotifier::default());
        let events = manager(Arc::clone(&notifier));

        events
            .subscribe(SubscriberId(1), &[EventKey::StatusChanged])
            .await
            .unwrap();
        events
            .subscribe(SubscriberId(2), &[EventKey::Outage])
            .await
            .unwrap();

        events.notify_event(EventKey::StatusChanged, "hello").await;

        assert_eq!(notifier.sent(), vec![(SubscriberId(1), "hello".to_owned())]);
    }

    #[tokio::test]
    async fn notify_all_reaches_every_registered_subscriber() {
        let notifier = Arc::new(RecordingNotifier::default());
        let events = manager(Arc::clone(&notifier));

        events
            .subscribe(SubscriberId(1), &[EventKey::StatusChanged])
            .await
            .unwrap();
        events
            .subscribe(SubscriberId(2), &[EventKey::Outage])
            .await
            .unwrap();

        events.notify_all("broadcast").await;
        assert_eq!(notifier.sent().len(), 2);
    }

    #[tokio::test]
    async fn one_failed_recipient_does_not_block_the_rest() {
        let notifier = Arc::new(RecordingNotifier::default());
        notifier.fail_for(SubscriberId(1));
        let events = manager(Arc::clone(&notifier));

        events
            .subscribe(SubscriberId(1), &[EventKey::StatusChanged])
            .await
            .unwrap();
        events
            .subscribe(SubscriberId(2), &[EventKey::StatusChanged])
            .await
            .unwrap();

        events.notify_event(EventKey::StatusChanged, "hi").await;

        assert_eq!(notifier.sent(), vec![(SubscriberId(2), "hi".to_owned())]);
    }

    #[tokio::test]
    async fn transition_jobs_also_reach_status_changed_subscribers() {
        let notifier = Arc::new(RecordingNotifier::default());
        let events = manager(Arc::clone(&notifier));

        events
            .subscribe(SubscriberId(1), &[EventKey::StatusChanged])
            .await
            .unwrap();
        events
            .subscribe(SubscriberId(2), &[EventKey::Outage])
            .await
            .unwrap();
        events
            .subscribe(SubscriberId(3), &[EventKey::NotifyBefore(LeadTime::new(5).unwrap())])
            .await
            .unwrap();

        let job = NotificationJob::new(EventKey::Outage, "began", chrono::Utc::now());
        events.deliver(&job).await;

        let recipients: Vec<SubscriberId> =
            notifier.sent().into_iter().map(|(id, _)| id).collect();
        assert_eq!(recipients, vec![SubscriberId(1), SubscriberId(2)]);
    }

    #[tokio::test]
    async fn lead_warning_jobs_reach_only_the_exact_lead_key() {
        let notifier = Arc::new(RecordingNotifier::default());
        let events = manager(Arc::clone(&notifier));

        let five = LeadTime::new(5).unwrap();
        let ten = LeadTime::new(10).unwrap();
        events
            .subscribe(SubscriberId(1), &[EventKey::NotifyBefore(five)])
            .await
            .unwrap();
        events
            .subscribe(SubscriberId(2), &[EventKey::NotifyBefore(ten)])
            .await
            .unwrap();

        let job =
            NotificationJob::new(EventKey::NotifyBefore(five), "soon", chrono::Utc::now());
        events.deliver(&job).await;

        assert_eq!(notifier.sent(), vec![(SubscriberId(1), "soon".to_owned())]);
    }

    #[tokio::test]
    async fn reschedule_replaces_the_queue() {
        use crate::model::{Outage, OutageSeverity};

        let notifier = Arc::new(RecordingNotifier::default());
        let events = manager(notifier);

        let now = chrono::Utc::now();
        let outage = Outage {
            severity: OutageSeverity::Confirmed,
            start: now + chrono::Duration::hours(2),
            end: now + chrono::Duration::hours(4),
            duration: "2 hours".into(),
        };

        events.reschedule(std::slice::from_ref(&outage)).await;
        assert!(!events.queue().is_empty());

        events.reschedule(&[]).await;
        assert!(events.queue().is_empty());
    }
}
