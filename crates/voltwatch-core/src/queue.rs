// ── Delivery queue ──
//
// One generation of pending notification jobs, ordered by fire time.
// `replace` swaps the whole generation atomically and bumps a watch-channel
// generation counter so a consumer blocked on a stale head re-evaluates
// immediately instead of sleeping out the old wait.

use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard, PoisonError};

use chrono::{DateTime, Utc};
use tokio::sync::watch;

use crate::model::NotificationJob;

pub struct DeliveryQueue {
    jobs: Mutex<VecDeque<NotificationJob>>,
    generation: watch::Sender<u64>,
}

impl DeliveryQueue {
    pub fn new() -> Self {
        let (generation, _) = watch::channel(0u64);
        Self {
            jobs: Mutex::new(VecDeque::new()),
            generation,
        }
    }

    /// Install a new generation, discarding every pending job.
    ///
    /// Jobs are stable-sorted by fire time so insertion-order ties survive.
    /// Waiting consumers are woken through the generation counter.
    pub fn replace(&self, mut jobs: Vec<NotificationJob>) {
        jobs.sort_by_key(|job| job.fire_at);
        *self.lock() = jobs.into();
        // `send_modify` updates unconditionally, even with zero receivers.
        self.generation.send_modify(|g| *g += 1);
    }

    /// Fire time of the earliest pending job.
    pub fn next_fire_at(&self) -> Option<DateTime<Utc>> {
        self.lock().front().map(|job| job.fire_at)
    }

    /// Dequeue the head if it is due at `now`.
    pub fn pop_due(&self, now: DateTime<Utc>) -> Option<NotificationJob> {
        let mut jobs = self.lock();
        if jobs.front().is_some_and(|job| job.fire_at <= now) {
            jobs.pop_front()
        } else {
            None
        }
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Subscribe to generation changes (bumped on every `replace`).
    pub fn watch_generation(&self) -> watch::Receiver<u64> {
        self.generation.subscribe()
    }

    pub fn generation(&self) -> u64 {
        *self.generation.borrow()
    }

    /// Copy of the pending jobs, earliest first.
    pub fn pending(&self) -> Vec<NotificationJob> {
        self.lock().iter().cloned().collect()
    }

    fn lock(&self) -> MutexGuard<'_, VecDeque<NotificationJob>> {
        self.jobs.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for DeliveryQueue {
    fn default() -> Self {
        Self::new()
    }
}
