// ── Subscription store ──
//
// Persisted mapping of event key -> subscriber set, plus the global
// subscriber set. Invariant: a subscriber appears in the global set iff it
// holds at least one key; subscribing with an empty key list is a no-op.

mod snapshot;

pub use snapshot::{JsonSnapshot, MemorySnapshot};

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::CoreError;
use crate::model::{EventKey, SubscriberId};

// ── Persisted snapshot ───────────────────────────────────────────────

/// One persisted key entry. The snapshot is keyed by the fixed startup
/// key set ([`EventKey::all`]), so save/load round-trips losslessly.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnapshotEntry {
    pub key: EventKey,
    pub subscribers: BTreeSet<SubscriberId>,
}

/// Durable representation of the full subscription state.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubscriptionSnapshot {
    pub subscribers: BTreeSet<SubscriberId>,
    pub entries: Vec<SnapshotEntry>,
}

/// Durable storage for a [`SubscriptionSnapshot`]. `load` returning
/// `Ok(None)` means "nothing persisted yet".
pub trait SnapshotBackend: Send + Sync {
    fn load(&self) -> Result<Option<SubscriptionSnapshot>, CoreError>;
    fn save(&self, snapshot: &SubscriptionSnapshot) -> Result<(), CoreError>;
}

// ── Store ────────────────────────────────────────────────────────────

/// In-memory subscription state with synchronous write-through persistence.
///
/// Owned exclusively by the [`EventManager`](crate::events::EventManager);
/// every mutation persists before returning.
pub struct SubscriptionStore {
    by_key: BTreeMap<EventKey, BTreeSet<SubscriberId>>,
    subscribers: BTreeSet<SubscriberId>,
    backend: Box<dyn SnapshotBackend>,
}

impl SubscriptionStore {
    /// Open the store, restoring persisted state.
    ///
    /// A missing or corrupt snapshot starts empty and writes a fresh one --
    /// never a fatal startup error.
    pub fn open(backend: Box<dyn SnapshotBackend>) -> Self {
        let mut store = Self {
            by_key: EventKey::all().into_iter().map(|k| (k, BTreeSet::new())).collect(),
            subscribers: BTreeSet::new(),
            backend,
        };

        match store.backend.load() {
            Ok(Some(snapshot)) => {
                store.subscribers = snapshot.subscribers;
                for entry in snapshot.entries {
                    // Keys outside the current fixed set are dropped on load.
                    if let Some(set) = store.by_key.get_mut(&entry.key) {
                        *set = entry.subscribers;
                    }
                }
                debug!(subscribers = store.subscribers.len(), "subscription state restored");
            }
            Ok(None) => {
                if let Err(e) = store.persist() {
                    warn!(error = %e, "failed to write initial subscription snapshot");
                }
            }
            Err(e) => {
                warn!(error = %e, "subscription snapshot unreadable -- starting empty");
                if let Err(e) = store.persist() {
                    warn!(error = %e, "failed to write fresh subscription snapshot");
                }
            }
        }

        store
    }

    /// Add `id` to each key's subscriber set. Idempotent; persists before
    /// returning. An empty `keys` slice changes nothing.
    pub fn subscribe(&mut self, id: SubscriberId, keys: &[EventKey]) -> Result<(), CoreError> {
        if keys.is_empty() {
            return Ok(());
        }
        for key in keys {
            self.key_set_mut(*key).insert(id);
        }
        self.subscribers.insert(id);
        self.persist()
    }

    /// Remove `id` from the given keys, or from everything when `keys` is
    /// `None`. Silent no-op for keys the subscriber never held. Dropping the
    /// last key also drops the global registration.
    pub fn unsubscribe(
        &mut self,
        id: SubscriberId,
        keys: Option<&[EventKey]>,
    ) -> Result<(), CoreError> {
        match keys {
            Some(keys) => {
                for key in keys {
                    self.key_set_mut(*key).remove(&id);
                }
            }
            None => {
                for set in self.by_key.values_mut() {
                    set.remove(&id);
                }
            }
        }

        if !self.by_key.values().any(|set| set.contains(&id)) {
            self.subscribers.remove(&id);
        }
        self.persist()
    }

    /// The keys `id` currently holds.
    pub fn keys_for(&self, id: SubscriberId) -> BTreeSet<EventKey> {
        self.by_key
            .iter()
            .filter(|(_, set)| set.contains(&id))
            .map(|(key, _)| *key)
            .collect()
    }

    /// Subscribers of a single key.
    pub fn subscribers_of(&self, key: EventKey) -> BTreeSet<SubscriberId> {
        self.key_set(key).clone()
    }

    /// Every globally registered subscriber.
    pub fn all_subscribers(&self) -> BTreeSet<SubscriberId> {
        self.subscribers.clone()
    }

    pub fn is_registered(&self, id: SubscriberId) -> bool {
        self.subscribers.contains(&id)
    }

    // ── Private helpers ──────────────────────────────────────────────

    // The fixed key set is installed in `open` and every constructible
    // EventKey is a member, so a miss is a programming error.
    fn key_set(&self, key: EventKey) -> &BTreeSet<SubscriberId> {
        self.by_key
            .get(&key)
            .expect("fixed key set covers every constructible EventKey")
    }

    fn key_set_mut(&mut self, key: EventKey) -> &mut BTreeSet<SubscriberId> {
        self.by_key
            .get_mut(&key)
            .expect("fixed key set covers every constructible EventKey")
    }

    fn to_snapshot(&self) -> SubscriptionSnapshot {
        SubscriptionSnapshot {
            subscribers: self.subscribers.clone(),
            entries: self
                .by_key
                .iter()
                .map(|(key, subscribers)| SnapshotEntry {
                    key: *key,
                    subscribers: subscribers.clone(),
                })
                .collect(),
        }
    }

    fn persist(&self) -> Result<(), CoreError> {
        self.backend.save(&self.to_snapshot())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::model::LeadTime;

    fn memory_store() -> SubscriptionStore {
        SubscriptionStore::open(Box::new(MemorySnapshot::default()))
    }

    fn lead(minutes: i64) -> EventKey {
        EventKey::NotifyBefore(LeadTime::new(minutes).unwrap())
    }

    #[test]
    fn subscribe_registers_globally() {
        let mut store = memory_store();
        let id = SubscriberId(7);
        store.subscribe(id, &[EventKey::StatusChanged]).unwrap();

        assert!(store.is_registered(id));
        assert!(store.subscribers_of(EventKey::StatusChanged).contains(&id));
    }

    #[test]
    fn subscribe_is_idempotent() {
        let mut store = memory_store();
        let id = SubscriberId(7);
        let keys = [EventKey::StatusChanged, lead(5)];
        store.subscribe(id, &keys).unwrap();
        let once = store.keys_for(id);

        store.subscribe(id, &keys).unwrap();
        assert_eq!(store.keys_for(id), once);
        assert_eq!(store.all_subscribers().len(), 1);
    }

    #[test]
    fn subscribe_with_no_keys_does_not_register() {
        let mut store = memory_store();
        store.subscribe(SubscriberId(7), &[]).unwrap();
        assert!(!store.is_registered(SubscriberId(7)));
    }

    #[test]
    fn full_unsubscribe_removes_everywhere() {
        let mut store = memory_store();
        let id = SubscriberId(7);
        store
            .subscribe(id, &[EventKey::StatusChanged, lead(5), lead(30)])
            .unwrap();

        store.unsubscribe(id, None).unwrap();

        assert!(!store.is_registered(id));
        for key in EventKey::all() {
            assert!(!store.subscribers_of(key).contains(&id), "still in {key}");
        }
    }

    #[test]
    fn partial_unsubscribe_keeps_other_keys() {
        let mut store = memory_store();
        let id = SubscriberId(7);
        store.subscribe(id, &[lead(5), lead(10)]).unwrap();

        store.unsubscribe(id, Some(&[lead(5)])).unwrap();

        assert_eq!(store.keys_for(id), [lead(10)].into_iter().collect());
        assert!(store.is_registered(id));
    }

    #[test]
    fn dropping_last_key_drops_global_registration() {
        let mut store = memory_store();
        let id = SubscriberId(7);
        store.subscribe(id, &[lead(5)]).unwrap();

        store.unsubscribe(id, Some(&[lead(5)])).unwrap();
        assert!(!store.is_registered(id));
    }

    #[test]
    fn unsubscribe_unknown_key_is_a_noop() {
        let mut store = memory_store();
        let id = SubscriberId(7);
        store.subscribe(id, &[lead(5)]).unwrap();

        store.unsubscribe(id, Some(&[lead(10)])).unwrap();
        assert_eq!(store.keys_for(id), [lead(5)].into_iter().collect());
    }

    #[test]
    fn state_round_trips_through_the_backend() {
        let backend = MemorySnapshot::default();
        let shared = backend.share();

        let mut store = SubscriptionStore::open(Box::new(backend));
        store
            .subscribe(SubscriberId(1), &[EventKey::StatusChanged, lead(15)])
            .unwrap();
        store.subscribe(SubscriberId(2), &[EventKey::Outage]).unwrap();

        let reopened = SubscriptionStore::open(Box::new(shared));
        assert_eq!(reopened.keys_for(SubscriberId(1)), store.keys_for(SubscriberId(1)));
        assert_eq!(reopened.keys_for(SubscriberId(2)), store.keys_for(SubscriberId(2)));
        assert_eq!(reopened.all_subscribers(), store.all_subscribers());
    }
}
