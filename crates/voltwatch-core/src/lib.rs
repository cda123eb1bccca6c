// voltwatch-core: Subscription/event model and notification scheduling
// engine. Sits between the outage feed (voltwatch-feed) and the chat
// transport supplied by the binary.

pub mod config;
pub mod error;
pub mod events;
pub mod messages;
pub mod model;
pub mod queue;
pub mod schedule;
pub mod scheduler;
pub mod store;
pub mod watcher;

#[cfg(test)]
pub(crate) mod testing;

// ── Primary re-exports ──────────────────────────────────────────────
pub use config::ScheduleConfig;
pub use error::CoreError;
pub use events::{EventManager, Notifier};
pub use queue::DeliveryQueue;
pub use schedule::build_schedule;
pub use scheduler::delivery_loop;
pub use store::{JsonSnapshot, SnapshotBackend, SubscriptionSnapshot, SubscriptionStore};
pub use watcher::{OutageSource, OutageWatcher, watch_task};

// Re-export model types at the crate root for ergonomics.
pub use model::{
    EnergyState, EventKey, LeadTime, NotificationJob, Outage, OutageSeverity, PowerState,
    SubscriberId,
};
