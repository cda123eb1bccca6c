// ── Domain model ──

mod event_key;
mod job;
mod outage;

pub use event_key::{ALLOWED_LEAD_MINUTES, EventKey, LeadTime};
pub use job::NotificationJob;
pub use outage::{EnergyState, Outage, OutageSeverity, PowerState, current_status};

use std::fmt;

use serde::{Deserialize, Serialize};

/// Opaque numeric identity of a notification recipient (a chat id).
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
#[serde(transparent)]
pub struct SubscriberId(pub i64);

impl fmt::Display for SubscriberId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i64> for SubscriberId {
    fn from(id: i64) -> Self {
        Self(id)
    }
}
