// ── Notification job ──

use chrono::{DateTime, Utc};

use super::EventKey;

/// A single future notification: created in bulk by a reschedule, consumed
/// exactly once by the delivery loop (or discarded when the next reschedule
/// replaces the generation it belongs to).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotificationJob {
    pub key: EventKey,
    /// Rendered message text, ready for the transport.
    pub text: String,
    /// Absolute timestamp at which this job becomes due.
    pub fire_at: DateTime<Utc>,
}

impl NotificationJob {
    pub fn new(key: EventKey, text: impl Into<String>, fire_at: DateTime<Utc>) -> Self {
        Self {
            key,
            text: text.into(),
            fire_at,
        }
    }
}
