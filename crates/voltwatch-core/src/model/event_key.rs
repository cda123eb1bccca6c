// ── Event keys ──
//
// The fixed set of things a subscriber can sign up for. The key set is
// known at startup: three plain kinds plus NotifyBefore crossed with the
// allowed lead-time minutes.

use std::fmt;

use chrono::Duration;
use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// Lead-time minutes a subscriber may choose for advance warnings.
pub const ALLOWED_LEAD_MINUTES: [i64; 4] = [5, 10, 15, 30];

/// A validated number of minutes before a transition at which a warning
/// notification fires. Only values from [`ALLOWED_LEAD_MINUTES`] exist.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(try_from = "i64", into = "i64")]
pub struct LeadTime(i64);

impl LeadTime {
    /// Validate a user-supplied minute value against the allowed set.
    pub fn new(minutes: i64) -> Result<Self, CoreError> {
        if ALLOWED_LEAD_MINUTES.contains(&minutes) {
            Ok(Self(minutes))
        } else {
            Err(CoreError::InvalidLeadTime {
                minutes,
                allowed: ALLOWED_LEAD_MINUTES
                    .iter()
                    .map(ToString::to_string)
                    .collect::<Vec<_>>()
                    .join(", "),
            })
        }
    }

    pub fn minutes(self) -> i64 {
        self.0
    }

    pub fn to_duration(self) -> Duration {
        Duration::minutes(self.0)
    }

    /// All allowed lead times, largest first (the evaluation order the
    /// scheduling algorithm uses).
    pub fn all_descending() -> Vec<Self> {
        let mut values: Vec<Self> = ALLOWED_LEAD_MINUTES.iter().map(|&m| Self(m)).collect();
        values.sort_unstable_by(|a, b| b.cmp(a));
        values
    }
}

impl TryFrom<i64> for LeadTime {
    type Error = String;

    fn try_from(minutes: i64) -> Result<Self, Self::Error> {
        Self::new(minutes).map_err(|e| e.to_string())
    }
}

impl From<LeadTime> for i64 {
    fn from(lead: LeadTime) -> Self {
        lead.minutes()
    }
}

impl fmt::Display for LeadTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} min", self.0)
    }
}

/// A subscribable event. Equality and ordering cover the full value --
/// `NotifyBefore(5)` and `NotifyBefore(10)` are distinct keys.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum EventKey {
    /// An outage interval began.
    Outage,
    /// An outage interval ended.
    Restored,
    /// The published schedule (or derived status) changed.
    StatusChanged,
    /// Advance warning a configurable number of minutes before a transition.
    NotifyBefore(LeadTime),
}

impl EventKey {
    /// The fixed key set known at startup: plain kinds plus the
    /// NotifyBefore x allowed-minutes cross product.
    pub fn all() -> Vec<Self> {
        let mut keys = vec![Self::Outage, Self::Restored, Self::StatusChanged];
        keys.extend(ALLOWED_LEAD_MINUTES.iter().map(|&m| Self::NotifyBefore(LeadTime(m))));
        keys
    }

    pub fn lead_time(self) -> Option<LeadTime> {
        match self {
            Self::NotifyBefore(lead) => Some(lead),
            _ => None,
        }
    }
}

impl fmt::Display for EventKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Outage => write!(f, "outage"),
            Self::Restored => write!(f, "restored"),
            Self::StatusChanged => write!(f, "status changed"),
            Self::NotifyBefore(lead) => write!(f, "warn {lead} ahead"),
        }
    }
}
