// ── Outage interval and derived status types ──

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// How certain the published schedule is about an interval.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[non_exhaustive]
pub enum OutageSeverity {
    /// The feed marks this interval as a definite outage.
    Confirmed,
    /// The feed marks this interval as a possible outage.
    Possible,
}

/// A contiguous time range during which power is (expected to be) out.
///
/// Lists of outages are ordered by `start` and non-overlapping; both are
/// guaranteed by the feed, not enforced here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Outage {
    pub severity: OutageSeverity,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    /// Pre-rendered duration string from the feed (e.g. "2 hours").
    pub duration: String,
}

impl Outage {
    pub fn contains(&self, at: DateTime<Utc>) -> bool {
        self.start <= at && at <= self.end
    }
}

/// Whether an outage is currently in progress.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PowerState {
    /// An outage interval contains `now`.
    Active,
    /// No outage interval contains `now`.
    Inactive,
}

/// Derived current status: state plus the next transition, if any.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnergyState {
    pub state: PowerState,
    /// When the state next flips. `None` when nothing is scheduled.
    pub next_transition: Option<DateTime<Utc>>,
    /// Time left until `next_transition`.
    pub remaining: Option<Duration>,
}

/// Locate the first outage whose interval contains `now`, or the first one
/// starting after `now`. With neither, the state is Inactive with no
/// upcoming transition.
pub fn current_status(now: DateTime<Utc>, outages: &[Outage]) -> EnergyState {
    for outage in outages {
        if outage.contains(now) {
            return EnergyState {
                state: PowerState::Active,
                next_transition: Some(outage.end),
                remaining: Some(outage.end - now),
            };
        }
        if now < outage.start {
            return EnergyState {
                state: PowerState::Inactive,
                next_transition: Some(outage.start),
                remaining: Some(outage.start - now),
            };
        }
    }

    EnergyState {
        state: PowerState::Inactive,
        next_transition: None,
        remaining: None,
    }
}
