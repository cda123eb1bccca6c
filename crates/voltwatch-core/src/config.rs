// ── Runtime scheduling configuration ──
//
// Tuning knobs for the engine. Built by the binary from its config layer
// and handed in -- core never reads config files.

use std::time::Duration;

use crate::model::LeadTime;

/// Configuration for the scheduling engine and its background tasks.
#[derive(Debug, Clone)]
pub struct ScheduleConfig {
    /// Lead times offered to subscribers and used when building warnings.
    pub lead_times: Vec<LeadTime>,
    /// How often the watcher polls the outage feed.
    pub poll_interval: Duration,
    /// How long the delivery loop dozes when the queue is empty.
    pub idle_poll: Duration,
    /// Lateness beyond which a catch-up delivery is logged as late.
    pub late_tolerance: chrono::Duration,
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            lead_times: LeadTime::all_descending(),
            poll_interval: Duration::from_secs(5 * 60),
            idle_poll: Duration::from_secs(5),
            late_tolerance: chrono::Duration::seconds(60),
        }
    }
}
