// ── Message rendering ──
//
// Builds the notification texts the scheduling engine queues and the
// broadcasts the watcher sends. Times are rendered in the host's local
// timezone; the transport delivers the strings verbatim.

use chrono::{DateTime, Duration, Local, Utc};

use crate::model::{EnergyState, LeadTime, Outage, PowerState};

pub const EMOJI_ENERGY: &str = "\u{1f4a1}"; // 💡
pub const EMOJI_OUTAGE: &str = "\u{1f56f}\u{fe0f}"; // 🕯️
pub const EMOJI_WAITING: &str = "\u{23f3}"; // ⏳
pub const EMOJI_SCHEDULE: &str = "\u{23f0}"; // ⏰

/// Render a timestamp as local wall-clock HH:MM.
pub fn clock(at: DateTime<Utc>) -> String {
    at.with_timezone(&Local).format("%H:%M").to_string()
}

/// Render a duration as HH:MM (clamped at zero).
pub fn hours_minutes(d: Duration) -> String {
    let minutes = d.num_minutes().max(0);
    format!("{:02}:{:02}", minutes / 60, minutes % 60)
}

pub fn outage_starts_soon(outage: &Outage, lead: LeadTime) -> String {
    format!(
        "{EMOJI_WAITING} Outage starts at {} (in {lead}), until {} ({})",
        clock(outage.start),
        clock(outage.end),
        outage.duration,
    )
}

pub fn outage_ends_soon(outage: &Outage, lead: LeadTime) -> String {
    format!(
        "{EMOJI_WAITING} Outage ends at {} (in {lead})",
        clock(outage.end),
    )
}

pub fn outage_began(outage: &Outage, next: Option<&Outage>) -> String {
    let mut text = format!(
        "{EMOJI_OUTAGE} Outage! {} - {} ({})",
        clock(outage.start),
        clock(outage.end),
        outage.duration,
    );
    if let Some(next) = next {
        text.push_str(&format!("\nNext outage at {}", clock(next.start)));
    }
    text
}

pub fn outage_ended(outage: &Outage, next: Option<&Outage>) -> String {
    let mut text = format!(
        "{EMOJI_ENERGY} Outage ended at {} ({})",
        clock(outage.end),
        outage.duration,
    );
    match next {
        Some(next) => text.push_str(&format!(
            "\nNext outage at {} (in {})",
            clock(next.start),
            hours_minutes(next.start - outage.end),
        )),
        None => text.push_str("\nNo further outage planned"),
    }
    text
}

pub fn schedule_changed() -> String {
    format!("{EMOJI_SCHEDULE} The outage schedule changed")
}

pub fn status_line(state: &EnergyState) -> String {
    match (state.state, state.next_transition, state.remaining) {
        (PowerState::Active, Some(at), Some(left)) => format!(
            "{EMOJI_OUTAGE} Outage until {} ({} left)",
            clock(at),
            hours_minutes(left),
        ),
        (PowerState::Inactive, Some(at), Some(left)) => format!(
            "{EMOJI_ENERGY} Power is on until {} ({} left)",
            clock(at),
            hours_minutes(left),
        ),
        _ => format!("{EMOJI_ENERGY} Power is on, no outage planned"),
    }
}

/// One line per outage, for the "today's schedule" listing.
pub fn schedule_listing(outages: &[Outage]) -> String {
    if outages.is_empty() {
        return format!("{EMOJI_ENERGY} No outages scheduled");
    }
    let mut text = format!("{EMOJI_SCHEDULE} Outage schedule:\n");
    for outage in outages {
        text.push_str(&format!(
            "\n{EMOJI_OUTAGE} {} - {} ({})",
            clock(outage.start),
            clock(outage.end),
            outage.duration,
        ));
    }
    text
}
