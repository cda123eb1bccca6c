// ── Schedule page parsing ──
//
// The feed publishes the schedule as an HTML list; each row carries a
// traffic-light css class (`clock_info_red` / `_yellow` / `_green`) and
// three bold spans: start time, end time, and a duration label. Green
// rows mean power is available and are not outages.

use std::sync::LazyLock;

use chrono::{DateTime, Local, NaiveDate, NaiveTime, TimeZone, Utc};
use regex::Regex;
use tracing::debug;

use voltwatch_core::{Outage, OutageSeverity};

use crate::error::FeedError;

const ROW_MARKER: &str = "grafik_string_list_item";

static COLOR_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"clock_info_([a-z]+)").expect("static regex is valid")
});

static BOLD_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"<b>([^<]+)</b>").expect("static regex is valid")
});

/// Parse one schedule page into the outage list for `date`.
///
/// Wall-clock times on the page are interpreted in the host's local
/// timezone (the schedule is regional). Intervals that run past midnight
/// end on the following day. Rows that do not match the expected shape
/// are skipped, not fatal; a page with no recognizable schedule container
/// is an error.
pub fn parse_schedule(html: &str, date: NaiveDate) -> Result<Vec<Outage>, FeedError> {
    if !html.contains(ROW_MARKER) {
        return Err(FeedError::Parse {
            reason: "no schedule rows found on page".into(),
        });
    }

    let mut outages = Vec::new();

    for chunk in html.split(ROW_MARKER).skip(1) {
        let Some(color) = COLOR_RE.captures(chunk).map(|c| c[1].to_owned()) else {
            continue;
        };

        let severity = match color.as_str() {
            "red" => OutageSeverity::Confirmed,
            "yellow" => OutageSeverity::Possible,
            // Green rows are "power available" fillers.
            _ => continue,
        };

        let bolds: Vec<&str> = BOLD_RE
            .captures_iter(chunk)
            .filter_map(|c| c.get(1).map(|m| m.as_str().trim()))
            .collect();
        let [start_raw, end_raw, duration, ..] = bolds.as_slice() else {
            debug!(color, "skipping malformed schedule row");
            continue;
        };

        let start = local_timestamp(date, start_raw)?;
        let mut end = local_timestamp(date, end_raw)?;
        if end <= start {
            // Interval crosses midnight.
            end += chrono::Duration::days(1);
        }

        outages.push(Outage {
            severity,
            start,
            end,
            duration: (*duration).to_owned(),
        });
    }

    outages.sort_by_key(|o| o.start);
    Ok(outages)
}

fn local_timestamp(date: NaiveDate, raw: &str) -> Result<DateTime<Utc>, FeedError> {
    let time = NaiveTime::parse_from_str(raw, "%H:%M").map_err(|e| FeedError::Parse {
        reason: format!("bad time '{raw}': {e}"),
    })?;

    let naive = date.and_time(time);
    Local
        .from_local_datetime(&naive)
        .earliest()
        .map(|local| local.with_timezone(&Utc))
        .ok_or_else(|| FeedError::Parse {
            reason: format!("unrepresentable local time '{raw}' on {date}"),
        })
}
