// ── Reschedule algorithm ──
//
// Pure translation of an ordered outage list into one generation of
// notification jobs. Lead times that have already elapsed are skipped,
// never negative-clamped: no job is ever emitted with a fire time before
// `now`.

use chrono::{DateTime, Utc};

use crate::messages;
use crate::model::{EventKey, LeadTime, NotificationJob, Outage};

/// Build the notification jobs for one reschedule generation.
///
/// `outages` must be ordered by start time (guaranteed by the feed).
/// `lead_times` are evaluated largest to smallest so the resulting jobs
/// for one transition already stand in chronological order; a final
/// stable sort merges the per-outage runs (ties keep insertion order).
///
/// When one outage ends exactly as the next begins, the earlier outage's
/// Restored job is emitted first and the tie keeps that order: subscribers
/// read "ended" before "began" at the shared instant.
pub fn build_schedule(
    now: DateTime<Utc>,
    outages: &[Outage],
    lead_times: &[LeadTime],
) -> Vec<NotificationJob> {
    let mut leads: Vec<LeadTime> = lead_times.to_vec();
    leads.sort_unstable_by(|a, b| b.cmp(a));

    let mut jobs = Vec::new();

    for (i, outage) in outages.iter().enumerate() {
        let next = outages.get(i + 1);

        // Warnings and the "began" transition for a future start.
        if now < outage.start {
            for &lead in &leads {
                let fire_at = outage.start - lead.to_duration();
                if fire_at >= now {
                    jobs.push(NotificationJob::new(
                        EventKey::NotifyBefore(lead),
                        messages::outage_starts_soon(outage, lead),
                        fire_at,
                    ));
                }
            }
            jobs.push(NotificationJob::new(
                EventKey::Outage,
                messages::outage_began(outage, next),
                outage.start,
            ));
        }

        // Warnings and the "ended" transition for a pending end.
        if now <= outage.end {
            for &lead in &leads {
                let fire_at = outage.end - lead.to_duration();
                if fire_at >= now {
                    jobs.push(NotificationJob::new(
                        EventKey::NotifyBefore(lead),
                        messages::outage_ends_soon(outage, lead),
                        fire_at,
                    ));
                }
            }
            jobs.push(NotificationJob::new(
                EventKey::Restored,
                messages::outage_ended(outage, next),
                outage.end,
            ));
        }
    }

    // sort_by_key is stable: equal fire times keep insertion order.
    jobs.sort_by_key(|job| job.fire_at);
    jobs
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::model::OutageSeverity;
    use chrono::TimeZone;

    fn at(hour: u32, minute: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 8, 30, hour, minute, 0).unwrap()
    }

    fn outage(start: DateTime<Utc>, end: DateTime<Utc>) -> Outage {
        Outage {
            severity: OutageSeverity::Confirmed,
            start,
            end,
            duration: "2 hours".into(),
        }
    }

    fn leads() -> Vec<LeadTime> {
        LeadTime::all_descending()
    }

    #[test]
    fn fire_times_are_non_decreasing() {
        let outages = vec![
            outage(at(10, 0), at(12, 0)),
            outage(at(14, 0), at(16, 30)),
            outage(at(20, 0), at(22, 0)),
        ];
        let jobs = build_schedule(at(8, 0), &outages, &leads());

        assert!(!jobs.is_empty());
        for pair in jobs.windows(2) {
            assert!(pair[0].fire_at <= pair[1].fire_at);
        }
    }

    #[test]
    fn no_job_fires_in_the_past() {
        let now = at(9, 50);
        let jobs = build_schedule(now, &[outage(at(10, 0), at(12, 0))], &leads());
        for job in &jobs {
            assert!(job.fire_at >= now, "{:?} fires before now", job.key);
        }
    }

    // Outage 10:00-12:00, now 09:50. The 5-minute
    // warning fires at 09:55 and the transition at 10:00; a 30-minute
    // warning would have had to fire at 09:30 and is skipped.
    #[test]
    fn elapsed_lead_times_are_skipped() {
        let now = at(9, 50);
        let jobs = build_schedule(now, &[outage(at(10, 0), at(12, 0))], &leads());

        let five = LeadTime::new(5).unwrap();
        let thirty = LeadTime::new(30).unwrap();

        assert!(jobs.iter().any(|j| j.key == EventKey::NotifyBefore(five)
            && j.fire_at == at(9, 55)));
        assert!(jobs.iter().any(|j| j.key == EventKey::Outage && j.fire_at == at(10, 0)));
        assert!(
            !jobs
                .iter()
                .any(|j| j.key == EventKey::NotifyBefore(thirty) && j.fire_at < at(10, 0)),
            "a 30-minute start warning would already have elapsed"
        );
    }

    #[test]
    fn mid_outage_schedules_only_the_end_side() {
        let now = at(11, 0);
        let jobs = build_schedule(now, &[outage(at(10, 0), at(12, 0))], &leads());

        assert!(jobs.iter().all(|j| j.key != EventKey::Outage));
        assert!(jobs.iter().any(|j| j.key == EventKey::Restored && j.fire_at == at(12, 0)));
        // All four end-side warnings still fit.
        let warnings = jobs
            .iter()
            .filter(|j| matches!(j.key, EventKey::NotifyBefore(_)))
            .count();
        assert_eq!(warnings, 4);
    }

    #[test]
    fn fully_past_outages_produce_nothing() {
        let jobs = build_schedule(at(13, 0), &[outage(at(10, 0), at(12, 0))], &leads());
        assert!(jobs.is_empty());
    }

    #[test]
    fn empty_outage_list_produces_empty_schedule() {
        assert!(build_schedule(at(10, 0), &[], &leads()).is_empty());
    }

    #[test]
    fn back_to_back_outages_announce_ended_before_began() {
        let outages = vec![outage(at(10, 0), at(12, 0)), outage(at(12, 0), at(14, 0))];
        let jobs = build_schedule(at(9, 0), &outages, &leads());

        let at_noon: Vec<EventKey> = jobs
            .iter()
            .filter(|j| j.fire_at == at(12, 0))
            .map(|j| j.key)
            .collect();
        assert_eq!(at_noon, vec![EventKey::Restored, EventKey::Outage]);
    }

    #[test]
    fn ended_transition_mentions_the_next_outage() {
        let outages = vec![outage(at(10, 0), at(12, 0)), outage(at(15, 0), at(17, 0))];
        let jobs = build_schedule(at(9, 0), &outages, &leads());

        let ended = jobs
            .iter()
            .find(|j| j.key == EventKey::Restored && j.fire_at == at(12, 0))
            .unwrap();
        assert!(ended.text.contains("Next outage at"));

        let last_ended = jobs
            .iter()
            .find(|j| j.key == EventKey::Restored && j.fire_at == at(17, 0))
            .unwrap();
        assert!(last_ended.text.contains("No further outage planned"));
    }
}
