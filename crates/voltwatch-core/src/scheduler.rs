// ── Delivery loop ──
//
// The single consumer of the DeliveryQueue. Sleeps until the head job is
// due, preempted by either a queue replacement (the generation counter) or
// shutdown. A naive per-head blocking sleep would keep waiting out a stale
// job after a reschedule; re-validating the head after every wakeup is what
// makes replacement safe while a wait is in progress.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::events::EventManager;

/// Run the delivery loop until `cancel` fires.
///
/// Runs for the lifetime of the process; jobs found overdue (process was
/// asleep or restarted) are delivered immediately and logged as late,
/// never dropped.
pub async fn delivery_loop(events: EventManager, cancel: CancellationToken) {
    let queue = Arc::clone(events.queue());
    let mut generation = queue.watch_generation();
    let idle_poll = events.config().idle_poll;
    let late_tolerance = events.config().late_tolerance;

    loop {
        // Mark the current generation seen; `changed()` below then only
        // fires for replacements after this point.
        generation.borrow_and_update();

        let Some(fire_at) = queue.next_fire_at() else {
            tokio::select! {
                biased;
                () = cancel.cancelled() => break,
                _ = generation.changed() => {}
                () = tokio::time::sleep(idle_poll) => {}
            }
            continue;
        };

        let now = Utc::now();
        if fire_at <= now {
            // Re-validate under the queue lock; the head may have been
            // superseded between peek and pop.
            if let Some(job) = queue.pop_due(now) {
                let lateness = now - job.fire_at;
                if lateness > late_tolerance {
                    warn!(
                        key = %job.key,
                        late_secs = lateness.num_seconds(),
                        "delivering overdue notification"
                    );
                }
                debug!(key = %job.key, fire_at = %job.fire_at, "dispatching notification");
                events.deliver(&job).await;
            }
            continue;
        }

        let wait = (fire_at - now).to_std().unwrap_or(Duration::ZERO);
        tokio::select! {
            biased;
            () = cancel.cancelled() => break,
            // The queue was replaced; loop around and re-read the head
            // instead of sleeping out the stale fire time.
            _ = generation.changed() => {}
            () = tokio::time::sleep(wait) => {}
        }
    }

    debug!("delivery loop stopped");
}
