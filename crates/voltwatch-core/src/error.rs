// ── Core error types ──
//
// User-facing errors from voltwatch-core. These are NOT transport-specific --
// consumers never see HTTP status codes or HTML parse failures directly.
// The feed crate maps its own errors into `FeedUnavailable` at the boundary.

use thiserror::Error;

use crate::model::SubscriberId;

/// Unified error type for the core crate.
#[derive(Debug, Error)]
pub enum CoreError {
    // ── Subscription errors ──────────────────────────────────────────
    #[error("Invalid lead time: {minutes} minutes (allowed: {allowed})")]
    InvalidLeadTime { minutes: i64, allowed: String },

    // ── Feed errors ──────────────────────────────────────────────────
    #[error("Outage feed unavailable: {reason}")]
    FeedUnavailable { reason: String },

    // ── Delivery errors ──────────────────────────────────────────────
    #[error("Delivery to subscriber {subscriber} failed: {reason}")]
    DeliveryFailed {
        subscriber: SubscriberId,
        reason: String,
    },

    // ── Persistence errors ───────────────────────────────────────────
    #[error("Subscription state persistence failed: {reason}")]
    Persistence { reason: String },

    // ── Internal errors ──────────────────────────────────────────────
    #[error("Internal error: {0}")]
    Internal(String),
}
