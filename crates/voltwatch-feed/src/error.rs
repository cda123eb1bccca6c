use thiserror::Error;

use voltwatch_core::CoreError;

/// Error type for the feed crate.
///
/// The watcher never sees these directly -- the `From` impl collapses them
/// into `CoreError::FeedUnavailable` at the boundary.
#[derive(Debug, Error)]
pub enum FeedError {
    #[error("HTTP transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Feed returned HTTP {status}")]
    Status { status: u16 },

    #[error("Schedule page unparseable: {reason}")]
    Parse { reason: String },

    #[error("Invalid feed URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
}

impl From<FeedError> for CoreError {
    fn from(err: FeedError) -> Self {
        CoreError::FeedUnavailable {
            reason: err.to_string(),
        }
    }
}
