// voltwatch-feed: fetches and parses the public outage-schedule page.
// The core only ever sees this crate through the `OutageSource` trait.

pub mod client;
pub mod error;
pub mod parse;

pub use client::{FeedClient, FeedConfig};
pub use error::FeedError;
