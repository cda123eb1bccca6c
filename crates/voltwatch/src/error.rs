//! Binary error types with miette diagnostics.
//!
//! Wraps config, feed, and core errors into user-facing diagnostics with
//! actionable help text and stable exit codes.

use miette::Diagnostic;
use thiserror::Error;

use voltwatch_config::ConfigError;
use voltwatch_core::CoreError;
use voltwatch_feed::FeedError;

pub mod exit_code {
    pub const GENERAL: i32 = 1;
    pub const USAGE: i32 = 2;
    pub const AUTH: i32 = 3;
    pub const CONNECTION: i32 = 7;
}

#[derive(Debug, Error, Diagnostic)]
pub enum BotError {
    // ── Credentials ──────────────────────────────────────────────────

    #[error("No Telegram bot token configured")]
    #[diagnostic(
        code(voltwatch::no_token),
        help(
            "Set the VOLTWATCH_BOT_TOKEN environment variable,\n\
             or add [telegram].token to your config file.\n\
             Config location: voltwatch config path"
        )
    )]
    NoToken,

    // ── Configuration ────────────────────────────────────────────────

    #[error("Invalid value for {field}: {reason}")]
    #[diagnostic(code(voltwatch::validation))]
    Validation { field: String, reason: String },

    #[error(transparent)]
    #[diagnostic(code(voltwatch::config))]
    Config(ConfigError),

    // ── Network ──────────────────────────────────────────────────────

    #[error("Could not reach the outage-schedule feed")]
    #[diagnostic(
        code(voltwatch::feed_unreachable),
        help("Check the [schedule].url setting and your network connection.")
    )]
    Feed(#[source] FeedError),

    #[error("Telegram API request failed: {reason}")]
    #[diagnostic(
        code(voltwatch::telegram),
        help("Verify the bot token and that api.telegram.org is reachable.")
    )]
    Telegram { reason: String },

    // ── Core / IO ────────────────────────────────────────────────────

    #[error(transparent)]
    #[diagnostic(code(voltwatch::core))]
    Core(#[from] CoreError),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl From<ConfigError> for BotError {
    fn from(err: ConfigError) -> Self {
        match err {
            ConfigError::NoToken => Self::NoToken,
            ConfigError::Validation { field, reason } => Self::Validation { field, reason },
            other => Self::Config(other),
        }
    }
}

impl From<FeedError> for BotError {
    fn from(err: FeedError) -> Self {
        Self::Feed(err)
    }
}

impl From<reqwest::Error> for BotError {
    fn from(err: reqwest::Error) -> Self {
        Self::Telegram {
            reason: err.to_string(),
        }
    }
}

impl BotError {
    /// Map this error to an exit code for process termination.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::NoToken => exit_code::AUTH,
            Self::Validation { .. } => exit_code::USAGE,
            Self::Feed(_) | Self::Telegram { .. } => exit_code::CONNECTION,
            _ => exit_code::GENERAL,
        }
    }
}
