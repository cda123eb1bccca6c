//! Configuration for the voltwatch bot.
//!
//! TOML file + `VOLTWATCH_*` environment overrides via figment, bot-token
//! resolution (env var → keyring → plaintext), and translation into the
//! core's `ScheduleConfig`.

use std::path::PathBuf;
use std::time::Duration;

use directories::ProjectDirs;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use voltwatch_core::{LeadTime, ScheduleConfig};

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("no bot token configured (set VOLTWATCH_BOT_TOKEN or [telegram].token)")]
    NoToken,

    #[error("failed to serialize config: {0}")]
    Serialization(#[from] toml::ser::Error),

    #[error("config loading failed: {0}")]
    Figment(Box<figment::Error>),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Figment(Box::new(err))
    }
}

// ── TOML config structs ─────────────────────────────────────────────

/// Top-level TOML configuration.
#[derive(Debug, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub schedule: Schedule,

    #[serde(default)]
    pub notifications: Notifications,

    #[serde(default)]
    pub state: State,

    #[serde(default)]
    pub telegram: Telegram,
}

/// Outage-feed settings.
#[derive(Debug, Deserialize, Serialize)]
pub struct Schedule {
    /// Regional schedule page URL.
    #[serde(default = "default_feed_url")]
    pub url: String,

    /// Minutes between feed polls.
    #[serde(default = "default_poll_minutes")]
    pub poll_minutes: u64,

    /// Request timeout in seconds.
    #[serde(default = "default_timeout")]
    pub timeout: u64,
}

impl Default for Schedule {
    fn default() -> Self {
        Self {
            url: default_feed_url(),
            poll_minutes: default_poll_minutes(),
            timeout: default_timeout(),
        }
    }
}

fn default_feed_url() -> String {
    "https://energy-ua.info/grafik".into()
}
fn default_poll_minutes() -> u64 {
    5
}
fn default_timeout() -> u64 {
    30
}

/// Notification-engine tuning.
#[derive(Debug, Deserialize, Serialize)]
pub struct Notifications {
    /// Lead times offered to subscribers (minutes, from the allowed set).
    #[serde(default = "default_lead_times")]
    pub lead_minutes: Vec<i64>,

    /// Seconds of lateness before a catch-up delivery is logged as late.
    #[serde(default = "default_late_tolerance")]
    pub late_tolerance_secs: i64,
}

impl Default for Notifications {
    fn default() -> Self {
        Self {
            lead_minutes: default_lead_times(),
            late_tolerance_secs: default_late_tolerance(),
        }
    }
}

fn default_lead_times() -> Vec<i64> {
    vec![30, 15, 10, 5]
}
fn default_late_tolerance() -> i64 {
    60
}

/// Where the subscription snapshot lives.
#[derive(Debug, Deserialize, Serialize)]
pub struct State {
    /// Path to the subscriptions JSON file. Defaults next to the config.
    pub path: Option<PathBuf>,
}

impl Default for State {
    fn default() -> Self {
        Self { path: None }
    }
}

/// Telegram transport settings.
#[derive(Debug, Default, Deserialize, Serialize)]
pub struct Telegram {
    /// Bot token (plaintext — prefer the env var or keyring).
    pub token: Option<String>,

    /// Environment variable holding the bot token.
    pub token_env: Option<String>,

    /// getUpdates long-poll timeout in seconds.
    #[serde(default = "default_long_poll")]
    pub long_poll_secs: u64,
}

fn default_long_poll() -> u64 {
    30
}

// ── Paths ───────────────────────────────────────────────────────────

/// Resolve the config file path via XDG / platform conventions.
pub fn config_path() -> PathBuf {
    ProjectDirs::from("io", "voltwatch", "voltwatch").map_or_else(
        || {
            let mut p = dirs_fallback();
            p.push("config.toml");
            p
        },
        |dirs| dirs.config_dir().join("config.toml"),
    )
}

/// Default location of the subscription snapshot.
pub fn default_state_path() -> PathBuf {
    ProjectDirs::from("io", "voltwatch", "voltwatch").map_or_else(
        || {
            let mut p = dirs_fallback();
            p.push("subscriptions.json");
            p
        },
        |dirs| dirs.data_dir().join("subscriptions.json"),
    )
}

fn dirs_fallback() -> PathBuf {
    let mut p = PathBuf::from(std::env::var("HOME").unwrap_or_else(|_| ".".into()));
    p.push(".config");
    p.push("voltwatch");
    p
}

// ── Loading / saving ────────────────────────────────────────────────

/// Load the full Config from file + environment.
pub fn load_config() -> Result<Config, ConfigError> {
    load_config_from(&config_path())
}

/// Load from an explicit file path (still merged with env overrides).
pub fn load_config_from(path: &std::path::Path) -> Result<Config, ConfigError> {
    let figment = Figment::new()
        .merge(Serialized::defaults(Config::default()))
        .merge(Toml::file(path))
        .merge(Env::prefixed("VOLTWATCH_").split("__"));

    let config: Config = figment.extract()?;
    Ok(config)
}

/// Serialize config to TOML and write to the canonical config path.
pub fn save_config(cfg: &Config) -> Result<(), ConfigError> {
    let path = config_path();
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let toml_str = toml::to_string_pretty(cfg)?;
    std::fs::write(&path, toml_str)?;
    Ok(())
}

// ── Token resolution ────────────────────────────────────────────────

/// Resolve the bot token from the credential chain.
pub fn resolve_bot_token(telegram: &Telegram) -> Result<SecretString, ConfigError> {
    // 1. Configured env var, then the conventional one
    if let Some(ref env_name) = telegram.token_env {
        if let Ok(val) = std::env::var(env_name) {
            return Ok(SecretString::from(val));
        }
    }
    if let Ok(val) = std::env::var("VOLTWATCH_BOT_TOKEN") {
        return Ok(SecretString::from(val));
    }

    // 2. System keyring
    if let Ok(entry) = keyring::Entry::new("voltwatch", "bot-token") {
        if let Ok(secret) = entry.get_password() {
            return Ok(SecretString::from(secret));
        }
    }

    // 3. Plaintext in config
    if let Some(ref token) = telegram.token {
        return Ok(SecretString::from(token.clone()));
    }

    Err(ConfigError::NoToken)
}

// ── Translation to core config ──────────────────────────────────────

/// Build the core `ScheduleConfig` from the loaded file.
///
/// Lead-time minutes outside the allowed set are a validation error, not
/// silently dropped -- a typo in the config should be loud.
pub fn to_schedule_config(cfg: &Config) -> Result<ScheduleConfig, ConfigError> {
    let mut lead_times = Vec::with_capacity(cfg.notifications.lead_minutes.len());
    for &minutes in &cfg.notifications.lead_minutes {
        let lead = LeadTime::new(minutes).map_err(|e| ConfigError::Validation {
            field: "notifications.lead_minutes".into(),
            reason: e.to_string(),
        })?;
        lead_times.push(lead);
    }

    if cfg.schedule.poll_minutes == 0 {
        return Err(ConfigError::Validation {
            field: "schedule.poll_minutes".into(),
            reason: "must be at least 1".into(),
        });
    }

    Ok(ScheduleConfig {
        lead_times,
        poll_interval: Duration::from_secs(cfg.schedule.poll_minutes * 60),
        idle_poll: Duration::from_secs(5),
        late_tolerance: chrono_duration_secs(cfg.notifications.late_tolerance_secs),
    })
}

fn chrono_duration_secs(secs: i64) -> chrono::Duration {
    chrono::Duration::seconds(secs.max(0))
}

/// Parse and validate the feed URL.
pub fn feed_url(cfg: &Config) -> Result<url::Url, ConfigError> {
    cfg.schedule
        .url
        .parse()
        .map_err(|_| ConfigError::Validation {
            field: "schedule.url".into(),
            reason: format!("invalid URL: {}", cfg.schedule.url),
        })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn defaults_translate_to_a_valid_schedule_config() {
        let cfg = Config::default();
        let schedule = to_schedule_config(&cfg).unwrap();
        assert_eq!(schedule.poll_interval, Duration::from_secs(300));
        assert_eq!(schedule.lead_times.len(), 4);
    }

    #[test]
    fn invalid_lead_minutes_are_rejected() {
        let mut cfg = Config::default();
        cfg.notifications.lead_minutes = vec![5, 17];
        assert!(matches!(
            to_schedule_config(&cfg),
            Err(ConfigError::Validation { .. })
        ));
    }

    #[test]
    fn zero_poll_interval_is_rejected() {
        let mut cfg = Config::default();
        cfg.schedule.poll_minutes = 0;
        assert!(matches!(
            to_schedule_config(&cfg),
            Err(ConfigError::Validation { .. })
        ));
    }

    #[test]
    fn toml_file_overrides_defaults() {
        figment::Jail::expect_with(|jail| {
            jail.create_file(
                "config.toml",
                r#"
                    [schedule]
                    poll_minutes = 10

                    [notifications]
                    lead_minutes = [15, 5]
                "#,
            )?;

            let cfg = load_config_from(std::path::Path::new("config.toml"))
                .expect("config loads");
            assert_eq!(cfg.schedule.poll_minutes, 10);
            assert_eq!(cfg.notifications.lead_minutes, vec![15, 5]);
            Ok(())
        });
    }

    #[test]
    fn env_overrides_toml() {
        figment::Jail::expect_with(|jail| {
            jail.create_file("config.toml", "[schedule]\npoll_minutes = 10\n")?;
            jail.set_env("VOLTWATCH_SCHEDULE__POLL_MINUTES", "3");

            let cfg = load_config_from(std::path::Path::new("config.toml"))
                .expect("config loads");
            assert_eq!(cfg.schedule.poll_minutes, 3);
            Ok(())
        });
    }

    #[test]
    fn bad_feed_url_is_rejected() {
        let mut cfg = Config::default();
        cfg.schedule.url = "not a url".into();
        assert!(feed_url(&cfg).is_err());
    }
}
