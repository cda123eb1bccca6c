// ── Application wiring ──
//
// Builds the component graph from config and runs the three background
// loops: feed watcher, notification delivery, and inbound chat updates.
// Shutdown is cooperative via one shared cancellation token.

use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use voltwatch_config as config;
use voltwatch_core::{
    EventManager, JsonSnapshot, OutageWatcher, SubscriberId, SubscriptionStore,
    delivery_loop, messages, model::current_status, watch_task,
};
use voltwatch_feed::{FeedClient, FeedConfig};

use crate::chat;
use crate::cli::GlobalOpts;
use crate::error::BotError;
use crate::telegram::{TelegramApi, TelegramNotifier};

/// Load config, apply CLI overrides on top.
fn load(global: &GlobalOpts) -> Result<config::Config, BotError> {
    let mut cfg = match &global.config {
        Some(path) => config::load_config_from(path)?,
        None => config::load_config()?,
    };

    if let Some(ref url) = global.url {
        cfg.schedule.url.clone_from(url);
    }
    if let Some(poll) = global.poll_minutes {
        cfg.schedule.poll_minutes = poll;
    }
    if let Some(ref state) = global.state {
        cfg.state.path = Some(state.clone());
    }

    Ok(cfg)
}

fn feed_client(cfg: &config::Config) -> Result<FeedClient, BotError> {
    let mut feed_config = FeedConfig::new(config::feed_url(cfg)?);
    feed_config.timeout = Duration::from_secs(cfg.schedule.timeout);
    FeedClient::new(feed_config).map_err(Into::into)
}

// ── run ─────────────────────────────────────────────────────────────

pub async fn run(global: &GlobalOpts) -> Result<(), BotError> {
    let cfg = load(global)?;
    let schedule_config = config::to_schedule_config(&cfg)?;
    let token = config::resolve_bot_token(&cfg.telegram)?;
    let feed = feed_client(&cfg)?;

    let state_path = cfg
        .state
        .path
        .clone()
        .unwrap_or_else(config::default_state_path);
    info!(path = %state_path.display(), "loading subscriptions");
    let store = SubscriptionStore::open(Box::new(JsonSnapshot::new(state_path)));

    let api = Arc::new(TelegramApi::new(
        token,
        Duration::from_secs(cfg.telegram.long_poll_secs),
    )?);
    let notifier = Arc::new(TelegramNotifier::new(Arc::clone(&api)));

    let poll_interval = schedule_config.poll_interval;
    let events = EventManager::new(store, notifier, schedule_config);
    let watcher = Arc::new(OutageWatcher::new(feed.into_source(), events.clone()));

    let cancel = CancellationToken::new();
    let watch = tokio::spawn(watch_task(
        Arc::clone(&watcher),
        poll_interval,
        cancel.clone(),
    ));
    let deliver = tokio::spawn(delivery_loop(events.clone(), cancel.clone()));
    let updates = tokio::spawn(updates_loop(
        api,
        events,
        Arc::clone(&watcher),
        cancel.clone(),
    ));

    info!("voltwatch running, Ctrl-C to stop");
    tokio::signal::ctrl_c().await?;
    info!("shutting down");
    cancel.cancel();

    let _ = tokio::join!(watch, deliver, updates);
    Ok(())
}

/// Long-poll Telegram for inbound messages and answer chat commands.
async fn updates_loop(
    api: Arc<TelegramApi>,
    events: EventManager,
    watcher: Arc<OutageWatcher>,
    cancel: CancellationToken,
) {
    let mut offset = 0_i64;

    loop {
        tokio::select! {
            biased;
            () = cancel.cancelled() => break,
            result = api.get_updates(offset) => match result {
                Ok(updates) => {
                    for update in updates {
                        offset = offset.max(update.update_id + 1);

                        let Some(message) = update.message else { continue };
                        let Some(text) = message.text else { continue };
                        let chat_id = SubscriberId(message.chat.id);

                        let Some(reply) =
                            chat::handle(&events, &watcher, chat_id, &text).await
                        else {
                            continue;
                        };
                        if let Err(e) = api.send_message(message.chat.id, &reply).await {
                            warn!(chat = %chat_id, error = %e, "reply failed");
                        }
                    }
                }
                Err(e) => {
                    warn!(error = %e, "getUpdates failed, backing off");
                    tokio::time::sleep(Duration::from_secs(5)).await;
                }
            }
        }
    }

    debug!("update loop stopped");
}

// ── check ───────────────────────────────────────────────────────────

/// One-shot fetch: print the current status and today's schedule.
pub async fn check(global: &GlobalOpts) -> Result<(), BotError> {
    let cfg = load(global)?;
    let feed = feed_client(&cfg)?;

    let outages = feed.fetch_schedule().await?;
    let state = current_status(chrono::Utc::now(), &outages);

    println!("{}", messages::status_line(&state));
    println!();
    println!("{}", messages::schedule_listing(&outages));
    Ok(())
}

// ── config ──────────────────────────────────────────────────────────

pub fn config_path(global: &GlobalOpts) -> std::path::PathBuf {
    global
        .config
        .clone()
        .unwrap_or_else(config::config_path)
}

pub fn config_init() -> Result<(), BotError> {
    let path = config::config_path();
    if path.exists() {
        println!("Config already exists at {}", path.display());
        return Ok(());
    }

    config::save_config(&config::Config::default())?;
    println!("Wrote default config to {}", path.display());
    Ok(())
}
