// ── Chat commands ──
//
// Parses inbound Telegram texts into bot commands and executes them
// against the event manager and watcher. Non-command chatter is ignored;
// unknown slash-commands get the help text.

use tracing::warn;

use voltwatch_core::messages::EMOJI_WAITING;
use voltwatch_core::model::ALLOWED_LEAD_MINUTES;
use voltwatch_core::{
    EventKey, EventManager, LeadTime, OutageWatcher, SubscriberId, messages,
};

// ── Parsing ─────────────────────────────────────────────────────────

#[derive(Debug, PartialEq, Eq)]
pub enum ChatCommand {
    Start,
    Stop,
    Status,
    Today,
    Notify(Option<String>),
    Subscriptions,
    Help,
}

/// Parse a message text into a command. Returns `None` for plain chatter.
pub fn parse(text: &str) -> Option<ChatCommand> {
    let text = text.trim();
    if !text.starts_with('/') {
        return None;
    }

    let mut parts = text.split_whitespace();
    let command = parts.next()?;
    // Group chats append the bot name: "/status@voltwatch_bot".
    let command = command.split('@').next().unwrap_or(command);

    Some(match command {
        "/start" => ChatCommand::Start,
        "/stop" => ChatCommand::Stop,
        "/status" => ChatCommand::Status,
        "/today" => ChatCommand::Today,
        "/notify" => ChatCommand::Notify(parts.next().map(str::to_owned)),
        "/subscriptions" => ChatCommand::Subscriptions,
        _ => ChatCommand::Help,
    })
}

// ── Execution ───────────────────────────────────────────────────────

/// Execute one inbound message; the returned string is the reply to send.
pub async fn handle(
    events: &EventManager,
    watcher: &OutageWatcher,
    chat: SubscriberId,
    text: &str,
) -> Option<String> {
    let command = parse(text)?;

    let reply = match command {
        ChatCommand::Start => start(events, watcher, chat).await,
        ChatCommand::Stop => stop(events, chat).await,
        ChatCommand::Status => messages::status_line(&watcher.current_status().await),
        ChatCommand::Today => {
            messages::schedule_listing(&watcher.latest().await.unwrap_or_default())
        }
        ChatCommand::Notify(arg) => notify(events, chat, arg.as_deref()).await,
        ChatCommand::Subscriptions => subscriptions(events, chat).await,
        ChatCommand::Help => help_text(),
    };

    Some(reply)
}

async fn start(events: &EventManager, watcher: &OutageWatcher, chat: SubscriberId) -> String {
    if let Err(e) = events.subscribe(chat, &[EventKey::StatusChanged]).await {
        warn!(subscriber = %chat, error = %e, "subscribe failed");
        return "Could not save your subscription, please try again.".into();
    }

    let status = messages::status_line(&watcher.current_status().await);
    format!(
        "You are subscribed to outage updates.\n\
         Use /notify <minutes> for advance warnings, /help for all commands.\n\n{status}"
    )
}

async fn stop(events: &EventManager, chat: SubscriberId) -> String {
    if let Err(e) = events.unsubscribe(chat, None).await {
        warn!(subscriber = %chat, error = %e, "unsubscribe failed");
        return "Could not update your subscription, please try again.".into();
    }
    "You are unsubscribed. Send /start to subscribe again.".into()
}

async fn notify(events: &EventManager, chat: SubscriberId, arg: Option<&str>) -> String {
    let Some(arg) = arg else {
        return notify_usage();
    };

    if arg.eq_ignore_ascii_case("off") {
        let lead_keys: Vec<EventKey> = LeadTime::all_descending()
            .into_iter()
            .map(EventKey::NotifyBefore)
            .collect();
        if let Err(e) = events.unsubscribe(chat, Some(&lead_keys)).await {
            warn!(subscriber = %chat, error = %e, "unsubscribe failed");
            return "Could not update your subscription, please try again.".into();
        }
        return "Advance warnings disabled.".into();
    }

    let Ok(minutes) = arg.parse::<i64>() else {
        return notify_usage();
    };
    let lead = match LeadTime::new(minutes) {
        Ok(lead) => lead,
        Err(_) => return notify_usage(),
    };

    if let Err(e) = events.subscribe(chat, &[EventKey::NotifyBefore(lead)]).await {
        warn!(subscriber = %chat, error = %e, "subscribe failed");
        return "Could not save your subscription, please try again.".into();
    }
    format!("{EMOJI_WAITING} You will be warned {lead} before each outage.")
}

async fn subscriptions(events: &EventManager, chat: SubscriberId) -> String {
    let keys = events.keys_for(chat).await;
    if keys.is_empty() {
        return "You have no subscriptions. Send /start to subscribe.".into();
    }

    let mut text = String::from("Your subscriptions:");
    for key in keys {
        text.push_str(&format!("\n- {key}"));
    }
    text
}

fn notify_usage() -> String {
    let allowed = ALLOWED_LEAD_MINUTES
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ");
    format!("Usage: /notify <minutes> (allowed: {allowed}), or /notify off")
}

fn help_text() -> String {
    "Commands:\n\
     /start - subscribe to outage updates\n\
     /stop - unsubscribe\n\
     /status - current power status\n\
     /today - today's outage schedule\n\
     /notify <minutes> - advance warning before outages\n\
     /subscriptions - list your subscriptions"
        .into()
}
