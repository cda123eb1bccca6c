// ── Telegram transport ──
//
// Thin client for the Bot API: sendMessage for outbound notifications and
// getUpdates long-polling for inbound chat commands. The token travels in
// the URL path, as the Bot API requires.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::json;
use tracing::debug;
use url::Url;

use voltwatch_core::{CoreError, Notifier, SubscriberId};

use crate::error::BotError;

pub const DEFAULT_API_BASE: &str = "https://api.telegram.org";

// ── Wire types ──────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct ApiResponse<T> {
    ok: bool,
    result: Option<T>,
    description: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct Update {
    pub update_id: i64,
    #[serde(default)]
    pub message: Option<IncomingMessage>,
}

#[derive(Debug, Deserialize)]
pub struct IncomingMessage {
    pub chat: Chat,
    #[serde(default)]
    pub text: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct Chat {
    pub id: i64,
}

// ── Client ──────────────────────────────────────────────────────────

pub struct TelegramApi {
    http: reqwest::Client,
    base: Url,
    token: SecretString,
    long_poll: Duration,
}

impl TelegramApi {
    pub fn new(token: SecretString, long_poll: Duration) -> Result<Self, BotError> {
        let base = DEFAULT_API_BASE.parse().expect("static URL is valid");
        Self::with_base(token, base, long_poll)
    }

    /// Point the client at a non-default API base (local bot-api servers,
    /// tests).
    pub fn with_base(
        token: SecretString,
        base: Url,
        long_poll: Duration,
    ) -> Result<Self, BotError> {
        // The request timeout must outlive a full long-poll cycle.
        let http = reqwest::Client::builder()
            .timeout(long_poll + Duration::from_secs(10))
            .build()?;

        Ok(Self {
            http,
            base,
            token,
            long_poll,
        })
    }

    fn method_url(&self, method: &str) -> Result<Url, BotError> {
        self.base
            .join(&format!("bot{}/{method}", self.token.expose_secret()))
            .map_err(|e| BotError::Telegram {
                reason: format!("bad API URL: {e}"),
            })
    }

    /// POST one Bot API method. Errors arrive as `ok: false` bodies with a
    /// description, sometimes alongside a non-2xx status; the body wins.
    async fn call<T: DeserializeOwned>(
        &self,
        method: &str,
        payload: &serde_json::Value,
    ) -> Result<T, BotError> {
        let url = self.method_url(method)?;
        let response = self.http.post(url).json(payload).send().await?;
        let body: ApiResponse<T> = response.json().await?;

        if !body.ok {
            return Err(BotError::Telegram {
                reason: body
                    .description
                    .unwrap_or_else(|| format!("{method} failed without description")),
            });
        }

        body.result.ok_or_else(|| BotError::Telegram {
            reason: format!("{method} returned an empty result"),
        })
    }

    pub async fn send_message(&self, chat_id: i64, text: &str) -> Result<(), BotError> {
        debug!(chat_id, "sending message");
        self.call::<serde_json::Value>(
            "sendMessage",
            &json!({ "chat_id": chat_id, "text": text }),
        )
        .await?;
        Ok(())
    }

    /// Long-poll for updates after `offset`.
    pub async fn get_updates(&self, offset: i64) -> Result<Vec<Update>, BotError> {
        self.call(
            "getUpdates",
            &json!({
                "offset": offset,
                "timeout": self.long_poll.as_secs(),
                "allowed_updates": ["message"],
            }),
        )
        .await
    }
}

// ── Notifier boundary ───────────────────────────────────────────────

/// Adapts the Telegram client to the core's delivery boundary.
pub struct TelegramNotifier {
    api: Arc<TelegramApi>,
}

impl TelegramNotifier {
    pub fn new(api: Arc<TelegramApi>) -> Self {
        Self { api }
    }
}

#[async_trait]
impl Notifier for TelegramNotifier {
    async fn send(&self, to: SubscriberId, text: &str) -> Result<(), CoreError> {
        self.api
            .send_message(to.0, text)
            .await
            .map_err(|e| CoreError::DeliveryFailed {
                subscriber: to,
                reason: e.to_string(),
            })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn api(server: &MockServer) -> TelegramApi {
        TelegramApi::with_base(
            SecretString::from("TEST"),
            server.uri().parse().unwrap(),
            Duration::from_secs(1),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn send_message_posts_to_the_token_path() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/botTEST/sendMessage"))
            .and(body_partial_json(json!({ "chat_id": 42, "text": "hi" })))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({ "ok": true, "result": { "message_id": 1 } })),
            )
            .expect(1)
            .mount(&server)
            .await;

        api(&server).await.send_message(42, "hi").await.unwrap();
    }

    #[tokio::test]
    async fn api_error_description_is_surfaced() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/botTEST/sendMessage"))
            .respond_with(ResponseTemplate::new(403).set_body_json(json!({
                "ok": false,
                "description": "Forbidden: bot was blocked by the user",
            })))
            .mount(&server)
            .await;

        match api(&server).await.send_message(42, "hi").await {
            Err(BotError::Telegram { reason }) => assert!(reason.contains("blocked")),
            other => panic!("expected telegram error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn get_updates_deserializes_messages() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/botTEST/getUpdates"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "ok": true,
                "result": [{
                    "update_id": 7,
                    "message": { "chat": { "id": 42 }, "text": "/status" },
                }],
            })))
            .mount(&server)
            .await;

        let updates = api(&server).await.get_updates(0).await.unwrap();
        assert_eq!(updates.len(), 1);
        assert_eq!(updates[0].update_id, 7);
        let message = updates[0].message.as_ref().unwrap();
        assert_eq!(message.chat.id, 42);
        assert_eq!(message.text.as_deref(), Some("/status"));
    }

    #[tokio::test]
    async fn blocked_recipient_becomes_a_delivery_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/botTEST/sendMessage"))
            .respond_with(ResponseTemplate::new(403).set_body_json(json!({
                "ok": false,
                "description": "Forbidden",
            })))
            .mount(&server)
            .await;

        let notifier = TelegramNotifier::new(Arc::new(api(&server).await));
        assert!(matches!(
            notifier.send(SubscriberId(42), "hi").await,
            Err(CoreError::DeliveryFailed { .. })
        ));
    }
}
