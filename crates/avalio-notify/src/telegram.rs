//! Telegram notificator — posts to the Bot API on health edges only.
//!
//! `NotAvailable` and `Recovered` produce a `sendMessage` call;
//! `Available` and `StillNotAvailable` are dropped silently.

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;
use tracing::debug;

use avalio_core::config::{DEFAULT_TELEGRAM_API_URL, TelegramNotificatorConfig};
use avalio_core::{CheckResult, ResourceState};

use crate::error::{NotifyError, NotifyResult};
use crate::notificator::Notificator;

const SEND_TIMEOUT: Duration = Duration::from_secs(10);

/// Body of every Bot API response.
#[derive(Debug, Deserialize)]
struct TelegramResponse {
    ok: bool,
    #[serde(default)]
    description: String,
}

pub struct TelegramNotificator {
    name: String,
    chat_id: String,
    token: String,
    api_url: String,
    client: reqwest::Client,
}

impl TelegramNotificator {
    pub fn new(
        name: impl Into<String>,
        chat_id: impl Into<String>,
        token: impl Into<String>,
    ) -> NotifyResult<Self> {
        let client = reqwest::Client::builder().timeout(SEND_TIMEOUT).build()?;
        Ok(Self {
            name: name.into(),
            chat_id: chat_id.into(),
            token: token.into(),
            api_url: DEFAULT_TELEGRAM_API_URL.to_string(),
            client,
        })
    }

    pub fn from_config(config: &TelegramNotificatorConfig) -> NotifyResult<Self> {
        Ok(Self::new(&config.name, &config.chat_id, &config.token)?.with_api_url(config.api_url()))
    }

    /// Point at a different Bot API server.
    pub fn with_api_url(mut self, api_url: &str) -> Self {
        self.api_url = api_url.trim_end_matches('/').to_string();
        self
    }

    async fn send_message(&self, text: &str) -> NotifyResult<()> {
        let url = format!("{}/bot{}/sendMessage", self.api_url, self.token);
        let body = json!({
            "chat_id": self.chat_id,
            "text": text,
            "parse_mode": "Markdown",
        });

        // The request URL carries the bot token; keep it out of errors.
        let resp = self
            .client
            .post(url)
            .json(&body)
            .send()
            .await
            .map_err(|e| NotifyError::Http(e.without_url()))?;

        let parsed: TelegramResponse = resp
            .json()
            .await
            .map_err(|e| NotifyError::Http(e.without_url()))?;

        if !parsed.ok {
            return Err(NotifyError::Api(parsed.description));
        }
        Ok(())
    }
}

/// Message text for a result, or `None` when it does not warrant one.
pub fn render_message(result: &CheckResult) -> Option<String> {
    if !result.state.is_edge() {
        return None;
    }
    if result.state == ResourceState::Recovered {
        return Some(format!(
            "✅ Resource `{}` is available again.",
            result.resource_name
        ));
    }
    let mut text = format!(
        "❌ Resource `{}` is not available.\n\nCheck kind: `{}`\n",
        result.resource_name, result.resource_kind
    );
    text.push_str(&result.details_as_string());
    Some(text)
}

#[async_trait]
impl Notificator for TelegramNotificator {
    fn name(&self) -> &str {
        &self.name
    }

    fn kind(&self) -> &str {
        "telegram"
    }

    async fn deliver(&self, result: &CheckResult) -> NotifyResult<()> {
        let Some(text) = render_message(result) else {
            return Ok(());
        };
        debug!(
            notificator = %self.name,
            resource = %result.resource_name,
            state = %result.state,
            "sending telegram message"
        );
        self.send_message(&text).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use avalio_core::CheckDetail;

    fn result(state: ResourceState) -> CheckResult {
        CheckResult {
            resource_name: "site".to_string(),
            resource_kind: "http".to_string(),
            monitor_name: "m".to_string(),
            state,
            details: vec![
                CheckDetail::new("reason", "unexpected response status"),
                CheckDetail::new("status", "502"),
            ],
            checked_at: chrono::Utc::now(),
        }
    }

    #[test]
    fn not_available_message_lists_details() {
        let text = render_message(&result(ResourceState::NotAvailable)).unwrap();
        assert_eq!(
            text,
            "❌ Resource `site` is not available.\n\n\
             Check kind: `http`\n\
             reason: unexpected response status\n\
             status: 502\n"
        );
    }

    #[test]
    fn recovered_message() {
        let text = render_message(&result(ResourceState::Recovered)).unwrap();
        assert_eq!(text, "✅ Resource `site` is available again.");
    }

    #[test]
    fn steady_states_are_silent() {
        assert!(render_message(&result(ResourceState::Available)).is_none());
        assert!(render_message(&result(ResourceState::StillNotAvailable)).is_none());
    }

    #[test]
    fn from_config_uses_default_api() {
        let config = TelegramNotificatorConfig {
            name: "bot".to_string(),
            chat_id: "42".to_string(),
            token: "t".to_string(),
            api_url: None,
        };
        let bot = TelegramNotificator::from_config(&config).unwrap();
        assert_eq!(bot.name(), "bot");
        assert_eq!(bot.kind(), "telegram");
        assert_eq!(bot.api_url, DEFAULT_TELEGRAM_API_URL);
    }

    #[test]
    fn api_url_trailing_slash_trimmed() {
        let bot = TelegramNotificator::new("bot", "42", "t")
            .unwrap()
            .with_api_url("http://localhost:8081/");
        assert_eq!(bot.api_url, "http://localhost:8081");
    }
}
