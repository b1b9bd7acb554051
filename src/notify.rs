use async_trait::async_trait;
use reqwest::Client;
use tracing::warn;

use crate::config::AppConfig;
use crate::types::{NewsletterError, Result};

/// Operational notification port. Best-effort by contract: call sites go
/// through [`notify_best_effort`], which swallows any failure.
#[async_trait]
pub trait Notify: Send + Sync {
    async fn notify(&self, message: &str) -> Result<()>;
}

/// Telegram bot notifier. Credentials are checked on first use, so a process
/// without them still starts; every notification then fails (and is
/// swallowed) with a descriptive error.
pub struct TelegramNotifier {
    client: Client,
    credentials: Option<(String, String)>,
}

impl TelegramNotifier {
    pub fn from_config(config: &AppConfig) -> Self {
        let credentials = config
            .telegram_bot_token
            .clone()
            .zip(config.telegram_chat_id.clone());
        Self {
            client: Client::new(),
            credentials,
        }
    }
}

#[async_trait]
impl Notify for TelegramNotifier {
    async fn notify(&self, message: &str) -> Result<()> {
        let (token, chat_id) = self
            .credentials
            .as_ref()
            .ok_or(NewsletterError::Config("TELEGRAM_BOT_TOKEN"))?;

        let url = format!("https://api.telegram.org/bot{token}/sendMessage");
        self.client
            .post(&url)
            .json(&serde_json::json!({ "chat_id": chat_id, "text": message }))
            .send()
            .await?
            .error_for_status()?;
        Ok(())
    }
}

/// Fire a notification and log instead of propagating on failure, so the
/// notifier can never mask the pipeline's own outcome.
pub async fn notify_best_effort(notifier: &dyn Notify, message: &str) {
    if let Err(err) = notifier.notify(message).await {
        warn!("Notification failed: {}", err);
    }
}
