use std::env;

use crate::types::{NewsletterError, Result};

pub const DEFAULT_PORT: u16 = 3001;
pub const DEFAULT_MODEL: &str = "gpt-5.1";

/// Process configuration, read once from the environment.
///
/// Credentials are kept optional here on purpose: a missing value only
/// becomes an error when the component that needs it is built, so the HTTP
/// surface can start (and report healthy) without a full set of secrets.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: Option<String>,
    pub openai_api_key: Option<String>,
    pub openai_model: String,
    pub smtp_host: Option<String>,
    pub smtp_username: Option<String>,
    pub smtp_password: Option<String>,
    pub email_from: Option<String>,
    pub telegram_bot_token: Option<String>,
    pub telegram_chat_id: Option<String>,
    pub port: u16,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            database_url: None,
            openai_api_key: None,
            openai_model: DEFAULT_MODEL.to_string(),
            smtp_host: None,
            smtp_username: None,
            smtp_password: None,
            email_from: None,
            telegram_bot_token: None,
            telegram_chat_id: None,
            port: DEFAULT_PORT,
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Self {
        Self {
            database_url: read("DATABASE_URL"),
            openai_api_key: read("OPENAI_API_KEY"),
            openai_model: read("OPENAI_MODEL").unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            smtp_host: read("SMTP_HOST"),
            smtp_username: read("SMTP_USERNAME"),
            smtp_password: read("SMTP_PASSWORD"),
            email_from: read("EMAIL_FROM"),
            telegram_bot_token: read("TELEGRAM_BOT_TOKEN"),
            telegram_chat_id: read("TELEGRAM_CHAT_ID"),
            port: read("PORT")
                .and_then(|v| v.parse().ok())
                .unwrap_or(DEFAULT_PORT),
        }
    }

    pub fn database_url(&self) -> Result<&str> {
        require(&self.database_url, "DATABASE_URL")
    }

    pub fn openai_api_key(&self) -> Result<&str> {
        require(&self.openai_api_key, "OPENAI_API_KEY")
    }

    pub fn smtp_host(&self) -> Result<&str> {
        require(&self.smtp_host, "SMTP_HOST")
    }

    pub fn smtp_username(&self) -> Result<&str> {
        require(&self.smtp_username, "SMTP_USERNAME")
    }

    pub fn smtp_password(&self) -> Result<&str> {
        require(&self.smtp_password, "SMTP_PASSWORD")
    }

    pub fn email_from(&self) -> Result<&str> {
        require(&self.email_from, "EMAIL_FROM")
    }
}

fn read(key: &str) -> Option<String> {
    env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn require<'a>(value: &'a Option<String>, key: &'static str) -> Result<&'a str> {
    value.as_deref().ok_or(NewsletterError::Config(key))
}
