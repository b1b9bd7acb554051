use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use lettre::{
    message::{header::ContentType, Mailbox},
    transport::smtp::authentication::Credentials,
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
};
use tracing::{error, info};

use crate::store::{record_niche_cooldowns, Store, DEFAULT_COOLDOWN_DAYS};
use crate::types::{
    AnalysisResult, DeliveryReport, NewsletterError, NewsletterRecord, NicheDraft, Result,
};

/// Single-message send primitive. May fail per recipient; the dispatcher
/// recovers and keeps going.
#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, to: &str, subject: &str, html: &str) -> Result<()>;
}

/// SMTP delivery via lettre.
pub struct SmtpMailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
}

impl SmtpMailer {
    pub fn new(host: &str, username: &str, password: &str, from: &str) -> Result<Self> {
        let from = from
            .parse::<Mailbox>()
            .map_err(|err| NewsletterError::Email(format!("Invalid EMAIL_FROM address: {err}")))?;
        let transport = AsyncSmtpTransport::<Tokio1Executor>::relay(host)
            .map_err(|err| NewsletterError::Email(err.to_string()))?
            .credentials(Credentials::new(username.to_string(), password.to_string()))
            .build();
        Ok(Self { transport, from })
    }
}

#[async_trait]
impl Mailer for SmtpMailer {
    async fn send(&self, to: &str, subject: &str, html: &str) -> Result<()> {
        let message = Message::builder()
            .from(self.from.clone())
            .to(to
                .parse::<Mailbox>()
                .map_err(|err| NewsletterError::Email(format!("Invalid recipient {to}: {err}")))?)
            .subject(subject)
            .header(ContentType::TEXT_HTML)
            .body(html.to_string())
            .map_err(|err| NewsletterError::Email(err.to_string()))?;

        self.transport
            .send(message)
            .await
            .map_err(|err| NewsletterError::Email(err.to_string()))?;
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct DispatchConfig {
    pub cooldown_days: i64,
    /// Pause between sends. 600ms keeps us under a 2 msg/sec provider
    /// ceiling with headroom.
    pub send_delay: Duration,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            cooldown_days: DEFAULT_COOLDOWN_DAYS,
            send_delay: Duration::from_millis(600),
        }
    }
}

/// Persists the run's artifacts and delivers the newsletter.
pub struct Dispatcher {
    store: Arc<dyn Store>,
    mailer: Arc<dyn Mailer>,
    config: DispatchConfig,
}

impl Dispatcher {
    pub fn new(store: Arc<dyn Store>, mailer: Arc<dyn Mailer>, config: DispatchConfig) -> Self {
        Self {
            store,
            mailer,
            config,
        }
    }

    /// Runs the persistence and delivery steps in order: newsletter upsert,
    /// niche drafts, cooldowns for the reconciled ids, then one paced send
    /// per subscribed address.
    pub async fn dispatch(
        &self,
        analysis: &AnalysisResult,
        html: &str,
        reconciled_ids: &[Vec<String>],
    ) -> Result<DeliveryReport> {
        let run_date = Utc::now().date_naive();

        self.store
            .upsert_newsletter(&NewsletterRecord {
                title: analysis.title.clone(),
                content: html.to_string(),
                run_date,
            })
            .await?;
        info!("Newsletter saved for {}", run_date);

        for niche in &analysis.niches {
            let draft = NicheDraft {
                title: niche.name.clone(),
                apps: serde_json::to_value(&niche.apps)?,
                summary: niche.why_hot.clone(),
                newsletter_date: run_date,
                processed: false,
            };
            self.store.insert_niche_draft(&draft).await?;
            info!("Niche draft saved: \"{}\"", niche.name);
        }

        for (niche, app_ids) in analysis.niches.iter().zip(reconciled_ids) {
            if !app_ids.is_empty() {
                record_niche_cooldowns(
                    self.store.as_ref(),
                    &niche.name,
                    app_ids,
                    self.config.cooldown_days,
                )
                .await;
            }
        }

        let subscribers = self.store.active_subscribers().await?;
        info!("Sending to {} subscribers", subscribers.len());

        let mut sent = 0;
        let mut failed = 0;
        for (index, subscriber) in subscribers.iter().enumerate() {
            match self
                .mailer
                .send(&subscriber.email, &analysis.title, html)
                .await
            {
                Ok(()) => {
                    sent += 1;
                    info!("[{}/{}] Sent to {}", index + 1, subscribers.len(), subscriber.email);
                }
                Err(err) => {
                    failed += 1;
                    error!(
                        "[{}/{}] Failed to send to {}: {}",
                        index + 1,
                        subscribers.len(),
                        subscriber.email,
                        err
                    );
                }
            }

            if index + 1 < subscribers.len() {
                tokio::time::sleep(self.config.send_delay).await;
            }
        }

        info!("Delivery done: {} sent, {} failed", sent, failed);
        Ok(DeliveryReport { sent, failed })
    }
}
