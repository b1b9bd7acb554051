use std::sync::Arc;

use chrono::Utc;
use tracing::{error, info};

use crate::analysis::{analyze, format_for_analysis, OpenAiClient, ReasoningClient, SchemaPolicy};
use crate::config::AppConfig;
use crate::dispatch::{DispatchConfig, Dispatcher, Mailer, SmtpMailer};
use crate::notify::{notify_best_effort, Notify, TelegramNotifier};
use crate::reconcile::reconcile;
use crate::store::{active_exclusions, select_candidates, PgStore, Store, DAILY_PICK_LIMIT};
use crate::template::render_newsletter;
use crate::types::{Result, RunOutcome};

/// The pipeline's external collaborators, passed explicitly so tests can
/// substitute in-memory doubles for any of them.
pub struct Ports {
    pub store: Arc<dyn Store>,
    pub reasoning: Arc<dyn ReasoningClient>,
    pub mailer: Arc<dyn Mailer>,
    pub notifier: Arc<dyn Notify>,
}

impl Ports {
    /// Build the production port set. Missing credentials surface here, at
    /// the start of a run, with an error naming the variable; process start
    /// never touches them.
    pub async fn connect(config: &AppConfig, notifier: Arc<dyn Notify>) -> Result<Self> {
        let store = PgStore::connect(config.database_url()?).await?;
        let reasoning = OpenAiClient::new(
            config.openai_api_key()?.to_string(),
            config.openai_model.clone(),
        )?;
        let mailer = SmtpMailer::new(
            config.smtp_host()?,
            config.smtp_username()?,
            config.smtp_password()?,
            config.email_from()?,
        )?;

        Ok(Self {
            store: Arc::new(store),
            reasoning: Arc::new(reasoning),
            mailer: Arc::new(mailer),
            notifier,
        })
    }
}

/// Connect the production ports and run the pipeline once. This is the whole
/// run's failure boundary: any terminal error sends exactly one failure
/// notification before propagating to the caller.
pub async fn run_once(config: &AppConfig) -> Result<RunOutcome> {
    let notifier: Arc<dyn Notify> = Arc::new(TelegramNotifier::from_config(config));

    let ports = match Ports::connect(config, notifier.clone()).await {
        Ok(ports) => ports,
        Err(err) => {
            notify_best_effort(
                notifier.as_ref(),
                &format!("Newsletter generation FAILED!\n\nError: {err}"),
            )
            .await;
            return Err(err);
        }
    };

    generate_newsletter(&ports).await
}

/// Run the pipeline against an already-built port set, reporting any failure
/// to the notifier before rethrowing it.
pub async fn generate_newsletter(ports: &Ports) -> Result<RunOutcome> {
    match run_pipeline(ports).await {
        Ok(outcome) => Ok(outcome),
        Err(err) => {
            error!("Newsletter generation failed: {}", err);
            notify_best_effort(
                ports.notifier.as_ref(),
                &format!("Newsletter generation FAILED!\n\nError: {err}"),
            )
            .await;
            Err(err)
        }
    }
}

async fn run_pipeline(ports: &Ports) -> Result<RunOutcome> {
    let now = Utc::now();
    info!("Starting newsletter generation");

    let excluded = active_exclusions(ports.store.as_ref(), now).await?;
    let picks = select_candidates(ports.store.as_ref(), DAILY_PICK_LIMIT, &excluded).await?;

    if picks.is_empty() {
        info!("No daily picks available (all in cooldown?), skipping run");
        notify_best_effort(
            ports.notifier.as_ref(),
            "Newsletter skipped: no daily picks available (all in cooldown)",
        )
        .await;
        return Ok(RunOutcome::Skipped);
    }
    info!("{} apps selected for analysis", picks.len());

    let opportunities_text = format_for_analysis(&picks);
    let today = now.format("%B %-d, %Y").to_string();
    let analysis = analyze(
        ports.reasoning.as_ref(),
        &opportunities_text,
        &today,
        &SchemaPolicy::default(),
    )
    .await?;

    let html = render_newsletter(&analysis);
    info!("HTML generated ({} chars)", html.len());

    let reconciled = reconcile(&analysis, &picks);
    let cooldown_count: usize = reconciled.iter().map(Vec::len).sum();

    let dispatcher = Dispatcher::new(
        ports.store.clone(),
        ports.mailer.clone(),
        DispatchConfig::default(),
    );
    let report = dispatcher.dispatch(&analysis, &html, &reconciled).await?;

    let summary = format!(
        "Newsletter sent!\n\n{}\n\nNiches:\n{}\n\nStats:\n- Sent: {}\n- Failed: {}\n- New cooldowns: {}\n\n{}",
        analysis.title,
        analysis
            .niches
            .iter()
            .zip(&reconciled)
            .map(|(niche, ids)| format!("- {} ({} apps)", niche.name, ids.len()))
            .collect::<Vec<_>>()
            .join("\n"),
        report.sent,
        report.failed,
        cooldown_count,
        if report.failed > 0 {
            "Check logs for failed emails"
        } else {
            "All sent!"
        }
    );
    notify_best_effort(ports.notifier.as_ref(), &summary).await;

    info!("Newsletter generation complete");
    Ok(RunOutcome::Completed {
        title: analysis.title,
        report,
    })
}
