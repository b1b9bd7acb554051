#![allow(dead_code)]

// In-memory doubles for the pipeline's ports, shared by the integration tests.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use uuid::Uuid;

use newsletter_generator::analysis::ReasoningClient;
use newsletter_generator::dispatch::Mailer;
use newsletter_generator::notify::Notify;
use newsletter_generator::pipeline::Ports;
use newsletter_generator::store::Store;
use newsletter_generator::types::{
    AnalysisResult, CandidateItem, CooldownRecord, FeaturedApp, NewsletterError, NewsletterRecord,
    NicheAnalysis, NicheDraft, Result, Subscriber,
};

#[derive(Default)]
struct StoreState {
    picks: Vec<CandidateItem>,
    cooldowns: Vec<CooldownRecord>,
    newsletters: HashMap<NaiveDate, NewsletterRecord>,
    drafts: Vec<NicheDraft>,
    subscribers: Vec<Subscriber>,
    fail_cooldown_for: HashSet<String>,
}

/// In-memory [`Store`] with the same contracts as the Postgres one:
/// newsletters upsert by run date, cooldown inserts are one row per app.
#[derive(Clone, Default)]
pub struct MemoryStore {
    state: Arc<Mutex<StoreState>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_picks(self, picks: Vec<CandidateItem>) -> Self {
        self.state.lock().unwrap().picks = picks;
        self
    }

    pub fn with_subscribers(self, emails: &[&str]) -> Self {
        self.state.lock().unwrap().subscribers = emails
            .iter()
            .map(|email| Subscriber {
                id: Uuid::new_v4(),
                email: email.to_string(),
                status: "subscribed".to_string(),
            })
            .collect();
        self
    }

    pub fn with_cooldown(self, record: CooldownRecord) -> Self {
        self.state.lock().unwrap().cooldowns.push(record);
        self
    }

    /// Make `record_cooldown` fail for the given app id.
    pub fn fail_cooldown_for(self, app_id: &str) -> Self {
        self.state
            .lock()
            .unwrap()
            .fail_cooldown_for
            .insert(app_id.to_string());
        self
    }

    pub fn newsletters(&self) -> Vec<NewsletterRecord> {
        self.state.lock().unwrap().newsletters.values().cloned().collect()
    }

    pub fn drafts(&self) -> Vec<NicheDraft> {
        self.state.lock().unwrap().drafts.clone()
    }

    pub fn cooldowns(&self) -> Vec<CooldownRecord> {
        self.state.lock().unwrap().cooldowns.clone()
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn cooldown_records(&self) -> Result<Vec<CooldownRecord>> {
        Ok(self.state.lock().unwrap().cooldowns.clone())
    }

    async fn record_cooldown(
        &self,
        niche_pattern: &str,
        app_id: &str,
        cooldown_until: DateTime<Utc>,
    ) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        if state.fail_cooldown_for.contains(app_id) {
            return Err(NewsletterError::Database(sqlx::Error::RowNotFound));
        }
        state.cooldowns.push(CooldownRecord {
            niche_pattern: niche_pattern.to_string(),
            source_app_ids: vec![app_id.to_string()],
            cooldown_until,
        });
        Ok(())
    }

    async fn fetch_candidates(&self, limit: usize) -> Result<Vec<CandidateItem>> {
        let state = self.state.lock().unwrap();
        Ok(state.picks.iter().take(limit).cloned().collect())
    }

    async fn upsert_newsletter(&self, record: &NewsletterRecord) -> Result<()> {
        self.state
            .lock()
            .unwrap()
            .newsletters
            .insert(record.run_date, record.clone());
        Ok(())
    }

    async fn insert_niche_draft(&self, draft: &NicheDraft) -> Result<()> {
        self.state.lock().unwrap().drafts.push(draft.clone());
        Ok(())
    }

    async fn active_subscribers(&self) -> Result<Vec<Subscriber>> {
        let state = self.state.lock().unwrap();
        Ok(state
            .subscribers
            .iter()
            .filter(|s| s.status == "subscribed")
            .cloned()
            .collect())
    }
}

/// Reasoning client returning a canned reply.
pub struct ScriptedReasoning {
    pub reply: String,
}

impl ScriptedReasoning {
    pub fn new(reply: impl Into<String>) -> Self {
        Self {
            reply: reply.into(),
        }
    }
}

#[async_trait]
impl ReasoningClient for ScriptedReasoning {
    async fn complete(&self, _prompt: &str) -> Result<String> {
        Ok(self.reply.clone())
    }
}

/// Mailer recording every attempt, failing for listed recipients.
#[derive(Clone, Default)]
pub struct RecordingMailer {
    attempts: Arc<Mutex<Vec<String>>>,
    fail_for: HashSet<String>,
}

impl RecordingMailer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing_for(emails: &[&str]) -> Self {
        Self {
            attempts: Arc::new(Mutex::new(Vec::new())),
            fail_for: emails.iter().map(|e| e.to_string()).collect(),
        }
    }

    pub fn attempts(&self) -> Vec<String> {
        self.attempts.lock().unwrap().clone()
    }
}

#[async_trait]
impl Mailer for RecordingMailer {
    async fn send(&self, to: &str, _subject: &str, _html: &str) -> Result<()> {
        self.attempts.lock().unwrap().push(to.to_string());
        if self.fail_for.contains(to) {
            return Err(NewsletterError::Email(format!("simulated failure for {to}")));
        }
        Ok(())
    }
}

/// Notifier collecting messages, optionally failing every call.
#[derive(Clone, Default)]
pub struct RecordingNotifier {
    messages: Arc<Mutex<Vec<String>>>,
    fail: bool,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing() -> Self {
        Self {
            messages: Arc::new(Mutex::new(Vec::new())),
            fail: true,
        }
    }

    pub fn messages(&self) -> Vec<String> {
        self.messages.lock().unwrap().clone()
    }
}

#[async_trait]
impl Notify for RecordingNotifier {
    async fn notify(&self, message: &str) -> Result<()> {
        if self.fail {
            return Err(NewsletterError::Config("TELEGRAM_BOT_TOKEN"));
        }
        self.messages.lock().unwrap().push(message.to_string());
        Ok(())
    }
}

pub fn make_ports(
    store: MemoryStore,
    reasoning: ScriptedReasoning,
    mailer: RecordingMailer,
    notifier: RecordingNotifier,
) -> Ports {
    Ports {
        store: Arc::new(store),
        reasoning: Arc::new(reasoning),
        mailer: Arc::new(mailer),
        notifier: Arc::new(notifier),
    }
}

/// A candidate with only the fields every row is guaranteed to have.
pub fn candidate(app_id: &str, name: &str) -> CandidateItem {
    CandidateItem {
        app_id: app_id.to_string(),
        name: name.to_string(),
        developer: Some("Example Dev".to_string()),
        category: "HEALTH_AND_FITNESS".to_string(),
        category_name: Some("Health & Fitness".to_string()),
        best_rank: 12,
        best_country: Some("US".to_string()),
        countries: vec!["US".to_string(), "GB".to_string()],
        country_count: 2,
        dev_app_count: Some(1),
        total_score: Some(82),
        is_new: true,
        category_apps_count: Some(4),
        daily_stats: None,
    }
}

pub fn featured_app(name: &str) -> FeaturedApp {
    FeaturedApp {
        name: name.to_string(),
        rank: 12,
        country: "US".to_string(),
        flag: "\u{1F1FA}\u{1F1F8}".to_string(),
        dev_type: "indie".to_string(),
        insight: "Small team already ranking. Proof the market pays.".to_string(),
    }
}

fn niche(name: &str, app_names: &[&str]) -> NicheAnalysis {
    NicheAnalysis {
        name: name.to_string(),
        emoji: "\u{1F3AF}".to_string(),
        cluster_size: app_names.len() as u32 + 2,
        intro: "Apps helping people sleep better.".to_string(),
        why_hot: "Two indie apps ranking top 20 this week. Users already pay for subscriptions."
            .to_string(),
        gap: "Current apps have dated onboarding. A cleaner free tier would convert.".to_string(),
        competition: 40,
        potential: 85,
        apps: app_names.iter().map(|n| featured_app(n)).collect(),
    }
}

/// A schema-valid analysis (2 niches, app counts 2 and 1).
pub fn analysis_with_app_names(niche1: &str, apps1: &[&str], niche2: &str, apps2: &[&str]) -> AnalysisResult {
    AnalysisResult {
        title: "Sleep Apps Are Printing Money \u{1F4A4}".to_string(),
        date: "August 6, 2026".to_string(),
        hook: "Three sleep apps from solo devs cracked the top 20 this week.".to_string(),
        niches: vec![niche(niche1, apps1), niche(niche2, apps2)],
        action: "Build a minimalist sleep tracker for shift workers with offline export."
            .to_string(),
    }
}

/// The same analysis, as the JSON string a well-behaved model would return.
pub fn valid_analysis_json(apps1: &[&str], apps2: &[&str]) -> String {
    let analysis = analysis_with_app_names("Sleep Sound Apps", apps1, "Pet Care Reminders", apps2);
    serde_json::to_string(&analysis).unwrap()
}
