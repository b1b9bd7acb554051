use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One curated "app opportunity" row from the daily picks table.
///
/// Produced by an upstream ingestion process and read-only here. Most fields
/// beyond the identifier and name are optional in practice, so the formatter
/// has to tolerate their absence.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CandidateItem {
    pub app_id: String,
    pub name: String,
    pub developer: Option<String>,
    pub category: String,
    pub category_name: Option<String>,
    pub best_rank: i32,
    pub best_country: Option<String>,
    pub countries: Vec<String>,
    pub country_count: i32,
    pub dev_app_count: Option<i32>,
    pub total_score: Option<i32>,
    pub is_new: bool,
    pub category_apps_count: Option<i32>,
    /// Aggregate statistics for the day, shared by all picks. Either a JSON
    /// object or a JSON-encoded string depending on how the upstream wrote it.
    pub daily_stats: Option<serde_json::Value>,
}

/// A time-boxed exclusion: apps featured in a recent newsletter stay out of
/// selection until `cooldown_until` has passed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CooldownRecord {
    pub niche_pattern: String,
    pub source_app_ids: Vec<String>,
    pub cooldown_until: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Subscriber {
    pub id: Uuid,
    pub email: String,
    pub status: String,
}

/// Rendered newsletter for one run date. Upserted by `run_date`, so a re-run
/// on the same day replaces the earlier record instead of duplicating it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewsletterRecord {
    pub title: String,
    pub content: String,
    pub run_date: NaiveDate,
}

/// Per-niche artifact saved alongside the newsletter for later reuse.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NicheDraft {
    pub title: String,
    pub apps: serde_json::Value,
    pub summary: String,
    pub newsletter_date: NaiveDate,
    pub processed: bool,
}

/// Validated output of the reasoning service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub title: String,
    pub date: String,
    pub hook: String,
    pub niches: Vec<NicheAnalysis>,
    pub action: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NicheAnalysis {
    pub name: String,
    pub emoji: String,
    pub cluster_size: u32,
    pub intro: String,
    pub why_hot: String,
    pub gap: String,
    pub competition: u8,
    pub potential: u8,
    pub apps: Vec<FeaturedApp>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeaturedApp {
    pub name: String,
    pub rank: u32,
    pub country: String,
    pub flag: String,
    pub dev_type: String,
    pub insight: String,
}

/// Outcome of the email delivery step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeliveryReport {
    pub sent: usize,
    pub failed: usize,
}

/// Result of one pipeline run. A day with zero eligible candidates is a
/// deliberate skip, not a failure.
#[derive(Debug, Clone)]
pub enum RunOutcome {
    Completed {
        title: String,
        report: DeliveryReport,
    },
    Skipped,
}

#[derive(Debug, thiserror::Error)]
pub enum NewsletterError {
    #[error("Missing configuration: {0} is not set")]
    Config(&'static str),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Email error: {0}")]
    Email(String),

    #[error("Reasoning service returned no content")]
    EmptyResponse,

    #[error("Reasoning service reply is not valid JSON: {0}")]
    MalformedResponse(String),

    #[error("Analysis violates the expected schema: {0}")]
    SchemaViolation(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, NewsletterError>;
