use std::collections::HashSet;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use sqlx::{postgres::PgPoolOptions, PgPool, Row};
use tracing::{debug, info, warn};

use crate::types::{
    CandidateItem, CooldownRecord, NewsletterRecord, NicheDraft, Result, Subscriber,
};

/// How many picks a newsletter run asks for before cooldown filtering.
pub const DAILY_PICK_LIMIT: usize = 30;

/// Days a featured app stays out of selection after being published.
pub const DEFAULT_COOLDOWN_DAYS: i64 = 10;

/// Persistence port for the pipeline. One production implementation backed by
/// Postgres, plus in-memory doubles in the test suite.
#[async_trait]
pub trait Store: Send + Sync {
    /// All cooldown rows, expired or not. Expiry filtering happens in
    /// [`active_exclusions`] so the boundary rule lives in one place.
    async fn cooldown_records(&self) -> Result<Vec<CooldownRecord>>;

    /// Insert a single cooldown row for one app.
    async fn record_cooldown(
        &self,
        niche_pattern: &str,
        app_id: &str,
        cooldown_until: DateTime<Utc>,
    ) -> Result<()>;

    /// Raw daily picks in the store's natural order, up to `limit` rows.
    async fn fetch_candidates(&self, limit: usize) -> Result<Vec<CandidateItem>>;

    /// Save-or-replace the newsletter for its run date.
    async fn upsert_newsletter(&self, record: &NewsletterRecord) -> Result<()>;

    async fn insert_niche_draft(&self, draft: &NicheDraft) -> Result<()>;

    /// Subscribers with status `subscribed`.
    async fn active_subscribers(&self) -> Result<Vec<Subscriber>>;
}

/// Every app id under a cooldown that has not expired yet. The comparison is
/// strict: a record whose expiry equals `now` no longer excludes anything.
pub async fn active_exclusions(store: &dyn Store, now: DateTime<Utc>) -> Result<HashSet<String>> {
    let records = store.cooldown_records().await?;

    let mut excluded = HashSet::new();
    for record in records.iter().filter(|r| r.cooldown_until > now) {
        for app_id in &record.source_app_ids {
            if excluded.insert(app_id.clone()) {
                debug!(
                    "App {} in cooldown (niche: {}) until {}",
                    app_id, record.niche_pattern, record.cooldown_until
                );
            }
        }
    }

    info!("{} apps currently in cooldown", excluded.len());
    Ok(excluded)
}

/// Fetch candidates, oversampling by the exclusion count so the post-filter
/// result can still reach `limit`. Ordering is whatever the store returns.
pub async fn select_candidates(
    store: &dyn Store,
    limit: usize,
    excluded: &HashSet<String>,
) -> Result<Vec<CandidateItem>> {
    let raw = store.fetch_candidates(limit + excluded.len()).await?;
    let before = raw.len();

    let mut picks: Vec<CandidateItem> = raw
        .into_iter()
        .filter(|item| !excluded.contains(&item.app_id))
        .collect();
    if picks.len() < before {
        info!(
            "Filtered daily picks: {} -> {} ({} in cooldown)",
            before,
            picks.len(),
            before - picks.len()
        );
    }

    picks.truncate(limit);
    Ok(picks)
}

/// Record one cooldown row per app id. Writes are independent: a failed
/// insert is logged and the remaining ids are still attempted. Returns the
/// number of rows actually written.
pub async fn record_niche_cooldowns(
    store: &dyn Store,
    niche_pattern: &str,
    app_ids: &[String],
    days: i64,
) -> usize {
    let cooldown_until = Utc::now() + Duration::days(days);
    let mut recorded = 0;

    for app_id in app_ids {
        match store
            .record_cooldown(niche_pattern, app_id, cooldown_until)
            .await
        {
            Ok(()) => recorded += 1,
            Err(err) => warn!("Failed to save cooldown for {}: {}", app_id, err),
        }
    }

    info!(
        "{}/{} apps added to {}-day cooldown for niche \"{}\"",
        recorded,
        app_ids.len(),
        days,
        niche_pattern
    );
    recorded
}

/// Postgres-backed store.
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub async fn connect(database_url: &str) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(5)
            .connect(database_url)
            .await?;
        Ok(Self { pool })
    }

    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl Store for PgStore {
    async fn cooldown_records(&self) -> Result<Vec<CooldownRecord>> {
        let rows = sqlx::query(
            "SELECT niche_pattern, source_app_ids, cooldown_until FROM published_niche_history",
        )
        .fetch_all(&self.pool)
        .await?;

        let records = rows
            .into_iter()
            .map(|r| CooldownRecord {
                niche_pattern: r.get("niche_pattern"),
                source_app_ids: r
                    .get::<Option<Vec<String>>, _>("source_app_ids")
                    .unwrap_or_default(),
                cooldown_until: r.get("cooldown_until"),
            })
            .collect();
        Ok(records)
    }

    async fn record_cooldown(
        &self,
        niche_pattern: &str,
        app_id: &str,
        cooldown_until: DateTime<Utc>,
    ) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO published_niche_history (niche_pattern, source_app_ids, cooldown_until)
            VALUES ($1, $2, $3)
            "#,
        )
        .bind(niche_pattern)
        .bind(vec![app_id.to_string()])
        .bind(cooldown_until)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn fetch_candidates(&self, limit: usize) -> Result<Vec<CandidateItem>> {
        let rows = sqlx::query(
            r#"
            SELECT app_id, name, developer, category, category_name, best_rank,
                   best_country, countries, country_count, dev_app_count,
                   total_score, is_new, category_apps_count, daily_stats
            FROM daily_picks
            LIMIT $1
            "#,
        )
        .bind(limit as i64)
        .fetch_all(&self.pool)
        .await?;

        let items = rows
            .into_iter()
            .map(|r| CandidateItem {
                app_id: r.get("app_id"),
                name: r.get("name"),
                developer: r.get("developer"),
                category: r.get("category"),
                category_name: r.get("category_name"),
                best_rank: r.get("best_rank"),
                best_country: r.get("best_country"),
                countries: r
                    .get::<Option<Vec<String>>, _>("countries")
                    .unwrap_or_default(),
                country_count: r.get::<Option<i32>, _>("country_count").unwrap_or(0),
                dev_app_count: r.get("dev_app_count"),
                total_score: r.get("total_score"),
                is_new: r.get::<Option<bool>, _>("is_new").unwrap_or(false),
                category_apps_count: r.get("category_apps_count"),
                daily_stats: r.get("daily_stats"),
            })
            .collect();
        Ok(items)
    }

    async fn upsert_newsletter(&self, record: &NewsletterRecord) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO newsletters (content, title, run_date)
            VALUES ($1, $2, $3)
            ON CONFLICT (run_date)
            DO UPDATE SET content = EXCLUDED.content, title = EXCLUDED.title
            "#,
        )
        .bind(&record.content)
        .bind(&record.title)
        .bind(record.run_date)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn insert_niche_draft(&self, draft: &NicheDraft) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO niche_drafts (title, apps, summary, newsletter_date, processed)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(&draft.title)
        .bind(&draft.apps)
        .bind(&draft.summary)
        .bind(draft.newsletter_date)
        .bind(draft.processed)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn active_subscribers(&self) -> Result<Vec<Subscriber>> {
        let rows = sqlx::query(
            "SELECT id, email, status FROM newsletter_subscribers WHERE status = 'subscribed'",
        )
        .fetch_all(&self.pool)
        .await?;

        let subscribers = rows
            .into_iter()
            .map(|r| Subscriber {
                id: r.get("id"),
                email: r.get("email"),
                status: r.get("status"),
            })
            .collect();
        Ok(subscribers)
    }
}
