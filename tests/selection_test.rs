mod common;

use std::collections::HashSet;

use chrono::{Duration, Utc};
use common::{candidate, MemoryStore};
use newsletter_generator::store::{
    active_exclusions, record_niche_cooldowns, select_candidates,
};
use newsletter_generator::types::CooldownRecord;

fn cooldown(ids: &[&str], until_offset: Duration) -> CooldownRecord {
    CooldownRecord {
        niche_pattern: "Sleep Sound Apps".to_string(),
        source_app_ids: ids.iter().map(|id| id.to_string()).collect(),
        cooldown_until: Utc::now() + until_offset,
    }
}

#[tokio::test]
async fn expired_cooldowns_do_not_exclude() {
    let now = Utc::now();
    let store = MemoryStore::new()
        .with_cooldown(CooldownRecord {
            niche_pattern: "a".to_string(),
            source_app_ids: vec!["expired".to_string()],
            cooldown_until: now - Duration::seconds(1),
        })
        .with_cooldown(CooldownRecord {
            niche_pattern: "b".to_string(),
            source_app_ids: vec!["active".to_string()],
            cooldown_until: now + Duration::hours(1),
        });

    let excluded = active_exclusions(&store, now).await.unwrap();

    assert!(excluded.contains("active"));
    assert!(!excluded.contains("expired"));
}

#[tokio::test]
async fn expiry_equal_to_now_is_not_excluded() {
    // The comparison is strict: a record expiring exactly "now" is spent.
    let now = Utc::now();
    let store = MemoryStore::new().with_cooldown(CooldownRecord {
        niche_pattern: "boundary".to_string(),
        source_app_ids: vec!["edge".to_string()],
        cooldown_until: now,
    });

    let excluded = active_exclusions(&store, now).await.unwrap();
    assert!(excluded.is_empty());
}

#[tokio::test]
async fn duplicate_ids_across_records_collapse() {
    let store = MemoryStore::new()
        .with_cooldown(cooldown(&["app-1", "app-2"], Duration::days(3)))
        .with_cooldown(cooldown(&["app-2", "app-3"], Duration::days(5)));

    let excluded = active_exclusions(&store, Utc::now()).await.unwrap();
    assert_eq!(excluded.len(), 3);
}

#[tokio::test]
async fn selection_filters_exclusions_and_truncates() {
    let picks: Vec<_> = (1..=10)
        .map(|i| candidate(&format!("app-{i}"), &format!("App {i}")))
        .collect();
    let store = MemoryStore::new().with_picks(picks);

    let excluded: HashSet<String> = ["app-1", "app-3", "app-5"]
        .iter()
        .map(|s| s.to_string())
        .collect();

    let selected = select_candidates(&store, 5, &excluded).await.unwrap();

    assert_eq!(selected.len(), 5);
    for item in &selected {
        assert!(!excluded.contains(&item.app_id), "{} should be excluded", item.app_id);
    }
    // Upstream order survives the filter.
    assert_eq!(selected[0].app_id, "app-2");
    assert_eq!(selected[1].app_id, "app-4");
}

#[tokio::test]
async fn selection_returns_everything_when_short() {
    let picks = vec![
        candidate("app-1", "App 1"),
        candidate("app-2", "App 2"),
        candidate("app-3", "App 3"),
        candidate("app-4", "App 4"),
    ];
    let store = MemoryStore::new().with_picks(picks);

    let excluded: HashSet<String> = ["app-2"].iter().map(|s| s.to_string()).collect();
    let selected = select_candidates(&store, 30, &excluded).await.unwrap();

    assert_eq!(selected.len(), 3);
}

#[tokio::test]
async fn cooldown_writes_continue_past_failures() {
    let store = MemoryStore::new().fail_cooldown_for("app-2");
    let ids = vec![
        "app-1".to_string(),
        "app-2".to_string(),
        "app-3".to_string(),
    ];

    let recorded = record_niche_cooldowns(&store, "Sleep Sound Apps", &ids, 10).await;

    assert_eq!(recorded, 2);
    let rows = store.cooldowns();
    assert_eq!(rows.len(), 2);
    // One row per app id, not one row per batch.
    for row in &rows {
        assert_eq!(row.source_app_ids.len(), 1);
        assert_eq!(row.niche_pattern, "Sleep Sound Apps");
    }
}
