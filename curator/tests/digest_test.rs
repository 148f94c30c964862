mod common;

use chrono::{Duration, Utc};
use common::{init_tracing, item, tagged};
use curator::curation::{CurationEngine, DiversityLimits};
use curator::digest::{append_items, render_digest, render_sync_results};
use curator::manual;
use curator::types::{CanonicalItem, ItemFilter, Result, RuleKind, SyncResult};
use curator::Store;
use std::sync::Arc;

/// Two sources, one cross-posted story, one fuzzy repost, one muted and one boosted item.
async fn seeded_store() -> Result<(Arc<Store>, Vec<CanonicalItem>)> {
    let store = Arc::new(Store::in_memory().await?);
    let hn = store.get_or_create_source("Hacker News", "hackernews", None, "🔶").await?;
    let reddit = store.get_or_create_source("Reddit", "reddit", None, "🤖").await?;
    let now = Utc::now();

    let mut launch = item("Big launch", "https://example.com/launch?utm_source=hn", "Hacker News", now - Duration::hours(1));
    launch.engagement.points = Some(500.0);
    let crosspost = item("Big launch thread", "https://example.com/launch", "Reddit", now - Duration::hours(2));
    let repost = item("[D] Big launch", "https://mirror.example/launch", "Reddit", now - Duration::hours(3));
    let rust = tagged(item("Rust tips", "https://other.example/rust", "Reddit", now - Duration::hours(40)), &["rust"]);
    let spam = item("Buy now", "https://spam.example/1", "Hacker News", now);

    let rows = [(&launch, hn.id), (&crosspost, reddit.id), (&repost, reddit.id), (&rust, reddit.id), (&spam, hn.id)];
    for (row, source_id) in rows {
        let mut row = row.clone();
        row.fetched_at = now;
        store.upsert_item(&row, source_id).await?;
    }

    store.add_rule(RuleKind::MuteDomain, "spam.example").await?;
    store.add_rule(RuleKind::BoostTag, "Rust").await?;

    Ok((store, vec![launch, crosspost, repost, rust, spam]))
}

#[tokio::test]
async fn digest_runs_the_whole_pipeline() -> Result<()> {
    init_tracing();
    let (store, items) = seeded_store().await?;
    let now = Utc::now();

    let engine = CurationEngine::new(store.clone());
    let digest = engine.generate_digest_at(now, Duration::hours(48), 10, "Morning brew").await?;

    assert_eq!(digest.kind, "trss-digest");
    assert_eq!(digest.version, "1");
    assert_eq!(digest.window, "48h");
    assert_eq!(digest.max_items, 10);
    assert_eq!(digest.meta.items_considered, 5);
    assert_eq!(digest.meta.rules_applied, 2);
    assert_eq!(digest.meta.items_deduped, 2);
    assert_eq!(digest.meta.sources_synced, 2);

    let titles: Vec<&str> = digest.items.iter().map(|i| i.title.as_str()).collect();
    assert_eq!(titles, vec!["Big launch", "Rust tips"]);
    assert_eq!(digest.item_count, 2);
    assert_eq!(digest.sections.len(), 2);
    assert_eq!(digest.sections[0].name, "Hacker News");

    let top = &digest.items[0];
    assert!((top.computed_score - (-1.0f64 / 24.0).exp()).abs() < 0.01);
    let boosted = &digest.items[1];
    assert!((boosted.computed_score - 2.0 * (-40.0f64 / 24.0).exp()).abs() < 0.01);

    // the cross-post shares an id with the kept item, so only the fuzzy repost leaves an edge
    let edges = store.dedup_edges().await?;
    assert_eq!(edges.len(), 1);
    assert_eq!(edges[0].confidence, 0.8);
    let repost_id = &items[2].id;
    assert!(edges[0].id_a == *repost_id || edges[0].id_b == *repost_id);

    let stored = store.get_item(&top.id).await?.expect("stored item");
    assert!((stored.computed_score - top.computed_score).abs() < 1e-9);

    let history = store.list_digests(5).await?;
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].title, "Morning brew");
    assert_eq!(history[0].item_count, 2);
    assert_eq!(history[0].id.to_string(), digest.id);
    let reloaded = store.load_digest(history[0].id).await?.expect("stored digest");
    assert_eq!(reloaded.id, digest.id);

    let text = render_digest(&digest);
    assert!(text.contains("Morning brew"));
    assert!(text.contains("📰 Hacker News"));
    assert!(text.contains("2 deduped"));
    Ok(())
}

#[tokio::test]
async fn cross_posted_story_collapses_and_outranks_older_news() -> Result<()> {
    init_tracing();
    let store = Arc::new(Store::in_memory().await?);
    let hn = store.get_or_create_source("HN", "hackernews", None, "").await?;
    let reddit = store.get_or_create_source("Reddit", "reddit", None, "").await?;
    let now = Utc::now();

    let mut first = item("AI breakthrough", "https://x.com/a?utm_source=t", "HN", now - Duration::hours(1));
    first.engagement.points = Some(600.0);
    let mut second = item("Ai Breakthrough", "https://x.com/a", "Reddit", now - Duration::hours(1));
    second.engagement.points = Some(10.0);
    let third = item("Unrelated", "https://y.com/b", "HN", now - Duration::hours(30));

    for (row, source_id) in [(&first, hn.id), (&second, reddit.id), (&third, hn.id)] {
        let mut row = row.clone();
        row.fetched_at = now;
        store.upsert_item(&row, source_id).await?;
    }

    let digest = CurationEngine::new(store)
        .generate_digest_at(now, Duration::hours(48), 10, "Brew")
        .await?;

    assert_eq!(digest.item_count, 2);
    assert_eq!(digest.meta.items_deduped, 1);
    assert_eq!(digest.items[0].title, "AI breakthrough");
    assert_eq!(digest.items[0].canonical_url, "https://x.com/a");
    assert_eq!(digest.items[1].title, "Unrelated");
    assert!(digest.items[0].computed_score > digest.items[1].computed_score);
    Ok(())
}

#[tokio::test]
async fn diversity_limits_come_from_the_engine() -> Result<()> {
    init_tracing();
    let (store, _) = seeded_store().await?;
    let engine = CurationEngine::new(store).with_limits(DiversityLimits {
        max_source_percent: 0.1,
        ..Default::default()
    });
    let digest = engine.generate_digest(Duration::hours(48), 10, "Capped").await?;
    // one item per source
    assert_eq!(digest.item_count, 2);
    Ok(())
}

#[tokio::test]
async fn empty_window_gives_an_empty_digest() -> Result<()> {
    init_tracing();
    let store = Arc::new(Store::in_memory().await?);
    let digest = CurationEngine::new(store.clone())
        .generate_digest(Duration::hours(24), 0, "Nothing")
        .await?;

    assert!(digest.items.is_empty());
    assert!(digest.sections.is_empty());
    assert_eq!(digest.max_items, 25);
    assert_eq!(digest.meta.items_considered, 0);
    assert!(render_digest(&digest).contains("Nothing new"));
    assert_eq!(store.list_digests(5).await?.len(), 1);
    Ok(())
}

#[tokio::test]
async fn ndjson_digest_is_one_line() -> Result<()> {
    init_tracing();
    let (store, _) = seeded_store().await?;
    let digest = CurationEngine::new(store).generate_digest(Duration::hours(48), 10, "Wire").await?;

    let mut buf = Vec::new();
    interfaces::ndjson::encode_digest(&mut buf, &digest)?;
    let text = String::from_utf8(buf).expect("utf-8");
    assert_eq!(text.lines().count(), 1);

    let value: serde_json::Value = serde_json::from_str(text.trim())?;
    assert_eq!(value["type"], "trss-digest");
    assert_eq!(value["id"], digest.id.as_str());
    assert_eq!(value["item_count"], 2);
    assert!(value["items"][0]["url_canonical"].is_string());
    assert!(value["items"][0].get("raw_score").is_none());
    Ok(())
}

#[tokio::test]
async fn manual_links_and_imports() -> Result<()> {
    init_tracing();
    let store = Store::in_memory().await?;

    let added = manual::add_link(
        &store,
        "https://blog.example/post/?utm_campaign=x",
        None,
        vec!["reading".to_string()],
        Some("worth a look"),
    )
    .await?;
    assert_eq!(added.title, "blog.example");
    assert_eq!(added.canonical_url, "https://blog.example/post");
    assert_eq!(added.source.name, manual::MANUAL_SOURCE);
    assert_eq!(added.raw_score, 7.0);
    assert!(manual::add_link(&store, "not a url", None, Vec::new(), None).await.is_err());
    assert!(manual::add_link(&store, "ftp://files.example/x", None, Vec::new(), None).await.is_err());

    let mut exported = item("Exported", "https://a.example/e", "Lobsters", Utc::now() - Duration::days(3));
    exported.id = "sha256:stale".to_string();
    let untitled = item("", "https://a.example/u", "Lobsters", Utc::now());
    let mut buf = Vec::new();
    interfaces::ndjson::encode_items(&mut buf, &[exported.clone(), untitled])?;
    buf.extend_from_slice(b"{ not json\n");

    let decoded = interfaces::ndjson::decode_items(buf.as_slice())?;
    assert_eq!(decoded.len(), 2);
    assert_eq!(manual::import_items(&store, decoded.clone()).await?, 1);
    assert_eq!(manual::import_items(&store, decoded).await?, 0);

    let imported = store
        .list_items(&ItemFilter {
            source_name: Some("Lobsters".to_string()),
            ..Default::default()
        })
        .await?;
    assert_eq!(imported.len(), 1);
    assert_eq!(imported[0].id, interfaces::item_id("https://a.example/e"));
    assert!(store.source_by_name(manual::MANUAL_SOURCE).await?.is_some());
    Ok(())
}

#[test]
fn sync_summary_lines() {
    let results = vec![
        SyncResult {
            name: "Hacker News".to_string(),
            items_inserted: 8,
            error: None,
        },
        SyncResult {
            name: "Reddit".to_string(),
            items_inserted: 0,
            error: Some("Timed out after 60s".to_string()),
        },
    ];
    let text = render_sync_results(&results);
    assert!(text.contains("✓ Hacker News: 8 items"));
    assert!(text.contains("✗ Reddit: Timed out after 60s"));
    assert!(text.contains("Synced 8 items from 2 sources (1 errors)"));
}

#[tokio::test]
async fn window_beyond_the_calendar_still_generates() -> Result<()> {
    init_tracing();
    let (store, _) = seeded_store().await?;
    let digest = CurationEngine::new(store)
        .generate_digest(Duration::hours(i64::from(u32::MAX)), 10, "Everything")
        .await?;
    assert_eq!(digest.meta.items_considered, 5);
    Ok(())
}

#[tokio::test]
async fn digest_items_append_to_a_stream_log() -> Result<()> {
    init_tracing();
    let (store, _) = seeded_store().await?;
    let digest = CurationEngine::new(store).generate_digest(Duration::hours(48), 10, "Log").await?;

    let dir = tempfile::tempdir()?;
    let path = dir.path().join("logs").join("brew.ndjson");
    assert_eq!(append_items(&path, &digest.items)?, 2);
    assert_eq!(append_items(&path, &digest.items)?, 2);

    let text = std::fs::read_to_string(&path)?;
    assert_eq!(text.lines().count(), 4);
    let decoded = interfaces::ndjson::decode_items(text.as_bytes())?;
    assert_eq!(decoded[0].title, "Big launch");
    assert_eq!(decoded[2].id, decoded[0].id);
    Ok(())
}
