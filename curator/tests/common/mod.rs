#![allow(dead_code)]

use chrono::{DateTime, Utc};
use curator::types::{CanonicalItem, Engagement, ItemState, SourceRef};
use std::sync::Once;

static INIT: Once = Once::new();

pub fn init_tracing() {
    INIT.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_max_level(tracing::Level::DEBUG)
            .with_test_writer()
            .try_init();
    });
}

/// An item as ingestion would have produced it, fetched at `at`.
pub fn item(title: &str, url: &str, source: &str, at: DateTime<Utc>) -> CanonicalItem {
    let (canonical_url, fingerprint, id) = interfaces::identity(url, title, source);
    CanonicalItem {
        id,
        title: title.to_string(),
        url: url.to_string(),
        canonical_url,
        source: SourceRef {
            name: source.to_string(),
            icon: "📰".to_string(),
        },
        published_at: at,
        fetched_at: at,
        summary: String::new(),
        body: String::new(),
        tags: Vec::new(),
        computed_score: 0.0,
        engagement: Engagement::default(),
        fingerprint,
        raw_score: 5.0,
        state: ItemState::Unread,
    }
}

pub fn tagged(mut item: CanonicalItem, tags: &[&str]) -> CanonicalItem {
    item.tags = tags.iter().map(|t| t.to_string()).collect();
    item
}

pub fn with_score(mut item: CanonicalItem, score: f64) -> CanonicalItem {
    item.computed_score = score;
    item
}
