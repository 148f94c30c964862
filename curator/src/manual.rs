//! Hand-curated items: single links added from the command line and NDJSON imports.
//! Both are stored under the `manual` source record.

use crate::store::Store;
use crate::sync::convert_item;
use crate::types::{AggregatorError, CanonicalItem, Priority, RawItem, Result, SourceRef};
use chrono::Utc;
use tracing::{debug, info, warn};
use url::Url;

pub const MANUAL_SOURCE: &str = "manual";
pub const MANUAL_ICON: &str = "✍️";

fn manual_ref() -> SourceRef {
    SourceRef {
        name: MANUAL_SOURCE.to_string(),
        icon: MANUAL_ICON.to_string(),
    }
}

/// Store one link. Hand-picked links are seeded at high priority.
pub async fn add_link(
    store: &Store,
    url: &str,
    title: Option<&str>,
    tags: Vec<String>,
    note: Option<&str>,
) -> Result<CanonicalItem> {
    let parsed = Url::parse(url.trim())?;
    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(AggregatorError::General(format!("only http(s) links can be added: {}", url)));
    }
    let title = match title.map(str::trim).filter(|t| !t.is_empty()) {
        Some(t) => t.to_string(),
        None => parsed.host_str().unwrap_or(url).to_string(),
    };

    let raw = RawItem {
        title,
        url: parsed.to_string(),
        summary: note.unwrap_or_default().to_string(),
        priority: Priority::High,
        tags,
        ..Default::default()
    };

    let source = store.get_or_create_source(MANUAL_SOURCE, MANUAL_SOURCE, None, MANUAL_ICON).await?;
    let item = convert_item(raw, &manual_ref(), Utc::now());
    if store.upsert_item(&item, source.id).await? {
        info!("Added {} ({})", item.title, item.id);
    } else {
        debug!("{} was already stored, refreshed", item.id);
    }
    Ok(item)
}

/// Store items decoded from an NDJSON export. Identity is re-derived from each
/// item's url, title and source so that ids agree with locally synced items.
/// Returns the number of new rows.
pub async fn import_items(store: &Store, items: Vec<CanonicalItem>) -> Result<usize> {
    let source = store.get_or_create_source(MANUAL_SOURCE, MANUAL_SOURCE, None, MANUAL_ICON).await?;
    let fetched_at = Utc::now();
    let mut inserted = 0;

    for mut item in items {
        if item.title.trim().is_empty() {
            debug!("Skipping untitled import {}", item.id);
            continue;
        }
        if item.source.name.trim().is_empty() {
            item.source = manual_ref();
        }

        let (canonical_url, fingerprint, id) = interfaces::identity(&item.url, &item.title, &item.source.name);
        item.canonical_url = canonical_url;
        item.fingerprint = fingerprint;
        item.id = id;
        item.fetched_at = fetched_at;
        item.raw_score = Priority::Medium.seed_score();

        match store.upsert_item(&item, source.id).await {
            Ok(true) => inserted += 1,
            Ok(false) => debug!("Refreshed imported item {}", item.id),
            Err(e) => warn!("Failed to import {:?}: {}", item.title, e),
        }
    }

    info!("Imported {} new items", inserted);
    Ok(inserted)
}
