use crate::curation::dedup::{dedup, DedupOptions};
use crate::curation::diversity::{enforce_diversity, DiversityLimits, DEFAULT_MAX_ITEMS};
use crate::curation::rules::{apply_rules, count_applied_rules};
use crate::curation::scoring::{score_items, sort_by_score};
use crate::store::Store;
use crate::types::{CanonicalItem, Digest, DigestMeta, ItemFilter, ItemOrder, Result};
use chrono::{DateTime, Duration, Utc};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Render a window as `48h`, or `90m` when it is not a whole number of hours.
pub fn format_window(window: Duration) -> String {
    let minutes = window.num_minutes();
    if minutes % 60 == 0 {
        format!("{}h", minutes / 60)
    } else {
        format!("{}m", minutes)
    }
}

/// Runs rules → dedup → scoring → sort → diversity over a time window.
///
/// Not safe to run twice concurrently against the same store: score and
/// edge writes from both runs would interleave.
pub struct CurationEngine {
    store: Arc<Store>,
    limits: DiversityLimits,
    dedup: DedupOptions,
}

impl CurationEngine {
    pub fn new(store: Arc<Store>) -> Self {
        Self {
            store,
            limits: DiversityLimits::default(),
            dedup: DedupOptions::default(),
        }
    }

    pub fn with_limits(mut self, limits: DiversityLimits) -> Self {
        self.limits = limits;
        self
    }

    pub fn with_dedup(mut self, dedup: DedupOptions) -> Self {
        self.dedup = dedup;
        self
    }

    pub async fn generate_digest(&self, window: Duration, max_items: usize, title: &str) -> Result<Digest> {
        self.generate_digest_at(Utc::now(), window, max_items, title).await
    }

    /// Same as [`generate_digest`](Self::generate_digest) with an explicit clock.
    pub async fn generate_digest_at(
        &self,
        now: DateTime<Utc>,
        window: Duration,
        max_items: usize,
        title: &str,
    ) -> Result<Digest> {
        let max_items = if max_items == 0 { DEFAULT_MAX_ITEMS } else { max_items };

        let items = self
            .store
            .list_items(&ItemFilter {
                since: Some(window),
                order: ItemOrder::Chronological,
                ..Default::default()
            })
            .await?;
        let items_considered = items.len();
        debug!("Loaded {} items from the last {}", items_considered, format_window(window));

        let rules = self.store.list_rules().await?;
        let (filtered, boosts) = apply_rules(items, &rules);
        let rules_applied = count_applied_rules(items_considered, filtered.len(), &boosts);

        let filtered_count = filtered.len();
        let (mut deduped, edges) = dedup(filtered, &self.dedup);
        let items_deduped = filtered_count - deduped.len();
        for edge in &edges {
            if let Err(e) = self.store.record_dedup_edge(edge).await {
                warn!("Failed to record dedup edge {} ~ {}: {}", edge.id_a, edge.id_b, e);
            }
        }

        let weights = self.source_weights().await?;
        score_items(&mut deduped, &weights, &boosts, now);
        sort_by_score(&mut deduped);

        let selected = enforce_diversity(deduped, &self.limits, max_items);
        for item in &selected {
            if let Err(e) = self.store.update_score(&item.id, item.computed_score).await {
                warn!("Failed to persist score for {}: {}", item.id, e);
            }
        }

        let mut digest = Digest::new(title, format_window(window), max_items, now);
        digest.id = Uuid::new_v4().to_string();
        digest.meta = DigestMeta {
            sources_synced: count_sources(&selected),
            items_considered,
            items_deduped,
            rules_applied,
        };
        digest.set_items(selected);

        info!(
            "Generated digest {:?}: {} of {} items ({} deduped, {} rules applied)",
            digest.title, digest.item_count, items_considered, items_deduped, rules_applied
        );

        if let Err(e) = self.store.save_digest(&digest).await {
            warn!("Failed to save digest to history: {}", e);
        }

        Ok(digest)
    }

    async fn source_weights(&self) -> Result<HashMap<String, f64>> {
        Ok(self
            .store
            .list_sources()
            .await?
            .into_iter()
            .filter(|s| s.weight != 0.0)
            .map(|s| (s.name, s.weight))
            .collect())
    }
}

fn count_sources(items: &[CanonicalItem]) -> usize {
    items.iter().map(|i| i.source.name.as_str()).collect::<HashSet<_>>().len()
}
