use crate::store::Store;
use crate::traits::SourceAdapter;
use crate::types::{AggregatorError, CanonicalItem, ItemState, RawItem, Result, SourceConfig, SourceRef, SyncResult};
use chrono::{DateTime, Utc};
use futures::future::join_all;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, warn};

/// Normalize one adapter item into the interchange record.
pub fn convert_item(raw: RawItem, source: &SourceRef, fetched_at: DateTime<Utc>) -> CanonicalItem {
    let (canonical_url, fingerprint, id) = interfaces::identity(&raw.url, &raw.title, &source.name);

    let mut tags: Vec<String> = Vec::with_capacity(raw.tags.len() + 2);
    for tag in raw.tags.into_iter().chain(raw.language).chain(raw.category) {
        let tag = tag.trim().to_string();
        if !tag.is_empty() && !tags.contains(&tag) {
            tags.push(tag);
        }
    }

    CanonicalItem {
        id,
        title: raw.title,
        url: raw.url,
        canonical_url,
        source: source.clone(),
        published_at: raw.timestamp.unwrap_or(fetched_at),
        fetched_at,
        summary: raw.summary,
        body: raw.body,
        tags,
        computed_score: 0.0,
        engagement: raw.engagement,
        fingerprint,
        raw_score: raw.priority.seed_score(),
        state: ItemState::Unread,
    }
}

/// Totals across a sync run: (items inserted, sources attempted, sources failed).
pub fn summarize(results: &[SyncResult]) -> (usize, usize, usize) {
    let items = results.iter().map(|r| r.items_inserted).sum();
    let errors = results.iter().filter(|r| !r.is_ok()).count();
    (items, results.len(), errors)
}

/// Fetches every registered source concurrently under one deadline and
/// persists what came back. A failing source never affects the others.
pub struct SyncOrchestrator {
    store: Arc<Store>,
    sources: Vec<(Arc<dyn SourceAdapter>, SourceConfig)>,
    deadline: Duration,
}

impl SyncOrchestrator {
    pub fn new(store: Arc<Store>, deadline: Duration) -> Self {
        Self {
            store,
            sources: Vec::new(),
            deadline,
        }
    }

    pub fn register(&mut self, adapter: Arc<dyn SourceAdapter>, config: SourceConfig) {
        debug!("Registered source adapter: {} ({})", adapter.name(), adapter.kind());
        self.sources.push((adapter, config));
    }

    pub fn source_count(&self) -> usize {
        self.sources.len()
    }

    pub async fn sync_all(&self) -> Vec<SyncResult> {
        let mut active = Vec::with_capacity(self.sources.len());
        for (adapter, config) in &self.sources {
            if !config.enabled {
                debug!("Skipping disabled source {}", adapter.name());
                continue;
            }
            match self.store.source_by_name(adapter.name()).await {
                Ok(Some(record)) if !record.enabled => {
                    info!("Skipping {}: disabled in store", adapter.name());
                    continue;
                }
                Err(e) => warn!("Could not read source record for {}: {}", adapter.name(), e),
                _ => {}
            }
            active.push((adapter, config));
        }

        info!("Syncing {} sources (deadline {:?})", active.len(), self.deadline);

        let deadline = tokio::time::Instant::now() + self.deadline;
        let seconds = self.deadline.as_secs();
        let fetches = active.iter().map(|(adapter, config)| async move {
            match tokio::time::timeout_at(deadline, adapter.fetch(config)).await {
                Ok(outcome) => outcome,
                Err(_) => Err(AggregatorError::Timeout { seconds }),
            }
        });
        let outcomes = join_all(fetches).await;

        // persistence starts only once every fetch has finished or been abandoned
        let mut results = Vec::with_capacity(outcomes.len());
        for ((adapter, _), outcome) in active.iter().zip(outcomes) {
            results.push(self.persist(adapter, outcome).await);
        }

        let (items, sources, errors) = summarize(&results);
        info!("Synced {} items from {} sources ({} errors)", items, sources, errors);
        results
    }

    async fn persist(&self, adapter: &Arc<dyn SourceAdapter>, outcome: Result<Vec<RawItem>>) -> SyncResult {
        let name = adapter.name().to_string();

        let record = match self
            .store
            .get_or_create_source(adapter.name(), adapter.kind(), adapter.url(), adapter.icon())
            .await
        {
            Ok(record) => record,
            Err(e) => {
                error!("Could not register source {}: {}", name, e);
                return SyncResult {
                    name,
                    items_inserted: 0,
                    error: Some(e.to_string()),
                };
            }
        };

        let raw_items = match outcome {
            Ok(items) => items,
            Err(e) => {
                warn!("Source {} failed: {}", name, e);
                if let Err(db_err) = self.store.update_sync_result(record.id, false).await {
                    error!("Failed to record sync error for {}: {}", name, db_err);
                }
                return SyncResult {
                    name,
                    items_inserted: 0,
                    error: Some(e.to_string()),
                };
            }
        };

        let source = SourceRef {
            name: adapter.name().to_string(),
            icon: adapter.icon().to_string(),
        };
        let fetched_at = Utc::now();
        let fetched = raw_items.len();
        let mut inserted = 0;

        for raw in raw_items {
            let item = convert_item(raw, &source, fetched_at);
            match self.store.upsert_item(&item, record.id).await {
                Ok(true) => inserted += 1,
                Ok(false) => debug!("Refreshed existing item {}", item.id),
                Err(e) => warn!("Failed to store item {:?} from {}: {}", item.title, name, e),
            }
        }

        if let Err(e) = self.store.update_sync_result(record.id, true).await {
            error!("Failed to stamp sync for {}: {}", name, e);
        }

        info!("{}: {} fetched, {} new", name, fetched, inserted);
        SyncResult {
            name,
            items_inserted: inserted,
            error: None,
        }
    }
}
