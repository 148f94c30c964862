use crate::curation::rules::BoostMap;
use crate::types::{CanonicalItem, Engagement};
use chrono::{DateTime, Utc};
use std::collections::HashMap;

const RECENCY_FLOOR: f64 = 0.1;
const ENGAGEMENT_CAP: f64 = 2.0;
/// Signal that maps to an engagement factor of exactly 1.0
const ENGAGEMENT_PIVOT: f64 = 500.0;

/// `exp(-age_h / 24)`, floored at 0.1. Future timestamps count as brand new.
pub fn recency_score(published: DateTime<Utc>, now: DateTime<Utc>) -> f64 {
    let age_hours = ((now - published).num_milliseconds() as f64 / 3_600_000.0).max(0.0);
    (-age_hours / 24.0).exp().max(RECENCY_FLOOR)
}

/// `ln(1 + signal) / ln(501)`, capped at 2.0; neutral when there is no signal.
pub fn engagement_score(engagement: &Engagement) -> f64 {
    let signal = engagement.signal();
    if signal <= 0.0 {
        return 1.0;
    }
    ((1.0 + signal).ln() / (1.0 + ENGAGEMENT_PIVOT).ln()).min(ENGAGEMENT_CAP)
}

/// Configured weight for the source; unknown or zero weights are neutral.
pub fn source_weight(source_name: &str, weights: &HashMap<String, f64>) -> f64 {
    match weights.get(source_name) {
        Some(&w) if w != 0.0 => w,
        _ => 1.0,
    }
}

/// First matching boost, checking tags, then the source name, then the domain.
pub fn user_boost(item: &CanonicalItem, boosts: &BoostMap) -> f64 {
    if boosts.is_empty() {
        return 1.0;
    }
    if let Some(b) = item.tags.iter().find_map(|t| boosts.get(&t.to_lowercase())) {
        return *b;
    }
    if let Some(b) = boosts.get(&item.source.name.to_lowercase()) {
        return *b;
    }
    let domain = item.domain();
    if !domain.is_empty() {
        if let Some(b) = boosts.get(&domain) {
            return *b;
        }
    }
    1.0
}

/// `recency × source_weight × engagement × user_boost`, written to `computed_score`.
pub fn score_items(items: &mut [CanonicalItem], weights: &HashMap<String, f64>, boosts: &BoostMap, now: DateTime<Utc>) {
    for item in items.iter_mut() {
        item.computed_score = recency_score(item.published_at, now)
            * source_weight(&item.source.name, weights)
            * engagement_score(&item.engagement)
            * user_boost(item, boosts);
    }
}

/// Highest score first. Stable, so equal scores keep their load order.
pub fn sort_by_score(items: &mut [CanonicalItem]) {
    items.sort_by(|a, b| {
        b.computed_score
            .partial_cmp(&a.computed_score)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
}
