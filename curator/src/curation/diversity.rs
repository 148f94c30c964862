use crate::types::CanonicalItem;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::debug;

pub const DEFAULT_MAX_ITEMS: usize = 25;

/// Maximum concentration from any one domain, source or tag in a digest.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DiversityLimits {
    /// 0 disables the domain cap
    pub max_per_domain: usize,
    pub max_source_percent: f64,
    /// 0 disables the tag cap
    pub max_per_tag_cluster: usize,
}

impl Default for DiversityLimits {
    fn default() -> Self {
        Self {
            max_per_domain: 3,
            max_source_percent: 0.4,
            max_per_tag_cluster: 3,
        }
    }
}

impl DiversityLimits {
    /// Items allowed from one source: `max(1, floor(max_items × percent))`.
    pub fn source_cap(&self, max_items: usize) -> usize {
        ((max_items as f64 * self.max_source_percent).floor() as usize).max(1)
    }
}

/// Greedy single pass over score-sorted items, skipping anything that would
/// break a cap. Checks run domain, source, then tag.
pub fn enforce_diversity(items: Vec<CanonicalItem>, limits: &DiversityLimits, max_items: usize) -> Vec<CanonicalItem> {
    let max_items = if max_items == 0 { DEFAULT_MAX_ITEMS } else { max_items };
    let source_cap = limits.source_cap(max_items);

    let mut per_domain: HashMap<String, usize> = HashMap::new();
    let mut per_source: HashMap<String, usize> = HashMap::new();
    let mut per_tag: HashMap<String, usize> = HashMap::new();
    let mut selected = Vec::with_capacity(max_items.min(items.len()));

    for item in items {
        if selected.len() >= max_items {
            break;
        }

        let domain = item.domain();
        if limits.max_per_domain > 0
            && !domain.is_empty()
            && per_domain.get(&domain).copied().unwrap_or(0) >= limits.max_per_domain
        {
            debug!("Diversity: domain {} full, skipping {:?}", domain, item.title);
            continue;
        }

        if per_source.get(&item.source.name).copied().unwrap_or(0) >= source_cap {
            debug!("Diversity: source {} full, skipping {:?}", item.source.name, item.title);
            continue;
        }

        if limits.max_per_tag_cluster > 0
            && item
                .tags
                .iter()
                .any(|t| per_tag.get(t).copied().unwrap_or(0) >= limits.max_per_tag_cluster)
        {
            debug!("Diversity: tag cluster full, skipping {:?}", item.title);
            continue;
        }

        if !domain.is_empty() {
            *per_domain.entry(domain).or_default() += 1;
        }
        *per_source.entry(item.source.name.clone()).or_default() += 1;
        for tag in &item.tags {
            *per_tag.entry(tag.clone()).or_default() += 1;
        }
        selected.push(item);
    }

    selected
}
