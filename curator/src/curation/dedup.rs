use crate::types::{CanonicalItem, DedupEdge};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::debug;

pub const FINGERPRINT_CONFIDENCE: f64 = 1.0;
pub const CANONICAL_URL_CONFIDENCE: f64 = 0.95;
pub const FUZZY_TITLE_CONFIDENCE: f64 = 0.8;

/// Repost prefixes that say nothing about the content.
const NOISE_PREFIXES: &[&str] = &["show hn: ", "ask hn: ", "tell hn: ", "[p] ", "[d] "];

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DedupOptions {
    /// Minimum shorter/longer length ratio for a containment match
    pub title_ratio: f64,
}

impl Default for DedupOptions {
    fn default() -> Self {
        Self { title_ratio: 0.7 }
    }
}

pub fn normalize_title(title: &str) -> String {
    let mut t = title.trim().to_lowercase();
    for prefix in NOISE_PREFIXES {
        if let Some(rest) = t.strip_prefix(prefix) {
            t = rest.to_string();
        }
    }
    t
}

/// Equal normalized titles, or one containing the other with lengths within `ratio`.
/// Expects already-normalized input; empty titles never match.
pub fn titles_match(a: &str, b: &str, ratio: f64) -> bool {
    if a.is_empty() || b.is_empty() {
        return false;
    }
    if a == b {
        return true;
    }
    if a.contains(b) || b.contains(a) {
        let (la, lb) = (a.chars().count(), b.chars().count());
        let (shorter, longer) = if la <= lb { (la, lb) } else { (lb, la) };
        return shorter as f64 / longer as f64 > ratio;
    }
    false
}

/// Collapse duplicates, keeping the first occurrence of each.
///
/// Strategies run in order against everything accepted so far: fingerprint,
/// canonical URL, then fuzzy title. Returns survivors in input order and one
/// edge per dropped item.
pub fn dedup(items: Vec<CanonicalItem>, options: &DedupOptions) -> (Vec<CanonicalItem>, Vec<DedupEdge>) {
    let mut by_fingerprint: HashMap<String, usize> = HashMap::new();
    let mut by_url: HashMap<String, usize> = HashMap::new();
    let mut titles: Vec<String> = Vec::new();
    let mut kept: Vec<CanonicalItem> = Vec::new();
    let mut edges = Vec::new();

    for item in items {
        let normalized = normalize_title(&item.title);

        let duplicate_of = if let Some(&idx) = by_fingerprint.get(&item.fingerprint) {
            Some((idx, FINGERPRINT_CONFIDENCE))
        } else if let Some(&idx) = by_url.get(&item.canonical_url) {
            // empty canonical URLs are never indexed
            Some((idx, CANONICAL_URL_CONFIDENCE))
        } else {
            titles
                .iter()
                .position(|existing| titles_match(&normalized, existing, options.title_ratio))
                .map(|idx| (idx, FUZZY_TITLE_CONFIDENCE))
        };

        if let Some((idx, confidence)) = duplicate_of {
            debug!("Duplicate ({:.2}): {:?} -> {:?}", confidence, item.title, kept[idx].title);
            edges.push(DedupEdge::new(&kept[idx].id, &item.id, confidence));
            continue;
        }

        let idx = kept.len();
        by_fingerprint.insert(item.fingerprint.clone(), idx);
        if !item.canonical_url.is_empty() {
            by_url.insert(item.canonical_url.clone(), idx);
        }
        titles.push(normalized);
        kept.push(item);
    }

    (kept, edges)
}
