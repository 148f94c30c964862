use crate::types::{CanonicalItem, Rule, RuleKind};
use std::collections::{HashMap, HashSet};
use tracing::debug;

/// Lowercased boost pattern (tag, source name or domain) to multiplier.
pub type BoostMap = HashMap<String, f64>;

pub const BOOST_FACTOR: f64 = 2.0;

/// Domain patterns are compared against `CanonicalItem::domain`, which has no `www.`
fn bare_domain(pattern: String) -> String {
    match pattern.strip_prefix("www.") {
        Some(rest) => rest.to_string(),
        None => pattern,
    }
}

/// Drop muted items and collect boost patterns for scoring. Boosts never drop anything.
pub fn apply_rules(items: Vec<CanonicalItem>, rules: &[Rule]) -> (Vec<CanonicalItem>, BoostMap) {
    let mut mute_domains = HashSet::new();
    let mut mute_sources = HashSet::new();
    let mut boosts = BoostMap::new();

    for rule in rules.iter().filter(|r| r.enabled) {
        let pattern = rule.pattern.trim().to_lowercase();
        if pattern.is_empty() {
            continue;
        }
        match rule.kind {
            RuleKind::MuteDomain => {
                mute_domains.insert(bare_domain(pattern));
            }
            RuleKind::MuteSource => {
                mute_sources.insert(pattern);
            }
            RuleKind::BoostTag => {
                boosts.insert(pattern, BOOST_FACTOR);
            }
            RuleKind::BoostDomain => {
                boosts.insert(bare_domain(pattern), BOOST_FACTOR);
            }
        }
    }

    let before = items.len();
    let surviving: Vec<CanonicalItem> = items
        .into_iter()
        .filter(|item| {
            let muted = mute_domains.contains(&item.domain()) || mute_sources.contains(&item.source.name.to_lowercase());
            if muted {
                debug!("Muted: {} ({})", item.title, item.source.name);
            }
            !muted
        })
        .collect();

    debug!(
        "Rules: {} muted, {} boost patterns",
        before - surviving.len(),
        boosts.len()
    );
    (surviving, boosts)
}

/// Muted items plus distinct boost patterns.
pub fn count_applied_rules(original: usize, surviving: usize, boosts: &BoostMap) -> usize {
    original.saturating_sub(surviving) + boosts.len()
}
