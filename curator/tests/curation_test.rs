mod common;

use chrono::{Duration, TimeZone, Utc};
use common::{init_tracing, item, tagged, with_score};
use curator::curation::dedup::{
    dedup, normalize_title, titles_match, DedupOptions, CANONICAL_URL_CONFIDENCE, FINGERPRINT_CONFIDENCE,
    FUZZY_TITLE_CONFIDENCE,
};
use curator::curation::diversity::{enforce_diversity, DiversityLimits};
use curator::curation::rules::{apply_rules, count_applied_rules, BOOST_FACTOR};
use curator::curation::scoring::{engagement_score, recency_score, score_items, sort_by_score, user_boost};
use curator::types::{Engagement, Rule, RuleKind};
use std::collections::HashMap;

fn rule(id: i64, kind: RuleKind, pattern: &str) -> Rule {
    Rule {
        id,
        kind,
        pattern: pattern.to_string(),
        enabled: true,
        created_at: Utc::now(),
    }
}

fn now() -> chrono::DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 3, 1, 12, 0, 0).unwrap()
}

// ---- rules ----

#[test]
fn mute_domain_ignores_case_and_www() {
    init_tracing();
    let items = vec![
        item("Muted", "https://www.Spam.example/a", "Hacker News", now()),
        item("Kept", "https://good.example/b", "Hacker News", now()),
    ];
    let rules = vec![rule(1, RuleKind::MuteDomain, "WWW.spam.example")];

    let (surviving, boosts) = apply_rules(items, &rules);
    assert_eq!(surviving.len(), 1);
    assert_eq!(surviving[0].title, "Kept");
    assert!(boosts.is_empty());
    assert_eq!(count_applied_rules(2, surviving.len(), &boosts), 1);
}

#[test]
fn mute_source_matches_lowercased_name() {
    let items = vec![
        item("From reddit", "https://a.example/1", "Reddit", now()),
        item("From lobsters", "https://b.example/2", "Lobste.rs", now()),
    ];
    let (surviving, _) = apply_rules(items, &[rule(1, RuleKind::MuteSource, "reddit")]);
    assert_eq!(surviving.len(), 1);
    assert_eq!(surviving[0].source.name, "Lobste.rs");
}

#[test]
fn boosts_never_drop_and_count_once_per_pattern() {
    let items = vec![
        item("One", "https://a.example/1", "HN", now()),
        item("Two", "https://b.example/2", "HN", now()),
    ];
    let rules = vec![
        rule(1, RuleKind::BoostTag, "Rust"),
        rule(2, RuleKind::BoostTag, "rust"),
        rule(3, RuleKind::BoostDomain, "b.example"),
    ];

    let (surviving, boosts) = apply_rules(items, &rules);
    assert_eq!(surviving.len(), 2);
    assert_eq!(boosts.len(), 2);
    assert_eq!(boosts.get("rust"), Some(&BOOST_FACTOR));
    assert_eq!(count_applied_rules(2, 2, &boosts), 2);
}

#[test]
fn boost_domain_matches_without_www() {
    let (_, boosts) = apply_rules(Vec::new(), &[rule(1, RuleKind::BoostDomain, "WWW.Blog.example")]);
    assert_eq!(boosts.get("blog.example"), Some(&BOOST_FACTOR));

    let post = item("Post", "https://www.blog.example/p", "HN", now());
    assert_eq!(user_boost(&post, &boosts), BOOST_FACTOR);
}

#[test]
fn disabled_rules_are_ignored() {
    let mut muted = rule(1, RuleKind::MuteDomain, "a.example");
    muted.enabled = false;
    let (surviving, _) = apply_rules(vec![item("One", "https://a.example/1", "HN", now())], &[muted]);
    assert_eq!(surviving.len(), 1);
}

// ---- dedup ----

#[test]
fn normalize_strips_repost_prefixes() {
    assert_eq!(normalize_title("  Show HN: My Thing "), "my thing");
    assert_eq!(normalize_title("[D] Is attention enough?"), "is attention enough?");
    assert_eq!(normalize_title("Plain title"), "plain title");
}

#[test]
fn title_containment_needs_close_lengths() {
    assert!(titles_match("rust 2.0 released", "rust 2.0 released", 0.7));
    assert!(titles_match("rust 2.0 released today", "rust 2.0 released today!", 0.7));
    assert!(!titles_match("rust", "rust 2.0 released today", 0.7));
    assert!(!titles_match("", "", 0.7));
}

#[test]
fn same_fingerprint_keeps_first() {
    init_tracing();
    let first = item("Launch post", "https://example.com/launch?utm_source=hn", "HN", now());
    let second = item("Launch post (mirror)", "https://example.com/launch", "Reddit", now());
    assert_eq!(first.fingerprint, second.fingerprint);

    let (kept, edges) = dedup(vec![first.clone(), second.clone()], &DedupOptions::default());
    assert_eq!(kept.len(), 1);
    assert_eq!(kept[0].source.name, "HN");
    assert_eq!(edges.len(), 1);
    assert_eq!(edges[0].confidence, FINGERPRINT_CONFIDENCE);
}

#[test]
fn same_canonical_url_with_distinct_fingerprints() {
    let mut first = item("Alpha", "https://example.com/a?utm_source=x", "HN", now());
    let mut second = item("Beta", "https://example.com/a", "Reddit", now());
    first.fingerprint = interfaces::fingerprint(&first.url);
    second.fingerprint = interfaces::fingerprint(&second.url);
    assert_ne!(first.fingerprint, second.fingerprint);

    let (kept, edges) = dedup(vec![first, second], &DedupOptions::default());
    assert_eq!(kept.len(), 1);
    assert_eq!(kept[0].title, "Alpha");
    assert_eq!(edges[0].confidence, CANONICAL_URL_CONFIDENCE);
}

#[test]
fn fuzzy_titles_collapse_across_urls() {
    let first = item("Show HN: Rust 2.0 released today", "https://blog.example/rust", "HN", now());
    let second = item("Rust 2.0 released today!", "https://news.example/rust-2", "Reddit", now());

    let (kept, edges) = dedup(vec![first.clone(), second.clone()], &DedupOptions::default());
    assert_eq!(kept.len(), 1);
    assert_eq!(kept[0].id, first.id);
    assert_eq!(edges[0].confidence, FUZZY_TITLE_CONFIDENCE);

    let edge = &edges[0];
    assert!(edge.id_a < edge.id_b);
    let mut pair = vec![first.id, second.id];
    pair.sort();
    assert_eq!(vec![edge.id_a.clone(), edge.id_b.clone()], pair);
}

#[test]
fn empty_titles_never_merge() {
    let a = item("", "https://a.example/1", "HN", now());
    let b = item("", "https://b.example/2", "HN", now());
    let (kept, edges) = dedup(vec![a, b], &DedupOptions::default());
    assert_eq!(kept.len(), 2);
    assert!(edges.is_empty());
}

#[test]
fn survivors_keep_input_order() {
    let items = vec![
        item("First", "https://a.example/1", "HN", now()),
        item("Second", "https://b.example/2", "HN", now()),
        item("First", "https://c.example/3", "HN", now()),
        item("Third", "https://d.example/4", "HN", now()),
    ];
    let (kept, _) = dedup(items, &DedupOptions::default());
    let titles: Vec<&str> = kept.iter().map(|i| i.title.as_str()).collect();
    assert_eq!(titles, vec!["First", "Second", "Third"]);
}

// ---- scoring ----

#[test]
fn recency_decays_daily_with_floor() {
    let now = now();
    assert!((recency_score(now, now) - 1.0).abs() < 1e-9);
    assert!((recency_score(now - Duration::hours(24), now) - (-1.0f64).exp()).abs() < 1e-9);
    assert_eq!(recency_score(now - Duration::days(30), now), 0.1);
    assert_eq!(recency_score(now + Duration::hours(5), now), 1.0);
}

#[test]
fn engagement_is_log_scaled_and_capped() {
    assert_eq!(engagement_score(&Engagement::default()), 1.0);

    let pivot = Engagement { points: Some(500.0), ..Default::default() };
    assert!((engagement_score(&pivot) - 1.0).abs() < 1e-9);

    let mixed = Engagement {
        points: Some(100.0),
        stars: Some(20.0),
        comments: Some(40.0),
    };
    let expected = 121f64.ln() / 501f64.ln();
    assert!((engagement_score(&mixed) - expected).abs() < 1e-9);

    let viral = Engagement { stars: Some(1e9), ..Default::default() };
    assert_eq!(engagement_score(&viral), 2.0);
}

#[test]
fn boost_lookup_prefers_tags_then_source_then_domain() {
    let mut boosts = HashMap::new();
    boosts.insert("rust".to_string(), 2.0);
    boosts.insert("lobste.rs".to_string(), 3.0);
    boosts.insert("blog.example".to_string(), 4.0);

    let by_tag = tagged(item("A", "https://blog.example/a", "Lobste.rs", now()), &["Rust"]);
    assert_eq!(user_boost(&by_tag, &boosts), 2.0);

    let by_source = item("B", "https://blog.example/b", "Lobste.rs", now());
    assert_eq!(user_boost(&by_source, &boosts), 3.0);

    let by_domain = item("C", "https://www.blog.example/c", "HN", now());
    assert_eq!(user_boost(&by_domain, &boosts), 4.0);

    let none = item("D", "https://other.example/d", "HN", now());
    assert_eq!(user_boost(&none, &boosts), 1.0);
}

#[test]
fn score_is_the_product_of_factors() {
    let now = now();
    let mut weights = HashMap::new();
    weights.insert("HN".to_string(), 1.5);
    let mut boosts = HashMap::new();
    boosts.insert("ai".to_string(), 2.0);

    let mut items = vec![tagged(item("A", "https://a.example/1", "HN", now - Duration::hours(12)), &["ai"])];
    score_items(&mut items, &weights, &boosts, now);

    let expected = (-0.5f64).exp() * 1.5 * 1.0 * 2.0;
    assert!((items[0].computed_score - expected).abs() < 1e-9);
}

#[test]
fn sort_is_stable_on_ties() {
    let mut items = vec![
        with_score(item("low", "https://a.example/1", "HN", now()), 0.2),
        with_score(item("tie-1", "https://a.example/2", "HN", now()), 0.5),
        with_score(item("tie-2", "https://a.example/3", "HN", now()), 0.5),
        with_score(item("high", "https://a.example/4", "HN", now()), 0.9),
    ];
    sort_by_score(&mut items);
    let titles: Vec<&str> = items.iter().map(|i| i.title.as_str()).collect();
    assert_eq!(titles, vec!["high", "tie-1", "tie-2", "low"]);
}

// ---- diversity ----

#[test]
fn source_cap_rounds_down_but_allows_one() {
    let limits = DiversityLimits::default();
    assert_eq!(limits.source_cap(10), 4);
    assert_eq!(limits.source_cap(25), 10);
    assert_eq!(limits.source_cap(1), 1);
}

#[test]
fn domain_cap_skips_extra_items() {
    let items: Vec<_> = (0..5)
        .map(|i| item(&format!("Post {}", i), &format!("https://same.example/{}", i), &format!("S{}", i), now()))
        .collect();
    let selected = enforce_diversity(items, &DiversityLimits::default(), 10);
    assert_eq!(selected.len(), 3);
}

#[test]
fn source_cap_limits_one_source() {
    let items: Vec<_> = (0..6)
        .map(|i| item(&format!("Post {}", i), &format!("https://d{}.example/", i), "HN", now()))
        .collect();
    let selected = enforce_diversity(items, &DiversityLimits::default(), 10);
    assert_eq!(selected.len(), 4);
    assert!(selected.iter().all(|i| i.source.name == "HN"));
}

#[test]
fn tag_cluster_cap() {
    let items: Vec<_> = (0..5)
        .map(|i| {
            tagged(
                item(&format!("Post {}", i), &format!("https://d{}.example/", i), &format!("S{}", i), now()),
                &["llm"],
            )
        })
        .collect();
    let selected = enforce_diversity(items, &DiversityLimits::default(), 10);
    assert_eq!(selected.len(), 3);
}

#[test]
fn selection_stops_at_max_and_keeps_order() {
    let items: Vec<_> = (0..8)
        .map(|i| item(&format!("Post {}", i), &format!("https://d{}.example/", i), &format!("S{}", i), now()))
        .collect();
    let limits = DiversityLimits {
        max_source_percent: 1.0,
        ..Default::default()
    };
    let selected = enforce_diversity(items, &limits, 5);
    let titles: Vec<&str> = selected.iter().map(|i| i.title.as_str()).collect();
    assert_eq!(titles, vec!["Post 0", "Post 1", "Post 2", "Post 3", "Post 4"]);
}

#[test]
fn zero_max_falls_back_to_default() {
    let items: Vec<_> = (0..30)
        .map(|i| item(&format!("Post {}", i), &format!("https://d{}.example/", i), &format!("S{}", i), now()))
        .collect();
    let selected = enforce_diversity(items, &DiversityLimits::default(), 0);
    assert_eq!(selected.len(), 25);
}
