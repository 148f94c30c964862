pub mod arxiv;
pub mod github;
pub mod hackernews;
pub mod hnsearch;
pub mod lobsters;
pub mod reddit;
pub mod rss_feed;

pub use arxiv::ArxivSource;
pub use github::GithubTrendingSource;
pub use hackernews::HackerNewsSource;
pub use hnsearch::HnSearchSource;
pub use lobsters::LobstersSource;
pub use reddit::RedditSource;
pub use rss_feed::{FeedFlavor, RssFeedSource};

use crate::config::SourceProfile;
use crate::fetcher::Fetcher;
use crate::traits::SourceAdapter;
use crate::types::{AggregatorError, Result};
use std::sync::Arc;

/// Driver names accepted in `[[sources]]`.
pub const DRIVERS: &[&str] = &["hackernews", "hnsearch", "github-trending", "lobsters", "reddit", "arxiv", "rss", "tldr"];

/// Cut `text` to at most `max` characters, ending in `...` when shortened.
pub fn truncate_chars(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_string();
    }
    let keep = max.saturating_sub(3);
    let mut out: String = text.chars().take(keep).collect();
    out.push_str("...");
    out
}

/// Build the adapter for one configured source.
pub fn build_adapter(profile: &SourceProfile, fetcher: &Fetcher, fanout: usize) -> Result<Arc<dyn SourceAdapter>> {
    let name = profile.name.clone();
    let icon = profile.icon.clone().unwrap_or_else(|| default_icon(&profile.driver).to_string());
    let fetcher = fetcher.clone();

    let adapter: Arc<dyn SourceAdapter> = match profile.driver.as_str() {
        "hackernews" => Arc::new(HackerNewsSource::new(name, icon, fetcher, fanout)),
        "hnsearch" => Arc::new(HnSearchSource::new(name, icon, profile.queries.clone(), fetcher)),
        "github-trending" => Arc::new(GithubTrendingSource::new(name, icon, profile.topics.clone(), fetcher)),
        "lobsters" => Arc::new(LobstersSource::new(name, icon, profile.tags.clone(), fetcher)),
        "reddit" => Arc::new(RedditSource::new(name, icon, profile.subreddits.clone(), fetcher)),
        "arxiv" => Arc::new(ArxivSource::new(name, icon, profile.categories.clone(), fetcher)?),
        "rss" | "tldr" => {
            let url = profile
                .feed_url
                .clone()
                .ok_or_else(|| AggregatorError::Config(format!("source {} needs a feed_url", profile.key)))?;
            let flavor = if profile.driver == "tldr" { FeedFlavor::Newsletter } else { FeedFlavor::News };
            Arc::new(RssFeedSource::new(name, icon, url, flavor, fetcher))
        }
        other => return Err(AggregatorError::Config(format!("unknown source driver: {}", other))),
    };

    Ok(adapter)
}

/// Adapters for every enabled profile, in configuration order.
pub fn build_adapters(profiles: &[SourceProfile], fetcher: &Fetcher, fanout: usize) -> Result<Vec<Arc<dyn SourceAdapter>>> {
    profiles
        .iter()
        .filter(|p| p.enabled)
        .map(|p| build_adapter(p, fetcher, fanout))
        .collect()
}

fn default_icon(driver: &str) -> &'static str {
    match driver {
        "hackernews" => "🔶",
        "hnsearch" => "🔍",
        "github-trending" => "⭐",
        "lobsters" => "🦞",
        "reddit" => "🤖",
        "arxiv" => "📄",
        "tldr" => "💡",
        _ => "📰",
    }
}
