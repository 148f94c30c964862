use crate::fetcher::Fetcher;
use crate::parser::{FeedParser, ParsedEntry};
use crate::traits::SourceAdapter;
use crate::types::{Priority, RawItem, Result, SourceConfig};
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use tracing::{info, warn};

/// How a feed's entries are prioritized and categorized.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeedFlavor {
    /// Generic news/blog feed: fresher entries rank higher
    News,
    /// Curated newsletter issue: everything is at least medium
    Newsletter,
}

impl FeedFlavor {
    fn kind(&self) -> &'static str {
        match self {
            FeedFlavor::News => "rss",
            FeedFlavor::Newsletter => "tldr",
        }
    }

    fn category(&self) -> &'static str {
        match self {
            FeedFlavor::News => "news",
            FeedFlavor::Newsletter => "newsletter",
        }
    }

    fn default_max(&self) -> usize {
        match self {
            FeedFlavor::News => 5,
            FeedFlavor::Newsletter => 8,
        }
    }

    fn priority(&self, age: Duration) -> Priority {
        match self {
            FeedFlavor::News if age < Duration::hours(1) => Priority::High,
            FeedFlavor::News if age < Duration::hours(6) => Priority::Medium,
            FeedFlavor::News => Priority::Low,
            FeedFlavor::Newsletter if age < Duration::hours(6) => Priority::High,
            FeedFlavor::Newsletter => Priority::Medium,
        }
    }
}

pub fn map_entries(entries: Vec<ParsedEntry>, flavor: FeedFlavor, max: usize, now: DateTime<Utc>) -> Vec<RawItem> {
    entries
        .into_iter()
        .take(max)
        .map(|entry| {
            let timestamp = entry.timestamp();
            let age = now - timestamp.unwrap_or(now);

            RawItem {
                title: entry.title,
                url: entry.url,
                summary: entry.summary.unwrap_or_default(),
                body: entry.content.unwrap_or_default(),
                priority: flavor.priority(age),
                timestamp,
                category: Some(flavor.category().to_string()),
                tags: entry.categories,
                ..Default::default()
            }
        })
        .collect()
}

/// Any RSS/Atom feed, including newsletter feeds.
pub struct RssFeedSource {
    name: String,
    icon: String,
    url: String,
    flavor: FeedFlavor,
    fetcher: Fetcher,
}

impl RssFeedSource {
    pub fn new(name: impl Into<String>, icon: impl Into<String>, url: impl Into<String>, flavor: FeedFlavor, fetcher: Fetcher) -> Self {
        Self {
            name: name.into(),
            icon: icon.into(),
            url: url.into(),
            flavor,
            fetcher,
        }
    }
}

#[async_trait]
impl SourceAdapter for RssFeedSource {
    fn name(&self) -> &str {
        &self.name
    }

    fn icon(&self) -> &str {
        &self.icon
    }

    fn kind(&self) -> &str {
        self.flavor.kind()
    }

    fn url(&self) -> Option<&str> {
        Some(&self.url)
    }

    async fn fetch(&self, config: &SourceConfig) -> Result<Vec<RawItem>> {
        info!("Pulling feed: {}", self.url);
        let max = config.max_items(self.flavor.default_max());

        let content = self.fetcher.get_text(&self.url).await?;
        let entries = FeedParser::new().parse(&content)?;
        if entries.is_empty() {
            warn!("{}: feed had no entries", self.name);
        }

        let items = map_entries(entries, self.flavor, max, Utc::now());
        info!("{}: fetched {} items", self.name, items.len());
        Ok(items)
    }
}
