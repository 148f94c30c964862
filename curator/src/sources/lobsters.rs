use crate::fetcher::Fetcher;
use crate::traits::SourceAdapter;
use crate::types::{Engagement, Priority, RawItem, Result, SourceConfig};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use tracing::info;

const HOTTEST_URL: &str = "https://lobste.rs/hottest.json";
const DEFAULT_MAX: usize = 10;

#[derive(Debug, Clone, Deserialize)]
pub struct Story {
    pub short_id: String,
    pub title: String,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub score: i64,
    #[serde(default)]
    pub flags: i64,
    #[serde(default)]
    pub comment_count: i64,
    #[serde(default)]
    pub description_plain: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub comments_url: String,
}

fn priority_for(score: i64) -> Priority {
    match score {
        s if s >= 30 => Priority::Urgent,
        s if s >= 15 => Priority::High,
        s if s >= 5 => Priority::Medium,
        _ => Priority::Low,
    }
}

/// Map hottest stories, honoring the optional tag filter and skipping flagged ones.
pub fn map_stories(stories: Vec<Story>, tag_filter: &[String], max: usize) -> Vec<RawItem> {
    stories
        .into_iter()
        .filter(|s| tag_filter.is_empty() || s.tags.iter().any(|t| tag_filter.contains(t)))
        .filter(|s| s.flags <= 2)
        .take(max)
        .map(|story| {
            // text posts have no outbound link
            let url = if story.url.is_empty() { story.comments_url.clone() } else { story.url.clone() };

            RawItem {
                title: story.title,
                url,
                summary: story.description_plain,
                priority: priority_for(story.score),
                timestamp: story
                    .created_at
                    .as_deref()
                    .and_then(|t| DateTime::parse_from_rfc3339(t).ok())
                    .map(|t| t.with_timezone(&Utc)),
                category: Some("tech".to_string()),
                tags: story.tags,
                engagement: Engagement {
                    points: Some(story.score as f64),
                    stars: None,
                    comments: Some(story.comment_count as f64),
                },
                ..Default::default()
            }
        })
        .collect()
}

/// Lobste.rs hottest stories.
pub struct LobstersSource {
    name: String,
    icon: String,
    tags: Vec<String>,
    fetcher: Fetcher,
}

impl LobstersSource {
    pub fn new(name: impl Into<String>, icon: impl Into<String>, tags: Vec<String>, fetcher: Fetcher) -> Self {
        Self {
            name: name.into(),
            icon: icon.into(),
            tags,
            fetcher,
        }
    }
}

#[async_trait]
impl SourceAdapter for LobstersSource {
    fn name(&self) -> &str {
        &self.name
    }

    fn icon(&self) -> &str {
        &self.icon
    }

    fn kind(&self) -> &str {
        "lobsters"
    }

    fn url(&self) -> Option<&str> {
        Some(HOTTEST_URL)
    }

    async fn fetch(&self, config: &SourceConfig) -> Result<Vec<RawItem>> {
        let max = config.max_items(DEFAULT_MAX);
        let stories: Vec<Story> = self.fetcher.get_json(HOTTEST_URL).await?;
        let items = map_stories(stories, &self.tags, max);
        info!("{}: fetched {} items", self.name, items.len());
        Ok(items)
    }
}
