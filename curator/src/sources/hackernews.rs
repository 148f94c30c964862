use crate::fetcher::Fetcher;
use crate::traits::SourceAdapter;
use crate::types::{Engagement, Priority, RawItem, Result, SourceConfig};
use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use futures::stream::{self, StreamExt};
use serde::Deserialize;
use tracing::{debug, info, warn};

const TOP_STORIES_URL: &str = "https://hacker-news.firebaseio.com/v0/topstories.json";
const DEFAULT_MAX: usize = 8;

#[derive(Debug, Clone, Deserialize)]
pub struct Story {
    pub id: u64,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub score: i64,
    #[serde(default)]
    pub by: String,
    #[serde(default)]
    pub time: i64,
    #[serde(default)]
    pub descendants: i64,
}

pub fn discussion_url(id: u64) -> String {
    format!("https://news.ycombinator.com/item?id={}", id)
}

fn priority_for(score: i64) -> Priority {
    match score {
        s if s > 500 => Priority::Urgent,
        s if s > 200 => Priority::High,
        s if s > 50 => Priority::Medium,
        _ => Priority::Low,
    }
}

/// Map fetched stories to raw items. Link-less stories point at their discussion page.
pub fn map_stories(stories: Vec<Story>) -> Vec<RawItem> {
    stories
        .into_iter()
        .filter(|s| !s.title.trim().is_empty())
        .map(|story| {
            let url = story
                .url
                .clone()
                .filter(|u| !u.is_empty())
                .unwrap_or_else(|| discussion_url(story.id));

            RawItem {
                title: story.title.clone(),
                url,
                summary: format!("{} points by {} • {} comments", story.score, story.by, story.descendants),
                priority: priority_for(story.score),
                timestamp: Utc.timestamp_opt(story.time, 0).single(),
                category: Some("hackernews".to_string()),
                engagement: Engagement {
                    points: Some(story.score as f64),
                    stars: None,
                    comments: Some(story.descendants as f64),
                },
                ..Default::default()
            }
        })
        .collect()
}

/// Hacker News front page via the Firebase API.
pub struct HackerNewsSource {
    name: String,
    icon: String,
    fetcher: Fetcher,
    fanout: usize,
}

impl HackerNewsSource {
    pub fn new(name: impl Into<String>, icon: impl Into<String>, fetcher: Fetcher, fanout: usize) -> Self {
        Self {
            name: name.into(),
            icon: icon.into(),
            fetcher,
            fanout: fanout.max(1),
        }
    }
}

#[async_trait]
impl SourceAdapter for HackerNewsSource {
    fn name(&self) -> &str {
        &self.name
    }

    fn icon(&self) -> &str {
        &self.icon
    }

    fn kind(&self) -> &str {
        "hackernews"
    }

    fn url(&self) -> Option<&str> {
        Some(TOP_STORIES_URL)
    }

    async fn fetch(&self, config: &SourceConfig) -> Result<Vec<RawItem>> {
        let max = config.max_items(DEFAULT_MAX);

        let mut ids: Vec<u64> = self.fetcher.get_json(TOP_STORIES_URL).await?;
        ids.truncate(max);
        debug!("Fetching {} Hacker News stories", ids.len());

        // buffered keeps listing order while bounding concurrency
        let stories: Vec<Story> = stream::iter(ids)
            .map(|id| {
                let fetcher = self.fetcher.clone();
                async move {
                    let url = format!("https://hacker-news.firebaseio.com/v0/item/{}.json", id);
                    match fetcher.get_json::<Option<Story>>(&url).await {
                        Ok(story) => story,
                        Err(e) => {
                            warn!("Skipping HN story {}: {}", id, e);
                            None
                        }
                    }
                }
            })
            .buffered(self.fanout)
            .filter_map(|story| async move { story })
            .collect()
            .await;

        let items = map_stories(stories);
        info!("{}: fetched {} items", self.name, items.len());
        Ok(items)
    }
}
