use crate::fetcher::Fetcher;
use crate::sources::truncate_chars;
use crate::traits::SourceAdapter;
use crate::types::{Engagement, Priority, RawItem, Result, SourceConfig};
use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use serde::Deserialize;
use tracing::{info, warn};

const DEFAULT_MAX: usize = 8;

#[derive(Debug, Clone, Deserialize)]
pub struct Listing {
    pub data: ListingData,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ListingData {
    #[serde(default)]
    pub children: Vec<Child>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Child {
    pub data: Post,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Post {
    pub title: String,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub permalink: String,
    #[serde(default)]
    pub selftext: String,
    #[serde(default)]
    pub score: i64,
    #[serde(default)]
    pub num_comments: i64,
    #[serde(default)]
    pub subreddit: String,
    #[serde(default)]
    pub created_utc: f64,
    #[serde(default)]
    pub link_flair_text: Option<String>,
    #[serde(default)]
    pub is_self: bool,
    #[serde(default)]
    pub stickied: bool,
}

fn priority_for(score: i64) -> Priority {
    match score {
        s if s >= 500 => Priority::Urgent,
        s if s >= 100 => Priority::High,
        s if s >= 20 => Priority::Medium,
        _ => Priority::Low,
    }
}

/// Per-subreddit request size so that the merged list can still reach `max`.
pub fn per_subreddit_limit(max: usize, subreddits: usize) -> usize {
    if subreddits > 1 {
        max / subreddits + 1
    } else {
        max
    }
}

pub fn map_listing(listing: Listing) -> Vec<RawItem> {
    listing
        .data
        .children
        .into_iter()
        .map(|c| c.data)
        .filter(|p| !p.stickied && p.score >= 2)
        .map(|post| {
            let thread = format!("https://www.reddit.com{}", post.permalink);
            let url = if post.is_self || post.url.is_empty() { thread } else { post.url.clone() };

            let mut tags = vec![post.subreddit.clone()];
            if let Some(flair) = post.link_flair_text.as_deref().filter(|f| !f.is_empty()) {
                tags.push(flair.to_string());
            }

            RawItem {
                title: post.title,
                url,
                summary: truncate_chars(&post.selftext, 300),
                priority: priority_for(post.score),
                timestamp: Utc.timestamp_opt(post.created_utc as i64, 0).single(),
                category: Some("discussion".to_string()),
                tags,
                engagement: Engagement {
                    points: Some(post.score as f64),
                    stars: None,
                    comments: Some(post.num_comments as f64),
                },
                ..Default::default()
            }
        })
        .collect()
}

/// Hot posts from one or more subreddits via the public JSON listing.
pub struct RedditSource {
    name: String,
    icon: String,
    subreddits: Vec<String>,
    fetcher: Fetcher,
}

impl RedditSource {
    pub fn new(name: impl Into<String>, icon: impl Into<String>, subreddits: Vec<String>, fetcher: Fetcher) -> Self {
        Self {
            name: name.into(),
            icon: icon.into(),
            subreddits,
            fetcher,
        }
    }
}

#[async_trait]
impl SourceAdapter for RedditSource {
    fn name(&self) -> &str {
        &self.name
    }

    fn icon(&self) -> &str {
        &self.icon
    }

    fn kind(&self) -> &str {
        "reddit"
    }

    async fn fetch(&self, config: &SourceConfig) -> Result<Vec<RawItem>> {
        let max = config.max_items(DEFAULT_MAX);
        let limit = per_subreddit_limit(max, self.subreddits.len());

        let mut items = Vec::new();
        for sub in &self.subreddits {
            let url = format!("https://www.reddit.com/r/{}/hot.json?limit={}&raw_json=1", sub, limit);
            match self.fetcher.get_json::<Listing>(&url).await {
                Ok(listing) => items.extend(map_listing(listing)),
                // a dead subreddit should not fail the whole source
                Err(e) => warn!("{}: r/{} failed: {}", self.name, sub, e),
            }
        }

        items.truncate(max);
        info!("{}: fetched {} items", self.name, items.len());
        Ok(items)
    }
}
