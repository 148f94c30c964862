use crate::fetcher::Fetcher;
use crate::traits::SourceAdapter;
use crate::types::{Engagement, Priority, RawItem, Result, SourceConfig};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use std::collections::HashSet;
use tracing::{info, warn};

const SEARCH_URL: &str = "https://hn.algolia.com/api/v1/search";
const DEFAULT_MAX: usize = 5;

#[derive(Debug, Clone, Deserialize)]
pub struct SearchResponse {
    #[serde(default)]
    pub hits: Vec<Hit>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Hit {
    #[serde(rename = "objectID")]
    pub object_id: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub points: Option<i64>,
    #[serde(default)]
    pub author: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub num_comments: Option<i64>,
}

fn priority_for(points: i64) -> Priority {
    match points {
        p if p > 200 => Priority::Urgent,
        p if p > 100 => Priority::High,
        p if p > 30 => Priority::Medium,
        _ => Priority::Low,
    }
}

/// Merge hits from several queries: drop untitled and repeated hits, rank by points, keep `max`.
pub fn merge_hits(responses: Vec<SearchResponse>, max: usize) -> Vec<RawItem> {
    let mut seen = HashSet::new();
    let mut hits: Vec<Hit> = responses
        .into_iter()
        .flat_map(|r| r.hits)
        .filter(|h| h.title.as_deref().is_some_and(|t| !t.trim().is_empty()))
        .filter(|h| seen.insert(h.object_id.clone()))
        .collect();

    // stable, so ties keep query order
    hits.sort_by(|a, b| b.points.unwrap_or(0).cmp(&a.points.unwrap_or(0)));
    hits.truncate(max);

    hits.into_iter()
        .map(|hit| {
            let points = hit.points.unwrap_or(0);
            let comments = hit.num_comments.unwrap_or(0);
            let discussion = format!("https://news.ycombinator.com/item?id={}", hit.object_id);
            let url = hit.url.filter(|u| !u.is_empty()).unwrap_or(discussion);

            RawItem {
                title: hit.title.unwrap_or_default(),
                url,
                summary: format!(
                    "{} points by {} • {} comments",
                    points,
                    hit.author.as_deref().unwrap_or("unknown"),
                    comments
                ),
                priority: priority_for(points),
                timestamp: hit
                    .created_at
                    .as_deref()
                    .and_then(|t| DateTime::parse_from_rfc3339(t).ok())
                    .map(|t| t.with_timezone(&Utc)),
                category: Some("hackernews".to_string()),
                engagement: Engagement {
                    points: Some(points as f64),
                    stars: None,
                    comments: Some(comments as f64),
                },
                ..Default::default()
            }
        })
        .collect()
}

/// Hacker News stories matching a set of search queries (Algolia API).
pub struct HnSearchSource {
    name: String,
    icon: String,
    queries: Vec<String>,
    fetcher: Fetcher,
}

impl HnSearchSource {
    pub fn new(name: impl Into<String>, icon: impl Into<String>, queries: Vec<String>, fetcher: Fetcher) -> Self {
        Self {
            name: name.into(),
            icon: icon.into(),
            queries,
            fetcher,
        }
    }

    fn search_url(query: &str, max: usize) -> Result<String> {
        let per_page = (max * 2).to_string();
        let url = url::Url::parse_with_params(
            SEARCH_URL,
            &[
                ("query", query),
                ("tags", "story"),
                ("hitsPerPage", per_page.as_str()),
                ("numericFilters", "points>10"),
            ],
        )?;
        Ok(url.into())
    }
}

#[async_trait]
impl SourceAdapter for HnSearchSource {
    fn name(&self) -> &str {
        &self.name
    }

    fn icon(&self) -> &str {
        &self.icon
    }

    fn kind(&self) -> &str {
        "hnsearch"
    }

    async fn fetch(&self, config: &SourceConfig) -> Result<Vec<RawItem>> {
        let max = config.max_items(DEFAULT_MAX);

        let mut responses = Vec::with_capacity(self.queries.len());
        for query in &self.queries {
            let url = Self::search_url(query, max)?;
            match self.fetcher.get_json::<SearchResponse>(&url).await {
                Ok(response) => responses.push(response),
                // one failing query should not sink the others
                Err(e) => warn!("{}: query {:?} failed: {}", self.name, query, e),
            }
        }

        let items = merge_hits(responses, max);
        info!("{}: fetched {} items", self.name, items.len());
        Ok(items)
    }
}
