use crate::fetcher::Fetcher;
use crate::sources::truncate_chars;
use crate::traits::SourceAdapter;
use crate::types::{Engagement, Priority, RawItem, Result, SourceConfig};
use async_trait::async_trait;
use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::Deserialize;
use tracing::info;

const SEARCH_URL: &str = "https://api.github.com/search/repositories";
const DEFAULT_MAX: usize = 8;

#[derive(Debug, Clone, Deserialize)]
pub struct SearchResult {
    #[serde(default)]
    pub items: Vec<Repo>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Repo {
    pub full_name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub html_url: String,
    #[serde(default)]
    pub stargazers_count: i64,
    #[serde(default)]
    pub language: Option<String>,
    #[serde(default)]
    pub updated_at: Option<String>,
    #[serde(default)]
    pub topics: Vec<String>,
    pub owner: Owner,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Owner {
    pub login: String,
}

fn priority_for(stars: i64) -> Priority {
    match stars {
        s if s > 5000 => Priority::Urgent,
        s if s > 1000 => Priority::High,
        s if s > 200 => Priority::Medium,
        _ => Priority::Low,
    }
}

fn format_stars(stars: i64) -> String {
    if stars >= 1000 {
        format!("{:.1}k", stars as f64 / 1000.0)
    } else {
        stars.to_string()
    }
}

/// Search query: recent pushes, some traction, optionally restricted to topics.
pub fn build_query(topics: &[String], since: NaiveDate) -> String {
    let mut parts = Vec::new();
    if !topics.is_empty() {
        let clauses: Vec<String> = topics.iter().map(|t| format!("topic:{}", t)).collect();
        parts.push(format!("({})", clauses.join(" OR ")));
    }
    parts.push(format!("pushed:>{}", since.format("%Y-%m-%d")));
    parts.push("stars:>50".to_string());
    parts.join(" ")
}

pub fn map_repos(result: SearchResult) -> Vec<RawItem> {
    result
        .items
        .into_iter()
        .map(|repo| {
            let language = repo.language.filter(|l| !l.is_empty());
            let description = repo.description.unwrap_or_default();

            RawItem {
                title: repo.full_name,
                url: repo.html_url,
                summary: format!("★ {} • {}", format_stars(repo.stargazers_count), repo.owner.login),
                body: truncate_chars(&description, 80),
                priority: priority_for(repo.stargazers_count),
                timestamp: repo
                    .updated_at
                    .as_deref()
                    .and_then(|t| DateTime::parse_from_rfc3339(t).ok())
                    .map(|t| t.with_timezone(&Utc)),
                category: Some("github".to_string()),
                language,
                tags: repo.topics,
                engagement: Engagement {
                    points: None,
                    stars: Some(repo.stargazers_count as f64),
                    comments: None,
                },
            }
        })
        .collect()
}

/// Recently active, well-starred GitHub repositories.
pub struct GithubTrendingSource {
    name: String,
    icon: String,
    topics: Vec<String>,
    fetcher: Fetcher,
}

impl GithubTrendingSource {
    pub fn new(name: impl Into<String>, icon: impl Into<String>, topics: Vec<String>, fetcher: Fetcher) -> Self {
        Self {
            name: name.into(),
            icon: icon.into(),
            topics,
            fetcher,
        }
    }
}

#[async_trait]
impl SourceAdapter for GithubTrendingSource {
    fn name(&self) -> &str {
        &self.name
    }

    fn icon(&self) -> &str {
        &self.icon
    }

    fn kind(&self) -> &str {
        "github-trending"
    }

    fn url(&self) -> Option<&str> {
        Some(SEARCH_URL)
    }

    async fn fetch(&self, config: &SourceConfig) -> Result<Vec<RawItem>> {
        let max = config.max_items(DEFAULT_MAX);
        let since = (Utc::now() - Duration::days(7)).date_naive();
        let query = build_query(&self.topics, since);
        let per_page = max.to_string();

        let url = url::Url::parse_with_params(
            SEARCH_URL,
            &[
                ("q", query.as_str()),
                ("sort", "stars"),
                ("order", "desc"),
                ("per_page", per_page.as_str()),
            ],
        )?;

        let result: SearchResult = self
            .fetcher
            .get_json_with_headers(url.as_str(), &[("Accept", "application/vnd.github.v3+json")])
            .await?;

        let mut items = map_repos(result);
        items.truncate(max);
        info!("{}: fetched {} items", self.name, items.len());
        Ok(items)
    }
}
