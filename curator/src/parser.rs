use crate::types::{AggregatorError, Result};
use chrono::{DateTime, Utc};
use feed_rs::parser;
use std::collections::HashSet;
use tracing::debug;

/// One RSS/Atom entry, reduced to the fields the adapters map.
#[derive(Debug, Clone)]
pub struct ParsedEntry {
    pub guid: Option<String>,
    pub url: String,
    pub title: String,
    pub summary: Option<String>,
    pub content: Option<String>,
    pub authors: Vec<String>,
    pub published_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
    pub categories: Vec<String>,
}

impl ParsedEntry {
    /// Published time, falling back to the update time.
    pub fn timestamp(&self) -> Option<DateTime<Utc>> {
        self.published_at.or(self.updated_at)
    }
}

/// Parses RSS 0.9x/1.0/2.0, Atom and JSON Feed, skipping repeated entries.
pub struct FeedParser {
    seen_guids: HashSet<String>,
    seen_urls: HashSet<String>,
}

impl Default for FeedParser {
    fn default() -> Self {
        Self::new()
    }
}

impl FeedParser {
    pub fn new() -> Self {
        Self {
            seen_guids: HashSet::new(),
            seen_urls: HashSet::new(),
        }
    }

    pub fn parse(&mut self, content: &str) -> Result<Vec<ParsedEntry>> {
        debug!("Parsing feed content ({} bytes)", content.len());

        let feed = parser::parse(content.as_bytes())
            .map_err(|e| AggregatorError::Parse(format!("Failed to parse feed: {}", e)))?;

        let entries: Vec<ParsedEntry> = feed
            .entries
            .into_iter()
            .filter_map(|entry| self.parse_entry(entry))
            .collect();

        debug!("Parsed feed with {} entries", entries.len());
        Ok(entries)
    }

    fn parse_entry(&mut self, entry: feed_rs::model::Entry) -> Option<ParsedEntry> {
        let title = entry
            .title
            .map(|t| t.content.trim().to_string())
            .filter(|t| !t.is_empty())
            .unwrap_or_else(|| "Untitled".to_string());

        // Prefer the alternate (HTML) link, else the first one
        let url = entry
            .links
            .iter()
            .find(|l| l.rel.as_deref() == Some("alternate"))
            .or_else(|| entry.links.first())
            .map(|l| l.href.clone())
            .unwrap_or_default();

        let guid = if entry.id.is_empty() { None } else { Some(entry.id.clone()) };

        if let Some(ref guid) = guid {
            if !self.seen_guids.insert(guid.clone()) {
                debug!("Skipping duplicate entry with GUID: {}", guid);
                return None;
            }
        }

        if !url.is_empty() && !self.seen_urls.insert(url.clone()) {
            debug!("Skipping duplicate entry with URL: {}", url);
            return None;
        }

        let summary = entry.summary.map(|s| s.content);
        let content = entry.content.and_then(|c| c.body);

        Some(ParsedEntry {
            guid,
            url,
            title,
            summary,
            content,
            authors: entry.authors.into_iter().map(|a| a.name).filter(|n| !n.is_empty()).collect(),
            published_at: entry.published.map(|dt| dt.with_timezone(&Utc)),
            updated_at: entry.updated.map(|dt| dt.with_timezone(&Utc)),
            categories: entry.categories.into_iter().map(|c| c.term).collect(),
        })
    }
}
