use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Envelope type tag written on every digest.
pub const DIGEST_TYPE: &str = "trss-digest";
/// Current interchange format version.
pub const DIGEST_VERSION: &str = "1";

/// Engagement signals reported by a source. Any signal may be absent.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Engagement {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub points: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stars: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comments: Option<f64>,
}

impl Engagement {
    pub fn is_empty(&self) -> bool {
        self.points.is_none() && self.stars.is_none() && self.comments.is_none()
    }

    /// Combined popularity: the larger of points/stars plus half the comment count.
    pub fn signal(&self) -> f64 {
        let primary = match (self.points, self.stars) {
            (Some(p), Some(s)) => p.max(s),
            (Some(p), None) => p,
            (None, Some(s)) => s,
            (None, None) => 0.0,
        };
        primary + 0.5 * self.comments.unwrap_or(0.0)
    }
}

/// Denormalized snapshot of where an item came from.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceRef {
    pub name: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub icon: String,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemState {
    #[default]
    Unread,
    Read,
    Saved,
}

impl ItemState {
    pub fn as_str(&self) -> &'static str {
        match self {
            ItemState::Unread => "unread",
            ItemState::Read => "read",
            ItemState::Saved => "saved",
        }
    }
}

impl fmt::Display for ItemState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ItemState {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "unread" => Ok(ItemState::Unread),
            "read" => Ok(ItemState::Read),
            "saved" => Ok(ItemState::Saved),
            other => Err(format!("unknown item state: {other}")),
        }
    }
}

/// The interchange record every source is normalized into.
///
/// `raw_score` and `state` are storage-side fields and stay off the wire;
/// `computed_score` is published as `score`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CanonicalItem {
    pub id: String,
    pub title: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub url: String,
    #[serde(rename = "url_canonical", default, skip_serializing_if = "String::is_empty")]
    pub canonical_url: String,
    pub source: SourceRef,
    pub published_at: DateTime<Utc>,
    pub fetched_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub summary: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub body: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
    #[serde(rename = "score", default)]
    pub computed_score: f64,
    #[serde(default, skip_serializing_if = "Engagement::is_empty")]
    pub engagement: Engagement,
    pub fingerprint: String,
    #[serde(skip)]
    pub raw_score: f64,
    #[serde(skip)]
    pub state: ItemState,
}

impl CanonicalItem {
    /// Host of the item URL, lowercased with any `www.` prefix removed.
    pub fn domain(&self) -> String {
        crate::canonical::domain_of(&self.url)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DigestSection {
    pub name: String,
    #[serde(default)]
    pub icon: String,
    pub item_ids: Vec<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DigestMeta {
    pub sources_synced: usize,
    pub items_considered: usize,
    pub items_deduped: usize,
    pub rules_applied: usize,
}

/// One curated, ranked snapshot. Immutable once built.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Digest {
    #[serde(rename = "type")]
    pub kind: String,
    pub version: String,
    /// History key; empty until the digest is stored
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub id: String,
    pub generated_at: DateTime<Utc>,
    pub title: String,
    pub window: String,
    pub max_items: usize,
    pub item_count: usize,
    pub items: Vec<CanonicalItem>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub sections: Vec<DigestSection>,
    pub meta: DigestMeta,
}

impl Digest {
    /// Empty envelope stamped with the current format tag and version.
    pub fn new(
        title: impl Into<String>,
        window: impl Into<String>,
        max_items: usize,
        generated_at: DateTime<Utc>,
    ) -> Self {
        Self {
            kind: DIGEST_TYPE.to_string(),
            version: DIGEST_VERSION.to_string(),
            id: String::new(),
            generated_at,
            title: title.into(),
            window: window.into(),
            max_items,
            item_count: 0,
            items: Vec::new(),
            sections: Vec::new(),
            meta: DigestMeta::default(),
        }
    }

    /// Replace the item list, keeping `item_count` and per-source sections in step.
    pub fn set_items(&mut self, items: Vec<CanonicalItem>) {
        self.item_count = items.len();
        self.sections = sections_by_source(&items);
        self.items = items;
    }
}

/// Group items by source name, in first-seen order.
pub fn sections_by_source(items: &[CanonicalItem]) -> Vec<DigestSection> {
    let mut sections: Vec<DigestSection> = Vec::new();
    for item in items {
        match sections.iter_mut().find(|s| s.name == item.source.name) {
            Some(section) => section.item_ids.push(item.id.clone()),
            None => sections.push(DigestSection {
                name: item.source.name.clone(),
                icon: item.source.icon.clone(),
                item_ids: vec![item.id.clone()],
            }),
        }
    }
    sections
}
