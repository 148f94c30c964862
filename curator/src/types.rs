use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

pub use interfaces::{CanonicalItem, Digest, DigestMeta, DigestSection, Engagement, ItemState, SourceRef};

/// Source-assigned urgency, mapped to a seed score at ingestion.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    #[default]
    Low,
    Medium,
    High,
    Urgent,
}

impl Priority {
    pub fn seed_score(&self) -> f64 {
        match self {
            Priority::Urgent => 9.0,
            Priority::High => 7.0,
            Priority::Medium => 5.0,
            Priority::Low => 3.0,
        }
    }
}

/// What an adapter hands back before normalization.
#[derive(Debug, Clone, Default)]
pub struct RawItem {
    pub title: String,
    pub url: String,
    pub summary: String,
    pub body: String,
    pub priority: Priority,
    pub timestamp: Option<DateTime<Utc>>,
    pub category: Option<String>,
    pub language: Option<String>,
    pub tags: Vec<String>,
    pub engagement: Engagement,
}

/// Per-run adapter settings. `settings` is an open map; `max` is the common key.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceConfig {
    pub enabled: bool,
    #[serde(default)]
    pub settings: HashMap<String, serde_json::Value>,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            settings: HashMap::new(),
        }
    }
}

impl SourceConfig {
    pub fn with_max(max: usize) -> Self {
        let mut cfg = Self::default();
        cfg.settings.insert("max".to_string(), serde_json::Value::from(max as u64));
        cfg
    }

    /// The `max` setting, or `default` when absent or not a positive integer.
    pub fn max_items(&self, default: usize) -> usize {
        self.settings
            .get("max")
            .and_then(|v| v.as_u64())
            .filter(|&n| n > 0)
            .map(|n| n as usize)
            .unwrap_or(default)
    }
}

/// Outcome of syncing one source.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncResult {
    pub name: String,
    pub items_inserted: usize,
    pub error: Option<String>,
}

impl SyncResult {
    pub fn is_ok(&self) -> bool {
        self.error.is_none()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceRecord {
    pub id: i64,
    pub name: String,
    pub kind: String,
    pub url: Option<String>,
    pub icon: String,
    pub weight: f64,
    pub enabled: bool,
    pub added_at: DateTime<Utc>,
    pub last_sync: Option<DateTime<Utc>>,
    pub sync_errors: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RuleKind {
    MuteDomain,
    MuteSource,
    BoostTag,
    BoostDomain,
}

impl RuleKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            RuleKind::MuteDomain => "mute_domain",
            RuleKind::MuteSource => "mute_source",
            RuleKind::BoostTag => "boost_tag",
            RuleKind::BoostDomain => "boost_domain",
        }
    }
}

impl fmt::Display for RuleKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RuleKind {
    type Err = AggregatorError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "mute_domain" => Ok(RuleKind::MuteDomain),
            "mute_source" => Ok(RuleKind::MuteSource),
            "boost_tag" => Ok(RuleKind::BoostTag),
            "boost_domain" => Ok(RuleKind::BoostDomain),
            other => Err(AggregatorError::InvalidRule(format!("unknown rule kind: {}", other))),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Rule {
    pub id: i64,
    pub kind: RuleKind,
    pub pattern: String,
    pub enabled: bool,
    pub created_at: DateTime<Utc>,
}

/// Records that `id_b` was collapsed into `id_a` (or vice versa); always `id_a < id_b`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DedupEdge {
    pub id_a: String,
    pub id_b: String,
    pub confidence: f64,
}

impl DedupEdge {
    pub fn new(kept: &str, dropped: &str, confidence: f64) -> Self {
        let (id_a, id_b) = if kept <= dropped { (kept, dropped) } else { (dropped, kept) };
        Self {
            id_a: id_a.to_string(),
            id_b: id_b.to_string(),
            confidence,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ItemOrder {
    /// Computed score, then publish time, both descending.
    #[default]
    Ranked,
    /// Fetch time ascending.
    Chronological,
}

#[derive(Debug, Clone, Default)]
pub struct ItemFilter {
    pub unread_only: bool,
    pub source_name: Option<String>,
    pub since: Option<chrono::Duration>,
    pub limit: Option<usize>,
    pub order: ItemOrder,
}

/// A stored digest, as listed by history.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DigestRecord {
    pub id: Uuid,
    pub title: String,
    pub window: String,
    pub generated_at: DateTime<Utc>,
    pub item_count: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FetchConfig {
    pub user_agent: String,
    pub timeout_seconds: u64,
    pub max_retries: u32,
    pub retry_delay_seconds: u64,
    pub max_feed_size_mb: usize,
    pub max_redirects: usize,
    pub min_host_interval_ms: u64,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            user_agent: "curator/0.1 (terminal digest)".to_string(),
            timeout_seconds: 20,
            max_retries: 2,
            retry_delay_seconds: 1,
            max_feed_size_mb: 10,
            max_redirects: 5,
            min_host_interval_ms: 250,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum AggregatorError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Config error: {0}")]
    Config(String),

    #[error("Timed out after {seconds}s")]
    Timeout { seconds: u64 },

    #[error("Invalid rule: {0}")]
    InvalidRule(String),

    #[error("Source not found: {name}")]
    SourceNotFound { name: String },

    #[error("Item not found: {id}")]
    ItemNotFound { id: String },

    #[error("Response too large: {size_mb}MB")]
    TooLarge { size_mb: usize },

    #[error("General error: {0}")]
    General(String),
}

impl From<interfaces::FormatError> for AggregatorError {
    fn from(err: interfaces::FormatError) -> Self {
        match err {
            interfaces::FormatError::Io(e) => AggregatorError::Io(e),
            interfaces::FormatError::Json(e) => AggregatorError::Serialization(e),
        }
    }
}

impl From<toml::de::Error> for AggregatorError {
    fn from(err: toml::de::Error) -> Self {
        AggregatorError::Config(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, AggregatorError>;
