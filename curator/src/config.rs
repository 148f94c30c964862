use crate::curation::{DedupOptions, DiversityLimits};
use crate::sources::DRIVERS;
use crate::types::{AggregatorError, FetchConfig, Result, SourceConfig};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

const CONFIG_ENV: &str = "CURATOR_CONFIG";
const DATABASE_ENV: &str = "DATABASE_URL";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    pub url: String,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        let path = dirs::data_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("curator")
            .join("curator.db");
        Self {
            url: format!("sqlite://{}", path.display()),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DigestConfig {
    pub window_hours: u32,
    pub max_items: usize,
    pub title: String,
}

impl Default for DigestConfig {
    fn default() -> Self {
        Self {
            window_hours: 24,
            max_items: 25,
            title: "Your daily brew".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    /// Shared deadline for all sources in one run
    pub deadline_seconds: u64,
    /// Concurrent detail requests per source
    pub fanout: usize,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            deadline_seconds: 60,
            fanout: 8,
        }
    }
}

/// One `[[sources]]` entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceProfile {
    pub key: String,
    pub driver: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
    #[serde(default = "enabled_by_default")]
    pub enabled: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub feed_url: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub queries: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub topics: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub subreddits: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub categories: Vec<String>,
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub settings: HashMap<String, serde_json::Value>,
}

fn enabled_by_default() -> bool {
    true
}

impl SourceProfile {
    fn new(key: &str, driver: &str, name: &str) -> Self {
        Self {
            key: key.to_string(),
            driver: driver.to_string(),
            name: name.to_string(),
            icon: None,
            enabled: true,
            feed_url: None,
            queries: Vec::new(),
            topics: Vec::new(),
            tags: Vec::new(),
            subreddits: Vec::new(),
            categories: Vec::new(),
            settings: HashMap::new(),
        }
    }

    pub fn source_config(&self) -> SourceConfig {
        SourceConfig {
            enabled: self.enabled,
            settings: self.settings.clone(),
        }
    }
}

fn strings(values: &[&str]) -> Vec<String> {
    values.iter().map(|v| v.to_string()).collect()
}

/// Profile used when no config file exists.
pub fn default_sources() -> Vec<SourceProfile> {
    let mut hn_search = SourceProfile::new("hn-ai", "hnsearch", "HN: AI & agents");
    hn_search.queries = strings(&["LLM", "AI agents", "Claude", "GPT"]);

    let mut github = SourceProfile::new("github", "github-trending", "GitHub Trending");
    github.topics = strings(&["llm", "ai-agents", "machine-learning"]);

    let mut reddit = SourceProfile::new("reddit", "reddit", "Reddit");
    reddit.subreddits = strings(&["MachineLearning", "LocalLLaMA", "programming"]);

    let mut arxiv = SourceProfile::new("arxiv", "arxiv", "arXiv");
    arxiv.categories = strings(&["cs.CL", "cs.AI", "cs.LG", "cs.MA"]);

    let mut tldr_ai = SourceProfile::new("tldr-ai", "tldr", "TLDR AI");
    tldr_ai.feed_url = Some("https://tldr.tech/api/rss/ai".to_string());
    tldr_ai.icon = Some("🧠".to_string());

    let mut tldr_tech = SourceProfile::new("tldr-tech", "tldr", "TLDR Tech");
    tldr_tech.feed_url = Some("https://tldr.tech/api/rss/tech".to_string());
    tldr_tech.icon = Some("💻".to_string());

    vec![
        SourceProfile::new("hackernews", "hackernews", "Hacker News"),
        hn_search,
        github,
        SourceProfile::new("lobsters", "lobsters", "Lobste.rs"),
        reddit,
        arxiv,
        tldr_ai,
        tldr_tech,
    ]
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub database: DatabaseConfig,
    pub digest: DigestConfig,
    pub diversity: DiversityLimits,
    pub dedup: DedupOptions,
    pub fetch: FetchConfig,
    pub sync: SyncConfig,
    pub sources: Vec<SourceProfile>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database: DatabaseConfig::default(),
            digest: DigestConfig::default(),
            diversity: DiversityLimits::default(),
            dedup: DedupOptions::default(),
            fetch: FetchConfig::default(),
            sync: SyncConfig::default(),
            sources: default_sources(),
        }
    }
}

impl Config {
    pub fn from_toml(content: &str) -> Result<Self> {
        let config: Config = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .map_err(|e| AggregatorError::Config(format!("reading {}: {}", path.display(), e)))?;
        let config = Self::from_toml(&content)?;
        info!("Loaded config from {}", path.display());
        Ok(config)
    }

    /// Resolve and load the configuration:
    /// 1) `explicit` (the `--config` flag)
    /// 2) `$CURATOR_CONFIG`
    /// 3) `$XDG_CONFIG_HOME/curator/config.toml`, then `~/.config/curator/config.toml`
    /// 4) built-in defaults
    ///
    /// `DATABASE_URL` overrides the database url in every case.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        let mut config = match explicit {
            Some(path) => Self::load_from(path)?,
            None => match std::env::var(CONFIG_ENV) {
                Ok(path) => Self::load_from(Path::new(&path))?,
                Err(_) => match default_path().filter(|p| p.exists()) {
                    Some(path) => Self::load_from(&path)?,
                    None => {
                        debug!("No config file found, using defaults");
                        Self::default()
                    }
                },
            },
        };

        if let Ok(url) = std::env::var(DATABASE_ENV) {
            if !url.trim().is_empty() {
                debug!("Using database from {}", DATABASE_ENV);
                config.database.url = url;
            }
        }

        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        let pct = self.diversity.max_source_percent;
        if !(pct > 0.0 && pct <= 1.0) {
            return Err(AggregatorError::Config(format!(
                "diversity.max_source_percent must be in (0, 1], got {}",
                pct
            )));
        }
        let ratio = self.dedup.title_ratio;
        if !(ratio > 0.0 && ratio <= 1.0) {
            return Err(AggregatorError::Config(format!("dedup.title_ratio must be in (0, 1], got {}", ratio)));
        }

        let mut keys = HashSet::new();
        for source in &self.sources {
            if !keys.insert(source.key.as_str()) {
                return Err(AggregatorError::Config(format!("duplicate source key: {}", source.key)));
            }
            if !DRIVERS.contains(&source.driver.as_str()) {
                return Err(AggregatorError::Config(format!(
                    "source {} has unknown driver {:?}",
                    source.key, source.driver
                )));
            }
            if matches!(source.driver.as_str(), "rss" | "tldr") && source.feed_url.is_none() {
                return Err(AggregatorError::Config(format!("source {} needs a feed_url", source.key)));
            }
        }
        Ok(())
    }

    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).map_err(|e| AggregatorError::Config(e.to_string()))
    }

    pub fn window(&self) -> chrono::Duration {
        chrono::Duration::hours(i64::from(self.digest.window_hours))
    }
}

pub fn default_path() -> Option<PathBuf> {
    let base = match std::env::var("XDG_CONFIG_HOME") {
        Ok(xdg) if !xdg.is_empty() => PathBuf::from(xdg),
        _ => dirs::home_dir()?.join(".config"),
    };
    Some(base.join("curator").join("config.toml"))
}

/// Write the default config to `path` unless a file is already there.
pub fn write_default(path: &Path) -> Result<bool> {
    if path.exists() {
        return Ok(false);
    }
    if let Some(dir) = path.parent() {
        fs::create_dir_all(dir)?;
    }
    fs::write(path, Config::default().to_toml()?)?;
    info!("Wrote default config to {}", path.display());
    Ok(true)
}
