mod common;

use common::init_tracing;
use curator::config::{self, Config};
use curator::types::{AggregatorError, Result};

const SAMPLE: &str = r#"
[database]
url = "sqlite://brew.db"

[digest]
window_hours = 48
max_items = 15

[diversity]
max_source_percent = 0.5

[sync]
deadline_seconds = 30

[[sources]]
key = "hn"
driver = "hackernews"
name = "Hacker News"

[[sources]]
key = "rust-blog"
driver = "rss"
name = "Rust Blog"
feed_url = "https://blog.rust-lang.org/feed.xml"
enabled = false

[sources.settings]
max = 3
"#;

#[test]
fn parses_partial_config_with_defaults() -> Result<()> {
    init_tracing();
    let config = Config::from_toml(SAMPLE)?;

    assert_eq!(config.database.url, "sqlite://brew.db");
    assert_eq!(config.digest.window_hours, 48);
    assert_eq!(config.digest.max_items, 15);
    assert_eq!(config.digest.title, "Your daily brew");
    assert_eq!(config.diversity.max_source_percent, 0.5);
    assert_eq!(config.diversity.max_per_domain, 3);
    assert_eq!(config.dedup.title_ratio, 0.7);
    assert_eq!(config.sync.deadline_seconds, 30);
    assert_eq!(config.sync.fanout, 8);
    assert_eq!(config.fetch.timeout_seconds, 20);
    assert_eq!(config.window(), chrono::Duration::hours(48));

    assert_eq!(config.sources.len(), 2);
    assert!(config.sources[0].enabled);
    let blog = &config.sources[1];
    assert!(!blog.enabled);
    assert_eq!(blog.source_config().max_items(5), 3);
    assert!(!blog.source_config().enabled);
    Ok(())
}

#[test]
fn empty_file_means_defaults() -> Result<()> {
    let config = Config::from_toml("")?;
    assert_eq!(config.sources.len(), config::default_sources().len());
    assert_eq!(config.digest.max_items, 25);
    assert!(config.database.url.ends_with("curator.db"));
    Ok(())
}

fn expect_config_error(toml: &str, needle: &str) {
    match Config::from_toml(toml) {
        Err(AggregatorError::Config(msg)) => assert!(msg.contains(needle), "{} does not mention {}", msg, needle),
        other => panic!("expected a config error, got {:?}", other.map(|_| ())),
    }
}

#[test]
fn rejects_invalid_settings() {
    expect_config_error("[diversity]\nmax_source_percent = 0.0\n", "max_source_percent");
    expect_config_error("[diversity]\nmax_source_percent = 1.5\n", "max_source_percent");
    expect_config_error("[dedup]\ntitle_ratio = 0.0\n", "title_ratio");
    expect_config_error(
        "[[sources]]\nkey = \"a\"\ndriver = \"gopher\"\nname = \"A\"\n",
        "unknown driver",
    );
    expect_config_error(
        "[[sources]]\nkey = \"a\"\ndriver = \"lobsters\"\nname = \"A\"\n[[sources]]\nkey = \"a\"\ndriver = \"reddit\"\nname = \"B\"\n",
        "duplicate source key",
    );
    expect_config_error("[[sources]]\nkey = \"t\"\ndriver = \"tldr\"\nname = \"T\"\n", "feed_url");
    expect_config_error("[digest]\nmax_items = \"many\"\n", "max_items");
}

#[test]
fn default_config_round_trips_through_toml() -> Result<()> {
    let rendered = Config::default().to_toml()?;
    let parsed = Config::from_toml(&rendered)?;
    assert_eq!(parsed.sources.len(), config::default_sources().len());
    assert_eq!(parsed.sources[1].queries, config::default_sources()[1].queries);
    Ok(())
}

#[test]
fn write_default_does_not_clobber() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("nested").join("config.toml");

    assert!(config::write_default(&path)?);
    assert!(!config::write_default(&path)?);

    let loaded = Config::load_from(&path)?;
    assert_eq!(loaded.digest.window_hours, 24);
    Ok(())
}

#[test]
fn missing_explicit_file_is_an_error() {
    let result = Config::load(Some(std::path::Path::new("/nonexistent/curator/config.toml")));
    assert!(matches!(result, Err(AggregatorError::Config(_))));
}
