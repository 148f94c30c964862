use anyhow::{bail, Context, Result};
use chrono::Utc;
use clap::{Parser, Subcommand};
use curator::config::{self, Config};
use curator::curation::CurationEngine;
use curator::digest::{
    append_items, render_digest, render_history, render_items, render_rules, render_sources, render_sync_results,
};
use curator::manual;
use curator::sources::build_adapter;
use curator::{Fetcher, ItemFilter, ItemState, RuleKind, Store, SyncOrchestrator};
use std::io::{self, BufReader, Write};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

#[derive(Parser)]
#[command(name = "curator")]
#[command(about = "Pulls tech news from many sources and brews a short, ranked digest")]
struct Cli {
    /// Config file (default: $CURATOR_CONFIG, then ~/.config/curator/config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Debug logging for this crate
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch every enabled source and store new items
    Sync {
        /// Only sync the source with this key
        #[arg(long)]
        only: Option<String>,
    },

    /// Curate a digest from recently fetched items
    Digest {
        #[arg(long)]
        window_hours: Option<u32>,
        #[arg(long)]
        max: Option<usize>,
        #[arg(long)]
        title: Option<String>,
        /// Write the digest as one NDJSON line
        #[arg(long)]
        json: bool,
        /// Also append the digest items as NDJSON to this log file
        #[arg(long)]
        append: Option<PathBuf>,
    },

    /// List stored items, best first
    Items {
        #[arg(long)]
        unread: bool,
        #[arg(long)]
        source: Option<String>,
        #[arg(long, default_value_t = 20)]
        top: usize,
        #[arg(long)]
        json: bool,
    },

    /// Mark an item as read
    Read { id: String },

    /// Save an item for later
    Save { id: String },

    /// Mark an item as unread again
    Unread { id: String },

    /// Drop every item from a domain
    Mute { domain: String },

    /// Drop every item from a source
    MuteSource { name: String },

    /// Boost items carrying a tag
    Boost { tag: String },

    /// Boost items from a domain
    BoostDomain { domain: String },

    /// List rules, or delete one
    Rules {
        #[arg(long)]
        delete: Option<i64>,
    },

    /// List sources or change one
    Sources {
        #[command(subcommand)]
        action: Option<SourceAction>,
    },

    /// Past digests
    History {
        #[arg(long, default_value_t = 10)]
        limit: usize,
        /// Print the stored digest with this id
        #[arg(long)]
        show: Option<Uuid>,
    },

    /// Import items from an NDJSON file
    Import { file: PathBuf },

    /// Add a link by hand
    Add {
        url: String,
        #[arg(long)]
        title: Option<String>,
        /// Comma separated
        #[arg(long, value_delimiter = ',')]
        tags: Vec<String>,
        #[arg(long)]
        note: Option<String>,
    },

    /// Write the default config file
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

#[derive(Subcommand)]
enum SourceAction {
    /// Set the scoring weight of a source
    Weight { name: String, weight: f64 },
    Enable { name: String },
    Disable { name: String },
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "info,curator=debug" } else { "warn,curator=info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default)))
        .with_writer(io::stderr)
        .with_target(false)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    if let Commands::Init { force } = &cli.command {
        return init_config(cli.config.clone(), *force);
    }

    let config = Config::load(cli.config.as_deref()).context("loading configuration")?;
    let store = Arc::new(
        Store::connect(&config.database.url)
            .await
            .with_context(|| format!("opening database {}", config.database.url))?,
    );

    match cli.command {
        Commands::Sync { only } => sync(&config, store, only.as_deref()).await?,
        Commands::Digest { window_hours, max, title, json, append } => {
            let window = chrono::Duration::hours(i64::from(window_hours.unwrap_or(config.digest.window_hours)));
            let max = max.unwrap_or(config.digest.max_items);
            let title = title.unwrap_or_else(|| config.digest.title.clone());

            let engine = CurationEngine::new(store)
                .with_limits(config.diversity)
                .with_dedup(config.dedup);
            let digest = engine.generate_digest(window, max, &title).await?;

            if let Some(path) = append {
                let written = append_items(&path, &digest.items)
                    .with_context(|| format!("appending to {}", path.display()))?;
                debug!("Appended {} items to {}", written, path.display());
            }

            if json {
                let mut out = io::stdout().lock();
                interfaces::ndjson::encode_digest(&mut out, &digest)?;
            } else {
                print!("{}", render_digest(&digest));
            }
        }
        Commands::Items { unread, source, top, json } => {
            let items = store
                .list_items(&ItemFilter {
                    unread_only: unread,
                    source_name: source,
                    limit: Some(top),
                    ..Default::default()
                })
                .await?;
            if json {
                let mut out = io::stdout().lock();
                interfaces::ndjson::encode_items(&mut out, &items)?;
            } else if items.is_empty() {
                println!("No items.");
            } else {
                print!("{}", render_items(&items, Utc::now()));
            }
        }
        Commands::Read { id } => mark(&store, &id, ItemState::Read).await?,
        Commands::Save { id } => mark(&store, &id, ItemState::Saved).await?,
        Commands::Unread { id } => mark(&store, &id, ItemState::Unread).await?,
        Commands::Mute { domain } => add_rule(&store, RuleKind::MuteDomain, &domain).await?,
        Commands::MuteSource { name } => add_rule(&store, RuleKind::MuteSource, &name).await?,
        Commands::Boost { tag } => add_rule(&store, RuleKind::BoostTag, &tag).await?,
        Commands::BoostDomain { domain } => add_rule(&store, RuleKind::BoostDomain, &domain).await?,
        Commands::Rules { delete } => match delete {
            Some(id) => {
                if !store.delete_rule(id).await? {
                    bail!("no rule with id {}", id);
                }
                println!("Deleted rule {}", id);
            }
            None => {
                let rules = store.list_rules().await?;
                if rules.is_empty() {
                    println!("No rules.");
                } else {
                    print!("{}", render_rules(&rules));
                }
            }
        },
        Commands::Sources { action } => match action {
            None => print!("{}", render_sources(&store.list_sources().await?)),
            Some(SourceAction::Weight { name, weight }) => {
                if !weight.is_finite() || weight < 0.0 {
                    bail!("weight must be a non-negative number");
                }
                store.set_source_weight(&name, weight).await?;
                println!("{} weight set to {}", name, weight);
            }
            Some(SourceAction::Enable { name }) => {
                store.set_source_enabled(&name, true).await?;
                println!("Enabled {}", name);
            }
            Some(SourceAction::Disable { name }) => {
                store.set_source_enabled(&name, false).await?;
                println!("Disabled {}", name);
            }
        },
        Commands::History { limit, show } => match show {
            Some(id) => match store.load_digest(id).await? {
                Some(digest) => print!("{}", render_digest(&digest)),
                None => bail!("no digest with id {}", id),
            },
            None => print!("{}", render_history(&store.list_digests(limit).await?)),
        },
        Commands::Import { file } => {
            let handle = std::fs::File::open(&file).with_context(|| format!("opening {}", file.display()))?;
            let items = interfaces::ndjson::decode_items(BufReader::new(handle))?;
            let read = items.len();
            let inserted = manual::import_items(&store, items).await?;
            println!("Imported {} new items ({} read from {})", inserted, read, file.display());
        }
        Commands::Add { url, title, tags, note } => {
            let item = manual::add_link(&store, &url, title.as_deref(), tags, note.as_deref()).await?;
            println!("Added {} {}", curator::digest::short_id(&item.id), item.title);
        }
        Commands::Init { force } => init_config(cli.config.clone(), force)?,
    }

    io::stdout().flush()?;
    Ok(())
}

async fn sync(config: &Config, store: Arc<Store>, only: Option<&str>) -> Result<()> {
    let fetcher = Fetcher::new(config.fetch.clone())?;
    let mut orchestrator = SyncOrchestrator::new(store, Duration::from_secs(config.sync.deadline_seconds));

    for profile in &config.sources {
        if let Some(key) = only {
            if profile.key != key {
                continue;
            }
        } else if !profile.enabled {
            debug!("{} is disabled in config", profile.key);
            continue;
        }
        match build_adapter(profile, &fetcher, config.sync.fanout) {
            Ok(adapter) => orchestrator.register(adapter, profile.source_config()),
            Err(e) => warn!("Skipping source {}: {}", profile.key, e),
        }
    }

    if orchestrator.source_count() == 0 {
        match only {
            Some(key) => bail!("no configured source with key {}", key),
            None => bail!("no sources enabled"),
        }
    }

    let results = orchestrator.sync_all().await;
    print!("{}", render_sync_results(&results));
    Ok(())
}

async fn mark(store: &Store, prefix: &str, state: ItemState) -> Result<()> {
    let id = store.resolve_item_id(prefix).await?;
    store.set_item_state(&id, state).await?;
    println!("{} → {}", curator::digest::short_id(&id), state);
    Ok(())
}

async fn add_rule(store: &Store, kind: RuleKind, pattern: &str) -> Result<()> {
    let rule = store.add_rule(kind, pattern).await?;
    info!("Added rule {} {} {}", rule.id, rule.kind, rule.pattern);
    println!("Rule {}: {} {}", rule.id, rule.kind, rule.pattern);
    Ok(())
}

fn init_config(explicit: Option<PathBuf>, force: bool) -> Result<()> {
    let path = match explicit {
        Some(path) => path,
        None => config::default_path().context("cannot locate a config directory")?,
    };
    if force && path.exists() {
        std::fs::remove_file(&path).with_context(|| format!("replacing {}", path.display()))?;
    }
    if config::write_default(&path)? {
        println!("Wrote {}", path.display());
    } else {
        println!("{} already exists (use --force to overwrite)", path.display());
    }
    Ok(())
}
