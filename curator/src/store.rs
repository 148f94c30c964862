use crate::types::{
    AggregatorError, CanonicalItem, DedupEdge, Digest, DigestRecord, Engagement, ItemFilter, ItemOrder, ItemState,
    Result, Rule, RuleKind, SourceRecord, SourceRef,
};
use chrono::{DateTime, SecondsFormat, Utc};
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions};
use sqlx::{FromRow, Row};
use std::str::FromStr;
use std::time::Duration;
use tracing::{debug, info, warn};
use uuid::Uuid;

const SCHEMA_VERSION: i64 = 1;

const SCHEMA: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS sources (
        id          INTEGER PRIMARY KEY AUTOINCREMENT,
        name        TEXT NOT NULL,
        kind        TEXT NOT NULL,
        url         TEXT,
        icon        TEXT NOT NULL DEFAULT '📰',
        weight      REAL NOT NULL DEFAULT 1.0,
        enabled     INTEGER NOT NULL DEFAULT 1,
        added_at    TEXT NOT NULL,
        last_sync   TEXT,
        sync_errors INTEGER NOT NULL DEFAULT 0,
        UNIQUE(name, kind)
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS items (
        row_id          INTEGER PRIMARY KEY AUTOINCREMENT,
        id              TEXT NOT NULL,
        fingerprint     TEXT NOT NULL,
        title           TEXT NOT NULL,
        url             TEXT,
        url_canonical   TEXT,
        source_id       INTEGER NOT NULL REFERENCES sources(id),
        source_name     TEXT NOT NULL,
        source_icon     TEXT,
        published_at    TEXT NOT NULL,
        fetched_at      TEXT NOT NULL,
        summary         TEXT,
        body            TEXT,
        tags            TEXT,
        score_raw       REAL NOT NULL DEFAULT 0,
        score_computed  REAL NOT NULL DEFAULT 0,
        engagement      TEXT,
        UNIQUE(fingerprint, source_id)
    )
    "#,
    "CREATE INDEX IF NOT EXISTS idx_items_id ON items(id)",
    "CREATE INDEX IF NOT EXISTS idx_items_fingerprint ON items(fingerprint)",
    "CREATE INDEX IF NOT EXISTS idx_items_fetched ON items(fetched_at)",
    "CREATE INDEX IF NOT EXISTS idx_items_score ON items(score_computed)",
    r#"
    CREATE TABLE IF NOT EXISTS dedup_edges (
        item_id_a   TEXT NOT NULL,
        item_id_b   TEXT NOT NULL,
        confidence  REAL NOT NULL DEFAULT 1.0,
        created_at  TEXT NOT NULL,
        PRIMARY KEY (item_id_a, item_id_b)
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS item_state (
        item_id     TEXT PRIMARY KEY,
        state       TEXT NOT NULL DEFAULT 'unread',
        opened_at   TEXT,
        saved_at    TEXT,
        updated_at  TEXT NOT NULL
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS rules (
        id          INTEGER PRIMARY KEY AUTOINCREMENT,
        kind        TEXT NOT NULL,
        pattern     TEXT NOT NULL,
        enabled     INTEGER NOT NULL DEFAULT 1,
        created_at  TEXT NOT NULL
    )
    "#,
    "CREATE INDEX IF NOT EXISTS idx_rules_kind ON rules(kind)",
    r#"
    CREATE TABLE IF NOT EXISTS digests (
        id           TEXT PRIMARY KEY,
        title        TEXT NOT NULL,
        window_label TEXT NOT NULL,
        generated_at TEXT NOT NULL,
        item_count   INTEGER NOT NULL,
        data         TEXT NOT NULL
    )
    "#,
];

/// Fixed-width UTC text so that string order matches time order.
fn ts(dt: DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn parse_ts(raw: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| AggregatorError::Parse(format!("bad timestamp {:?}: {}", raw, e)))
}

fn is_memory_url(database_url: &str) -> bool {
    matches!(database_url, ":memory:" | "sqlite::memory:" | "sqlite://:memory:")
}

#[derive(Debug, FromRow)]
struct ItemRow {
    id: String,
    fingerprint: String,
    title: String,
    url: Option<String>,
    url_canonical: Option<String>,
    source_name: String,
    source_icon: Option<String>,
    published_at: String,
    fetched_at: String,
    summary: Option<String>,
    body: Option<String>,
    tags: Option<String>,
    score_raw: f64,
    score_computed: f64,
    engagement: Option<String>,
    state: String,
}

impl ItemRow {
    fn into_item(self) -> Result<CanonicalItem> {
        let tags: Vec<String> = match self.tags.as_deref() {
            Some(raw) if !raw.is_empty() => serde_json::from_str(raw)?,
            _ => Vec::new(),
        };
        let engagement: Engagement = match self.engagement.as_deref() {
            Some(raw) if !raw.is_empty() => serde_json::from_str(raw)?,
            _ => Engagement::default(),
        };

        Ok(CanonicalItem {
            id: self.id,
            title: self.title,
            url: self.url.unwrap_or_default(),
            canonical_url: self.url_canonical.unwrap_or_default(),
            source: SourceRef {
                name: self.source_name,
                icon: self.source_icon.unwrap_or_default(),
            },
            published_at: parse_ts(&self.published_at)?,
            fetched_at: parse_ts(&self.fetched_at)?,
            summary: self.summary.unwrap_or_default(),
            body: self.body.unwrap_or_default(),
            tags,
            computed_score: self.score_computed,
            engagement,
            fingerprint: self.fingerprint,
            raw_score: self.score_raw,
            state: ItemState::from_str(&self.state).unwrap_or_default(),
        })
    }
}

#[derive(Debug, FromRow)]
struct SourceRow {
    id: i64,
    name: String,
    kind: String,
    url: Option<String>,
    icon: String,
    weight: f64,
    enabled: bool,
    added_at: String,
    last_sync: Option<String>,
    sync_errors: i64,
}

impl SourceRow {
    fn into_record(self) -> Result<SourceRecord> {
        Ok(SourceRecord {
            id: self.id,
            name: self.name,
            kind: self.kind,
            url: self.url,
            icon: self.icon,
            weight: self.weight,
            enabled: self.enabled,
            added_at: parse_ts(&self.added_at)?,
            last_sync: self.last_sync.as_deref().map(parse_ts).transpose()?,
            sync_errors: self.sync_errors.max(0) as u32,
        })
    }
}

const ITEM_COLUMNS: &str = r#"
    i.id, i.fingerprint, i.title, i.url, i.url_canonical, i.source_name, i.source_icon,
    i.published_at, i.fetched_at, i.summary, i.body, i.tags, i.score_raw, i.score_computed,
    i.engagement, COALESCE(s.state, 'unread') AS state
"#;

const SOURCE_COLUMNS: &str =
    "id, name, kind, url, icon, weight, enabled, added_at, last_sync, sync_errors";

/// Durable state: items, sources, rules, dedup history, read state and digests.
pub struct Store {
    db: SqlitePool,
}

impl Store {
    /// Open (creating if needed) the database at `database_url` and apply the schema.
    ///
    /// Accepts `sqlite:` URLs, bare file paths and `:memory:`.
    pub async fn connect(database_url: &str) -> Result<Self> {
        if is_memory_url(database_url) {
            return Self::in_memory().await;
        }

        let options = SqliteConnectOptions::from_str(database_url)?
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .busy_timeout(Duration::from_secs(5));

        // sqlite creates the file but not its directory
        if let Some(dir) = options.get_filename().parent() {
            if !dir.as_os_str().is_empty() {
                std::fs::create_dir_all(dir)?;
            }
        }

        let db = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(options)
            .await?;

        let store = Self { db };
        store.migrate().await?;
        info!("Opened store at {}", database_url);
        Ok(store)
    }

    /// Private in-memory database, for tests and dry runs.
    pub async fn in_memory() -> Result<Self> {
        // one long-lived connection, otherwise each pooled connection sees its own empty db
        let db = SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect("sqlite::memory:")
            .await?;

        let store = Self { db };
        store.migrate().await?;
        debug!("Opened in-memory store");
        Ok(store)
    }

    async fn migrate(&self) -> Result<()> {
        sqlx::query("CREATE TABLE IF NOT EXISTS schema_version (version INTEGER NOT NULL)")
            .execute(&self.db)
            .await?;

        let version: i64 = sqlx::query_scalar("SELECT COALESCE(MAX(version), 0) FROM schema_version")
            .fetch_one(&self.db)
            .await?;

        if version >= SCHEMA_VERSION {
            debug!("Schema at version {}", version);
            return Ok(());
        }

        let mut tx = self.db.begin().await?;
        for statement in SCHEMA {
            sqlx::query(statement).execute(&mut *tx).await?;
        }
        sqlx::query("DELETE FROM schema_version").execute(&mut *tx).await?;
        sqlx::query("INSERT INTO schema_version (version) VALUES (?)")
            .bind(SCHEMA_VERSION)
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;

        info!("Migrated schema from version {} to {}", version, SCHEMA_VERSION);
        Ok(())
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.db
    }

    // ---- sources ----

    /// Look a source up by (name, kind), registering it on first sight.
    pub async fn get_or_create_source(&self, name: &str, kind: &str, url: Option<&str>, icon: &str) -> Result<SourceRecord> {
        let existing = sqlx::query_as::<_, SourceRow>(&format!(
            "SELECT {} FROM sources WHERE name = ? AND kind = ?",
            SOURCE_COLUMNS
        ))
        .bind(name)
        .bind(kind)
        .fetch_optional(&self.db)
        .await?;

        if let Some(row) = existing {
            return row.into_record();
        }

        let icon = if icon.is_empty() { "📰" } else { icon };
        sqlx::query(
            r#"
            INSERT OR IGNORE INTO sources (name, kind, url, icon, weight, enabled, added_at, sync_errors)
            VALUES (?, ?, ?, ?, 1.0, 1, ?, 0)
            "#,
        )
        .bind(name)
        .bind(kind)
        .bind(url)
        .bind(icon)
        .bind(ts(Utc::now()))
        .execute(&self.db)
        .await?;

        info!("Registered new source: {} ({})", name, kind);

        let row = sqlx::query_as::<_, SourceRow>(&format!(
            "SELECT {} FROM sources WHERE name = ? AND kind = ?",
            SOURCE_COLUMNS
        ))
        .bind(name)
        .bind(kind)
        .fetch_one(&self.db)
        .await?;
        row.into_record()
    }

    pub async fn list_sources(&self) -> Result<Vec<SourceRecord>> {
        let rows = sqlx::query_as::<_, SourceRow>(&format!("SELECT {} FROM sources ORDER BY id", SOURCE_COLUMNS))
            .fetch_all(&self.db)
            .await?;
        rows.into_iter().map(SourceRow::into_record).collect()
    }

    pub async fn source_by_name(&self, name: &str) -> Result<Option<SourceRecord>> {
        let row = sqlx::query_as::<_, SourceRow>(&format!(
            "SELECT {} FROM sources WHERE name = ? ORDER BY id LIMIT 1",
            SOURCE_COLUMNS
        ))
        .bind(name)
        .fetch_optional(&self.db)
        .await?;
        row.map(SourceRow::into_record).transpose()
    }

    pub async fn set_source_weight(&self, name: &str, weight: f64) -> Result<()> {
        let result = sqlx::query("UPDATE sources SET weight = ? WHERE name = ?")
            .bind(weight)
            .bind(name)
            .execute(&self.db)
            .await?;
        if result.rows_affected() == 0 {
            return Err(AggregatorError::SourceNotFound { name: name.to_string() });
        }
        info!("Set weight of {} to {}", name, weight);
        Ok(())
    }

    pub async fn set_source_enabled(&self, name: &str, enabled: bool) -> Result<()> {
        let result = sqlx::query("UPDATE sources SET enabled = ? WHERE name = ?")
            .bind(enabled)
            .bind(name)
            .execute(&self.db)
            .await?;
        if result.rows_affected() == 0 {
            return Err(AggregatorError::SourceNotFound { name: name.to_string() });
        }
        Ok(())
    }

    /// Stamp a sync attempt: success resets the error counter, failure bumps it.
    pub async fn update_sync_result(&self, source_id: i64, success: bool) -> Result<()> {
        if success {
            sqlx::query("UPDATE sources SET last_sync = ?, sync_errors = 0 WHERE id = ?")
                .bind(ts(Utc::now()))
                .bind(source_id)
                .execute(&self.db)
                .await?;
        } else {
            sqlx::query("UPDATE sources SET sync_errors = sync_errors + 1 WHERE id = ?")
                .bind(source_id)
                .execute(&self.db)
                .await?;
        }
        Ok(())
    }

    // ---- items ----

    /// Insert the item, or refresh its mutable fields when `(fingerprint, source)` already exists.
    /// Returns `true` when a new row was written.
    pub async fn upsert_item(&self, item: &CanonicalItem, source_id: i64) -> Result<bool> {
        let tags = serde_json::to_string(&item.tags)?;
        let engagement = serde_json::to_string(&item.engagement)?;

        let mut tx = self.db.begin().await?;

        let inserted = sqlx::query(
            r#"
            INSERT OR IGNORE INTO items
                (id, fingerprint, title, url, url_canonical, source_id, source_name, source_icon,
                 published_at, fetched_at, summary, body, tags, score_raw, score_computed, engagement)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&item.id)
        .bind(&item.fingerprint)
        .bind(&item.title)
        .bind(&item.url)
        .bind(&item.canonical_url)
        .bind(source_id)
        .bind(&item.source.name)
        .bind(&item.source.icon)
        .bind(ts(item.published_at))
        .bind(ts(item.fetched_at))
        .bind(&item.summary)
        .bind(&item.body)
        .bind(&tags)
        .bind(item.raw_score)
        .bind(item.computed_score)
        .bind(&engagement)
        .execute(&mut *tx)
        .await?
        .rows_affected();

        if inserted == 0 {
            sqlx::query(
                r#"
                UPDATE items
                SET title = ?, summary = ?, body = ?, tags = ?, engagement = ?, score_raw = ?
                WHERE fingerprint = ? AND source_id = ?
                "#,
            )
            .bind(&item.title)
            .bind(&item.summary)
            .bind(&item.body)
            .bind(&tags)
            .bind(&engagement)
            .bind(item.raw_score)
            .bind(&item.fingerprint)
            .bind(source_id)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(inserted > 0)
    }

    pub async fn list_items(&self, filter: &ItemFilter) -> Result<Vec<CanonicalItem>> {
        let mut query = format!(
            "SELECT {} FROM items i LEFT JOIN item_state s ON i.id = s.item_id WHERE 1=1",
            ITEM_COLUMNS
        );

        if filter.unread_only {
            query.push_str(" AND (s.state IS NULL OR s.state = 'unread')");
        }
        if filter.source_name.is_some() {
            query.push_str(" AND i.source_name = ?");
        }
        // a window reaching past the earliest representable time means no cutoff
        let cutoff = filter.since.and_then(|since| Utc::now().checked_sub_signed(since));
        if cutoff.is_some() {
            query.push_str(" AND i.fetched_at >= ?");
        }
        match filter.order {
            ItemOrder::Ranked => query.push_str(" ORDER BY i.score_computed DESC, i.published_at DESC, i.row_id ASC"),
            ItemOrder::Chronological => query.push_str(" ORDER BY i.fetched_at ASC, i.row_id ASC"),
        }
        if filter.limit.is_some() {
            query.push_str(" LIMIT ?");
        }

        let mut q = sqlx::query_as::<_, ItemRow>(&query);
        if let Some(name) = &filter.source_name {
            q = q.bind(name);
        }
        if let Some(cutoff) = cutoff {
            q = q.bind(ts(cutoff));
        }
        if let Some(limit) = filter.limit {
            q = q.bind(limit as i64);
        }

        let rows = q.fetch_all(&self.db).await?;
        rows.into_iter().map(ItemRow::into_item).collect()
    }

    pub async fn get_item(&self, id: &str) -> Result<Option<CanonicalItem>> {
        let row = sqlx::query_as::<_, ItemRow>(&format!(
            "SELECT {} FROM items i LEFT JOIN item_state s ON i.id = s.item_id WHERE i.id = ? ORDER BY i.row_id LIMIT 1",
            ITEM_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.db)
        .await?;
        row.map(ItemRow::into_item).transpose()
    }

    /// Resolve a user-typed id prefix (with or without the `sha256:` tag) to one item id.
    pub async fn resolve_item_id(&self, prefix: &str) -> Result<String> {
        let prefix = prefix.trim();
        let needle = if prefix.starts_with("sha256:") {
            prefix.to_string()
        } else {
            format!("sha256:{}", prefix)
        };

        let ids: Vec<String> = sqlx::query_scalar("SELECT DISTINCT id FROM items WHERE substr(id, 1, ?) = ? LIMIT 2")
            .bind(needle.len() as i64)
            .bind(&needle)
            .fetch_all(&self.db)
            .await?;

        match ids.as_slice() {
            [id] => Ok(id.clone()),
            [] => Err(AggregatorError::ItemNotFound { id: prefix.to_string() }),
            _ => Err(AggregatorError::General(format!("id prefix {} is ambiguous", prefix))),
        }
    }

    pub async fn set_item_state(&self, item_id: &str, state: ItemState) -> Result<()> {
        let now = ts(Utc::now());
        let (opened_at, saved_at) = match state {
            ItemState::Read => (Some(now.clone()), None),
            ItemState::Saved => (None, Some(now.clone())),
            ItemState::Unread => (None, None),
        };

        sqlx::query(
            r#"
            INSERT INTO item_state (item_id, state, opened_at, saved_at, updated_at)
            VALUES (?, ?, ?, ?, ?)
            ON CONFLICT(item_id) DO UPDATE SET
                state = excluded.state,
                opened_at = COALESCE(excluded.opened_at, item_state.opened_at),
                saved_at = COALESCE(excluded.saved_at, item_state.saved_at),
                updated_at = excluded.updated_at
            "#,
        )
        .bind(item_id)
        .bind(state.as_str())
        .bind(opened_at)
        .bind(saved_at)
        .bind(&now)
        .execute(&self.db)
        .await?;

        debug!("Marked {} as {}", item_id, state);
        Ok(())
    }

    pub async fn update_score(&self, item_id: &str, score: f64) -> Result<()> {
        sqlx::query("UPDATE items SET score_computed = ? WHERE id = ?")
            .bind(score)
            .bind(item_id)
            .execute(&self.db)
            .await?;
        Ok(())
    }

    pub async fn item_count(&self) -> Result<usize> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM items")
            .fetch_one(&self.db)
            .await?;
        Ok(count.max(0) as usize)
    }

    // ---- dedup edges ----

    pub async fn record_dedup_edge(&self, edge: &DedupEdge) -> Result<()> {
        if edge.id_a == edge.id_b {
            return Ok(());
        }
        sqlx::query(
            "INSERT OR IGNORE INTO dedup_edges (item_id_a, item_id_b, confidence, created_at) VALUES (?, ?, ?, ?)",
        )
        .bind(&edge.id_a)
        .bind(&edge.id_b)
        .bind(edge.confidence)
        .bind(ts(Utc::now()))
        .execute(&self.db)
        .await?;
        Ok(())
    }

    pub async fn dedup_edges(&self) -> Result<Vec<DedupEdge>> {
        let rows = sqlx::query("SELECT item_id_a, item_id_b, confidence FROM dedup_edges ORDER BY created_at, item_id_a")
            .fetch_all(&self.db)
            .await?;

        let mut edges = Vec::with_capacity(rows.len());
        for row in rows {
            edges.push(DedupEdge {
                id_a: row.try_get("item_id_a")?,
                id_b: row.try_get("item_id_b")?,
                confidence: row.try_get("confidence")?,
            });
        }
        Ok(edges)
    }

    // ---- rules ----

    pub async fn add_rule(&self, kind: RuleKind, pattern: &str) -> Result<Rule> {
        let pattern = pattern.trim();
        if pattern.is_empty() {
            return Err(AggregatorError::InvalidRule("pattern must not be empty".to_string()));
        }

        let created_at = Utc::now();
        let id = sqlx::query("INSERT INTO rules (kind, pattern, enabled, created_at) VALUES (?, ?, 1, ?)")
            .bind(kind.as_str())
            .bind(pattern)
            .bind(ts(created_at))
            .execute(&self.db)
            .await?
            .last_insert_rowid();

        info!("Added rule #{}: {} {}", id, kind, pattern);
        Ok(Rule {
            id,
            kind,
            pattern: pattern.to_string(),
            enabled: true,
            created_at,
        })
    }

    /// All rules, oldest first. Rows with an unknown kind are skipped.
    pub async fn list_rules(&self) -> Result<Vec<Rule>> {
        let rows = sqlx::query("SELECT id, kind, pattern, enabled, created_at FROM rules ORDER BY id")
            .fetch_all(&self.db)
            .await?;

        let mut rules = Vec::with_capacity(rows.len());
        for row in rows {
            let kind: String = row.try_get("kind")?;
            let kind = match RuleKind::from_str(&kind) {
                Ok(kind) => kind,
                Err(e) => {
                    warn!("Ignoring stored rule: {}", e);
                    continue;
                }
            };
            let created_at: String = row.try_get("created_at")?;
            rules.push(Rule {
                id: row.try_get("id")?,
                kind,
                pattern: row.try_get("pattern")?,
                enabled: row.try_get("enabled")?,
                created_at: parse_ts(&created_at)?,
            });
        }
        Ok(rules)
    }

    pub async fn delete_rule(&self, id: i64) -> Result<bool> {
        let result = sqlx::query("DELETE FROM rules WHERE id = ?")
            .bind(id)
            .execute(&self.db)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    // ---- digests ----

    /// Store a digest in history under its own id, assigning one when it has none.
    pub async fn save_digest(&self, digest: &Digest) -> Result<Uuid> {
        let id = match Uuid::parse_str(&digest.id) {
            Ok(id) => id,
            Err(_) => Uuid::new_v4(),
        };
        let data = if digest.id == id.to_string() {
            serde_json::to_string(digest)?
        } else {
            let mut stamped = digest.clone();
            stamped.id = id.to_string();
            serde_json::to_string(&stamped)?
        };

        sqlx::query(
            "INSERT INTO digests (id, title, window_label, generated_at, item_count, data) VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(id.to_string())
        .bind(&digest.title)
        .bind(&digest.window)
        .bind(ts(digest.generated_at))
        .bind(digest.item_count as i64)
        .bind(data)
        .execute(&self.db)
        .await?;

        debug!("Saved digest {} ({} items)", id, digest.item_count);
        Ok(id)
    }

    /// Most recent digests first.
    pub async fn list_digests(&self, limit: usize) -> Result<Vec<DigestRecord>> {
        let rows = sqlx::query(
            "SELECT id, title, window_label, generated_at, item_count FROM digests ORDER BY generated_at DESC LIMIT ?",
        )
        .bind(limit as i64)
        .fetch_all(&self.db)
        .await?;

        let mut records = Vec::with_capacity(rows.len());
        for row in rows {
            let id: String = row.try_get("id")?;
            let generated_at: String = row.try_get("generated_at")?;
            let item_count: i64 = row.try_get("item_count")?;
            records.push(DigestRecord {
                id: Uuid::parse_str(&id).map_err(|e| AggregatorError::Parse(e.to_string()))?,
                title: row.try_get("title")?,
                window: row.try_get("window_label")?,
                generated_at: parse_ts(&generated_at)?,
                item_count: item_count.max(0) as usize,
            });
        }
        Ok(records)
    }

    pub async fn load_digest(&self, id: Uuid) -> Result<Option<Digest>> {
        let data: Option<String> = sqlx::query_scalar("SELECT data FROM digests WHERE id = ?")
            .bind(id.to_string())
            .fetch_optional(&self.db)
            .await?;

        match data {
            Some(data) => Ok(Some(serde_json::from_str(&data)?)),
            None => Ok(None),
        }
    }
}
