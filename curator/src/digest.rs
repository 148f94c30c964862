use crate::sync::summarize;
use crate::types::{CanonicalItem, Digest, DigestRecord, Result, Rule, SourceRecord, SyncResult};
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::fmt::Write;
use std::fs::{self, OpenOptions};
use std::io::BufWriter;
use std::path::Path;

/// Short id for display: the hash without its `sha256:` tag.
pub fn short_id(id: &str) -> &str {
    id.strip_prefix("sha256:").unwrap_or(id)
}

fn age_label(at: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let minutes = (now - at).num_minutes().max(0);
    match minutes {
        m if m < 60 => format!("{}m", m),
        m if m < 60 * 48 => format!("{}h", m / 60),
        m => format!("{}d", m / (60 * 24)),
    }
}

fn item_line(out: &mut String, item: &CanonicalItem, now: DateTime<Utc>) {
    let _ = writeln!(
        out,
        "  {} {}  [{:.3} · {} ago]",
        short_id(&item.id),
        item.title,
        item.computed_score,
        age_label(item.published_at, now)
    );
    if !item.url.is_empty() {
        let _ = writeln!(out, "      {}", item.url);
    }
}

/// Plain-text rendering of a digest, one block per section.
pub fn render_digest(digest: &Digest) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{}", digest.title);
    let _ = writeln!(
        out,
        "{} · last {} · {} items",
        digest.generated_at.format("%Y-%m-%d %H:%M UTC"),
        digest.window,
        digest.item_count
    );

    if digest.items.is_empty() {
        let _ = writeln!(out, "\nNothing new. Run `curator sync` to fetch sources.");
        return out;
    }

    let by_id: HashMap<&str, &CanonicalItem> = digest.items.iter().map(|i| (i.id.as_str(), i)).collect();
    for section in &digest.sections {
        let _ = writeln!(out, "\n{} {}", section.icon, section.name);
        for id in &section.item_ids {
            if let Some(item) = by_id.get(id.as_str()) {
                item_line(&mut out, item, digest.generated_at);
            }
        }
    }

    let meta = &digest.meta;
    let _ = writeln!(
        out,
        "\n{} considered · {} deduped · {} rules applied · {} sources",
        meta.items_considered, meta.items_deduped, meta.rules_applied, meta.sources_synced
    );
    out
}

pub fn render_items(items: &[CanonicalItem], now: DateTime<Utc>) -> String {
    let mut out = String::new();
    for item in items {
        let _ = write!(out, "{:<7}", item.state.as_str());
        item_line(&mut out, item, now);
    }
    out
}

/// One ✓/✗ line per source followed by the totals.
pub fn render_sync_results(results: &[SyncResult]) -> String {
    let mut out = String::new();
    for result in results {
        match &result.error {
            None => {
                let _ = writeln!(out, "✓ {}: {} items", result.name, result.items_inserted);
            }
            Some(err) => {
                let _ = writeln!(out, "✗ {}: {}", result.name, err);
            }
        }
    }
    let (items, sources, errors) = summarize(results);
    let _ = writeln!(out, "\nSynced {} items from {} sources ({} errors)", items, sources, errors);
    out
}

pub fn render_sources(sources: &[SourceRecord]) -> String {
    let mut out = String::new();
    for s in sources {
        let last = s
            .last_sync
            .map(|t| t.format("%Y-%m-%d %H:%M").to_string())
            .unwrap_or_else(|| "never".to_string());
        let _ = writeln!(
            out,
            "{} {:<24} {:<16} weight {:<5} {:<8} last sync {} ({} errors)",
            s.icon,
            s.name,
            s.kind,
            s.weight,
            if s.enabled { "enabled" } else { "disabled" },
            last,
            s.sync_errors
        );
    }
    out
}

pub fn render_history(records: &[DigestRecord]) -> String {
    let mut out = String::new();
    for r in records {
        let _ = writeln!(
            out,
            "{}  {}  {:<5} {:>3} items  {}",
            r.generated_at.format("%Y-%m-%d %H:%M"),
            r.id,
            r.window,
            r.item_count,
            r.title
        );
    }
    out
}

pub fn render_rules(rules: &[Rule]) -> String {
    let mut out = String::new();
    for r in rules {
        let _ = writeln!(
            out,
            "{:>4}  {:<13} {}{}",
            r.id,
            r.kind.as_str(),
            r.pattern,
            if r.enabled { "" } else { "  (disabled)" }
        );
    }
    out
}

/// Append items as NDJSON to a log file, creating it and its directory on first use.
/// Returns the number of lines written.
pub fn append_items(path: &Path, items: &[CanonicalItem]) -> Result<usize> {
    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        fs::create_dir_all(dir)?;
    }
    let file = OpenOptions::new().create(true).append(true).open(path)?;
    let mut writer = BufWriter::new(file);
    interfaces::ndjson::encode_items(&mut writer, items)?;
    Ok(items.len())
}
