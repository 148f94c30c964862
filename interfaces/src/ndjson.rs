use crate::defs::{CanonicalItem, Digest};
use serde::Serialize;
use std::io::{BufRead, Write};

#[derive(Debug, thiserror::Error)]
pub enum FormatError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, FormatError>;

// serde_json never HTML-escapes, so `<`, `>` and `&` go out verbatim
fn write_line<W: Write, T: Serialize>(writer: &mut W, value: &T) -> Result<()> {
    serde_json::to_writer(&mut *writer, value)?;
    writer.write_all(b"\n")?;
    Ok(())
}

/// Write items as NDJSON, one object per line.
pub fn encode_items<W: Write>(writer: &mut W, items: &[CanonicalItem]) -> Result<()> {
    for item in items {
        write_line(writer, item)?;
    }
    writer.flush()?;
    Ok(())
}

/// Write a digest as a single JSON line.
pub fn encode_digest<W: Write>(writer: &mut W, digest: &Digest) -> Result<()> {
    write_line(writer, digest)?;
    writer.flush()?;
    Ok(())
}

/// Read NDJSON items. Blank and malformed lines are skipped; only I/O errors fail.
pub fn decode_items<R: BufRead>(reader: R) -> Result<Vec<CanonicalItem>> {
    let mut items = Vec::new();
    for line in reader.lines() {
        let line = line?;
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        if let Ok(item) = serde_json::from_str::<CanonicalItem>(line) {
            items.push(item);
        }
    }
    Ok(items)
}

/// Read one digest from the first non-blank line.
pub fn decode_digest<R: BufRead>(reader: R) -> Result<Digest> {
    for line in reader.lines() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        return Ok(serde_json::from_str(line.trim())?);
    }
    Err(FormatError::Io(std::io::Error::new(
        std::io::ErrorKind::UnexpectedEof,
        "no digest found in input",
    )))
}
