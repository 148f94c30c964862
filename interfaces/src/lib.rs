//! Interchange format shared by ingestion, curation and every output surface.

pub mod canonical;
pub mod defs;
pub mod ndjson;

pub use canonical::{canonicalize, domain_of, fallback_key, fingerprint, identity, item_id};
pub use defs::{
    sections_by_source, CanonicalItem, Digest, DigestMeta, DigestSection, Engagement, ItemState,
    SourceRef, DIGEST_TYPE, DIGEST_VERSION,
};
pub use ndjson::FormatError;
