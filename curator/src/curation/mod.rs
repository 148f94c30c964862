//! The digest curation pipeline.

pub mod dedup;
pub mod diversity;
pub mod engine;
pub mod rules;
pub mod scoring;

pub use dedup::{dedup, DedupOptions};
pub use diversity::{enforce_diversity, DiversityLimits};
pub use engine::{format_window, CurationEngine};
pub use rules::{apply_rules, count_applied_rules, BoostMap};
pub use scoring::{score_items, sort_by_score};
