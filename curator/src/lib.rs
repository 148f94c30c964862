pub mod types;
pub mod config;
pub mod store;
pub mod fetcher;
pub mod parser;
pub mod traits;
pub mod sources;
pub mod sync;
pub mod curation;
pub mod manual;
pub mod digest;

pub use types::*;
pub use config::{Config, SourceProfile};
pub use store::Store;
pub use fetcher::Fetcher;
pub use parser::FeedParser;
pub use traits::SourceAdapter;
pub use sync::SyncOrchestrator;
pub use curation::CurationEngine;
