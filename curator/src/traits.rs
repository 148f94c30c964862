use crate::types::{RawItem, Result, SourceConfig};
use async_trait::async_trait;

/// One upstream content provider.
///
/// Each implementation owns its own endpoints, pagination and field mapping;
/// the sync orchestrator only sees `fetch`.
#[async_trait]
pub trait SourceAdapter: Send + Sync {
    /// Display name, also the identity used for source records and diversity caps
    fn name(&self) -> &str;

    fn icon(&self) -> &str;

    /// Driver name, e.g. `hackernews` or `rss`
    fn kind(&self) -> &str;

    /// Upstream location, when the source has a single one
    fn url(&self) -> Option<&str> {
        None
    }

    /// Fetch the current items. Either returns everything or fails as a whole.
    async fn fetch(&self, config: &SourceConfig) -> Result<Vec<RawItem>>;
}
