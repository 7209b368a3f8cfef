use async_trait::async_trait;

use mangamark_reddit::{Error as FeedError, Post};

/// Seam over the discussion feed so the engine can be exercised without a
/// network. Failures are typed by the feed crate and contained per title.
#[async_trait]
pub trait FeedRepository: Send + Sync {
    async fn search_posts(&self, query: &str) -> Result<Vec<Post>, FeedError>;
}
