use async_trait::async_trait;
use mangamark_reddit::{Error as FeedError, Post, RedditClient};

use crate::domain::repositories::feed::FeedRepository;

#[derive(Clone)]
pub struct FeedRepositoryImpl {
    client: RedditClient,
}

impl FeedRepositoryImpl {
    pub fn new(client: RedditClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl FeedRepository for FeedRepositoryImpl {
    async fn search_posts(&self, query: &str) -> Result<Vec<Post>, FeedError> {
        self.client.search(query).await
    }
}
