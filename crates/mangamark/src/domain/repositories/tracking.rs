use std::collections::HashSet;

use async_trait::async_trait;

use thiserror::Error;

use crate::domain::entities::tracking::TrackingEvent;

#[derive(Debug, Error)]
pub enum TrackingRepositoryError {
    /// The store already holds an event for this `(manga_id, source_url)`.
    /// Expected outcome of a stale snapshot or a racing cycle.
    #[error("event already recorded for manga {manga_id}: {source_url}")]
    DuplicateEvent { manga_id: i64, source_url: String },
    #[error("database error: {0}")]
    Db(#[from] sqlx::Error),
}

#[async_trait]
pub trait TrackingRepository: Send + Sync {
    /// All source URLs already committed for a title, for the dedup check.
    async fn existing_event_urls(
        &self,
        manga_id: i64,
    ) -> Result<HashSet<String>, TrackingRepositoryError>;

    /// Commits one event atomically. The unique index on
    /// `(manga_id, source_url)` enforces the invariant even when the caller's
    /// dedup check raced.
    async fn insert_event(&self, event: &TrackingEvent) -> Result<(), TrackingRepositoryError>;

    async fn get_events_by_manga_id(
        &self,
        manga_id: i64,
    ) -> Result<Vec<TrackingEvent>, TrackingRepositoryError>;
}
