use std::collections::HashSet;

use async_trait::async_trait;
use chrono::DateTime;
use sqlx::{Row, SqlitePool};

use crate::{
    domain::{
        entities::tracking::TrackingEvent,
        repositories::tracking::{TrackingRepository, TrackingRepositoryError},
    },
    infrastructure::database::Pool,
};

#[derive(Clone)]
pub struct TrackingRepositoryImpl {
    pool: Pool,
}

impl TrackingRepositoryImpl {
    pub fn new<P: Into<Pool>>(pool: P) -> Self {
        Self { pool: pool.into() }
    }
}

#[async_trait]
impl TrackingRepository for TrackingRepositoryImpl {
    async fn existing_event_urls(
        &self,
        manga_id: i64,
    ) -> Result<HashSet<String>, TrackingRepositoryError> {
        let urls = sqlx::query(
            r#"SELECT source_url
            FROM trackings
            WHERE manga_id = ?"#,
        )
        .bind(manga_id)
        .fetch_all(&self.pool as &SqlitePool)
        .await?
        .iter()
        .map(|row| row.get(0))
        .collect();

        Ok(urls)
    }

    async fn insert_event(&self, event: &TrackingEvent) -> Result<(), TrackingRepositoryError> {
        debug!(
            "inserting tracking: {} | {} | {} | {}",
            event.manga_id, event.chapter, event.source_url, event.observed_at
        );

        sqlx::query(
            r#"INSERT INTO trackings(manga_id, chapter_number, source_url, timestamp)
            VALUES (?, ?, ?, ?)"#,
        )
        .bind(event.manga_id)
        .bind(&event.chapter)
        .bind(&event.source_url)
        .bind(event.observed_at.and_utc().timestamp())
        .execute(&self.pool as &SqlitePool)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(db) if db.is_unique_violation() => {
                TrackingRepositoryError::DuplicateEvent {
                    manga_id: event.manga_id,
                    source_url: event.source_url.clone(),
                }
            }
            e => e.into(),
        })?;

        Ok(())
    }

    async fn get_events_by_manga_id(
        &self,
        manga_id: i64,
    ) -> Result<Vec<TrackingEvent>, TrackingRepositoryError> {
        let events = sqlx::query(
            r#"SELECT
                manga_id,
                chapter_number,
                source_url,
                timestamp
            FROM trackings
            WHERE manga_id = ?
            ORDER BY timestamp"#,
        )
        .bind(manga_id)
        .fetch_all(&self.pool as &SqlitePool)
        .await?
        .iter()
        .map(|row| TrackingEvent {
            manga_id: row.get(0),
            chapter: row.get(1),
            source_url: row.get(2),
            observed_at: DateTime::from_timestamp(row.get(3), 0)
                .unwrap_or_default()
                .naive_utc(),
        })
        .collect();

        Ok(events)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        domain::repositories::bookmark::BookmarkRepository,
        infrastructure::{
            database::memory_pool,
            domain::repositories::bookmark::BookmarkRepositoryImpl,
        },
    };
    use chrono::Utc;

    async fn setup() -> (TrackingRepositoryImpl, i64) {
        let pool = memory_pool().await;
        let bookmarks = BookmarkRepositoryImpl::new(pool.clone());
        let bookmark = bookmarks
            .insert_bookmark("spy x family", None, None)
            .await
            .unwrap();

        (TrackingRepositoryImpl::new(pool), bookmark.id)
    }

    fn event(manga_id: i64, chapter: &str, source_url: &str) -> TrackingEvent {
        TrackingEvent {
            manga_id,
            chapter: chapter.to_string(),
            source_url: source_url.to_string(),
            observed_at: Utc::now().naive_utc(),
        }
    }

    #[tokio::test]
    async fn inserted_events_show_up_in_the_url_set() {
        let (repo, manga_id) = setup().await;

        repo.insert_event(&event(manga_id, "80", "https://x/post1"))
            .await
            .unwrap();
        repo.insert_event(&event(manga_id, "81", "https://x/post2"))
            .await
            .unwrap();

        let urls = repo.existing_event_urls(manga_id).await.unwrap();
        assert_eq!(urls.len(), 2);
        assert!(urls.contains("https://x/post1"));
        assert!(urls.contains("https://x/post2"));
    }

    #[tokio::test]
    async fn the_unique_index_rejects_a_second_insert() {
        let (repo, manga_id) = setup().await;

        repo.insert_event(&event(manga_id, "80", "https://x/post1"))
            .await
            .unwrap();
        let result = repo
            .insert_event(&event(manga_id, "81", "https://x/post1"))
            .await;

        match result {
            Err(TrackingRepositoryError::DuplicateEvent {
                manga_id: id,
                source_url,
            }) => {
                assert_eq!(id, manga_id);
                assert_eq!(source_url, "https://x/post1");
            }
            other => panic!("expected duplicate event, got {other:?}"),
        }

        let events = repo.get_events_by_manga_id(manga_id).await.unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].chapter, "80");
    }

    #[tokio::test]
    async fn history_comes_back_in_observation_order() {
        let (repo, manga_id) = setup().await;

        let at = |secs| DateTime::from_timestamp(secs, 0).unwrap().naive_utc();
        let older = TrackingEvent {
            manga_id,
            chapter: "80".to_string(),
            source_url: "https://x/post1".to_string(),
            observed_at: at(1_000),
        };
        let newer = TrackingEvent {
            manga_id,
            chapter: "81".to_string(),
            source_url: "https://x/post2".to_string(),
            observed_at: at(2_000),
        };

        // inserted newest first, read back oldest first
        repo.insert_event(&newer).await.unwrap();
        repo.insert_event(&older).await.unwrap();

        let events = repo.get_events_by_manga_id(manga_id).await.unwrap();
        let chapters: Vec<&str> = events.iter().map(|e| e.chapter.as_str()).collect();
        assert_eq!(chapters, vec!["80", "81"]);
    }

    #[tokio::test]
    async fn url_sets_are_scoped_per_title() {
        let pool = memory_pool().await;
        let bookmarks = BookmarkRepositoryImpl::new(pool.clone());
        let first = bookmarks
            .insert_bookmark("spy x family", None, None)
            .await
            .unwrap();
        let second = bookmarks
            .insert_bookmark("frieren", None, None)
            .await
            .unwrap();
        let repo = TrackingRepositoryImpl::new(pool);

        repo.insert_event(&event(first.id, "80", "https://x/post1"))
            .await
            .unwrap();
        // the same URL under another title is a distinct event
        repo.insert_event(&event(second.id, "80", "https://x/post1"))
            .await
            .unwrap();

        assert_eq!(repo.existing_event_urls(first.id).await.unwrap().len(), 1);
        assert_eq!(repo.existing_event_urls(second.id).await.unwrap().len(), 1);
    }
}
