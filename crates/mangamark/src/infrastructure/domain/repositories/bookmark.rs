use async_trait::async_trait;
use chrono::DateTime;
use sqlx::{Row, SqlitePool, sqlite::SqliteRow};

use crate::{
    domain::{
        entities::bookmark::Bookmark,
        repositories::bookmark::{BookmarkRepository, BookmarkRepositoryError},
    },
    infrastructure::database::Pool,
};

#[derive(Clone)]
pub struct BookmarkRepositoryImpl {
    pool: Pool,
}

impl BookmarkRepositoryImpl {
    pub fn new<P: Into<Pool>>(pool: P) -> Self {
        Self { pool: pool.into() }
    }
}

fn bookmark_from_row(row: &SqliteRow) -> Bookmark {
    Bookmark {
        id: row.get(0),
        name: row.get(1),
        alternate_name: row.get(2),
        cover_url: row.get(3),
        added_at: DateTime::from_timestamp(row.get(4), 0)
            .unwrap_or_default()
            .naive_utc(),
    }
}

#[async_trait]
impl BookmarkRepository for BookmarkRepositoryImpl {
    async fn insert_bookmark(
        &self,
        name: &str,
        alternate_name: Option<&str>,
        cover_url: Option<&str>,
    ) -> Result<Bookmark, BookmarkRepositoryError> {
        let name = name.to_lowercase();

        debug!("inserting bookmark: {name} | {alternate_name:?} | {cover_url:?}");

        let row = sqlx::query(
            r#"INSERT INTO bookmarks(manga_name, manga_alternate_name, resp_image_uri)
            VALUES (?, ?, ?)
            RETURNING manga_id, manga_name, manga_alternate_name, resp_image_uri, added_on"#,
        )
        .bind(&name)
        .bind(alternate_name.map(|s| s.to_lowercase()))
        .bind(cover_url)
        .fetch_one(&self.pool as &SqlitePool)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(db) if db.is_unique_violation() => {
                BookmarkRepositoryError::DuplicateTitle(name.clone())
            }
            e => e.into(),
        })?;

        Ok(bookmark_from_row(&row))
    }

    async fn get_bookmark_by_name(
        &self,
        name: &str,
    ) -> Result<Bookmark, BookmarkRepositoryError> {
        let row = sqlx::query(
            r#"SELECT
                manga_id,
                manga_name,
                manga_alternate_name,
                resp_image_uri,
                added_on
            FROM bookmarks
            WHERE manga_name = ?"#,
        )
        .bind(name.to_lowercase())
        .fetch_one(&self.pool as &SqlitePool)
        .await?;

        Ok(bookmark_from_row(&row))
    }

    async fn list_bookmarks(&self) -> Result<Vec<Bookmark>, BookmarkRepositoryError> {
        let bookmarks = sqlx::query(
            r#"SELECT
                manga_id,
                manga_name,
                manga_alternate_name,
                resp_image_uri,
                added_on
            FROM bookmarks
            ORDER BY manga_name"#,
        )
        .fetch_all(&self.pool as &SqlitePool)
        .await?
        .iter()
        .map(bookmark_from_row)
        .collect();

        Ok(bookmarks)
    }
}
