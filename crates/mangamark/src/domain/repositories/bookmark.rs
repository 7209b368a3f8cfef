use async_trait::async_trait;

use thiserror::Error;

use crate::domain::entities::bookmark::Bookmark;

#[derive(Debug, Error)]
pub enum BookmarkRepositoryError {
    #[error("title already bookmarked: {0}")]
    DuplicateTitle(String),
    #[error("bookmark not found")]
    NotFound,
    #[error("database error: {0}")]
    Db(sqlx::Error),
}

impl From<sqlx::Error> for BookmarkRepositoryError {
    fn from(e: sqlx::Error) -> Self {
        match e {
            sqlx::Error::RowNotFound => Self::NotFound,
            e => Self::Db(e),
        }
    }
}

#[async_trait]
pub trait BookmarkRepository: Send + Sync {
    /// Inserts a bookmark, lower-casing the names. Fails with
    /// `DuplicateTitle` when a bookmark with the same normalized name exists.
    async fn insert_bookmark(
        &self,
        name: &str,
        alternate_name: Option<&str>,
        cover_url: Option<&str>,
    ) -> Result<Bookmark, BookmarkRepositoryError>;

    async fn get_bookmark_by_name(&self, name: &str)
    -> Result<Bookmark, BookmarkRepositoryError>;

    async fn list_bookmarks(&self) -> Result<Vec<Bookmark>, BookmarkRepositoryError>;
}
