use thiserror::Error;

use crate::domain::{
    entities::bookmark::Bookmark,
    repositories::bookmark::{BookmarkRepository, BookmarkRepositoryError},
};

#[derive(Debug, Error)]
pub enum BookmarkError {
    #[error("title name must not be empty")]
    EmptyName,
    #[error("repository error: {0}")]
    Repository(#[from] BookmarkRepositoryError),
}

/// Data-entry surface for bookmarks: add and list. Uniqueness is the only
/// invariant, enforced by the repository.
pub struct BookmarkService<R>
where
    R: BookmarkRepository,
{
    repo: R,
}

impl<R> BookmarkService<R>
where
    R: BookmarkRepository,
{
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    pub async fn add_bookmark(
        &self,
        name: &str,
        alternate_name: Option<&str>,
        cover_url: Option<&str>,
    ) -> Result<Bookmark, BookmarkError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(BookmarkError::EmptyName);
        }

        let bookmark = self
            .repo
            .insert_bookmark(name, alternate_name.map(str::trim), cover_url)
            .await?;

        info!("bookmarked {} (id {})", bookmark.name, bookmark.id);

        Ok(bookmark)
    }

    pub async fn get_bookmark(&self, name: &str) -> Result<Bookmark, BookmarkError> {
        Ok(self.repo.get_bookmark_by_name(name.trim()).await?)
    }

    pub async fn list_bookmarks(&self) -> Result<Vec<Bookmark>, BookmarkError> {
        Ok(self.repo.list_bookmarks().await?)
    }
}
