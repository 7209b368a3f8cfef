use std::collections::HashSet;

use chrono::Utc;
use mangamark_reddit::{Error as FeedError, Post};
use thiserror::Error;

use crate::domain::{
    entities::{
        bookmark::Bookmark,
        tracking::{Candidate, CycleSummary, TrackingEvent},
    },
    repositories::{
        bookmark::{BookmarkRepository, BookmarkRepositoryError},
        feed::FeedRepository,
        tracking::{TrackingRepository, TrackingRepositoryError},
    },
};

/// Store-level failures abort the whole cycle so the scheduler can back off.
/// Feed failures never appear here, they are contained per title and show up
/// in the cycle summary instead.
#[derive(Debug, Error)]
pub enum TrackingError {
    #[error("bookmark repository error: {0}")]
    Bookmark(#[from] BookmarkRepositoryError),
    #[error("tracking repository error: {0}")]
    Tracking(#[from] TrackingRepositoryError),
}

enum TitleError {
    Feed(FeedError),
    Store(TrackingRepositoryError),
}

/// The polling engine: one cycle reads every bookmark, searches the feed per
/// title, filters out already-recorded posts and commits the rest. A cycle
/// keeps no state across runs, re-running after a crash is safe because
/// recording is dedup-protected.
pub struct TrackingService<B, T, F>
where
    B: BookmarkRepository,
    T: TrackingRepository,
    F: FeedRepository,
{
    bookmark_repo: B,
    tracking_repo: T,
    feed_repo: F,
}

impl<B, T, F> TrackingService<B, T, F>
where
    B: BookmarkRepository,
    T: TrackingRepository,
    F: FeedRepository,
{
    pub fn new(bookmark_repo: B, tracking_repo: T, feed_repo: F) -> Self {
        Self {
            bookmark_repo,
            tracking_repo,
            feed_repo,
        }
    }

    /// Runs one cycle to completion. An empty bookmark list ends the cycle
    /// trivially; a failing title never aborts the others.
    pub async fn run_cycle(&self) -> Result<CycleSummary, TrackingError> {
        let bookmarks = self.bookmark_repo.list_bookmarks().await?;

        let mut summary = CycleSummary::default();
        for bookmark in bookmarks {
            summary.titles_checked += 1;

            match self.check_title(&bookmark).await {
                Ok(recorded) => {
                    if recorded == 0 {
                        debug!("{} has no new posts", bookmark.name);
                    } else {
                        info!("{} has {} new posts", bookmark.name, recorded);
                    }
                    summary.new_events += recorded;
                }
                Err(TitleError::Feed(e)) => {
                    warn!("feed search failed for {}: {e}", bookmark.name);
                    summary.titles_failed += 1;
                }
                Err(TitleError::Store(e)) => {
                    return Err(e.into());
                }
            }
        }

        Ok(summary)
    }

    async fn check_title(&self, bookmark: &Bookmark) -> Result<usize, TitleError> {
        let posts = self
            .feed_repo
            .search_posts(&bookmark.name)
            .await
            .map_err(TitleError::Feed)?;

        let candidates = extract_candidates(&posts);

        let existing = self
            .tracking_repo
            .existing_event_urls(bookmark.id)
            .await
            .map_err(TitleError::Store)?;

        let mut recorded = 0;
        for candidate in candidates {
            if existing.contains(&candidate.source_url) {
                continue;
            }

            let event = TrackingEvent {
                manga_id: bookmark.id,
                chapter: candidate.chapter,
                source_url: candidate.source_url,
                observed_at: Utc::now().naive_utc(),
            };

            match self.tracking_repo.insert_event(&event).await {
                Ok(()) => recorded += 1,
                Err(TrackingRepositoryError::DuplicateEvent { source_url, .. }) => {
                    // lost a race against another cycle, the row exists
                    debug!("{source_url} already recorded");
                }
                Err(e) => return Err(TitleError::Store(e)),
            }
        }

        Ok(recorded)
    }
}

/// Extracts `(chapter, source_url)` pairs from a search result. Posts without
/// a resolvable URL cannot be deduped or cited and are dropped, as are
/// repeats of the same URL within one response.
fn extract_candidates(posts: &[Post]) -> Vec<Candidate> {
    let mut seen = HashSet::new();

    posts
        .iter()
        .filter_map(|post| {
            let source_url = post.source_url()?;
            if !seen.insert(source_url.clone()) {
                return None;
            }

            Some(Candidate {
                chapter: post.chapter_label().unwrap_or_default(),
                source_url,
            })
        })
        .collect()
}
