use chrono::NaiveDateTime;

/// A durable record that a discussion post for a bookmarked title has been
/// observed. `(manga_id, source_url)` is the dedup key; the chapter label is
/// opaque free text and takes no part in it.
#[derive(Debug, Clone)]
pub struct TrackingEvent {
    pub manga_id: i64,
    pub chapter: String,
    pub source_url: String,
    pub observed_at: NaiveDateTime,
}

/// A `(chapter, source_url)` pair extracted from a post before it is checked
/// against the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    pub chapter: String,
    pub source_url: String,
}

/// Outcome of one full pass over all bookmarked titles.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct CycleSummary {
    pub titles_checked: usize,
    pub titles_failed: usize,
    pub new_events: usize,
}
