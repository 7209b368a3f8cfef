use chrono::NaiveDateTime;

/// A manga title the user wants tracked. The name is lower-cased on creation
/// and unique across all bookmarks; bookmarks are never mutated or deleted.
#[derive(Debug, Clone)]
pub struct Bookmark {
    pub id: i64,
    pub name: String,
    pub alternate_name: Option<String>,
    pub cover_url: Option<String>,
    pub added_at: NaiveDateTime,
}
