pub mod bookmark;
pub mod feed;
pub mod tracking;
