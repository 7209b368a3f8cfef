pub mod bookmark;
pub mod tracking;
