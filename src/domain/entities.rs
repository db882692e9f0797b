//! Domain entities mirrored from persistent storage.

use serde::Serialize;
use time::OffsetDateTime;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CategoryRecord {
    pub id: i64,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TagRecord {
    pub id: i64,
    pub name: String,
}

/// A stored post. `body_markdown` is the authoring source and is never
/// replaced by rendered output.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PostRecord {
    pub id: i64,
    pub title: String,
    pub body_markdown: String,
    pub excerpt: String,
    pub created_at: OffsetDateTime,
    pub modified_at: OffsetDateTime,
    pub views: i64,
    pub category: CategoryRecord,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CategoryWithCount {
    pub id: i64,
    pub name: String,
    pub post_count: u64,
}

/// Number of posts created in one calendar month of the site timezone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MonthCount {
    pub year: i32,
    pub month: u32,
    pub count: u64,
}
