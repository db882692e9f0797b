//! Repository traits describing persistence adapters.

use async_trait::async_trait;
use chrono_tz::Tz;
use thiserror::Error;

use crate::application::pagination::PageWindow;
use crate::domain::archive::MonthRange;
use crate::domain::entities::{
    CategoryRecord, CategoryWithCount, MonthCount, PostRecord, TagRecord,
};

#[derive(Debug, Error)]
pub enum RepoError {
    #[error("persistence error: {0}")]
    Persistence(String),
    #[error("resource not found")]
    NotFound,
    #[error("invalid input: {message}")]
    InvalidInput { message: String },
    #[error("database timeout")]
    Timeout,
}

impl RepoError {
    pub fn from_persistence(err: impl std::fmt::Display) -> Self {
        Self::Persistence(err.to_string())
    }
}

/// Which posts a listing query selects. Every variant orders newest first
/// (`created_at DESC, id DESC`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PostFilter {
    All,
    Archive(MonthRange),
    Category(i64),
    Tag(i64),
    /// Case-insensitive substring match against title or body.
    Search(String),
}

#[derive(Debug, Clone, Default)]
pub struct PostSlice {
    pub items: Vec<PostRecord>,
    /// Number of posts matching the filter, regardless of the window.
    pub total: u64,
}

#[async_trait]
pub trait PostsRepo: Send + Sync {
    /// Single parameterised listing query. `None` returns every match.
    async fn list_posts(
        &self,
        filter: &PostFilter,
        window: Option<PageWindow>,
    ) -> Result<PostSlice, RepoError>;

    async fn find_post(&self, id: i64) -> Result<Option<PostRecord>, RepoError>;

    /// Atomically add one view and return the stored count afterwards.
    /// Fails with [`RepoError::NotFound`] when the post no longer exists.
    async fn increment_views(&self, id: i64) -> Result<i64, RepoError>;

    /// Post counts per calendar month of `tz`, newest month first.
    async fn list_month_counts(&self, tz: Tz) -> Result<Vec<MonthCount>, RepoError>;
}

#[async_trait]
pub trait CategoriesRepo: Send + Sync {
    async fn find_category(&self, id: i64) -> Result<Option<CategoryRecord>, RepoError>;

    async fn list_with_counts(&self) -> Result<Vec<CategoryWithCount>, RepoError>;
}

#[async_trait]
pub trait TagsRepo: Send + Sync {
    async fn find_tag(&self, id: i64) -> Result<Option<TagRecord>, RepoError>;

    async fn list_all(&self) -> Result<Vec<TagRecord>, RepoError>;

    /// Tags attached to each of `post_ids`, as `(post_id, tag)` pairs ordered by tag name.
    async fn list_for_posts(&self, post_ids: &[i64]) -> Result<Vec<(i64, TagRecord)>, RepoError>;
}

#[async_trait]
pub trait StoreHealth: Send + Sync {
    async fn ping(&self) -> Result<(), RepoError>;
}
