//! In-memory store and wiring shared by the integration tests.
#![allow(dead_code)]

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use chrono::Datelike;
use chrono_tz::Tz;
use time::{Duration, OffsetDateTime, macros::datetime};
use tokio::sync::Mutex;

use quire::application::feed::{FeedService, FeedSettings};
use quire::application::pagination::PageWindow;
use quire::application::render::{RenderError, RenderOutput, RenderService, render_service};
use quire::application::repos::{
    CategoriesRepo, PostFilter, PostSlice, PostsRepo, RepoError, StoreHealth, TagsRepo,
};
use quire::config::ApiSettings;
use quire::domain::entities::{
    CategoryRecord, CategoryWithCount, MonthCount, PostRecord, TagRecord,
};
use quire::infra::http::HttpState;
use quire::util::timezone;

pub const BASE_TIME: OffsetDateTime = datetime!(2024-01-01 08:00 UTC);

#[derive(Default)]
struct StoreState {
    categories: Vec<CategoryRecord>,
    tags: Vec<TagRecord>,
    posts: Vec<PostRecord>,
    post_tags: Vec<(i64, i64)>,
    next_id: i64,
}

impl StoreState {
    fn allocate_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }

    fn matches(&self, post: &PostRecord, filter: &PostFilter) -> bool {
        match filter {
            PostFilter::All => true,
            PostFilter::Archive(range) => range.contains(post.created_at),
            PostFilter::Category(id) => post.category.id == *id,
            PostFilter::Tag(id) => self
                .post_tags
                .iter()
                .any(|(post_id, tag_id)| *post_id == post.id && tag_id == id),
            PostFilter::Search(key) => {
                let key = key.to_lowercase();
                post.title.to_lowercase().contains(&key)
                    || post.body_markdown.to_lowercase().contains(&key)
            }
        }
    }
}

/// Repository double that serialises every operation through one lock, so
/// view increments behave like the single-statement SQL update.
pub struct MemoryStore {
    state: Mutex<StoreState>,
    healthy: AtomicBool,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self {
            state: Mutex::new(StoreState::default()),
            healthy: AtomicBool::new(true),
        }
    }
}

pub struct NewPost<'a> {
    pub title: &'a str,
    pub body: &'a str,
    pub excerpt: &'a str,
    pub created_at: OffsetDateTime,
    pub category_id: i64,
}

impl MemoryStore {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn set_healthy(&self, healthy: bool) {
        self.healthy.store(healthy, Ordering::SeqCst);
    }

    pub async fn add_category(&self, name: &str) -> i64 {
        let mut state = self.state.lock().await;
        let id = state.allocate_id();
        state.categories.push(CategoryRecord {
            id,
            name: name.to_string(),
        });
        id
    }

    pub async fn add_tag(&self, name: &str) -> i64 {
        let mut state = self.state.lock().await;
        let id = state.allocate_id();
        state.tags.push(TagRecord {
            id,
            name: name.to_string(),
        });
        id
    }

    pub async fn add_post(&self, post: NewPost<'_>) -> i64 {
        let mut state = self.state.lock().await;
        let category = state
            .categories
            .iter()
            .find(|category| category.id == post.category_id)
            .cloned()
            .expect("post category must be seeded first");
        let id = state.allocate_id();
        state.posts.push(PostRecord {
            id,
            title: post.title.to_string(),
            body_markdown: post.body.to_string(),
            excerpt: post.excerpt.to_string(),
            created_at: post.created_at,
            modified_at: post.created_at,
            views: 0,
            category,
        });
        id
    }

    pub async fn tag_post(&self, post_id: i64, tag_id: i64) {
        self.state.lock().await.post_tags.push((post_id, tag_id));
    }

    pub async fn views(&self, post_id: i64) -> i64 {
        self.state
            .lock()
            .await
            .posts
            .iter()
            .find(|post| post.id == post_id)
            .map(|post| post.views)
            .expect("post exists")
    }

    pub async fn body_of(&self, post_id: i64) -> String {
        self.state
            .lock()
            .await
            .posts
            .iter()
            .find(|post| post.id == post_id)
            .map(|post| post.body_markdown.clone())
            .expect("post exists")
    }
}

#[async_trait]
impl PostsRepo for MemoryStore {
    async fn list_posts(
        &self,
        filter: &PostFilter,
        window: Option<PageWindow>,
    ) -> Result<PostSlice, RepoError> {
        let state = self.state.lock().await;
        let mut matching: Vec<PostRecord> = state
            .posts
            .iter()
            .filter(|post| state.matches(post, filter))
            .cloned()
            .collect();
        matching.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));

        let total = matching.len() as u64;
        let items = match window {
            Some(window) => matching
                .into_iter()
                .skip(window.offset as usize)
                .take(window.limit as usize)
                .collect(),
            None => matching,
        };

        Ok(PostSlice { items, total })
    }

    async fn find_post(&self, id: i64) -> Result<Option<PostRecord>, RepoError> {
        let state = self.state.lock().await;
        Ok(state.posts.iter().find(|post| post.id == id).cloned())
    }

    async fn increment_views(&self, id: i64) -> Result<i64, RepoError> {
        let mut state = self.state.lock().await;
        let post = state
            .posts
            .iter_mut()
            .find(|post| post.id == id)
            .ok_or(RepoError::NotFound)?;
        post.views += 1;
        Ok(post.views)
    }

    async fn list_month_counts(&self, tz: Tz) -> Result<Vec<MonthCount>, RepoError> {
        let state = self.state.lock().await;
        let mut counts: Vec<MonthCount> = Vec::new();
        for post in &state.posts {
            let local = timezone::localized_datetime(post.created_at, tz);
            let (year, month) = (local.year(), local.month());
            match counts
                .iter_mut()
                .find(|entry| entry.year == year && entry.month == month)
            {
                Some(entry) => entry.count += 1,
                None => counts.push(MonthCount {
                    year,
                    month,
                    count: 1,
                }),
            }
        }
        counts.sort_by(|a, b| (b.year, b.month).cmp(&(a.year, a.month)));
        Ok(counts)
    }
}

#[async_trait]
impl CategoriesRepo for MemoryStore {
    async fn find_category(&self, id: i64) -> Result<Option<CategoryRecord>, RepoError> {
        let state = self.state.lock().await;
        Ok(state
            .categories
            .iter()
            .find(|category| category.id == id)
            .cloned())
    }

    async fn list_with_counts(&self) -> Result<Vec<CategoryWithCount>, RepoError> {
        let state = self.state.lock().await;
        Ok(state
            .categories
            .iter()
            .filter_map(|category| {
                let post_count = state
                    .posts
                    .iter()
                    .filter(|post| post.category.id == category.id)
                    .count() as u64;
                (post_count > 0).then(|| CategoryWithCount {
                    id: category.id,
                    name: category.name.clone(),
                    post_count,
                })
            })
            .collect())
    }
}

#[async_trait]
impl TagsRepo for MemoryStore {
    async fn find_tag(&self, id: i64) -> Result<Option<TagRecord>, RepoError> {
        let state = self.state.lock().await;
        Ok(state.tags.iter().find(|tag| tag.id == id).cloned())
    }

    async fn list_all(&self) -> Result<Vec<TagRecord>, RepoError> {
        let mut tags = self.state.lock().await.tags.clone();
        tags.sort_by(|a, b| a.name.to_lowercase().cmp(&b.name.to_lowercase()));
        Ok(tags)
    }

    async fn list_for_posts(&self, post_ids: &[i64]) -> Result<Vec<(i64, TagRecord)>, RepoError> {
        let state = self.state.lock().await;
        Ok(state
            .post_tags
            .iter()
            .filter(|(post_id, _)| post_ids.contains(post_id))
            .filter_map(|(post_id, tag_id)| {
                state
                    .tags
                    .iter()
                    .find(|tag| tag.id == *tag_id)
                    .map(|tag| (*post_id, tag.clone()))
            })
            .collect())
    }
}

#[async_trait]
impl StoreHealth for MemoryStore {
    async fn ping(&self) -> Result<(), RepoError> {
        if self.healthy.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(RepoError::Timeout)
        }
    }
}

/// Renderer that rejects every document.
pub struct FailingRenderer;

impl RenderService for FailingRenderer {
    fn render(&self, _markdown: &str) -> Result<RenderOutput, RenderError> {
        Err(RenderError::Markdown {
            message: "renderer unavailable".to_string(),
        })
    }
}

pub fn feed_service(store: Arc<MemoryStore>) -> FeedService {
    feed_service_with_renderer(store, render_service())
}

pub fn feed_service_with_renderer(
    store: Arc<MemoryStore>,
    renderer: Arc<dyn RenderService>,
) -> FeedService {
    FeedService::new(
        store.clone(),
        store.clone(),
        store,
        renderer,
        FeedSettings::default(),
    )
}

pub fn http_state(store: Arc<MemoryStore>) -> HttpState {
    http_state_with_feed(store.clone(), feed_service(store))
}

pub fn http_state_with_feed(store: Arc<MemoryStore>, feed: FeedService) -> HttpState {
    HttpState {
        feed: Arc::new(feed),
        health: store,
        api: ApiSettings::default(),
    }
}

/// One category ("General") holding `count` posts created a day apart,
/// oldest first. Returns the category id and the post ids in creation order.
pub async fn seed_posts(store: &MemoryStore, count: usize) -> (i64, Vec<i64>) {
    let category = store.add_category("General").await;
    let mut ids = Vec::with_capacity(count);
    for index in 0..count {
        let title = format!("Post {}", index + 1);
        let id = store
            .add_post(NewPost {
                title: &title,
                body: "Plain body text.",
                excerpt: "",
                created_at: BASE_TIME + Duration::days(index as i64),
                category_id: category,
            })
            .await;
        ids.push(id);
    }
    (category, ids)
}
