//! Read side of the blog: listings, filters, search and post detail.

use std::{collections::HashMap, sync::Arc, time::Instant};

use chrono_tz::Tz;
use metrics::{counter, histogram};
use serde::Serialize;
use thiserror::Error;
use time::OffsetDateTime;
use tracing::debug;

use crate::application::pagination::{
    PageMeta, PageSelector, PageWindow, PaginationError, Paginator,
};
use crate::application::render::{
    RenderError, RenderService, extract_toc_list, plain_text_summary,
};
use crate::application::repos::{
    CategoriesRepo, PostFilter, PostSlice, PostsRepo, RepoError, TagsRepo,
};
use crate::domain::archive::ArchiveMonth;
use crate::domain::entities::{CategoryRecord, PostRecord, TagRecord};
use crate::presentation::views::{
    BrandView, CountedLink, LayoutChrome, LinkView, PageContext, PageMetaView, PaginationView,
    PostCard, PostDetailContext, SidebarView, category_link, month_label, post_href, tag_link,
};
use crate::util::timezone;

pub const EMPTY_SEARCH_WARNING: &str = "please enter a search keyword";

const METRIC_POST_VIEWS: &str = "quire_post_views_total";
const METRIC_POST_RENDER_MS: &str = "quire_post_render_ms";
const METRIC_SEARCH_QUERIES: &str = "quire_search_queries_total";

/// Characters of body text shown on a card when a post has no excerpt.
const CARD_SUMMARY_CHARS: usize = 54;
const RECENT_POSTS: u64 = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeedFilter {
    All,
    Archive { year: i64, month: i64 },
    Category(i64),
    Tag(i64),
}

#[derive(Debug, Clone)]
pub struct FeedSettings {
    pub site_title: String,
    pub page_size: u64,
    pub timezone: Tz,
}

impl Default for FeedSettings {
    fn default() -> Self {
        Self {
            site_title: "quire".to_string(),
            page_size: 10,
            timezone: Tz::UTC,
        }
    }
}

/// Read-only projection of a post prepared for display. The stored Markdown
/// is never modified; rendering output lives only here.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RenderedPost {
    pub id: i64,
    pub title: String,
    pub body_html: String,
    /// Inner markup of the table of contents, `""` when there is none.
    pub toc_html: String,
    pub contains_code: bool,
    pub excerpt: String,
    pub created_at: OffsetDateTime,
    pub modified_at: OffsetDateTime,
    /// Stored count after this view was recorded.
    pub views: i64,
    pub category: CategoryRecord,
    pub tags: Vec<TagRecord>,
}

/// One page of the JSON listing.
#[derive(Debug, Clone)]
pub struct ApiPage {
    pub items: Vec<PostRecord>,
    pub meta: PageMeta,
}

#[derive(Debug, Error)]
pub enum FeedError {
    #[error("post not found")]
    PostNotFound,
    #[error("category not found")]
    CategoryNotFound,
    #[error("tag not found")]
    TagNotFound,
    #[error(transparent)]
    Pagination(#[from] PaginationError),
    #[error(transparent)]
    Render(#[from] RenderError),
    #[error(transparent)]
    Repo(#[from] RepoError),
}

impl FeedError {
    /// Whether the error means "nothing lives here" rather than a failure.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            FeedError::PostNotFound
                | FeedError::CategoryNotFound
                | FeedError::TagNotFound
                | FeedError::Pagination(_)
        )
    }
}

struct ResolvedFilter {
    /// `None` when the filter cannot match any post.
    query: Option<PostFilter>,
    heading: Option<String>,
    base_path: String,
}

#[derive(Clone)]
pub struct FeedService {
    posts: Arc<dyn PostsRepo>,
    categories: Arc<dyn CategoriesRepo>,
    tags: Arc<dyn TagsRepo>,
    renderer: Arc<dyn RenderService>,
    settings: FeedSettings,
}

impl FeedService {
    pub fn new(
        posts: Arc<dyn PostsRepo>,
        categories: Arc<dyn CategoriesRepo>,
        tags: Arc<dyn TagsRepo>,
        renderer: Arc<dyn RenderService>,
        settings: FeedSettings,
    ) -> Self {
        Self {
            posts,
            categories,
            tags,
            renderer,
            settings,
        }
    }

    pub fn timezone(&self) -> Tz {
        self.settings.timezone
    }

    /// Paginated listing, newest first. `page` is the raw query value.
    pub async fn list(
        &self,
        filter: FeedFilter,
        page: Option<&str>,
    ) -> Result<PageContext, FeedError> {
        let selector = PageSelector::parse(page)?;
        let resolved = self.resolve_filter(filter).await?;
        let (slice, meta) = match &resolved.query {
            Some(query) => {
                self.fetch_page(query, selector, self.settings.page_size)
                    .await?
            }
            None => empty_page(selector, self.settings.page_size)?,
        };

        let posts = self.build_cards(&slice.items).await?;
        let post_count = posts.len();

        Ok(PageContext {
            heading: resolved.heading,
            warning: None,
            posts,
            post_count,
            total_count: slice.total,
            has_results: post_count > 0,
            pagination: Some(build_pagination_view(&meta, &resolved.base_path)),
        })
    }

    /// Case-insensitive keyword search over title and body. Results are not
    /// paginated. A missing or blank keyword yields the first page of the
    /// default listing with a warning instead.
    pub async fn search(&self, key: Option<&str>) -> Result<PageContext, FeedError> {
        let Some(key) = key.map(str::trim).filter(|key| !key.is_empty()) else {
            let mut context = self.list(FeedFilter::All, None).await?;
            context.warning = Some(EMPTY_SEARCH_WARNING.to_string());
            return Ok(context);
        };

        counter!(METRIC_SEARCH_QUERIES).increment(1);
        let slice = self
            .posts
            .list_posts(&PostFilter::Search(key.to_string()), None)
            .await?;
        debug!(
            target = "quire::application::feed",
            key,
            matches = slice.total,
            "search executed"
        );

        let posts = self.build_cards(&slice.items).await?;
        let post_count = posts.len();

        Ok(PageContext {
            heading: Some(format!("Search: {key}")),
            warning: None,
            posts,
            post_count,
            total_count: slice.total,
            has_results: post_count > 0,
            pagination: None,
        })
    }

    /// Load, count and render one post. The view is recorded before
    /// rendering, so a render failure still counts as a view.
    pub async fn post_detail(&self, id: i64) -> Result<RenderedPost, FeedError> {
        let post = self
            .posts
            .find_post(id)
            .await?
            .ok_or(FeedError::PostNotFound)?;

        let views = match self.posts.increment_views(post.id).await {
            Ok(views) => views,
            Err(RepoError::NotFound) => return Err(FeedError::PostNotFound),
            Err(err) => return Err(err.into()),
        };
        counter!(METRIC_POST_VIEWS).increment(1);

        let started_at = Instant::now();
        let output = self.renderer.render(&post.body_markdown)?;
        histogram!(METRIC_POST_RENDER_MS).record(started_at.elapsed().as_secs_f64() * 1000.0);

        let tags = self
            .tags
            .list_for_posts(&[post.id])
            .await?
            .into_iter()
            .map(|(_, tag)| tag)
            .collect();

        Ok(RenderedPost {
            id: post.id,
            title: post.title,
            body_html: output.html,
            toc_html: extract_toc_list(&output.toc_block),
            contains_code: output.contains_code,
            excerpt: post.excerpt,
            created_at: post.created_at,
            modified_at: post.modified_at,
            views,
            category: post.category,
            tags,
        })
    }

    pub async fn post_page(&self, id: i64) -> Result<PostDetailContext, FeedError> {
        let post = self.post_detail(id).await?;
        let tz = self.settings.timezone;

        Ok(PostDetailContext {
            id: post.id,
            title: post.title,
            body_html: post.body_html,
            toc_html: post.toc_html,
            published: timezone::format_human_date(post.created_at, tz),
            iso_date: timezone::localized_datetime(post.created_at, tz).to_rfc3339(),
            modified: timezone::format_human_date(post.modified_at, tz),
            category: category_link(post.category.id, &post.category.name),
            tags: post
                .tags
                .iter()
                .map(|tag| tag_link(tag.id, &tag.name))
                .collect(),
            views: post.views,
            has_code_blocks: post.contains_code,
        })
    }

    /// Default listing for the JSON endpoint with a caller-chosen page size.
    pub async fn api_page(&self, page: Option<&str>, page_size: u64) -> Result<ApiPage, FeedError> {
        let selector = PageSelector::parse(page)?;
        let (slice, meta) = self
            .fetch_page(&PostFilter::All, selector, page_size)
            .await?;

        Ok(ApiPage {
            items: slice.items,
            meta,
        })
    }

    /// Header and sidebar shared by every HTML page.
    pub async fn chrome(&self) -> Result<LayoutChrome, FeedError> {
        let recent = self
            .posts
            .list_posts(&PostFilter::All, Some(PageWindow::for_page(1, RECENT_POSTS)))
            .await?;
        let months = self.posts.list_month_counts(self.settings.timezone).await?;
        let categories = self.categories.list_with_counts().await?;
        let tags = self.tags.list_all().await?;

        let sidebar = SidebarView {
            recent_posts: recent
                .items
                .iter()
                .map(|post| LinkView {
                    label: post.title.clone(),
                    href: post_href(post.id),
                })
                .collect(),
            months: months
                .iter()
                .map(|entry| CountedLink {
                    label: month_label(entry.year, entry.month),
                    href: format!("/archives/{}/{}/", entry.year, entry.month),
                    count: entry.count,
                })
                .collect(),
            categories: categories
                .iter()
                .map(|category| CountedLink {
                    label: category.name.clone(),
                    href: format!("/category/{}", category.id),
                    count: category.post_count,
                })
                .collect(),
            tags: tags.iter().map(|tag| tag_link(tag.id, &tag.name)).collect(),
        };

        Ok(LayoutChrome {
            sidebar,
            ..self.bare_chrome()
        })
    }

    /// Chrome without any data-backed widgets, for pages rendered while the
    /// store is unavailable.
    pub fn bare_chrome(&self) -> LayoutChrome {
        LayoutChrome {
            brand: BrandView {
                title: self.settings.site_title.clone(),
                href: "/".to_string(),
            },
            meta: PageMetaView {
                title: self.settings.site_title.clone(),
                description: String::new(),
            },
            sidebar: SidebarView::default(),
        }
    }

    async fn resolve_filter(&self, filter: FeedFilter) -> Result<ResolvedFilter, FeedError> {
        match filter {
            FeedFilter::All => Ok(ResolvedFilter {
                query: Some(PostFilter::All),
                heading: None,
                base_path: "/".to_string(),
            }),
            FeedFilter::Archive { year, month } => {
                let resolved = ArchiveMonth::new(year, month).and_then(|archive| {
                    let range = archive.range_in(self.settings.timezone)?;
                    Ok((archive, range))
                });
                match resolved {
                    Ok((archive, range)) => Ok(ResolvedFilter {
                        query: Some(PostFilter::Archive(range)),
                        heading: Some(format!(
                            "Archive: {}",
                            month_label(archive.year(), archive.month())
                        )),
                        base_path: archive.path(),
                    }),
                    // A month no calendar has simply holds no posts.
                    Err(err) => {
                        debug!(
                            target = "quire::application::feed",
                            year,
                            month,
                            error = %err,
                            "archive month matches no posts"
                        );
                        Ok(ResolvedFilter {
                            query: None,
                            heading: Some(format!("Archive: {year}-{month:02}")),
                            base_path: format!("/archives/{year}/{month}/"),
                        })
                    }
                }
            }
            FeedFilter::Category(id) => {
                let category = self
                    .categories
                    .find_category(id)
                    .await?
                    .ok_or(FeedError::CategoryNotFound)?;
                Ok(ResolvedFilter {
                    query: Some(PostFilter::Category(category.id)),
                    heading: Some(format!("Category: {}", category.name)),
                    base_path: format!("/category/{}", category.id),
                })
            }
            FeedFilter::Tag(id) => {
                let tag = self
                    .tags
                    .find_tag(id)
                    .await?
                    .ok_or(FeedError::TagNotFound)?;
                Ok(ResolvedFilter {
                    query: Some(PostFilter::Tag(tag.id)),
                    heading: Some(format!("Tag: {}", tag.name)),
                    base_path: format!("/tags/{}", tag.id),
                })
            }
        }
    }

    /// Fetch the selected page. The total is only known after a query, so
    /// `last` costs one extra round trip and range checks run afterwards.
    async fn fetch_page(
        &self,
        query: &PostFilter,
        selector: PageSelector,
        per_page: u64,
    ) -> Result<(PostSlice, PageMeta), FeedError> {
        let (number, slice) = match selector {
            PageSelector::Number(number) => {
                let slice = self
                    .posts
                    .list_posts(query, Some(PageWindow::for_page(number, per_page)))
                    .await?;
                (number, slice)
            }
            PageSelector::Last => {
                let first = self
                    .posts
                    .list_posts(query, Some(PageWindow::for_page(1, per_page)))
                    .await?;
                let last = Paginator::new(first.total, per_page).num_pages();
                if last == 1 {
                    (1, first)
                } else {
                    let slice = self
                        .posts
                        .list_posts(query, Some(PageWindow::for_page(last, per_page)))
                        .await?;
                    (last, slice)
                }
            }
        };

        let paginator = Paginator::new(slice.total, per_page);
        let number = paginator.resolve(PageSelector::Number(number))?;
        Ok((slice, paginator.meta(number)))
    }

    async fn build_cards(&self, records: &[PostRecord]) -> Result<Vec<PostCard>, FeedError> {
        let mut tags_by_post: HashMap<i64, Vec<TagRecord>> = HashMap::new();
        if !records.is_empty() {
            let ids: Vec<i64> = records.iter().map(|record| record.id).collect();
            for (post_id, tag) in self.tags.list_for_posts(&ids).await? {
                tags_by_post.entry(post_id).or_default().push(tag);
            }
        }

        Ok(records
            .iter()
            .map(|record| {
                let tags = tags_by_post.get(&record.id).map(Vec::as_slice).unwrap_or(&[]);
                record_to_card(record, tags, self.settings.timezone)
            })
            .collect())
    }
}

/// Page bookkeeping for a filter that cannot match anything. Only the first
/// (empty) page exists.
fn empty_page(selector: PageSelector, per_page: u64) -> Result<(PostSlice, PageMeta), FeedError> {
    let paginator = Paginator::new(0, per_page);
    let number = paginator.resolve(selector)?;
    let slice = PostSlice {
        items: Vec::new(),
        total: 0,
    };
    Ok((slice, paginator.meta(number)))
}

fn record_to_card(record: &PostRecord, tags: &[TagRecord], tz: Tz) -> PostCard {
    PostCard {
        id: record.id,
        href: post_href(record.id),
        title: record.title.clone(),
        excerpt: card_excerpt(record),
        iso_date: timezone::localized_datetime(record.created_at, tz).to_rfc3339(),
        published: timezone::format_human_date(record.created_at, tz),
        category: category_link(record.category.id, &record.category.name),
        tags: tags.iter().map(|tag| tag_link(tag.id, &tag.name)).collect(),
        views: record.views,
    }
}

fn card_excerpt(record: &PostRecord) -> String {
    if record.excerpt.trim().is_empty() {
        plain_text_summary(&record.body_markdown, CARD_SUMMARY_CHARS)
    } else {
        record.excerpt.clone()
    }
}

fn page_href(base_path: &str, number: u64) -> String {
    if number <= 1 {
        base_path.to_string()
    } else {
        format!("{base_path}?page={number}")
    }
}

fn build_pagination_view(meta: &PageMeta, base_path: &str) -> PaginationView {
    PaginationView {
        number: meta.number,
        num_pages: meta.num_pages,
        first_href: page_href(base_path, 1),
        previous_href: meta
            .previous_number()
            .map(|number| page_href(base_path, number)),
        next_href: meta.next_number().map(|number| page_href(base_path, number)),
        last_href: page_href(base_path, meta.num_pages),
    }
}
