use crate::application::error::{ErrorReport, HttpError};
use askama::{Error as AskamaError, Template};
use axum::{
    http::StatusCode,
    response::{Html, IntoResponse, Response},
};
use thiserror::Error;

#[derive(Debug, Error)]
#[error("{public_message}")]
pub struct TemplateRenderError {
    pub(crate) source: &'static str,
    pub(crate) public_message: &'static str,
    #[source]
    pub(crate) error: AskamaError,
}

impl TemplateRenderError {
    pub fn new(source: &'static str, public_message: &'static str, error: AskamaError) -> Self {
        Self {
            source,
            public_message,
            error,
        }
    }
}

impl From<TemplateRenderError> for HttpError {
    fn from(err: TemplateRenderError) -> Self {
        let TemplateRenderError {
            source,
            public_message,
            error,
        } = err;

        HttpError::from_error(
            source,
            StatusCode::INTERNAL_SERVER_ERROR,
            public_message,
            &error,
        )
    }
}

pub fn render_template<T: Template>(template: T) -> Result<Html<String>, HttpError> {
    template.render().map(Html).map_err(|err| {
        TemplateRenderError::new(
            "presentation::views::render_template",
            "Template rendering failed",
            err,
        )
        .into()
    })
}

pub fn render_template_response<T: Template>(template: T, status: StatusCode) -> Response {
    match render_template(template) {
        Ok(html) => (status, html).into_response(),
        Err(err) => err.into_response(),
    }
}

pub fn render_not_found_response(chrome: LayoutChrome) -> Response {
    let content = ErrorPageView::not_found();
    let view = LayoutContext::new(chrome.with_page_title(&content.title), content);
    let mut response = render_template_response(ErrorTemplate { view }, StatusCode::NOT_FOUND);
    ErrorReport::from_message(
        "presentation::views::render_not_found_response",
        StatusCode::NOT_FOUND,
        "Resource not found",
    )
    .attach(&mut response);
    response
}

#[derive(Clone)]
pub struct BrandView {
    pub title: String,
    pub href: String,
}

#[derive(Clone)]
pub struct PageMetaView {
    pub title: String,
    pub description: String,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LinkView {
    pub label: String,
    pub href: String,
}

/// Sidebar entry that carries a post count, e.g. a category or archive month.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CountedLink {
    pub label: String,
    pub href: String,
    pub count: u64,
}

#[derive(Clone, Default)]
pub struct SidebarView {
    pub recent_posts: Vec<LinkView>,
    pub months: Vec<CountedLink>,
    pub categories: Vec<CountedLink>,
    pub tags: Vec<LinkView>,
}

#[derive(Clone)]
pub struct LayoutChrome {
    pub brand: BrandView,
    pub meta: PageMetaView,
    pub sidebar: SidebarView,
}

impl LayoutChrome {
    /// Prefix the document title with the page's own title.
    pub fn with_page_title(self, title: &str) -> Self {
        let meta = PageMetaView {
            title: format!("{title} - {}", self.brand.title),
            ..self.meta
        };
        Self { meta, ..self }
    }
}

#[derive(Clone)]
pub struct LayoutContext<T> {
    pub brand: BrandView,
    pub meta: PageMetaView,
    pub sidebar: SidebarView,
    pub content: T,
}

impl<T> LayoutContext<T> {
    pub fn new(chrome: LayoutChrome, content: T) -> Self {
        Self {
            brand: chrome.brand,
            meta: chrome.meta,
            sidebar: chrome.sidebar,
            content,
        }
    }
}

#[derive(Clone, Debug)]
pub struct PostCard {
    pub id: i64,
    pub href: String,
    pub title: String,
    pub excerpt: String,
    pub iso_date: String,
    pub published: String,
    pub category: LinkView,
    pub tags: Vec<LinkView>,
    pub views: i64,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PaginationView {
    pub number: u64,
    pub num_pages: u64,
    pub first_href: String,
    pub previous_href: Option<String>,
    pub next_href: Option<String>,
    pub last_href: String,
}

impl PaginationView {
    pub fn is_paginated(&self) -> bool {
        self.num_pages > 1
    }
}

#[derive(Clone, Debug)]
pub struct PageContext {
    /// Filter description shown above the list ("Category: Rust"); `None` on the index.
    pub heading: Option<String>,
    /// User-facing validation message, such as an empty search keyword.
    pub warning: Option<String>,
    pub posts: Vec<PostCard>,
    pub post_count: usize,
    pub total_count: u64,
    pub has_results: bool,
    /// Absent for unpaginated result sets (search).
    pub pagination: Option<PaginationView>,
}

#[derive(Template)]
#[template(path = "index.html")]
pub struct IndexTemplate {
    pub view: LayoutContext<PageContext>,
}

#[derive(Clone, Debug)]
pub struct PostDetailContext {
    pub id: i64,
    pub title: String,
    pub body_html: String,
    /// Inner `<li>` markup of the table of contents; empty when the post has no headings.
    pub toc_html: String,
    pub published: String,
    pub iso_date: String,
    pub modified: String,
    pub category: LinkView,
    pub tags: Vec<LinkView>,
    pub views: i64,
    pub has_code_blocks: bool,
}

impl PostDetailContext {
    pub fn has_toc(&self) -> bool {
        !self.toc_html.trim().is_empty()
    }
}

#[derive(Template)]
#[template(path = "post.html")]
pub struct PostTemplate {
    pub view: LayoutContext<PostDetailContext>,
}

pub struct ErrorPageView {
    pub title: String,
    pub message: String,
    pub primary_action: Option<ErrorAction>,
}

impl ErrorPageView {
    pub fn not_found() -> Self {
        Self {
            title: "Page Not Found".to_string(),
            message: "The page you requested does not exist. Try returning to the homepage to continue reading.".to_string(),
            primary_action: Some(ErrorAction::home()),
        }
    }
}

pub struct ErrorAction {
    pub href: String,
    pub label: String,
}

impl ErrorAction {
    pub fn home() -> Self {
        Self {
            href: "/".to_string(),
            label: "Back to home".to_string(),
        }
    }
}

#[derive(Template)]
#[template(path = "error.html")]
pub struct ErrorTemplate {
    pub view: LayoutContext<ErrorPageView>,
}

pub fn month_label(year: i32, month: u32) -> String {
    const NAMES: [&str; 12] = [
        "January",
        "February",
        "March",
        "April",
        "May",
        "June",
        "July",
        "August",
        "September",
        "October",
        "November",
        "December",
    ];

    let index = usize::try_from(month.saturating_sub(1)).unwrap_or(0);
    match NAMES.get(index) {
        Some(name) => format!("{name} {year}"),
        None => format!("{year}-{month:02}"),
    }
}

pub fn category_link(id: i64, name: &str) -> LinkView {
    LinkView {
        label: name.to_string(),
        href: format!("/category/{id}"),
    }
}

pub fn tag_link(id: i64, name: &str) -> LinkView {
    LinkView {
        label: format!("#{name}"),
        href: format!("/tags/{id}"),
    }
}

pub fn post_href(id: i64) -> String {
    format!("/posts/{id}/")
}
