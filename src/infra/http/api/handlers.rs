use axum::Json;
use axum::extract::{Query, State};
use url::form_urlencoded;

use crate::application::pagination::PageMeta;
use crate::config::ApiSettings;
use crate::infra::http::HttpState;

use super::INDEX_PATH;
use super::error::ApiError;
use super::models::{PostListQuery, PostListResponse, PostSummary};

pub async fn list_posts(
    State(state): State<HttpState>,
    Query(query): Query<PostListQuery>,
) -> Result<Json<PostListResponse>, ApiError> {
    let page_size = resolve_page_size(query.page_size.as_deref(), state.api);
    let page = state
        .feed
        .api_page(query.page.as_deref(), page_size)
        .await?;

    // Echo the page size only when the client chose one.
    let echoed_size = query.page_size.as_ref().map(|_| page_size);
    let tz = state.feed.timezone();

    Ok(Json(PostListResponse {
        count: page.meta.total,
        next: page
            .meta
            .next_number()
            .map(|number| page_link(Some(number), echoed_size)),
        previous: previous_link(&page.meta, echoed_size),
        results: page
            .items
            .into_iter()
            .map(|record| PostSummary::from_record(record, tz))
            .collect(),
    }))
}

/// Unparseable or zero sizes fall back to the default; larger ones are
/// capped at the configured maximum.
fn resolve_page_size(raw: Option<&str>, settings: ApiSettings) -> u64 {
    let default = u64::from(settings.page_size.get());
    let max = u64::from(settings.max_page_size.get());

    match raw.and_then(|value| value.trim().parse::<u64>().ok()) {
        Some(0) | None => default,
        Some(size) => size.min(max),
    }
}

fn previous_link(meta: &PageMeta, page_size: Option<u64>) -> Option<String> {
    let number = meta.previous_number()?;
    // The first page is addressed without a `page` parameter.
    let page = (number > 1).then_some(number);
    Some(page_link(page, page_size))
}

fn page_link(page: Option<u64>, page_size: Option<u64>) -> String {
    let mut query = form_urlencoded::Serializer::new(String::new());
    if let Some(page) = page {
        query.append_pair("page", &page.to_string());
    }
    if let Some(size) = page_size {
        query.append_pair("page_size", &size.to_string());
    }
    let query = query.finish();

    if query.is_empty() {
        INDEX_PATH.to_string()
    } else {
        format!("{INDEX_PATH}?{query}")
    }
}

#[cfg(test)]
mod tests {
    use std::num::NonZeroU32;

    use super::*;

    fn settings(page_size: u32, max: u32) -> ApiSettings {
        ApiSettings {
            page_size: NonZeroU32::new(page_size).expect("non-zero"),
            max_page_size: NonZeroU32::new(max).expect("non-zero"),
        }
    }

    #[test]
    fn page_size_defaults_and_clamps() {
        let api = settings(10, 100);
        assert_eq!(resolve_page_size(None, api), 10);
        assert_eq!(resolve_page_size(Some("25"), api), 25);
        assert_eq!(resolve_page_size(Some("5000"), api), 100);
        assert_eq!(resolve_page_size(Some("0"), api), 10);
        assert_eq!(resolve_page_size(Some("-4"), api), 10);
        assert_eq!(resolve_page_size(Some("lots"), api), 10);
    }

    #[test]
    fn links_are_relative_and_encoded() {
        assert_eq!(page_link(Some(3), None), "/api/index/?page=3");
        assert_eq!(
            page_link(Some(2), Some(25)),
            "/api/index/?page=2&page_size=25"
        );
        assert_eq!(page_link(None, None), "/api/index/");
    }

    #[test]
    fn previous_link_to_first_page_drops_page_parameter() {
        let meta = PageMeta {
            number: 2,
            num_pages: 3,
            per_page: 10,
            total: 25,
            has_previous: true,
            has_next: true,
        };
        assert_eq!(previous_link(&meta, None).as_deref(), Some("/api/index/"));

        let third = PageMeta { number: 3, has_next: false, ..meta };
        assert_eq!(
            previous_link(&third, Some(10)).as_deref(),
            Some("/api/index/?page=2&page_size=10")
        );
    }

    #[test]
    fn first_page_has_no_previous_link() {
        let meta = PageMeta {
            number: 1,
            num_pages: 1,
            per_page: 10,
            total: 3,
            has_previous: false,
            has_next: false,
        };
        assert!(previous_link(&meta, None).is_none());
    }
}
