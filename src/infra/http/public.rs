use axum::{
    Router,
    extract::{Path, Query, State},
    http::StatusCode,
    middleware,
    response::{IntoResponse, Response},
    routing::get,
};
use serde::Deserialize;

use crate::{
    application::{
        error::{ErrorReport, HttpError},
        feed::{FeedError, FeedFilter},
    },
    presentation::views::{
        IndexTemplate, LayoutChrome, LayoutContext, PageContext, PostTemplate,
        render_not_found_response, render_template_response,
    },
};

use super::{
    HttpState, api, db_health_response,
    middleware::{log_responses, set_request_context},
};

pub fn build_router(state: HttpState) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/posts/{id}/", get(post_detail))
        .route("/archives/{year}/{month}/", get(archive_index))
        .route("/category/{id}", get(category_index))
        .route("/tags/{id}", get(tag_index))
        .route("/search/", get(search))
        .route("/_health/db", get(public_health))
        .merge(api::build_api_router())
        .fallback(fallback_router)
        .with_state(state)
        .layer(middleware::from_fn(log_responses))
        .layer(middleware::from_fn(set_request_context))
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct PageQuery {
    page: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct SearchQuery {
    search_key: Option<String>,
}

async fn index(State(state): State<HttpState>, Query(query): Query<PageQuery>) -> Response {
    listing_response(&state, FeedFilter::All, query.page.as_deref()).await
}

async fn archive_index(
    State(state): State<HttpState>,
    Path((year, month)): Path<(String, String)>,
    Query(query): Query<PageQuery>,
) -> Response {
    let (Some(year), Some(month)) = (parse_id(&year), parse_id(&month)) else {
        return not_found(&state).await;
    };

    listing_response(
        &state,
        FeedFilter::Archive { year, month },
        query.page.as_deref(),
    )
    .await
}

async fn category_index(
    State(state): State<HttpState>,
    Path(id): Path<String>,
    Query(query): Query<PageQuery>,
) -> Response {
    let Some(id) = parse_id(&id) else {
        return not_found(&state).await;
    };

    listing_response(&state, FeedFilter::Category(id), query.page.as_deref()).await
}

async fn tag_index(
    State(state): State<HttpState>,
    Path(id): Path<String>,
    Query(query): Query<PageQuery>,
) -> Response {
    let Some(id) = parse_id(&id) else {
        return not_found(&state).await;
    };

    listing_response(&state, FeedFilter::Tag(id), query.page.as_deref()).await
}

async fn search(State(state): State<HttpState>, Query(query): Query<SearchQuery>) -> Response {
    let chrome = match state.feed.chrome().await {
        Ok(chrome) => chrome,
        Err(err) => return HttpError::from(err).into_response(),
    };

    match state.feed.search(query.search_key.as_deref()).await {
        Ok(content) => listing_page(chrome, content),
        Err(err) => feed_error_to_response(err, chrome),
    }
}

async fn post_detail(State(state): State<HttpState>, Path(id): Path<String>) -> Response {
    let Some(id) = parse_id(&id) else {
        return not_found(&state).await;
    };

    let chrome = match state.feed.chrome().await {
        Ok(chrome) => chrome,
        Err(err) => return HttpError::from(err).into_response(),
    };

    match state.feed.post_page(id).await {
        Ok(content) => {
            let view = LayoutContext::new(chrome.with_page_title(&content.title), content);
            render_template_response(PostTemplate { view }, StatusCode::OK)
        }
        Err(err) => feed_error_to_response(err, chrome),
    }
}

async fn public_health(State(state): State<HttpState>) -> Response {
    db_health_response(state.health.ping().await)
}

async fn fallback_router(State(state): State<HttpState>) -> Response {
    not_found(&state).await
}

async fn listing_response(state: &HttpState, filter: FeedFilter, page: Option<&str>) -> Response {
    let chrome = match state.feed.chrome().await {
        Ok(chrome) => chrome,
        Err(err) => return HttpError::from(err).into_response(),
    };

    match state.feed.list(filter, page).await {
        Ok(content) => listing_page(chrome, content),
        Err(err) => feed_error_to_response(err, chrome),
    }
}

fn listing_page(chrome: LayoutChrome, content: PageContext) -> Response {
    let chrome = match content.heading.as_deref() {
        Some(heading) => chrome.with_page_title(heading),
        None => chrome,
    };
    let view = LayoutContext::new(chrome, content);
    render_template_response(IndexTemplate { view }, StatusCode::OK)
}

/// The 404 page still carries the sidebar when the store answers.
async fn not_found(state: &HttpState) -> Response {
    let chrome = state
        .feed
        .chrome()
        .await
        .unwrap_or_else(|_| state.feed.bare_chrome());
    render_not_found_response(chrome)
}

fn feed_error_to_response(err: FeedError, chrome: LayoutChrome) -> Response {
    if err.is_not_found() {
        let mut response = render_not_found_response(chrome);
        ErrorReport::from_error(
            "infra::http::feed_error_to_response",
            StatusCode::NOT_FOUND,
            &err,
        )
        .attach(&mut response);
        return response;
    }

    HttpError::from(err).into_response()
}

/// Path ids that are not integers name nothing.
fn parse_id(raw: &str) -> Option<i64> {
    raw.parse().ok()
}
