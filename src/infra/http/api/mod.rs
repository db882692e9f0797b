pub mod error;
pub mod handlers;
pub mod models;

use axum::{Router, routing::get};

use crate::infra::http::HttpState;

pub(crate) const INDEX_PATH: &str = "/api/index/";

/// Read-only JSON surface. Public, no authentication.
pub fn build_api_router() -> Router<HttpState> {
    Router::new().route(INDEX_PATH, get(handlers::list_posts))
}
