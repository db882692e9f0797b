pub mod api;
mod middleware;
mod public;

pub use public::build_router;

use std::sync::Arc;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

use crate::application::error::ErrorReport;
use crate::application::feed::FeedService;
use crate::application::repos::{RepoError, StoreHealth};
use crate::config::ApiSettings;

/// Shared state handed to every handler.
#[derive(Clone)]
pub struct HttpState {
    pub feed: Arc<FeedService>,
    pub health: Arc<dyn StoreHealth>,
    pub api: ApiSettings,
}

fn db_health_response(result: Result<(), RepoError>) -> Response {
    match result {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(err) => {
            let mut response = StatusCode::SERVICE_UNAVAILABLE.into_response();
            ErrorReport::from_error(
                "infra::http::db_health",
                StatusCode::SERVICE_UNAVAILABLE,
                &err,
            )
            .attach(&mut response);
            response
        }
    }
}
