//! Route tables. `app` assembles the full service the server binary runs.

mod common;
mod postits;
mod stories;
mod users;

pub use common::common_routes;
pub use postits::postit_routes;
pub use stories::story_routes;
pub use users::user_routes;

use crate::state::AppState;
use axum::{extract::DefaultBodyLimit, Router};
use tower_http::limit::RequestBodyLimitLayer;

/// Common routes at the root and the REST API under `/api`, with request bodies capped at `max_body_bytes`.
pub fn app(state: AppState, max_body_bytes: usize) -> Router {
    let api = Router::new()
        .merge(user_routes(state.clone()))
        .merge(story_routes(state.clone()))
        .merge(postit_routes(state.clone()));

    Router::new()
        .merge(common_routes(state))
        .nest("/api", api)
        .layer(DefaultBodyLimit::disable())
        .layer(RequestBodyLimitLayer::new(max_body_bytes))
}
