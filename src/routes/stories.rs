//! Story and page routes. Everything under `/users/:id/stories` requires the
//! bearer token of user `:id`, except reading a cover.

use crate::handlers::{pages, stories};
use crate::state::AppState;
use axum::{
    routing::{get, patch, post},
    Router,
};

pub fn story_routes(state: AppState) -> Router {
    Router::new()
        .route("/stories", get(stories::search))
        .route("/users/:id/stories", post(stories::add).get(stories::list))
        .route(
            "/users/:id/stories/:story_id",
            get(stories::retrieve).patch(stories::update).delete(stories::remove),
        )
        .route("/users/:id/stories/:story_id/finish", patch(stories::finish))
        .route("/users/:id/stories/:story_id/process", patch(stories::work_in))
        .route(
            "/users/:id/stories/:story_id/cover",
            post(stories::save_cover).get(stories::retrieve_cover),
        )
        .route("/users/:id/stories/:story_id/pages", post(pages::add).get(pages::list))
        .route(
            "/users/:id/stories/:story_id/pages/:page_id",
            get(pages::retrieve).patch(pages::update).delete(pages::remove),
        )
        .route(
            "/users/:id/stories/:story_id/pages/:page_id/picture",
            post(pages::save_picture).get(pages::retrieve_picture),
        )
        .route(
            "/users/:id/stories/:story_id/pages/:page_id/audio",
            post(pages::save_audio).get(pages::retrieve_audio),
        )
        .with_state(state)
}
