use crate::handlers::users::{
    add_collaborator, add_favourite, authenticate, list_collaborators, list_favourites, register, remove_favourite,
    retrieve, update,
};
use crate::state::AppState;
use axum::{
    routing::{get, post},
    Router,
};

pub fn user_routes(state: AppState) -> Router {
    Router::new()
        .route("/users", post(register))
        .route("/auth", post(authenticate))
        .route("/users/:id", get(retrieve).patch(update))
        .route("/users/:id/favourites", get(list_favourites))
        .route("/users/:id/favourites/:story_id", post(add_favourite).delete(remove_favourite))
        .route("/users/:id/collaborators", get(list_collaborators).post(add_collaborator))
        .with_state(state)
}
