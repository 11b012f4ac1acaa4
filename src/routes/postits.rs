use crate::handlers::postits::{add, assign, list, remove, unassign, update};
use crate::state::AppState;
use axum::{
    routing::{patch, post},
    Router,
};

pub fn postit_routes(state: AppState) -> Router {
    Router::new()
        .route("/users/:id/postits", post(add).get(list))
        .route("/users/:id/postits/:postit_id", patch(update).delete(remove))
        .route("/users/:id/postits/:postit_id/assign", patch(assign))
        .route("/users/:id/postits/:postit_id/unassign", patch(unassign))
        .with_state(state)
}
