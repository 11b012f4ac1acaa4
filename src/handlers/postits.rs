use super::parse_id;
use crate::error::AppError;
use crate::extractors::{AuthUser, JsonBody};
use crate::response::{created, message, ok, IdBody};
use crate::service::validation::require;
use crate::service::PostitService;
use crate::state::AppState;
use axum::{
    extract::{Path, State},
    response::IntoResponse,
};
use serde::Deserialize;
use uuid::Uuid;

#[derive(Deserialize)]
pub struct PostitBody {
    text: Option<String>,
    status: Option<String>,
}

#[derive(Deserialize)]
pub struct AssignBody {
    assignee: Option<String>,
}

fn owned_ids(auth: &AuthUser, id: &str, postit_id: &str) -> Result<(Uuid, Uuid), AppError> {
    let id = parse_id("user id", id)?;
    auth.ensure(id)?;
    Ok((id, parse_id("postit id", postit_id)?))
}

/// POST /users/:id/postits
pub async fn add(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<String>,
    JsonBody(body): JsonBody<PostitBody>,
) -> Result<impl IntoResponse, AppError> {
    let id = parse_id("user id", &id)?;
    auth.ensure(id)?;
    let text = require("text", body.text.as_deref())?;
    let postit_id = PostitService::add(state.store(), id, text).await?;
    Ok(created(IdBody { id: postit_id }))
}

/// GET /users/:id/postits
pub async fn list(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let id = parse_id("user id", &id)?;
    auth.ensure(id)?;
    Ok(ok(PostitService::list(state.store(), id).await?))
}

/// PATCH /users/:id/postits/:postitId
pub async fn update(
    State(state): State<AppState>,
    auth: AuthUser,
    Path((id, postit_id)): Path<(String, String)>,
    JsonBody(body): JsonBody<PostitBody>,
) -> Result<impl IntoResponse, AppError> {
    let (id, postit_id) = owned_ids(&auth, &id, &postit_id)?;
    PostitService::update(state.store(), id, postit_id, body.text.as_deref(), body.status.as_deref()).await?;
    Ok(message("postit updated"))
}

/// DELETE /users/:id/postits/:postitId
pub async fn remove(
    State(state): State<AppState>,
    auth: AuthUser,
    Path((id, postit_id)): Path<(String, String)>,
) -> Result<impl IntoResponse, AppError> {
    let (id, postit_id) = owned_ids(&auth, &id, &postit_id)?;
    PostitService::remove(state.store(), id, postit_id).await?;
    Ok(message("postit removed"))
}

/// PATCH /users/:id/postits/:postitId/assign
pub async fn assign(
    State(state): State<AppState>,
    auth: AuthUser,
    Path((id, postit_id)): Path<(String, String)>,
    JsonBody(body): JsonBody<AssignBody>,
) -> Result<impl IntoResponse, AppError> {
    let (id, postit_id) = owned_ids(&auth, &id, &postit_id)?;
    let assignee = parse_id("assignee", require("assignee", body.assignee.as_deref())?)?;
    PostitService::assign(state.store(), id, postit_id, assignee).await?;
    Ok(message("postit assigned"))
}

/// PATCH /users/:id/postits/:postitId/unassign
pub async fn unassign(
    State(state): State<AppState>,
    auth: AuthUser,
    Path((id, postit_id)): Path<(String, String)>,
) -> Result<impl IntoResponse, AppError> {
    let (id, postit_id) = owned_ids(&auth, &id, &postit_id)?;
    PostitService::unassign(state.store(), id, postit_id).await?;
    Ok(message("postit unassigned"))
}
