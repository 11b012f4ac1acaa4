//! Story CRUD, publishing toggles, cover upload and public search.

use super::{blob_response, parse_id};
use crate::error::AppError;
use crate::extractors::{AuthUser, JsonBody, Upload};
use crate::response::{created, message, ok, IdBody};
use crate::service::validation::require;
use crate::service::{NewStory, StoryChanges, StoryService};
use crate::state::AppState;
use axum::{
    extract::{Path, Query, State},
    response::IntoResponse,
};
use serde::Deserialize;
use uuid::Uuid;

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoryBody {
    title: Option<String>,
    audience: Option<String>,
    init_lang: Option<String>,
    final_lang: Option<String>,
}

#[derive(Deserialize)]
pub struct SearchParams {
    query: Option<String>,
}

fn owned_ids(auth: &AuthUser, id: &str, story_id: &str) -> Result<(Uuid, Uuid), AppError> {
    let id = parse_id("user id", id)?;
    auth.ensure(id)?;
    Ok((id, parse_id("story id", story_id)?))
}

/// POST /users/:id/stories
pub async fn add(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<String>,
    JsonBody(body): JsonBody<StoryBody>,
) -> Result<impl IntoResponse, AppError> {
    let id = parse_id("user id", &id)?;
    auth.ensure(id)?;
    let new = NewStory {
        title: require("title", body.title.as_deref())?,
        audience: require("audience", body.audience.as_deref())?,
        init_lang: body.init_lang.as_deref(),
        final_lang: body.final_lang.as_deref(),
    };
    let story_id = StoryService::add(state.store(), id, new).await?;
    Ok(created(IdBody { id: story_id }))
}

/// GET /users/:id/stories
pub async fn list(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let id = parse_id("user id", &id)?;
    auth.ensure(id)?;
    Ok(ok(StoryService::list(state.store(), id).await?))
}

/// GET /users/:id/stories/:storyId
pub async fn retrieve(
    State(state): State<AppState>,
    auth: AuthUser,
    Path((id, story_id)): Path<(String, String)>,
) -> Result<impl IntoResponse, AppError> {
    let (id, story_id) = owned_ids(&auth, &id, &story_id)?;
    Ok(ok(StoryService::retrieve(state.store(), id, story_id).await?))
}

/// PATCH /users/:id/stories/:storyId
pub async fn update(
    State(state): State<AppState>,
    auth: AuthUser,
    Path((id, story_id)): Path<(String, String)>,
    JsonBody(body): JsonBody<StoryBody>,
) -> Result<impl IntoResponse, AppError> {
    let (id, story_id) = owned_ids(&auth, &id, &story_id)?;
    let changes = StoryChanges {
        title: body.title.as_deref(),
        audience: body.audience.as_deref(),
        init_lang: body.init_lang.as_deref(),
        final_lang: body.final_lang.as_deref(),
    };
    StoryService::update(state.store(), id, story_id, changes).await?;
    Ok(message("story updated"))
}

/// DELETE /users/:id/stories/:storyId
pub async fn remove(
    State(state): State<AppState>,
    auth: AuthUser,
    Path((id, story_id)): Path<(String, String)>,
) -> Result<impl IntoResponse, AppError> {
    let (id, story_id) = owned_ids(&auth, &id, &story_id)?;
    StoryService::remove(state.store(), id, story_id).await?;
    Ok(message("story removed"))
}

/// PATCH /users/:id/stories/:storyId/finish
pub async fn finish(
    State(state): State<AppState>,
    auth: AuthUser,
    Path((id, story_id)): Path<(String, String)>,
) -> Result<impl IntoResponse, AppError> {
    let (id, story_id) = owned_ids(&auth, &id, &story_id)?;
    StoryService::finish(state.store(), id, story_id).await?;
    Ok(message("story finished"))
}

/// PATCH /users/:id/stories/:storyId/process
pub async fn work_in(
    State(state): State<AppState>,
    auth: AuthUser,
    Path((id, story_id)): Path<(String, String)>,
) -> Result<impl IntoResponse, AppError> {
    let (id, story_id) = owned_ids(&auth, &id, &story_id)?;
    StoryService::work_in(state.store(), id, story_id).await?;
    Ok(message("story in process"))
}

/// POST /users/:id/stories/:storyId/cover (multipart)
pub async fn save_cover(
    State(state): State<AppState>,
    auth: AuthUser,
    Path((id, story_id)): Path<(String, String)>,
    Upload(cover): Upload,
) -> Result<impl IntoResponse, AppError> {
    let (id, story_id) = owned_ids(&auth, &id, &story_id)?;
    StoryService::save_cover(state.store(), id, story_id, cover).await?;
    Ok(message("cover saved"))
}

/// GET /users/:id/stories/:storyId/cover
///
/// No bearer token: covers are loaded by plain `<img>` tags.
pub async fn retrieve_cover(
    State(state): State<AppState>,
    Path((id, story_id)): Path<(String, String)>,
) -> Result<impl IntoResponse, AppError> {
    let id = parse_id("user id", &id)?;
    let story_id = parse_id("story id", &story_id)?;
    let cover = StoryService::retrieve_cover(state.store(), id, story_id).await?;
    Ok(blob_response(cover))
}

/// GET /stories?query=
pub async fn search(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> Result<impl IntoResponse, AppError> {
    let query = require("query", params.query.as_deref())?;
    Ok(ok(StoryService::search(state.store(), query).await?))
}
