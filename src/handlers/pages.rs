//! Page CRUD and page attachments (picture, audio).

use super::{blob_response, parse_id};
use crate::error::AppError;
use crate::extractors::{AuthUser, JsonBody, Upload};
use crate::model::DrawVector;
use crate::response::{created, message, ok, IdBody};
use crate::service::PageService;
use crate::state::AppState;
use axum::{
    extract::{Path, State},
    response::IntoResponse,
};
use serde::Deserialize;
use uuid::Uuid;

#[derive(Deserialize)]
pub struct PageBody {
    text: Option<String>,
    vectors: Option<Vec<DrawVector>>,
}

type PagePath = (String, String, String);

fn story_ids(auth: &AuthUser, id: &str, story_id: &str) -> Result<(Uuid, Uuid), AppError> {
    let id = parse_id("user id", id)?;
    auth.ensure(id)?;
    Ok((id, parse_id("story id", story_id)?))
}

fn page_ids(auth: &AuthUser, (id, story_id, page_id): &PagePath) -> Result<(Uuid, Uuid, Uuid), AppError> {
    let (id, story_id) = story_ids(auth, id, story_id)?;
    Ok((id, story_id, parse_id("page id", page_id)?))
}

/// POST /users/:id/stories/:storyId/pages
pub async fn add(
    State(state): State<AppState>,
    auth: AuthUser,
    Path((id, story_id)): Path<(String, String)>,
    JsonBody(body): JsonBody<PageBody>,
) -> Result<impl IntoResponse, AppError> {
    let (id, story_id) = story_ids(&auth, &id, &story_id)?;
    let page_id = PageService::add(state.store(), id, story_id, body.text.as_deref()).await?;
    Ok(created(IdBody { id: page_id }))
}

/// GET /users/:id/stories/:storyId/pages
pub async fn list(
    State(state): State<AppState>,
    auth: AuthUser,
    Path((id, story_id)): Path<(String, String)>,
) -> Result<impl IntoResponse, AppError> {
    let (id, story_id) = story_ids(&auth, &id, &story_id)?;
    Ok(ok(PageService::list(state.store(), id, story_id).await?))
}

/// GET /users/:id/stories/:storyId/pages/:pageId
pub async fn retrieve(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(path): Path<PagePath>,
) -> Result<impl IntoResponse, AppError> {
    let (id, story_id, page_id) = page_ids(&auth, &path)?;
    Ok(ok(PageService::retrieve(state.store(), id, story_id, page_id).await?))
}

/// PATCH /users/:id/stories/:storyId/pages/:pageId
pub async fn update(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(path): Path<PagePath>,
    JsonBody(body): JsonBody<PageBody>,
) -> Result<impl IntoResponse, AppError> {
    let (id, story_id, page_id) = page_ids(&auth, &path)?;
    PageService::update(state.store(), id, story_id, page_id, body.text.as_deref(), body.vectors).await?;
    Ok(message("page updated"))
}

/// DELETE /users/:id/stories/:storyId/pages/:pageId
pub async fn remove(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(path): Path<PagePath>,
) -> Result<impl IntoResponse, AppError> {
    let (id, story_id, page_id) = page_ids(&auth, &path)?;
    PageService::remove(state.store(), id, story_id, page_id).await?;
    Ok(message("page removed"))
}

/// POST .../pages/:pageId/picture (multipart)
pub async fn save_picture(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(path): Path<PagePath>,
    Upload(picture): Upload,
) -> Result<impl IntoResponse, AppError> {
    let (id, story_id, page_id) = page_ids(&auth, &path)?;
    PageService::save_picture(state.store(), id, story_id, page_id, picture).await?;
    Ok(message("picture saved"))
}

/// GET .../pages/:pageId/picture
pub async fn retrieve_picture(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(path): Path<PagePath>,
) -> Result<impl IntoResponse, AppError> {
    let (id, story_id, page_id) = page_ids(&auth, &path)?;
    let picture = PageService::retrieve_picture(state.store(), id, story_id, page_id).await?;
    Ok(blob_response(picture))
}

/// POST .../pages/:pageId/audio (multipart)
pub async fn save_audio(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(path): Path<PagePath>,
    Upload(audio): Upload,
) -> Result<impl IntoResponse, AppError> {
    let (id, story_id, page_id) = page_ids(&auth, &path)?;
    PageService::save_audio(state.store(), id, story_id, page_id, audio).await?;
    Ok(message("audio saved"))
}

/// GET .../pages/:pageId/audio
pub async fn retrieve_audio(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(path): Path<PagePath>,
) -> Result<impl IntoResponse, AppError> {
    let (id, story_id, page_id) = page_ids(&auth, &path)?;
    let audio = PageService::retrieve_audio(state.store(), id, story_id, page_id).await?;
    Ok(blob_response(audio))
}
