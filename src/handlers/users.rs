//! Registration, login, profile, favourites and collaborators.

use super::parse_id;
use crate::error::AppError;
use crate::extractors::{AuthUser, JsonBody};
use crate::response::{created, message, ok, IdBody};
use crate::service::validation::require;
use crate::service::{UserChanges, UserService};
use crate::state::AppState;
use axum::{
    extract::{Path, State},
    response::IntoResponse,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Deserialize)]
pub struct RegisterBody {
    name: Option<String>,
    surname: Option<String>,
    username: Option<String>,
    password: Option<String>,
}

#[derive(Deserialize)]
pub struct CredentialsBody {
    username: Option<String>,
    password: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateUserBody {
    name: Option<String>,
    surname: Option<String>,
    username: Option<String>,
    new_password: Option<String>,
    password: Option<String>,
}

#[derive(Deserialize)]
pub struct CollaboratorBody {
    username: Option<String>,
}

#[derive(Serialize)]
pub struct TokenBody {
    id: Uuid,
    token: String,
}

/// POST /users
pub async fn register(
    State(state): State<AppState>,
    JsonBody(body): JsonBody<RegisterBody>,
) -> Result<impl IntoResponse, AppError> {
    let id = UserService::register(
        state.store(),
        require("name", body.name.as_deref())?,
        require("surname", body.surname.as_deref())?,
        require("username", body.username.as_deref())?,
        require("password", body.password.as_deref())?,
    )
    .await?;
    Ok(created(IdBody { id }))
}

/// POST /auth
pub async fn authenticate(
    State(state): State<AppState>,
    JsonBody(body): JsonBody<CredentialsBody>,
) -> Result<impl IntoResponse, AppError> {
    let id = UserService::authenticate(
        state.store(),
        require("username", body.username.as_deref())?,
        require("password", body.password.as_deref())?,
    )
    .await?;
    let token = state.tokens.issue(id)?;
    Ok(ok(TokenBody { id, token }))
}

/// GET /users/:id
pub async fn retrieve(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let id = parse_id("user id", &id)?;
    auth.ensure(id)?;
    Ok(ok(UserService::retrieve(state.store(), id).await?))
}

/// PATCH /users/:id
pub async fn update(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<String>,
    JsonBody(body): JsonBody<UpdateUserBody>,
) -> Result<impl IntoResponse, AppError> {
    let id = parse_id("user id", &id)?;
    auth.ensure(id)?;
    let changes = UserChanges {
        name: body.name.as_deref(),
        surname: body.surname.as_deref(),
        username: body.username.as_deref(),
        new_password: body.new_password.as_deref(),
        password: require("password", body.password.as_deref())?,
    };
    UserService::update(state.store(), id, changes).await?;
    Ok(message("user updated"))
}

/// GET /users/:id/favourites
pub async fn list_favourites(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let id = parse_id("user id", &id)?;
    auth.ensure(id)?;
    Ok(ok(UserService::list_favourites(state.store(), id).await?))
}

/// POST /users/:id/favourites/:storyId
pub async fn add_favourite(
    State(state): State<AppState>,
    auth: AuthUser,
    Path((id, story_id)): Path<(String, String)>,
) -> Result<impl IntoResponse, AppError> {
    let id = parse_id("user id", &id)?;
    auth.ensure(id)?;
    let story_id = parse_id("story id", &story_id)?;
    UserService::add_favourite(state.store(), id, story_id).await?;
    Ok(message("favourite added"))
}

/// DELETE /users/:id/favourites/:storyId
pub async fn remove_favourite(
    State(state): State<AppState>,
    auth: AuthUser,
    Path((id, story_id)): Path<(String, String)>,
) -> Result<impl IntoResponse, AppError> {
    let id = parse_id("user id", &id)?;
    auth.ensure(id)?;
    let story_id = parse_id("story id", &story_id)?;
    UserService::remove_favourite(state.store(), id, story_id).await?;
    Ok(message("favourite removed"))
}

/// GET /users/:id/collaborators
pub async fn list_collaborators(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let id = parse_id("user id", &id)?;
    auth.ensure(id)?;
    Ok(ok(UserService::list_collaborators(state.store(), id).await?))
}

/// POST /users/:id/collaborators
pub async fn add_collaborator(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<String>,
    JsonBody(body): JsonBody<CollaboratorBody>,
) -> Result<impl IntoResponse, AppError> {
    let id = parse_id("user id", &id)?;
    auth.ensure(id)?;
    let username = require("username", body.username.as_deref())?;
    UserService::add_collaborator(state.store(), id, username).await?;
    Ok(message("collaborator added"))
}
