//! Bearer-token subject from the `Authorization` header.

use crate::error::AppError;
use crate::state::AppState;
use async_trait::async_trait;
use axum::{
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts},
};
use uuid::Uuid;

/// The user id carried by a valid bearer token.
#[derive(Clone, Copy, Debug)]
pub struct AuthUser(pub Uuid);

impl AuthUser {
    /// Routes under `/users/:id` only serve the token's own user.
    pub fn ensure(&self, user_id: Uuid) -> Result<(), AppError> {
        if self.0 != user_id {
            tracing::warn!(subject = %self.0, path_user = %user_id, "token subject does not match path user");
            return Err(AppError::Auth(format!("token does not belong to user {}", user_id)));
        }
        Ok(())
    }
}

#[async_trait]
impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let token = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .and_then(|s| s.strip_prefix("Bearer ").or_else(|| s.strip_prefix("bearer ")))
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .ok_or_else(|| AppError::Auth("missing bearer token".into()))?;
        state.tokens.verify(token).map(AuthUser)
    }
}
