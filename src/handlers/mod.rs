//! HTTP handlers: extract, call the service, wrap the result in the envelope.

pub mod pages;
pub mod postits;
pub mod stories;
pub mod users;

use crate::error::AppError;
use crate::model::Blob;
use axum::{
    http::header::CONTENT_TYPE,
    response::{IntoResponse, Response},
};
use uuid::Uuid;

fn parse_id(field: &str, id_str: &str) -> Result<Uuid, AppError> {
    Uuid::parse_str(id_str).map_err(|_| AppError::BadRequest(format!("invalid {}: {}", field, id_str)))
}

fn blob_response(blob: Blob) -> Response {
    ([(CONTENT_TYPE, blob.content_type)], blob.bytes).into_response()
}
