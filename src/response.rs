//! Response envelope helpers: `{ data?, message?, error? }`.

use axum::{http::StatusCode, Json};
use serde::Serialize;

#[derive(Serialize)]
pub struct DataEnvelope<T> {
    pub data: T,
}

#[derive(Serialize)]
pub struct MessageEnvelope {
    pub message: String,
}

#[derive(Serialize)]
pub struct ErrorEnvelope {
    pub error: String,
}

/// 201 with the created payload (usually `{ id }`).
pub fn created<T: Serialize>(data: T) -> (StatusCode, Json<DataEnvelope<T>>) {
    (StatusCode::CREATED, Json(DataEnvelope { data }))
}

pub fn ok<T: Serialize>(data: T) -> (StatusCode, Json<DataEnvelope<T>>) {
    (StatusCode::OK, Json(DataEnvelope { data }))
}

pub fn message(text: impl Into<String>) -> (StatusCode, Json<MessageEnvelope>) {
    (
        StatusCode::OK,
        Json(MessageEnvelope {
            message: text.into(),
        }),
    )
}

#[derive(Serialize)]
pub struct IdBody {
    pub id: uuid::Uuid,
}
