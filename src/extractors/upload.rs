//! Multipart upload extractor: the first part carrying a file name becomes a `Blob`.

use crate::error::AppError;
use crate::model::Blob;
use async_trait::async_trait;
use axum::{
    extract::{FromRequest, Multipart, Request},
    http::StatusCode,
};

pub struct Upload(pub Blob);

fn rejected(status: StatusCode, text: String) -> AppError {
    if status == StatusCode::PAYLOAD_TOO_LARGE {
        AppError::PayloadTooLarge(text)
    } else {
        AppError::BadRequest(text)
    }
}

#[async_trait]
impl<S> FromRequest<S> for Upload
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let mut multipart = Multipart::from_request(req, state)
            .await
            .map_err(|e| rejected(e.status(), e.body_text()))?;
        while let Some(field) = multipart
            .next_field()
            .await
            .map_err(|e| rejected(e.status(), e.body_text()))?
        {
            if field.file_name().is_none() {
                continue;
            }
            let content_type = field
                .content_type()
                .unwrap_or("application/octet-stream")
                .to_string();
            let bytes = field.bytes().await.map_err(|e| rejected(e.status(), e.body_text()))?;
            return Ok(Upload(Blob {
                content_type,
                bytes: bytes.to_vec(),
            }));
        }
        Err(AppError::Type("upload has no file part".into()))
    }
}
