//! Input validation combinators. Run before any store call.
//!
//! A missing argument is a `Type` error; a present but blank one is a `Value` error.

use crate::error::AppError;
use crate::model::{Blob, BlobKind, DrawVector};

/// Required string: must be present and not blank.
pub fn require<'a>(field: &str, value: Option<&'a str>) -> Result<&'a str, AppError> {
    match value {
        Some(v) => not_blank(field, v),
        None => Err(AppError::Type(format!("{} is not a string", field))),
    }
}

pub fn not_blank<'a>(field: &str, value: &'a str) -> Result<&'a str, AppError> {
    if value.trim().is_empty() {
        return Err(AppError::Value(format!("{} is empty or blank", field)));
    }
    Ok(value)
}

/// Optional string: absent is fine, present must not be blank.
pub fn optional<'a>(field: &str, value: Option<&'a str>) -> Result<Option<&'a str>, AppError> {
    value.map(|v| not_blank(field, v)).transpose()
}

/// Uploaded attachment: non-empty and of the media type the kind expects.
pub fn upload(kind: BlobKind, blob: &Blob) -> Result<(), AppError> {
    if blob.bytes.is_empty() {
        return Err(AppError::Value(format!("{} is empty", kind.as_str())));
    }
    if !blob.content_type.to_ascii_lowercase().starts_with(kind.media_prefix()) {
        return Err(AppError::Value(format!(
            "{} must be of type {}*, got {}",
            kind.as_str(),
            kind.media_prefix(),
            blob.content_type
        )));
    }
    Ok(())
}

pub fn vectors(vectors: &[DrawVector]) -> Result<(), AppError> {
    for (i, v) in vectors.iter().enumerate() {
        if !v.x.is_finite() || !v.y.is_finite() {
            return Err(AppError::Value(format!("vectors[{}] has a non-finite coordinate", i)));
        }
        if !(v.line_width.is_finite() && v.line_width > 0.0) {
            return Err(AppError::Value(format!("vectors[{}].lineWidth must be positive", i)));
        }
        not_blank(&format!("vectors[{}].color", i), &v.color)?;
    }
    Ok(())
}
