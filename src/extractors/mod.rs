//! Request extractors that reject with the JSON error envelope.

pub mod auth;
pub mod json;
pub mod upload;

pub use auth::AuthUser;
pub use json::JsonBody;
pub use upload::Upload;
