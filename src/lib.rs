//! Storyboard API: users, illustrated stories with pages, and kanban postits over REST.

pub mod auth;
pub mod config;
pub mod error;
pub mod extractors;
pub mod handlers;
pub mod model;
pub mod response;
pub mod routes;
pub mod service;
pub mod state;
pub mod store;

pub use auth::TokenIssuer;
pub use config::{Settings, StoreKind};
pub use error::AppError;
pub use routes::{app, common_routes, postit_routes, story_routes, user_routes};
pub use state::AppState;
pub use store::{ensure_database_exists, MemoryStore, PgStore, Store};
