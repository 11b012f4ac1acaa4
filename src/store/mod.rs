//! Document-store seam for the logic layer.
//!
//! Every method is one round trip. Ownership, uniqueness and reference checks
//! belong to the services, not to the store; the only exception is the
//! username uniqueness the PostgreSQL schema also enforces.

mod memory;
mod postgres;

pub use memory::MemoryStore;
pub use postgres::{ensure_database_exists, PgStore};

use crate::error::AppError;
use crate::model::{Blob, BlobKind, Page, Postit, Story, User};
use async_trait::async_trait;
use uuid::Uuid;

#[async_trait]
pub trait UserStore: Send + Sync {
    /// Fails with `AlreadyExists` when the username is taken.
    async fn insert_user(&self, user: &User) -> Result<(), AppError>;
    async fn find_user(&self, id: Uuid) -> Result<Option<User>, AppError>;
    async fn find_user_by_username(&self, username: &str) -> Result<Option<User>, AppError>;
    async fn find_users(&self, ids: &[Uuid]) -> Result<Vec<User>, AppError>;
    /// Overwrites every mutable field. Returns false if the user does not exist.
    async fn save_user(&self, user: &User) -> Result<bool, AppError>;
}

#[async_trait]
pub trait StoryStore: Send + Sync {
    async fn insert_story(&self, story: &Story) -> Result<(), AppError>;
    async fn find_story(&self, id: Uuid) -> Result<Option<Story>, AppError>;
    async fn find_stories(&self, ids: &[Uuid]) -> Result<Vec<Story>, AppError>;
    /// Newest first.
    async fn stories_by_author(&self, author: Uuid) -> Result<Vec<Story>, AppError>;
    /// Finished stories whose title contains `query`, case-insensitively.
    async fn search_stories(&self, query: &str) -> Result<Vec<Story>, AppError>;
    async fn save_story(&self, story: &Story) -> Result<bool, AppError>;
    /// Deletes the story with its pages and every blob attached to either.
    async fn delete_story(&self, id: Uuid) -> Result<bool, AppError>;
}

#[async_trait]
pub trait PageStore: Send + Sync {
    async fn insert_page(&self, page: &Page) -> Result<(), AppError>;
    async fn find_page(&self, id: Uuid) -> Result<Option<Page>, AppError>;
    /// Ordered by position.
    async fn pages_of_story(&self, story: Uuid) -> Result<Vec<Page>, AppError>;
    async fn save_page(&self, page: &Page) -> Result<bool, AppError>;
    /// Deletes the page and its blobs.
    async fn delete_page(&self, id: Uuid) -> Result<bool, AppError>;
}

#[async_trait]
pub trait PostitStore: Send + Sync {
    async fn insert_postit(&self, postit: &Postit) -> Result<(), AppError>;
    async fn find_postit(&self, id: Uuid) -> Result<Option<Postit>, AppError>;
    /// Postits owned by or assigned to `user`, oldest first.
    async fn postits_for(&self, user: Uuid) -> Result<Vec<Postit>, AppError>;
    async fn save_postit(&self, postit: &Postit) -> Result<bool, AppError>;
    async fn delete_postit(&self, id: Uuid) -> Result<bool, AppError>;
}

#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Replaces any blob of the same kind on the same owner.
    async fn put_blob(&self, owner: Uuid, kind: BlobKind, blob: &Blob) -> Result<(), AppError>;
    async fn get_blob(&self, owner: Uuid, kind: BlobKind) -> Result<Option<Blob>, AppError>;
}

/// Everything the services need from a backing store.
#[async_trait]
pub trait Store: UserStore + StoryStore + PageStore + PostitStore + BlobStore {
    /// Cheap reachability probe for `/ready`.
    async fn ping(&self) -> Result<(), AppError>;
}
