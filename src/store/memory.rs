use super::{BlobStore, PageStore, PostitStore, Store, StoryStore, UserStore};
use crate::error::AppError;
use crate::model::{Blob, BlobKind, Page, Postit, Story, User};
use async_trait::async_trait;
use regex::RegexBuilder;
use std::collections::HashMap;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};
use uuid::Uuid;

#[derive(Default)]
struct Collections {
    users: HashMap<Uuid, User>,
    stories: HashMap<Uuid, Story>,
    pages: HashMap<Uuid, Page>,
    postits: HashMap<Uuid, Postit>,
    blobs: HashMap<(Uuid, BlobKind), Blob>,
}

/// In-memory store for tests and `STORE=memory`. One lock over all collections;
/// no lock is held across an await point.
#[derive(Clone, Default)]
pub struct MemoryStore {
    inner: Arc<RwLock<Collections>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, Collections>, AppError> {
        self.inner.read().map_err(|_| AppError::Internal("memory store poisoned".into()))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, Collections>, AppError> {
        self.inner.write().map_err(|_| AppError::Internal("memory store poisoned".into()))
    }
}

fn replace<T: Clone>(map: &mut HashMap<Uuid, T>, id: Uuid, value: &T) -> bool {
    match map.get_mut(&id) {
        Some(slot) => {
            *slot = value.clone();
            true
        }
        None => false,
    }
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn insert_user(&self, user: &User) -> Result<(), AppError> {
        let mut c = self.write()?;
        if c.users.values().any(|u| u.username == user.username) {
            return Err(AppError::AlreadyExists(format!("user with username \"{}\" already exists", user.username)));
        }
        c.users.insert(user.id, user.clone());
        Ok(())
    }

    async fn find_user(&self, id: Uuid) -> Result<Option<User>, AppError> {
        Ok(self.read()?.users.get(&id).cloned())
    }

    async fn find_user_by_username(&self, username: &str) -> Result<Option<User>, AppError> {
        Ok(self.read()?.users.values().find(|u| u.username == username).cloned())
    }

    async fn find_users(&self, ids: &[Uuid]) -> Result<Vec<User>, AppError> {
        let c = self.read()?;
        Ok(ids.iter().filter_map(|id| c.users.get(id).cloned()).collect())
    }

    async fn save_user(&self, user: &User) -> Result<bool, AppError> {
        let mut c = self.write()?;
        if c.users.values().any(|u| u.id != user.id && u.username == user.username) {
            return Err(AppError::AlreadyExists(format!("user with username \"{}\" already exists", user.username)));
        }
        Ok(replace(&mut c.users, user.id, user))
    }
}

#[async_trait]
impl StoryStore for MemoryStore {
    async fn insert_story(&self, story: &Story) -> Result<(), AppError> {
        self.write()?.stories.insert(story.id, story.clone());
        Ok(())
    }

    async fn find_story(&self, id: Uuid) -> Result<Option<Story>, AppError> {
        Ok(self.read()?.stories.get(&id).cloned())
    }

    async fn find_stories(&self, ids: &[Uuid]) -> Result<Vec<Story>, AppError> {
        let c = self.read()?;
        Ok(ids.iter().filter_map(|id| c.stories.get(id).cloned()).collect())
    }

    async fn stories_by_author(&self, author: Uuid) -> Result<Vec<Story>, AppError> {
        let mut out: Vec<Story> = self.read()?.stories.values().filter(|s| s.author == author).cloned().collect();
        out.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(out)
    }

    async fn search_stories(&self, query: &str) -> Result<Vec<Story>, AppError> {
        let re = RegexBuilder::new(&regex::escape(query))
            .case_insensitive(true)
            .build()
            .map_err(|e| AppError::Internal(e.to_string()))?;
        let mut out: Vec<Story> = self
            .read()?
            .stories
            .values()
            .filter(|s| !s.in_process && re.is_match(&s.title))
            .cloned()
            .collect();
        out.sort_by_cached_key(|s| (s.title.to_lowercase(), s.title.clone()));
        Ok(out)
    }

    async fn save_story(&self, story: &Story) -> Result<bool, AppError> {
        Ok(replace(&mut self.write()?.stories, story.id, story))
    }

    async fn delete_story(&self, id: Uuid) -> Result<bool, AppError> {
        let mut c = self.write()?;
        if c.stories.remove(&id).is_none() {
            return Ok(false);
        }
        let page_ids: Vec<Uuid> = c.pages.values().filter(|p| p.story == id).map(|p| p.id).collect();
        for pid in &page_ids {
            c.pages.remove(pid);
        }
        c.blobs.retain(|(owner, _), _| *owner != id && !page_ids.contains(owner));
        Ok(true)
    }
}

#[async_trait]
impl PageStore for MemoryStore {
    async fn insert_page(&self, page: &Page) -> Result<(), AppError> {
        self.write()?.pages.insert(page.id, page.clone());
        Ok(())
    }

    async fn find_page(&self, id: Uuid) -> Result<Option<Page>, AppError> {
        Ok(self.read()?.pages.get(&id).cloned())
    }

    async fn pages_of_story(&self, story: Uuid) -> Result<Vec<Page>, AppError> {
        let mut out: Vec<Page> = self.read()?.pages.values().filter(|p| p.story == story).cloned().collect();
        out.sort_by_key(|p| p.position);
        Ok(out)
    }

    async fn save_page(&self, page: &Page) -> Result<bool, AppError> {
        Ok(replace(&mut self.write()?.pages, page.id, page))
    }

    async fn delete_page(&self, id: Uuid) -> Result<bool, AppError> {
        let mut c = self.write()?;
        let removed = c.pages.remove(&id).is_some();
        if removed {
            c.blobs.retain(|(owner, _), _| *owner != id);
        }
        Ok(removed)
    }
}

#[async_trait]
impl PostitStore for MemoryStore {
    async fn insert_postit(&self, postit: &Postit) -> Result<(), AppError> {
        self.write()?.postits.insert(postit.id, postit.clone());
        Ok(())
    }

    async fn find_postit(&self, id: Uuid) -> Result<Option<Postit>, AppError> {
        Ok(self.read()?.postits.get(&id).cloned())
    }

    async fn postits_for(&self, user: Uuid) -> Result<Vec<Postit>, AppError> {
        let mut out: Vec<Postit> = self
            .read()?
            .postits
            .values()
            .filter(|p| p.owner == user || p.assignee == Some(user))
            .cloned()
            .collect();
        out.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        Ok(out)
    }

    async fn save_postit(&self, postit: &Postit) -> Result<bool, AppError> {
        Ok(replace(&mut self.write()?.postits, postit.id, postit))
    }

    async fn delete_postit(&self, id: Uuid) -> Result<bool, AppError> {
        Ok(self.write()?.postits.remove(&id).is_some())
    }
}

#[async_trait]
impl BlobStore for MemoryStore {
    async fn put_blob(&self, owner: Uuid, kind: BlobKind, blob: &Blob) -> Result<(), AppError> {
        self.write()?.blobs.insert((owner, kind), blob.clone());
        Ok(())
    }

    async fn get_blob(&self, owner: Uuid, kind: BlobKind) -> Result<Option<Blob>, AppError> {
        Ok(self.read()?.blobs.get(&(owner, kind)).cloned())
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn ping(&self) -> Result<(), AppError> {
        self.read().map(|_| ())
    }
}
