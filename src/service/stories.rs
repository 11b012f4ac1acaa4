//! Stories: author-scoped CRUD, publishing state, search and cover image.

use crate::error::AppError;
use crate::model::{Blob, BlobKind, PageView, Story, StoryView};
use crate::service::users::load_user;
use crate::service::validation::{self, not_blank, optional};
use crate::store::Store;
use chrono::Utc;
use uuid::Uuid;

#[derive(Debug)]
pub struct NewStory<'a> {
    pub title: &'a str,
    pub audience: &'a str,
    pub init_lang: Option<&'a str>,
    pub final_lang: Option<&'a str>,
}

/// `None` keeps the stored value.
#[derive(Debug, Default)]
pub struct StoryChanges<'a> {
    pub title: Option<&'a str>,
    pub audience: Option<&'a str>,
    pub init_lang: Option<&'a str>,
    pub final_lang: Option<&'a str>,
}

pub struct StoryService;

impl StoryService {
    pub async fn add(store: &dyn Store, user_id: Uuid, new: NewStory<'_>) -> Result<Uuid, AppError> {
        not_blank("title", new.title)?;
        not_blank("audience", new.audience)?;
        let init_lang = optional("initLang", new.init_lang)?;
        let final_lang = optional("finalLang", new.final_lang)?;

        load_user(store, user_id).await?;
        let story = Story {
            id: Uuid::new_v4(),
            title: new.title.to_string(),
            author: user_id,
            audience: new.audience.to_string(),
            init_lang: init_lang.map(str::to_string),
            final_lang: final_lang.map(str::to_string),
            in_process: true,
            has_cover: false,
            created_at: Utc::now(),
        };
        store.insert_story(&story).await?;
        tracing::info!(user = %user_id, story = %story.id, "story created");
        Ok(story.id)
    }

    pub async fn list(store: &dyn Store, user_id: Uuid) -> Result<Vec<StoryView>, AppError> {
        load_user(store, user_id).await?;
        let stories = store.stories_by_author(user_id).await?;
        Ok(stories.iter().map(StoryView::from).collect())
    }

    /// The story with its pages in order.
    pub async fn retrieve(store: &dyn Store, user_id: Uuid, story_id: Uuid) -> Result<StoryView, AppError> {
        let story = load_owned_story(store, user_id, story_id).await?;
        let pages = store.pages_of_story(story.id).await?;
        let mut view = StoryView::from(&story);
        view.pages = Some(pages.iter().map(PageView::from).collect());
        Ok(view)
    }

    pub async fn update(
        store: &dyn Store,
        user_id: Uuid,
        story_id: Uuid,
        changes: StoryChanges<'_>,
    ) -> Result<(), AppError> {
        let title = optional("title", changes.title)?;
        let audience = optional("audience", changes.audience)?;
        let init_lang = optional("initLang", changes.init_lang)?;
        let final_lang = optional("finalLang", changes.final_lang)?;

        let mut story = load_owned_story(store, user_id, story_id).await?;
        if let Some(title) = title {
            story.title = title.to_string();
        }
        if let Some(audience) = audience {
            story.audience = audience.to_string();
        }
        if let Some(lang) = init_lang {
            story.init_lang = Some(lang.to_string());
        }
        if let Some(lang) = final_lang {
            story.final_lang = Some(lang.to_string());
        }
        save(store, &story).await
    }

    pub async fn remove(store: &dyn Store, user_id: Uuid, story_id: Uuid) -> Result<(), AppError> {
        let story = load_owned_story(store, user_id, story_id).await?;
        if !store.delete_story(story.id).await? {
            return Err(story_not_found(story_id));
        }
        tracing::info!(user = %user_id, story = %story_id, "story removed");
        Ok(())
    }

    /// Mark the story finished; finished stories show up in search.
    pub async fn finish(store: &dyn Store, user_id: Uuid, story_id: Uuid) -> Result<(), AppError> {
        Self::set_in_process(store, user_id, story_id, false).await
    }

    /// Take the story back into work; it disappears from search.
    pub async fn work_in(store: &dyn Store, user_id: Uuid, story_id: Uuid) -> Result<(), AppError> {
        Self::set_in_process(store, user_id, story_id, true).await
    }

    async fn set_in_process(store: &dyn Store, user_id: Uuid, story_id: Uuid, in_process: bool) -> Result<(), AppError> {
        let mut story = load_owned_story(store, user_id, story_id).await?;
        story.in_process = in_process;
        save(store, &story).await
    }

    pub async fn search(store: &dyn Store, query: &str) -> Result<Vec<StoryView>, AppError> {
        not_blank("query", query)?;
        let stories = store.search_stories(query.trim()).await?;
        Ok(stories.iter().map(StoryView::from).collect())
    }

    pub async fn save_cover(store: &dyn Store, user_id: Uuid, story_id: Uuid, cover: Blob) -> Result<(), AppError> {
        validation::upload(BlobKind::Cover, &cover)?;

        let mut story = load_owned_story(store, user_id, story_id).await?;
        store.put_blob(story.id, BlobKind::Cover, &cover).await?;
        if !story.has_cover {
            story.has_cover = true;
            save(store, &story).await?;
        }
        tracing::info!(story = %story_id, size = cover.bytes.len(), "cover saved");
        Ok(())
    }

    /// Covers are readable by anyone once the path's user authored the story.
    pub async fn retrieve_cover(store: &dyn Store, user_id: Uuid, story_id: Uuid) -> Result<Blob, AppError> {
        let story = load_owned_story(store, user_id, story_id).await?;
        store
            .get_blob(story.id, BlobKind::Cover)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("story {} has no cover", story_id)))
    }
}

/// The story, if it exists and `user_id` (who must exist) is its author.
pub(crate) async fn load_owned_story(store: &dyn Store, user_id: Uuid, story_id: Uuid) -> Result<Story, AppError> {
    load_user(store, user_id).await?;
    let story = store.find_story(story_id).await?.ok_or_else(|| story_not_found(story_id))?;
    if story.author != user_id {
        return Err(AppError::Auth(format!(
            "story {} does not belong to user {}",
            story_id, user_id
        )));
    }
    Ok(story)
}

async fn save(store: &dyn Store, story: &Story) -> Result<(), AppError> {
    if !store.save_story(story).await? {
        return Err(story_not_found(story.id));
    }
    Ok(())
}

fn story_not_found(story_id: Uuid) -> AppError {
    AppError::NotFound(format!("story with id {} not found", story_id))
}
