//! Pages of a story: ordered CRUD plus picture and audio attachments.

use crate::error::AppError;
use crate::model::{Blob, BlobKind, DrawVector, Page, PageView, Story};
use crate::service::stories::load_owned_story;
use crate::service::validation;
use crate::store::Store;
use uuid::Uuid;

pub struct PageService;

impl PageService {
    /// Appends a page after the current last one.
    pub async fn add(store: &dyn Store, user_id: Uuid, story_id: Uuid, text: Option<&str>) -> Result<Uuid, AppError> {
        let story = load_owned_story(store, user_id, story_id).await?;
        let position = store
            .pages_of_story(story.id)
            .await?
            .last()
            .map(|p| p.position + 1)
            .unwrap_or(0);
        let page = Page {
            id: Uuid::new_v4(),
            story: story.id,
            position,
            text: text.unwrap_or_default().to_string(),
            vectors: Vec::new(),
            has_image: false,
            has_audio: false,
        };
        store.insert_page(&page).await?;
        tracing::info!(story = %story_id, page = %page.id, position, "page added");
        Ok(page.id)
    }

    pub async fn list(store: &dyn Store, user_id: Uuid, story_id: Uuid) -> Result<Vec<PageView>, AppError> {
        let story = load_owned_story(store, user_id, story_id).await?;
        let pages = store.pages_of_story(story.id).await?;
        Ok(pages.iter().map(PageView::from).collect())
    }

    pub async fn retrieve(store: &dyn Store, user_id: Uuid, story_id: Uuid, page_id: Uuid) -> Result<PageView, AppError> {
        let story = load_owned_story(store, user_id, story_id).await?;
        let page = load_page(store, &story, page_id).await?;
        Ok(PageView::from(&page))
    }

    /// `None` keeps the stored text or drawing.
    pub async fn update(
        store: &dyn Store,
        user_id: Uuid,
        story_id: Uuid,
        page_id: Uuid,
        text: Option<&str>,
        vectors: Option<Vec<DrawVector>>,
    ) -> Result<(), AppError> {
        if let Some(v) = &vectors {
            validation::vectors(v)?;
        }
        let story = load_owned_story(store, user_id, story_id).await?;
        let mut page = load_page(store, &story, page_id).await?;
        if let Some(text) = text {
            page.text = text.to_string();
        }
        if let Some(vectors) = vectors {
            page.vectors = vectors;
        }
        save(store, &page).await
    }

    pub async fn remove(store: &dyn Store, user_id: Uuid, story_id: Uuid, page_id: Uuid) -> Result<(), AppError> {
        let story = load_owned_story(store, user_id, story_id).await?;
        let page = load_page(store, &story, page_id).await?;
        if !store.delete_page(page.id).await? {
            return Err(page_not_found(page_id));
        }
        tracing::info!(story = %story_id, page = %page_id, "page removed");
        Ok(())
    }

    pub async fn save_picture(
        store: &dyn Store,
        user_id: Uuid,
        story_id: Uuid,
        page_id: Uuid,
        picture: Blob,
    ) -> Result<(), AppError> {
        save_attachment(store, user_id, story_id, page_id, BlobKind::Picture, picture).await
    }

    pub async fn retrieve_picture(store: &dyn Store, user_id: Uuid, story_id: Uuid, page_id: Uuid) -> Result<Blob, AppError> {
        retrieve_attachment(store, user_id, story_id, page_id, BlobKind::Picture).await
    }

    pub async fn save_audio(
        store: &dyn Store,
        user_id: Uuid,
        story_id: Uuid,
        page_id: Uuid,
        audio: Blob,
    ) -> Result<(), AppError> {
        save_attachment(store, user_id, story_id, page_id, BlobKind::Audio, audio).await
    }

    pub async fn retrieve_audio(store: &dyn Store, user_id: Uuid, story_id: Uuid, page_id: Uuid) -> Result<Blob, AppError> {
        retrieve_attachment(store, user_id, story_id, page_id, BlobKind::Audio).await
    }
}

async fn save_attachment(
    store: &dyn Store,
    user_id: Uuid,
    story_id: Uuid,
    page_id: Uuid,
    kind: BlobKind,
    blob: Blob,
) -> Result<(), AppError> {
    validation::upload(kind, &blob)?;

    let story = load_owned_story(store, user_id, story_id).await?;
    let mut page = load_page(store, &story, page_id).await?;
    store.put_blob(page.id, kind, &blob).await?;
    let flag = match kind {
        BlobKind::Audio => &mut page.has_audio,
        BlobKind::Picture | BlobKind::Cover => &mut page.has_image,
    };
    if !*flag {
        *flag = true;
        save(store, &page).await?;
    }
    tracing::info!(page = %page_id, kind = kind.as_str(), size = blob.bytes.len(), "page attachment saved");
    Ok(())
}

async fn retrieve_attachment(
    store: &dyn Store,
    user_id: Uuid,
    story_id: Uuid,
    page_id: Uuid,
    kind: BlobKind,
) -> Result<Blob, AppError> {
    let story = load_owned_story(store, user_id, story_id).await?;
    let page = load_page(store, &story, page_id).await?;
    store
        .get_blob(page.id, kind)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("page {} has no {}", page_id, kind.as_str())))
}

/// A page that belongs to a different story is reported as missing.
async fn load_page(store: &dyn Store, story: &Story, page_id: Uuid) -> Result<Page, AppError> {
    store
        .find_page(page_id)
        .await?
        .filter(|p| p.story == story.id)
        .ok_or_else(|| page_not_found(page_id))
}

async fn save(store: &dyn Store, page: &Page) -> Result<(), AppError> {
    if !store.save_page(page).await? {
        return Err(page_not_found(page.id));
    }
    Ok(())
}

fn page_not_found(page_id: Uuid) -> AppError {
    AppError::NotFound(format!("page with id {} not found", page_id))
}
