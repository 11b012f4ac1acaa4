//! Postits: kanban notes owned by a user and optionally assigned to a collaborator.

use crate::error::AppError;
use crate::model::{Postit, PostitStatus, PostitView};
use crate::service::users::load_user;
use crate::service::validation::{not_blank, optional};
use crate::store::Store;
use chrono::Utc;
use uuid::Uuid;

pub struct PostitService;

impl PostitService {
    pub async fn add(store: &dyn Store, user_id: Uuid, text: &str) -> Result<Uuid, AppError> {
        not_blank("text", text)?;

        load_user(store, user_id).await?;
        let postit = Postit {
            id: Uuid::new_v4(),
            text: text.to_string(),
            status: PostitStatus::default(),
            owner: user_id,
            assignee: None,
            created_at: Utc::now(),
        };
        store.insert_postit(&postit).await?;
        tracing::info!(user = %user_id, postit = %postit.id, "postit added");
        Ok(postit.id)
    }

    /// Owned postits plus those assigned to the user.
    pub async fn list(store: &dyn Store, user_id: Uuid) -> Result<Vec<PostitView>, AppError> {
        load_user(store, user_id).await?;
        let postits = store.postits_for(user_id).await?;
        Ok(postits.iter().map(PostitView::from).collect())
    }

    /// Owner or assignee may change text and status.
    pub async fn update(
        store: &dyn Store,
        user_id: Uuid,
        postit_id: Uuid,
        text: Option<&str>,
        status: Option<&str>,
    ) -> Result<(), AppError> {
        let text = optional("text", text)?;
        let status = optional("status", status)?
            .map(|s| s.parse::<PostitStatus>())
            .transpose()
            .map_err(|_| AppError::Value("status must be one of TODO, DOING, REVIEW, DONE".into()))?;

        load_user(store, user_id).await?;
        let mut postit = load_postit(store, postit_id).await?;
        if postit.owner != user_id && postit.assignee != Some(user_id) {
            return Err(not_yours(postit_id, user_id));
        }
        if let Some(text) = text {
            postit.text = text.to_string();
        }
        if let Some(status) = status {
            postit.status = status;
        }
        save(store, &postit).await
    }

    pub async fn remove(store: &dyn Store, user_id: Uuid, postit_id: Uuid) -> Result<(), AppError> {
        let postit = load_owned(store, user_id, postit_id).await?;
        if !store.delete_postit(postit.id).await? {
            return Err(postit_not_found(postit_id));
        }
        tracing::info!(user = %user_id, postit = %postit_id, "postit removed");
        Ok(())
    }

    /// The assignee must be one of the owner's collaborators.
    pub async fn assign(store: &dyn Store, user_id: Uuid, postit_id: Uuid, assignee_id: Uuid) -> Result<(), AppError> {
        let owner = load_user(store, user_id).await?;
        let assignee = load_user(store, assignee_id).await?;
        let mut postit = load_postit(store, postit_id).await?;
        if postit.owner != owner.id {
            return Err(not_yours(postit_id, user_id));
        }
        if !owner.collaborators.contains(&assignee.id) {
            return Err(AppError::Auth(format!(
                "user {} is not a collaborator of user {}",
                assignee.id, owner.id
            )));
        }
        postit.assignee = Some(assignee.id);
        save(store, &postit).await?;
        tracing::info!(postit = %postit_id, assignee = %assignee.id, "postit assigned");
        Ok(())
    }

    pub async fn unassign(store: &dyn Store, user_id: Uuid, postit_id: Uuid) -> Result<(), AppError> {
        let mut postit = load_owned(store, user_id, postit_id).await?;
        postit.assignee = None;
        save(store, &postit).await?;
        tracing::info!(postit = %postit_id, "postit unassigned");
        Ok(())
    }
}

async fn load_postit(store: &dyn Store, postit_id: Uuid) -> Result<Postit, AppError> {
    store.find_postit(postit_id).await?.ok_or_else(|| postit_not_found(postit_id))
}

async fn load_owned(store: &dyn Store, user_id: Uuid, postit_id: Uuid) -> Result<Postit, AppError> {
    load_user(store, user_id).await?;
    let postit = load_postit(store, postit_id).await?;
    if postit.owner != user_id {
        return Err(not_yours(postit_id, user_id));
    }
    Ok(postit)
}

async fn save(store: &dyn Store, postit: &Postit) -> Result<(), AppError> {
    if !store.save_postit(postit).await? {
        return Err(postit_not_found(postit.id));
    }
    Ok(())
}

fn postit_not_found(postit_id: Uuid) -> AppError {
    AppError::NotFound(format!("postit with id {} not found", postit_id))
}

fn not_yours(postit_id: Uuid, user_id: Uuid) -> AppError {
    AppError::Auth(format!("postit {} does not belong to user {}", postit_id, user_id))
}
