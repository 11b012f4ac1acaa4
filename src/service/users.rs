//! Users: registration, login, profile, favourites and collaborators.

use crate::auth::{hash_password, verify_password};
use crate::error::AppError;
use crate::model::{StoryView, User, UserView};
use crate::service::validation::{not_blank, optional};
use crate::store::Store;
use chrono::Utc;
use uuid::Uuid;

/// Profile changes. `None` keeps the stored value; `password` is the current one.
#[derive(Debug, Default)]
pub struct UserChanges<'a> {
    pub name: Option<&'a str>,
    pub surname: Option<&'a str>,
    pub username: Option<&'a str>,
    pub new_password: Option<&'a str>,
    pub password: &'a str,
}

pub struct UserService;

impl UserService {
    pub async fn register(
        store: &dyn Store,
        name: &str,
        surname: &str,
        username: &str,
        password: &str,
    ) -> Result<Uuid, AppError> {
        not_blank("name", name)?;
        not_blank("surname", surname)?;
        not_blank("username", username)?;
        not_blank("password", password)?;

        if store.find_user_by_username(username).await?.is_some() {
            return Err(AppError::AlreadyExists(format!(
                "user with username \"{}\" already exists",
                username
            )));
        }
        let user = User {
            id: Uuid::new_v4(),
            name: name.to_string(),
            surname: surname.to_string(),
            username: username.to_string(),
            password_hash: hash_password(password)?,
            favourites: Vec::new(),
            collaborators: Vec::new(),
            created_at: Utc::now(),
        };
        store.insert_user(&user).await?;
        tracing::info!(user = %user.id, username = %user.username, "user registered");
        Ok(user.id)
    }

    pub async fn authenticate(store: &dyn Store, username: &str, password: &str) -> Result<Uuid, AppError> {
        not_blank("username", username)?;
        not_blank("password", password)?;

        let user = store.find_user_by_username(username).await?;
        match user {
            Some(u) if verify_password(password, &u.password_hash)? => {
                tracing::info!(user = %u.id, "user authenticated");
                Ok(u.id)
            }
            _ => {
                tracing::warn!(username = %username, "authentication failed");
                Err(AppError::Auth("wrong credentials".into()))
            }
        }
    }

    pub async fn retrieve(store: &dyn Store, user_id: Uuid) -> Result<UserView, AppError> {
        let user = load_user(store, user_id).await?;
        Ok(UserView::from(&user))
    }

    pub async fn update(store: &dyn Store, user_id: Uuid, changes: UserChanges<'_>) -> Result<(), AppError> {
        let name = optional("name", changes.name)?;
        let surname = optional("surname", changes.surname)?;
        let username = optional("username", changes.username)?;
        let new_password = optional("new password", changes.new_password)?;
        not_blank("password", changes.password)?;

        let mut user = load_user(store, user_id).await?;
        if !verify_password(changes.password, &user.password_hash)? {
            tracing::warn!(user = %user_id, "profile update with wrong password");
            return Err(AppError::Auth("wrong credentials".into()));
        }
        if let Some(username) = username {
            if username != user.username {
                if store.find_user_by_username(username).await?.is_some() {
                    return Err(AppError::AlreadyExists(format!(
                        "user with username \"{}\" already exists",
                        username
                    )));
                }
                user.username = username.to_string();
            }
        }
        if let Some(name) = name {
            user.name = name.to_string();
        }
        if let Some(surname) = surname {
            user.surname = surname.to_string();
        }
        if let Some(new_password) = new_password {
            user.password_hash = hash_password(new_password)?;
        }
        if !store.save_user(&user).await? {
            return Err(not_found(user_id));
        }
        tracing::info!(user = %user_id, "user updated");
        Ok(())
    }

    /// Only finished stories, or the user's own, can be favourited.
    pub async fn add_favourite(store: &dyn Store, user_id: Uuid, story_id: Uuid) -> Result<(), AppError> {
        let mut user = load_user(store, user_id).await?;
        let story = store
            .find_story(story_id)
            .await?
            .filter(|s| !s.in_process || s.author == user_id)
            .ok_or_else(|| AppError::NotFound(format!("story with id {} not found", story_id)))?;
        if user.favourites.contains(&story.id) {
            return Err(AppError::AlreadyExists(format!("story {} is already a favourite", story_id)));
        }
        user.favourites.push(story.id);
        store.save_user(&user).await?;
        Ok(())
    }

    pub async fn remove_favourite(store: &dyn Store, user_id: Uuid, story_id: Uuid) -> Result<(), AppError> {
        let mut user = load_user(store, user_id).await?;
        let before = user.favourites.len();
        user.favourites.retain(|id| *id != story_id);
        if user.favourites.len() == before {
            return Err(AppError::NotFound(format!("story {} is not a favourite", story_id)));
        }
        store.save_user(&user).await?;
        Ok(())
    }

    /// Favourites whose story has since been deleted are skipped.
    pub async fn list_favourites(store: &dyn Store, user_id: Uuid) -> Result<Vec<StoryView>, AppError> {
        let user = load_user(store, user_id).await?;
        let stories = store.find_stories(&user.favourites).await?;
        Ok(stories.iter().map(StoryView::from).collect())
    }

    pub async fn add_collaborator(store: &dyn Store, user_id: Uuid, username: &str) -> Result<(), AppError> {
        not_blank("username", username)?;

        let mut user = load_user(store, user_id).await?;
        let collaborator = store
            .find_user_by_username(username)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("user with username \"{}\" not found", username)))?;
        if collaborator.id == user.id {
            return Err(AppError::AlreadyExists("a user is always their own collaborator".into()));
        }
        if user.collaborators.contains(&collaborator.id) {
            return Err(AppError::AlreadyExists(format!(
                "\"{}\" is already a collaborator",
                username
            )));
        }
        user.collaborators.push(collaborator.id);
        store.save_user(&user).await?;
        Ok(())
    }

    pub async fn list_collaborators(store: &dyn Store, user_id: Uuid) -> Result<Vec<UserView>, AppError> {
        let user = load_user(store, user_id).await?;
        let users = store.find_users(&user.collaborators).await?;
        Ok(users.iter().map(UserView::from).collect())
    }
}

pub(crate) async fn load_user(store: &dyn Store, user_id: Uuid) -> Result<User, AppError> {
    store.find_user(user_id).await?.ok_or_else(|| not_found(user_id))
}

fn not_found(user_id: Uuid) -> AppError {
    AppError::NotFound(format!("user with id {} not found", user_id))
}
