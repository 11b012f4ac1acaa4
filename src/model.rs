//! Stored documents and the views returned to clients.
//!
//! Stored types carry everything the store persists. View types are what leaves
//! the logic layer: no password hashes, no blob bytes.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

#[derive(Clone, Debug, PartialEq)]
pub struct User {
    pub id: Uuid,
    pub name: String,
    pub surname: String,
    pub username: String,
    pub password_hash: String,
    pub favourites: Vec<Uuid>,
    pub collaborators: Vec<Uuid>,
    pub created_at: DateTime<Utc>,
}

#[derive(Clone, Debug, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct UserView {
    pub id: Uuid,
    pub name: String,
    pub surname: String,
    pub username: String,
    pub favourites: Vec<Uuid>,
    pub collaborators: Vec<Uuid>,
}

impl From<&User> for UserView {
    fn from(u: &User) -> Self {
        UserView {
            id: u.id,
            name: u.name.clone(),
            surname: u.surname.clone(),
            username: u.username.clone(),
            favourites: u.favourites.clone(),
            collaborators: u.collaborators.clone(),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Story {
    pub id: Uuid,
    pub title: String,
    pub author: Uuid,
    pub audience: String,
    pub init_lang: Option<String>,
    pub final_lang: Option<String>,
    pub in_process: bool,
    pub has_cover: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Clone, Debug, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct StoryView {
    pub id: Uuid,
    pub title: String,
    pub author: Uuid,
    pub audience: String,
    pub init_lang: Option<String>,
    pub final_lang: Option<String>,
    pub in_process: bool,
    pub has_cover: bool,
    pub created_at: DateTime<Utc>,
    /// Filled only when a single story is retrieved.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pages: Option<Vec<PageView>>,
}

impl From<&Story> for StoryView {
    fn from(s: &Story) -> Self {
        StoryView {
            id: s.id,
            title: s.title.clone(),
            author: s.author,
            audience: s.audience.clone(),
            init_lang: s.init_lang.clone(),
            final_lang: s.final_lang.clone(),
            in_process: s.in_process,
            has_cover: s.has_cover,
            created_at: s.created_at,
            pages: None,
        }
    }
}

/// One point of a freehand drawing on a page.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DrawVector {
    pub x: f64,
    pub y: f64,
    pub color: String,
    pub line_width: f64,
    #[serde(default)]
    pub dragging: bool,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Page {
    pub id: Uuid,
    pub story: Uuid,
    pub position: i32,
    pub text: String,
    pub vectors: Vec<DrawVector>,
    pub has_image: bool,
    pub has_audio: bool,
}

#[derive(Clone, Debug, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PageView {
    pub id: Uuid,
    pub story: Uuid,
    pub position: i32,
    pub text: String,
    pub vectors: Vec<DrawVector>,
    pub has_image: bool,
    pub has_audio: bool,
}

impl From<&Page> for PageView {
    fn from(p: &Page) -> Self {
        PageView {
            id: p.id,
            story: p.story,
            position: p.position,
            text: p.text.clone(),
            vectors: p.vectors.clone(),
            has_image: p.has_image,
            has_audio: p.has_audio,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "UPPERCASE")]
pub enum PostitStatus {
    #[default]
    Todo,
    Doing,
    Review,
    Done,
}

impl PostitStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PostitStatus::Todo => "TODO",
            PostitStatus::Doing => "DOING",
            PostitStatus::Review => "REVIEW",
            PostitStatus::Done => "DONE",
        }
    }
}

impl fmt::Display for PostitStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PostitStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "TODO" => Ok(PostitStatus::Todo),
            "DOING" => Ok(PostitStatus::Doing),
            "REVIEW" => Ok(PostitStatus::Review),
            "DONE" => Ok(PostitStatus::Done),
            other => Err(format!("unknown status '{}'", other)),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Postit {
    pub id: Uuid,
    pub text: String,
    pub status: PostitStatus,
    pub owner: Uuid,
    pub assignee: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

#[derive(Clone, Debug, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PostitView {
    pub id: Uuid,
    pub text: String,
    pub status: PostitStatus,
    pub owner: Uuid,
    pub assignee: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

impl From<&Postit> for PostitView {
    fn from(p: &Postit) -> Self {
        PostitView {
            id: p.id,
            text: p.text.clone(),
            status: p.status,
            owner: p.owner,
            assignee: p.assignee,
            created_at: p.created_at,
        }
    }
}

/// Binary attachments hang off a story (cover) or a page (picture, audio).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum BlobKind {
    Cover,
    Picture,
    Audio,
}

impl BlobKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            BlobKind::Cover => "cover",
            BlobKind::Picture => "picture",
            BlobKind::Audio => "audio",
        }
    }

    /// MIME top-level type an upload of this kind must carry.
    pub fn media_prefix(&self) -> &'static str {
        match self {
            BlobKind::Cover | BlobKind::Picture => "image/",
            BlobKind::Audio => "audio/",
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Blob {
    pub content_type: String,
    pub bytes: Vec<u8>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_parses_case_insensitively_and_serializes_uppercase() {
        assert_eq!("doing".parse::<PostitStatus>().unwrap(), PostitStatus::Doing);
        assert!("later".parse::<PostitStatus>().is_err());
        assert_eq!(serde_json::to_value(PostitStatus::Review).unwrap(), "REVIEW");
    }

    #[test]
    fn user_view_hides_password_hash() {
        let user = User {
            id: Uuid::new_v4(),
            name: "Ada".into(),
            surname: "Lovelace".into(),
            username: "ada".into(),
            password_hash: "$argon2id$secret".into(),
            favourites: vec![],
            collaborators: vec![],
            created_at: Utc::now(),
        };
        let json = serde_json::to_string(&UserView::from(&user)).unwrap();
        assert!(!json.contains("argon2"));
        assert!(json.contains("\"username\":\"ada\""));
    }
}
