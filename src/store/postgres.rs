//! PostgreSQL store. Tables are created idempotently by [`PgStore::ensure_schema`].

use super::{BlobStore, PageStore, PostitStore, Store, StoryStore, UserStore};
use crate::error::AppError;
use crate::model::{Blob, BlobKind, DrawVector, Page, Postit, PostitStatus, Story, User};
use async_trait::async_trait;
use sqlx::postgres::PgRow;
use sqlx::types::Json;
use sqlx::{ConnectOptions, PgPool, Row};
use std::str::FromStr;
use uuid::Uuid;

const SCHEMA_DDL: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS users (
        id UUID PRIMARY KEY,
        name TEXT NOT NULL,
        surname TEXT NOT NULL,
        username TEXT NOT NULL UNIQUE,
        password_hash TEXT NOT NULL,
        favourites UUID[] NOT NULL DEFAULT '{}',
        collaborators UUID[] NOT NULL DEFAULT '{}',
        created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS stories (
        id UUID PRIMARY KEY,
        title TEXT NOT NULL,
        author UUID NOT NULL REFERENCES users(id) ON DELETE CASCADE,
        audience TEXT NOT NULL,
        init_lang TEXT,
        final_lang TEXT,
        in_process BOOLEAN NOT NULL DEFAULT TRUE,
        has_cover BOOLEAN NOT NULL DEFAULT FALSE,
        created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
    )
    "#,
    "CREATE INDEX IF NOT EXISTS stories_author_idx ON stories (author)",
    r#"
    CREATE TABLE IF NOT EXISTS pages (
        id UUID PRIMARY KEY,
        story UUID NOT NULL REFERENCES stories(id) ON DELETE CASCADE,
        position INTEGER NOT NULL,
        text TEXT NOT NULL DEFAULT '',
        vectors JSONB NOT NULL DEFAULT '[]',
        has_image BOOLEAN NOT NULL DEFAULT FALSE,
        has_audio BOOLEAN NOT NULL DEFAULT FALSE
    )
    "#,
    "CREATE INDEX IF NOT EXISTS pages_story_idx ON pages (story, position)",
    r#"
    CREATE TABLE IF NOT EXISTS postits (
        id UUID PRIMARY KEY,
        text TEXT NOT NULL,
        status TEXT NOT NULL,
        owner UUID NOT NULL REFERENCES users(id) ON DELETE CASCADE,
        assignee UUID REFERENCES users(id) ON DELETE SET NULL,
        created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS blobs (
        owner UUID NOT NULL,
        kind TEXT NOT NULL,
        content_type TEXT NOT NULL,
        bytes BYTEA NOT NULL,
        PRIMARY KEY (owner, kind)
    )
    "#,
];

#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        PgStore { pool }
    }

    /// Create tables and indexes if they do not exist.
    pub async fn ensure_schema(&self) -> Result<(), AppError> {
        for ddl in SCHEMA_DDL {
            sqlx::query(ddl).execute(&self.pool).await?;
        }
        tracing::info!("storage schema ready");
        Ok(())
    }
}

/// Connect to the `postgres` maintenance database and create the target database if missing.
pub async fn ensure_database_exists(database_url: &str) -> Result<(), AppError> {
    let (admin_url, db_name) = parse_db_name_from_url(database_url)?;
    if db_name.is_empty() || db_name == "postgres" {
        return Ok(());
    }
    let opts = sqlx::postgres::PgConnectOptions::from_str(&admin_url)
        .map_err(|e| AppError::BadRequest(format!("invalid DATABASE_URL: {}", e)))?;
    let mut conn: sqlx::PgConnection = opts.connect().await?;
    let exists: (bool,) = sqlx::query_as("SELECT EXISTS(SELECT 1 FROM pg_database WHERE datname = $1)")
        .bind(&db_name)
        .fetch_one(&mut conn)
        .await?;
    if !exists.0 {
        tracing::info!(database = %db_name, "creating database");
        sqlx::query(&format!("CREATE DATABASE {}", quote_ident(&db_name)))
            .execute(&mut conn)
            .await?;
    }
    Ok(())
}

fn parse_db_name_from_url(url: &str) -> Result<(String, String), AppError> {
    let path_start = url
        .rfind('/')
        .ok_or_else(|| AppError::BadRequest("DATABASE_URL: no path".into()))?
        + 1;
    let path_and_query = url.get(path_start..).unwrap_or("");
    let db_name = path_and_query.split('?').next().unwrap_or("").trim();
    let base = url.get(..path_start).unwrap_or(url);
    Ok((format!("{}postgres", base), db_name.to_string()))
}

fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

fn map_unique(e: sqlx::Error, username: &str) -> AppError {
    match &e {
        sqlx::Error::Database(db) if db.is_unique_violation() => {
            AppError::AlreadyExists(format!("user with username \"{}\" already exists", username))
        }
        _ => AppError::Db(e),
    }
}

fn user_from_row(row: &PgRow) -> Result<User, AppError> {
    Ok(User {
        id: row.try_get("id")?,
        name: row.try_get("name")?,
        surname: row.try_get("surname")?,
        username: row.try_get("username")?,
        password_hash: row.try_get("password_hash")?,
        favourites: row.try_get("favourites")?,
        collaborators: row.try_get("collaborators")?,
        created_at: row.try_get("created_at")?,
    })
}

fn story_from_row(row: &PgRow) -> Result<Story, AppError> {
    Ok(Story {
        id: row.try_get("id")?,
        title: row.try_get("title")?,
        author: row.try_get("author")?,
        audience: row.try_get("audience")?,
        init_lang: row.try_get("init_lang")?,
        final_lang: row.try_get("final_lang")?,
        in_process: row.try_get("in_process")?,
        has_cover: row.try_get("has_cover")?,
        created_at: row.try_get("created_at")?,
    })
}

fn page_from_row(row: &PgRow) -> Result<Page, AppError> {
    let Json(vectors): Json<Vec<DrawVector>> = row.try_get("vectors")?;
    Ok(Page {
        id: row.try_get("id")?,
        story: row.try_get("story")?,
        position: row.try_get("position")?,
        text: row.try_get("text")?,
        vectors,
        has_image: row.try_get("has_image")?,
        has_audio: row.try_get("has_audio")?,
    })
}

fn postit_from_row(row: &PgRow) -> Result<Postit, AppError> {
    let status: String = row.try_get("status")?;
    Ok(Postit {
        id: row.try_get("id")?,
        text: row.try_get("text")?,
        status: PostitStatus::from_str(&status).map_err(AppError::Internal)?,
        owner: row.try_get("owner")?,
        assignee: row.try_get("assignee")?,
        created_at: row.try_get("created_at")?,
    })
}

fn collect<T>(rows: &[PgRow], f: fn(&PgRow) -> Result<T, AppError>) -> Result<Vec<T>, AppError> {
    rows.iter().map(f).collect()
}

const USER_COLUMNS: &str = "id, name, surname, username, password_hash, favourites, collaborators, created_at";
const STORY_COLUMNS: &str = "id, title, author, audience, init_lang, final_lang, in_process, has_cover, created_at";
const PAGE_COLUMNS: &str = "id, story, position, text, vectors, has_image, has_audio";
const POSTIT_COLUMNS: &str = "id, text, status, owner, assignee, created_at";

#[async_trait]
impl UserStore for PgStore {
    async fn insert_user(&self, user: &User) -> Result<(), AppError> {
        tracing::debug!(user = %user.id, "insert user");
        sqlx::query(
            "INSERT INTO users (id, name, surname, username, password_hash, favourites, collaborators, created_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8)",
        )
        .bind(user.id)
        .bind(&user.name)
        .bind(&user.surname)
        .bind(&user.username)
        .bind(&user.password_hash)
        .bind(&user.favourites)
        .bind(&user.collaborators)
        .bind(user.created_at)
        .execute(&self.pool)
        .await
        .map_err(|e| map_unique(e, &user.username))?;
        Ok(())
    }

    async fn find_user(&self, id: Uuid) -> Result<Option<User>, AppError> {
        let sql = format!("SELECT {} FROM users WHERE id = $1", USER_COLUMNS);
        let row = sqlx::query(&sql).bind(id).fetch_optional(&self.pool).await?;
        row.as_ref().map(user_from_row).transpose()
    }

    async fn find_user_by_username(&self, username: &str) -> Result<Option<User>, AppError> {
        let sql = format!("SELECT {} FROM users WHERE username = $1", USER_COLUMNS);
        let row = sqlx::query(&sql).bind(username).fetch_optional(&self.pool).await?;
        row.as_ref().map(user_from_row).transpose()
    }

    async fn find_users(&self, ids: &[Uuid]) -> Result<Vec<User>, AppError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let sql = format!("SELECT {} FROM users WHERE id = ANY($1) ORDER BY username", USER_COLUMNS);
        let rows = sqlx::query(&sql).bind(ids).fetch_all(&self.pool).await?;
        collect(&rows, user_from_row)
    }

    async fn save_user(&self, user: &User) -> Result<bool, AppError> {
        tracing::debug!(user = %user.id, "save user");
        let res = sqlx::query(
            "UPDATE users SET name = $2, surname = $3, username = $4, password_hash = $5, \
             favourites = $6, collaborators = $7 WHERE id = $1",
        )
        .bind(user.id)
        .bind(&user.name)
        .bind(&user.surname)
        .bind(&user.username)
        .bind(&user.password_hash)
        .bind(&user.favourites)
        .bind(&user.collaborators)
        .execute(&self.pool)
        .await
        .map_err(|e| map_unique(e, &user.username))?;
        Ok(res.rows_affected() > 0)
    }
}

#[async_trait]
impl StoryStore for PgStore {
    async fn insert_story(&self, story: &Story) -> Result<(), AppError> {
        tracing::debug!(story = %story.id, "insert story");
        sqlx::query(
            "INSERT INTO stories (id, title, author, audience, init_lang, final_lang, in_process, has_cover, created_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)",
        )
        .bind(story.id)
        .bind(&story.title)
        .bind(story.author)
        .bind(&story.audience)
        .bind(&story.init_lang)
        .bind(&story.final_lang)
        .bind(story.in_process)
        .bind(story.has_cover)
        .bind(story.created_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn find_story(&self, id: Uuid) -> Result<Option<Story>, AppError> {
        let sql = format!("SELECT {} FROM stories WHERE id = $1", STORY_COLUMNS);
        let row = sqlx::query(&sql).bind(id).fetch_optional(&self.pool).await?;
        row.as_ref().map(story_from_row).transpose()
    }

    async fn find_stories(&self, ids: &[Uuid]) -> Result<Vec<Story>, AppError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let sql = format!("SELECT {} FROM stories WHERE id = ANY($1)", STORY_COLUMNS);
        let rows = sqlx::query(&sql).bind(ids).fetch_all(&self.pool).await?;
        let mut stories = collect(&rows, story_from_row)?;
        // keep the caller's order (favourites are listed in the order they were added)
        stories.sort_by_key(|s| ids.iter().position(|id| *id == s.id));
        Ok(stories)
    }

    async fn stories_by_author(&self, author: Uuid) -> Result<Vec<Story>, AppError> {
        let sql = format!(
            "SELECT {} FROM stories WHERE author = $1 ORDER BY created_at DESC",
            STORY_COLUMNS
        );
        let rows = sqlx::query(&sql).bind(author).fetch_all(&self.pool).await?;
        collect(&rows, story_from_row)
    }

    async fn search_stories(&self, query: &str) -> Result<Vec<Story>, AppError> {
        let pattern = format!(
            "%{}%",
            query.replace('\\', "\\\\").replace('%', "\\%").replace('_', "\\_")
        );
        let sql = format!(
            "SELECT {} FROM stories WHERE NOT in_process AND title ILIKE $1 ORDER BY lower(title), title",
            STORY_COLUMNS
        );
        tracing::debug!(pattern = %pattern, "search stories");
        let rows = sqlx::query(&sql).bind(pattern).fetch_all(&self.pool).await?;
        collect(&rows, story_from_row)
    }

    async fn save_story(&self, story: &Story) -> Result<bool, AppError> {
        tracing::debug!(story = %story.id, "save story");
        let res = sqlx::query(
            "UPDATE stories SET title = $2, audience = $3, init_lang = $4, final_lang = $5, \
             in_process = $6, has_cover = $7 WHERE id = $1",
        )
        .bind(story.id)
        .bind(&story.title)
        .bind(&story.audience)
        .bind(&story.init_lang)
        .bind(&story.final_lang)
        .bind(story.in_process)
        .bind(story.has_cover)
        .execute(&self.pool)
        .await?;
        Ok(res.rows_affected() > 0)
    }

    async fn delete_story(&self, id: Uuid) -> Result<bool, AppError> {
        tracing::debug!(story = %id, "delete story");
        let mut tx = self.pool.begin().await?;
        sqlx::query("DELETE FROM blobs WHERE owner = $1 OR owner IN (SELECT id FROM pages WHERE story = $1)")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        let res = sqlx::query("DELETE FROM stories WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;
        Ok(res.rows_affected() > 0)
    }
}

#[async_trait]
impl PageStore for PgStore {
    async fn insert_page(&self, page: &Page) -> Result<(), AppError> {
        tracing::debug!(page = %page.id, story = %page.story, "insert page");
        sqlx::query(
            "INSERT INTO pages (id, story, position, text, vectors, has_image, has_audio) \
             VALUES ($1, $2, $3, $4, $5, $6, $7)",
        )
        .bind(page.id)
        .bind(page.story)
        .bind(page.position)
        .bind(&page.text)
        .bind(Json(&page.vectors))
        .bind(page.has_image)
        .bind(page.has_audio)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn find_page(&self, id: Uuid) -> Result<Option<Page>, AppError> {
        let sql = format!("SELECT {} FROM pages WHERE id = $1", PAGE_COLUMNS);
        let row = sqlx::query(&sql).bind(id).fetch_optional(&self.pool).await?;
        row.as_ref().map(page_from_row).transpose()
    }

    async fn pages_of_story(&self, story: Uuid) -> Result<Vec<Page>, AppError> {
        let sql = format!("SELECT {} FROM pages WHERE story = $1 ORDER BY position", PAGE_COLUMNS);
        let rows = sqlx::query(&sql).bind(story).fetch_all(&self.pool).await?;
        collect(&rows, page_from_row)
    }

    async fn save_page(&self, page: &Page) -> Result<bool, AppError> {
        tracing::debug!(page = %page.id, "save page");
        let res = sqlx::query(
            "UPDATE pages SET position = $2, text = $3, vectors = $4, has_image = $5, has_audio = $6 WHERE id = $1",
        )
        .bind(page.id)
        .bind(page.position)
        .bind(&page.text)
        .bind(Json(&page.vectors))
        .bind(page.has_image)
        .bind(page.has_audio)
        .execute(&self.pool)
        .await?;
        Ok(res.rows_affected() > 0)
    }

    async fn delete_page(&self, id: Uuid) -> Result<bool, AppError> {
        tracing::debug!(page = %id, "delete page");
        let mut tx = self.pool.begin().await?;
        sqlx::query("DELETE FROM blobs WHERE owner = $1").bind(id).execute(&mut *tx).await?;
        let res = sqlx::query("DELETE FROM pages WHERE id = $1").bind(id).execute(&mut *tx).await?;
        tx.commit().await?;
        Ok(res.rows_affected() > 0)
    }
}

#[async_trait]
impl PostitStore for PgStore {
    async fn insert_postit(&self, postit: &Postit) -> Result<(), AppError> {
        tracing::debug!(postit = %postit.id, "insert postit");
        sqlx::query(
            "INSERT INTO postits (id, text, status, owner, assignee, created_at) VALUES ($1, $2, $3, $4, $5, $6)",
        )
        .bind(postit.id)
        .bind(&postit.text)
        .bind(postit.status.as_str())
        .bind(postit.owner)
        .bind(postit.assignee)
        .bind(postit.created_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn find_postit(&self, id: Uuid) -> Result<Option<Postit>, AppError> {
        let sql = format!("SELECT {} FROM postits WHERE id = $1", POSTIT_COLUMNS);
        let row = sqlx::query(&sql).bind(id).fetch_optional(&self.pool).await?;
        row.as_ref().map(postit_from_row).transpose()
    }

    async fn postits_for(&self, user: Uuid) -> Result<Vec<Postit>, AppError> {
        let sql = format!(
            "SELECT {} FROM postits WHERE owner = $1 OR assignee = $1 ORDER BY created_at",
            POSTIT_COLUMNS
        );
        let rows = sqlx::query(&sql).bind(user).fetch_all(&self.pool).await?;
        collect(&rows, postit_from_row)
    }

    async fn save_postit(&self, postit: &Postit) -> Result<bool, AppError> {
        tracing::debug!(postit = %postit.id, "save postit");
        let res = sqlx::query("UPDATE postits SET text = $2, status = $3, assignee = $4 WHERE id = $1")
            .bind(postit.id)
            .bind(&postit.text)
            .bind(postit.status.as_str())
            .bind(postit.assignee)
            .execute(&self.pool)
            .await?;
        Ok(res.rows_affected() > 0)
    }

    async fn delete_postit(&self, id: Uuid) -> Result<bool, AppError> {
        tracing::debug!(postit = %id, "delete postit");
        let res = sqlx::query("DELETE FROM postits WHERE id = $1").bind(id).execute(&self.pool).await?;
        Ok(res.rows_affected() > 0)
    }
}

#[async_trait]
impl BlobStore for PgStore {
    async fn put_blob(&self, owner: Uuid, kind: BlobKind, blob: &Blob) -> Result<(), AppError> {
        tracing::debug!(owner = %owner, kind = kind.as_str(), size = blob.bytes.len(), "put blob");
        sqlx::query(
            "INSERT INTO blobs (owner, kind, content_type, bytes) VALUES ($1, $2, $3, $4) \
             ON CONFLICT (owner, kind) DO UPDATE SET content_type = EXCLUDED.content_type, bytes = EXCLUDED.bytes",
        )
        .bind(owner)
        .bind(kind.as_str())
        .bind(&blob.content_type)
        .bind(&blob.bytes)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn get_blob(&self, owner: Uuid, kind: BlobKind) -> Result<Option<Blob>, AppError> {
        let row = sqlx::query("SELECT content_type, bytes FROM blobs WHERE owner = $1 AND kind = $2")
            .bind(owner)
            .bind(kind.as_str())
            .fetch_optional(&self.pool)
            .await?;
        row.map(|r| {
            Ok::<_, AppError>(Blob {
                content_type: r.try_get("content_type")?,
                bytes: r.try_get("bytes")?,
            })
        })
        .transpose()
    }
}

#[async_trait]
impl Store for PgStore {
    async fn ping(&self) -> Result<(), AppError> {
        sqlx::query("SELECT 1").fetch_optional(&self.pool).await?;
        Ok(())
    }
}
