use rusqlite::{Connection, ErrorCode, Row};

use crate::db::{follows, likes, messages};

/// Shown when a user has no image of their own.
pub const DEFAULT_IMAGE_URL: &str = "/static/images/default-pic.png";

#[derive(Debug, thiserror::Error)]
pub enum ModelError {
    /// A uniqueness, foreign key or not-null constraint was violated.
    #[error("Integrity error: {0}")]
    Integrity(String),

    #[error("SQL error: {0}")]
    Sql(rusqlite::Error),

    #[error("Pool error: {0}")]
    Pool(#[from] r2d2::Error),

    #[error("Hash error: {0}")]
    Hash(#[from] bcrypt::BcryptError),
}

impl From<rusqlite::Error> for ModelError {
    fn from(err: rusqlite::Error) -> Self {
        match err {
            rusqlite::Error::SqliteFailure(ref e, ref msg)
                if e.code == ErrorCode::ConstraintViolation =>
            {
                ModelError::Integrity(msg.clone().unwrap_or_else(|| e.to_string()))
            }
            other => ModelError::Sql(other),
        }
    }
}

impl ModelError {
    pub fn is_integrity(&self) -> bool {
        matches!(self, ModelError::Integrity(_))
    }
}

pub type ModelResult<T> = Result<T, ModelError>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub email: String,
    /// bcrypt hash, never the plaintext
    pub password: String,
    pub image_url: Option<String>,
}

impl User {
    pub(crate) const COLUMNS: &'static str = "id, username, email, password, image_url";

    pub(crate) fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(User {
            id: row.get(0)?,
            username: row.get(1)?,
            email: row.get(2)?,
            password: row.get(3)?,
            image_url: row.get(4)?,
        })
    }

    pub fn image(&self) -> &str {
        self.image_url
            .as_deref()
            .filter(|url| !url.is_empty())
            .unwrap_or(DEFAULT_IMAGE_URL)
    }

    /// Messages authored by this user, newest first.
    pub fn messages(&self, conn: &Connection) -> ModelResult<Vec<Message>> {
        messages::by_user(conn, self.id)
    }

    /// Users this user follows.
    pub fn following(&self, conn: &Connection) -> ModelResult<Vec<User>> {
        follows::following(conn, self.id)
    }

    /// Users following this user.
    pub fn followers(&self, conn: &Connection) -> ModelResult<Vec<User>> {
        follows::followers(conn, self.id)
    }

    /// Messages this user liked.
    pub fn likes(&self, conn: &Connection) -> ModelResult<Vec<Message>> {
        likes::liked_messages(conn, self.id)
    }

    pub fn is_following(&self, conn: &Connection, other: &User) -> ModelResult<bool> {
        follows::is_following(conn, self.id, other.id)
    }

    pub fn is_followed_by(&self, conn: &Connection, other: &User) -> ModelResult<bool> {
        follows::is_following(conn, other.id, self.id)
    }
}

/// A user that has not been inserted yet. Built by `auth::service::signup`
/// or directly when the password is already hashed.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub id: Option<i64>,
    pub username: String,
    pub email: String,
    pub password: String,
    pub image_url: Option<String>,
}

impl NewUser {
    pub fn new(username: &str, email: &str, password_hash: &str) -> Self {
        Self {
            id: None,
            username: username.to_string(),
            email: email.to_string(),
            password: password_hash.to_string(),
            image_url: None,
        }
    }

    pub fn with_id(mut self, id: i64) -> Self {
        self.id = Some(id);
        self
    }

    pub fn with_image_url(mut self, image_url: Option<String>) -> Self {
        self.image_url = image_url.filter(|url| !url.trim().is_empty());
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub id: i64,
    pub text: String,
    /// SQLite `datetime('now')` format, UTC
    pub timestamp: String,
    pub user_id: i64,
}

impl Message {
    pub(crate) const COLUMNS: &'static str = "id, text, timestamp, user_id";

    pub(crate) fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Message {
            id: row.get(0)?,
            text: row.get(1)?,
            timestamp: row.get(2)?,
            user_id: row.get(3)?,
        })
    }
}

#[derive(Debug, Clone)]
pub struct NewMessage {
    pub text: String,
    pub user_id: i64,
}

impl NewMessage {
    pub fn new(text: &str, user_id: i64) -> Self {
        Self {
            text: text.to_string(),
            user_id,
        }
    }
}

/// A message joined with its author, as shown in timelines and lists.
#[derive(Debug, Clone)]
pub struct MessageWithAuthor {
    pub message: Message,
    pub username: String,
    pub image_url: Option<String>,
}

impl MessageWithAuthor {
    pub(crate) fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(MessageWithAuthor {
            message: Message::from_row(row)?,
            username: row.get(4)?,
            image_url: row.get(5)?,
        })
    }
}
