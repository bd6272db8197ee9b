//! Display structs shared by the page templates.

use chrono::NaiveDateTime;
use rusqlite::Connection;

use crate::db::models::{Message, MessageWithAuthor, ModelResult, User, DEFAULT_IMAGE_URL};
use crate::db::{follows, likes, messages};
use crate::extractors::CurrentUser;

pub struct UserCard {
    pub id: i64,
    pub username: String,
    pub image_url: String,
    pub is_self: bool,
    pub followed_by_me: bool,
}

impl UserCard {
    pub fn list(conn: &Connection, users: Vec<User>, me: Option<&CurrentUser>) -> ModelResult<Vec<Self>> {
        let following: Vec<i64> = match me {
            Some(me) => follows::following(conn, me.id)?.into_iter().map(|u| u.id).collect(),
            None => Vec::new(),
        };

        Ok(users
            .into_iter()
            .map(|user| UserCard {
                is_self: me.is_some_and(|me| me.id == user.id),
                followed_by_me: following.contains(&user.id),
                image_url: user.image().to_string(),
                id: user.id,
                username: user.username,
            })
            .collect())
    }
}

/// Header shown above a user's profile, following, followers and likes pages.
pub struct ProfileView {
    pub id: i64,
    pub username: String,
    pub image_url: String,
    pub message_count: i64,
    pub following_count: usize,
    pub followers_count: usize,
    pub likes_count: usize,
    pub is_self: bool,
    pub followed_by_me: bool,
}

impl ProfileView {
    pub fn load(conn: &Connection, user: &User, me: &CurrentUser) -> ModelResult<Self> {
        Ok(ProfileView {
            id: user.id,
            username: user.username.clone(),
            image_url: user.image().to_string(),
            message_count: messages::count_by_user(conn, user.id)?,
            following_count: user.following(conn)?.len(),
            followers_count: user.followers(conn)?.len(),
            likes_count: user.likes(conn)?.len(),
            is_self: user.id == me.id,
            followed_by_me: follows::is_following(conn, me.id, user.id)?,
        })
    }
}

pub struct MessageView {
    pub id: i64,
    pub text: String,
    pub timestamp: String,
    pub user_id: i64,
    pub username: String,
    pub image_url: String,
    pub liked: bool,
    pub own: bool,
}

impl MessageView {
    pub fn from_joined(msg: MessageWithAuthor, me: &CurrentUser, liked: &[i64]) -> Self {
        let MessageWithAuthor {
            message,
            username,
            image_url,
        } = msg;
        MessageView {
            liked: liked.contains(&message.id),
            own: message.user_id == me.id,
            timestamp: format_timestamp(&message.timestamp),
            image_url: image_url
                .filter(|url| !url.is_empty())
                .unwrap_or_else(|| DEFAULT_IMAGE_URL.to_string()),
            id: message.id,
            text: message.text,
            user_id: message.user_id,
            username,
        }
    }

    /// Messages whose author is already known, e.g. on that author's profile.
    pub fn by_author(messages: Vec<Message>, author: &User, me: &CurrentUser, liked: &[i64]) -> Vec<Self> {
        messages
            .into_iter()
            .map(|message| {
                Self::from_joined(
                    MessageWithAuthor {
                        message,
                        username: author.username.clone(),
                        image_url: author.image_url.clone(),
                    },
                    me,
                    liked,
                )
            })
            .collect()
    }

    /// Messages by arbitrary authors; looks each author up.
    pub fn resolve(conn: &Connection, list: Vec<Message>, me: &CurrentUser) -> ModelResult<Vec<Self>> {
        let liked = likes::liked_ids(conn, me.id)?;
        let mut views = Vec::with_capacity(list.len());
        for message in list {
            if let Some(joined) = messages::get_with_author(conn, message.id)? {
                views.push(Self::from_joined(joined, me, &liked));
            }
        }
        Ok(views)
    }
}

/// `2024-03-05 14:00:00` → `05 March 2024`
pub fn format_timestamp(db_time: &str) -> String {
    NaiveDateTime::parse_from_str(db_time, "%Y-%m-%d %H:%M:%S")
        .map(|dt| dt.format("%d %B %Y").to_string())
        .unwrap_or_else(|_| db_time.to_string())
}
