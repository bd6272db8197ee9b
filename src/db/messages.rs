use rusqlite::{params, Connection, OptionalExtension};

use crate::db::models::{Message, MessageWithAuthor, ModelResult, NewMessage};

const WITH_AUTHOR: &str = "SELECT m.id, m.text, m.timestamp, m.user_id, u.username, u.image_url
     FROM messages m
     JOIN users u ON u.id = m.user_id";

/// Insert a message inside the caller's transaction. The owner is checked
/// when the transaction commits.
pub fn insert(conn: &Connection, message: &NewMessage) -> ModelResult<Message> {
    conn.execute(
        "INSERT INTO messages (text, user_id) VALUES (?1, ?2)",
        params![message.text, message.user_id],
    )?;
    let id = conn.last_insert_rowid();
    let row = conn.query_row(
        &format!("SELECT {} FROM messages WHERE id = ?1", Message::COLUMNS),
        params![id],
        Message::from_row,
    )?;
    Ok(row)
}

pub fn get(conn: &Connection, id: i64) -> ModelResult<Option<Message>> {
    let message = conn
        .query_row(
            &format!("SELECT {} FROM messages WHERE id = ?1", Message::COLUMNS),
            params![id],
            Message::from_row,
        )
        .optional()?;
    Ok(message)
}

pub fn get_with_author(conn: &Connection, id: i64) -> ModelResult<Option<MessageWithAuthor>> {
    let message = conn
        .query_row(
            &format!("{WITH_AUTHOR} WHERE m.id = ?1"),
            params![id],
            MessageWithAuthor::from_row,
        )
        .optional()?;
    Ok(message)
}

pub fn delete(conn: &Connection, id: i64) -> ModelResult<bool> {
    let rows = conn.execute("DELETE FROM messages WHERE id = ?1", params![id])?;
    Ok(rows > 0)
}

/// Messages authored by `user_id`, newest first.
pub fn by_user(conn: &Connection, user_id: i64) -> ModelResult<Vec<Message>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {} FROM messages WHERE user_id = ?1 ORDER BY timestamp DESC, id DESC",
        Message::COLUMNS
    ))?;
    let messages = stmt
        .query_map(params![user_id], Message::from_row)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(messages)
}

/// Messages from `user_id` and everyone they follow, newest first.
pub fn timeline(conn: &Connection, user_id: i64, limit: u32) -> ModelResult<Vec<MessageWithAuthor>> {
    let mut stmt = conn.prepare(&format!(
        "{WITH_AUTHOR}
         WHERE m.user_id = ?1
            OR m.user_id IN (SELECT followed_id FROM follows WHERE follower_id = ?1)
         ORDER BY m.timestamp DESC, m.id DESC
         LIMIT ?2"
    ))?;
    let messages = stmt
        .query_map(params![user_id, limit], MessageWithAuthor::from_row)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(messages)
}

pub fn count_by_user(conn: &Connection, user_id: i64) -> ModelResult<i64> {
    let n = conn.query_row(
        "SELECT COUNT(*) FROM messages WHERE user_id = ?1",
        params![user_id],
        |row| row.get(0),
    )?;
    Ok(n)
}
