use rusqlite::{params, Connection};

use crate::db::models::{Message, ModelResult};

/// Returns false when the user already liked the message.
pub fn like(conn: &Connection, user_id: i64, message_id: i64) -> ModelResult<bool> {
    let rows = conn.execute(
        "INSERT OR IGNORE INTO likes (user_id, message_id) VALUES (?1, ?2)",
        params![user_id, message_id],
    )?;
    Ok(rows > 0)
}

pub fn unlike(conn: &Connection, user_id: i64, message_id: i64) -> ModelResult<bool> {
    let rows = conn.execute(
        "DELETE FROM likes WHERE user_id = ?1 AND message_id = ?2",
        params![user_id, message_id],
    )?;
    Ok(rows > 0)
}

pub fn is_liked(conn: &Connection, user_id: i64, message_id: i64) -> ModelResult<bool> {
    let found = conn.query_row(
        "SELECT COUNT(*) > 0 FROM likes WHERE user_id = ?1 AND message_id = ?2",
        params![user_id, message_id],
        |row| row.get(0),
    )?;
    Ok(found)
}

/// Flip the like and return whether the message is now liked.
pub fn toggle(conn: &Connection, user_id: i64, message_id: i64) -> ModelResult<bool> {
    if unlike(conn, user_id, message_id)? {
        return Ok(false);
    }
    like(conn, user_id, message_id)?;
    Ok(true)
}

/// Messages liked by `user_id`, newest first.
pub fn liked_messages(conn: &Connection, user_id: i64) -> ModelResult<Vec<Message>> {
    let mut stmt = conn.prepare(
        "SELECT m.id, m.text, m.timestamp, m.user_id
         FROM likes l
         JOIN messages m ON m.id = l.message_id
         WHERE l.user_id = ?1
         ORDER BY m.timestamp DESC, m.id DESC",
    )?;
    let messages = stmt
        .query_map(params![user_id], Message::from_row)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(messages)
}

/// Ids of the messages `user_id` liked, for marking lists.
pub fn liked_ids(conn: &Connection, user_id: i64) -> ModelResult<Vec<i64>> {
    let mut stmt = conn.prepare("SELECT message_id FROM likes WHERE user_id = ?1")?;
    let ids = stmt
        .query_map(params![user_id], |row| row.get(0))?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(ids)
}
