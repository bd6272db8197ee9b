use rusqlite::{params, Connection, OptionalExtension};

use crate::db::models::{ModelResult, NewUser, User};

/// Insert a user inside the caller's transaction. Duplicate username or
/// email fails with `ModelError::Integrity`.
pub fn insert(conn: &Connection, user: &NewUser) -> ModelResult<User> {
    conn.execute(
        "INSERT INTO users (id, username, email, password, image_url) VALUES (?1, ?2, ?3, ?4, ?5)",
        params![user.id, user.username, user.email, user.password, user.image_url],
    )?;

    Ok(User {
        id: conn.last_insert_rowid(),
        username: user.username.clone(),
        email: user.email.clone(),
        password: user.password.clone(),
        image_url: user.image_url.clone(),
    })
}

pub fn get(conn: &Connection, id: i64) -> ModelResult<Option<User>> {
    let user = conn
        .query_row(
            &format!("SELECT {} FROM users WHERE id = ?1", User::COLUMNS),
            params![id],
            User::from_row,
        )
        .optional()?;
    Ok(user)
}

pub fn find_by_username(conn: &Connection, username: &str) -> ModelResult<Option<User>> {
    let user = conn
        .query_row(
            &format!("SELECT {} FROM users WHERE username = ?1", User::COLUMNS),
            params![username],
            User::from_row,
        )
        .optional()?;
    Ok(user)
}

/// All users, or those whose username contains `query` (case-sensitive).
pub fn search(conn: &Connection, query: Option<&str>) -> ModelResult<Vec<User>> {
    let query = query.map(str::trim).filter(|q| !q.is_empty());

    let mut stmt = conn.prepare(&format!(
        "SELECT {} FROM users
         WHERE ?1 IS NULL OR instr(username, ?1) > 0
         ORDER BY username",
        User::COLUMNS
    ))?;
    let users = stmt
        .query_map(params![query], User::from_row)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(users)
}

/// Update the editable profile fields. The password hash is left alone.
pub fn update_profile(
    conn: &Connection,
    id: i64,
    username: &str,
    email: &str,
    image_url: Option<&str>,
) -> ModelResult<()> {
    conn.execute(
        "UPDATE users SET username = ?1, email = ?2, image_url = ?3 WHERE id = ?4",
        params![username, email, image_url, id],
    )?;
    Ok(())
}

/// Delete a user; messages, follows, likes and sessions cascade.
pub fn delete(conn: &Connection, id: i64) -> ModelResult<bool> {
    let rows = conn.execute("DELETE FROM users WHERE id = ?1", params![id])?;
    Ok(rows > 0)
}

pub fn count(conn: &Connection) -> ModelResult<i64> {
    let n = conn.query_row("SELECT COUNT(*) FROM users", [], |row| row.get(0))?;
    Ok(n)
}
