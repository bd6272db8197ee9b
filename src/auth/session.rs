use rand::Rng;
use rusqlite::{params, Connection, OptionalExtension};

use crate::db::models::{ModelResult, User};
use crate::state::DbPool;

/// Create a new session for a user. Returns the session token.
pub fn create_session(pool: &DbPool, user_id: i64, hours: u64) -> ModelResult<String> {
    let conn = pool.get()?;

    let token = generate_token();
    let id = uuid::Uuid::now_v7().to_string();

    conn.execute(
        "INSERT INTO sessions (id, user_id, token, expires_at) VALUES (?1, ?2, ?3, datetime('now', ?4))",
        params![id, user_id, token, format!("+{} hours", hours)],
    )?;

    Ok(token)
}

/// The user behind an unexpired session token.
pub fn user_for_token(conn: &Connection, token: &str) -> ModelResult<Option<User>> {
    let user = conn
        .query_row(
            "SELECT u.id, u.username, u.email, u.password, u.image_url FROM sessions s \
             JOIN users u ON u.id = s.user_id \
             WHERE s.token = ?1 AND s.expires_at > datetime('now')",
            params![token],
            User::from_row,
        )
        .optional()?;
    Ok(user)
}

/// Delete a session by token.
pub fn delete_session(pool: &DbPool, token: &str) -> ModelResult<()> {
    let conn = pool.get()?;
    conn.execute("DELETE FROM sessions WHERE token = ?1", params![token])?;
    Ok(())
}

/// Generate a cryptographically random 32-byte hex token.
fn generate_token() -> String {
    let mut rng = rand::thread_rng();
    let bytes: [u8; 32] = rng.gen();
    hex::encode(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::models::NewUser;
    use crate::db::tests::test_pool;
    use crate::db::users;

    #[test]
    fn generate_token_is_64_hex_chars() {
        let token = generate_token();
        assert_eq!(token.len(), 64);
        assert!(token.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn generate_token_is_unique() {
        let t1 = generate_token();
        let t2 = generate_token();
        assert_ne!(t1, t2);
    }

    #[test]
    fn session_resolves_to_user_until_deleted() {
        let pool = test_pool();
        {
            let conn = pool.get().unwrap();
            users::insert(&conn, &NewUser::new("alice", "alice@test.com", "hash").with_id(7)).unwrap();
        }

        let token = create_session(&pool, 7, 1).unwrap();
        {
            let conn = pool.get().unwrap();
            assert_eq!(user_for_token(&conn, &token).unwrap().unwrap().id, 7);
            assert!(user_for_token(&conn, "nope").unwrap().is_none());
        }

        delete_session(&pool, &token).unwrap();
        let conn = pool.get().unwrap();
        assert!(user_for_token(&conn, &token).unwrap().is_none());
    }

    #[test]
    fn expired_session_is_ignored() {
        let pool = test_pool();
        let conn = pool.get().unwrap();
        users::insert(&conn, &NewUser::new("alice", "alice@test.com", "hash").with_id(7)).unwrap();
        conn.execute(
            "INSERT INTO sessions (id, user_id, token, expires_at) VALUES ('s', 7, 'old', datetime('now', '-1 hours'))",
            [],
        )
        .unwrap();

        assert!(user_for_token(&conn, "old").unwrap().is_none());
    }
}
