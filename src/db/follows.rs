use rusqlite::{params, Connection};

use crate::db::models::{ModelResult, User};

/// Record that `follower_id` follows `followed_id`. Returns false when the
/// pair already existed.
pub fn follow(conn: &Connection, follower_id: i64, followed_id: i64) -> ModelResult<bool> {
    let rows = conn.execute(
        "INSERT OR IGNORE INTO follows (follower_id, followed_id) VALUES (?1, ?2)",
        params![follower_id, followed_id],
    )?;
    Ok(rows > 0)
}

/// Returns false when there was nothing to remove.
pub fn unfollow(conn: &Connection, follower_id: i64, followed_id: i64) -> ModelResult<bool> {
    let rows = conn.execute(
        "DELETE FROM follows WHERE follower_id = ?1 AND followed_id = ?2",
        params![follower_id, followed_id],
    )?;
    Ok(rows > 0)
}

pub fn is_following(conn: &Connection, follower_id: i64, followed_id: i64) -> ModelResult<bool> {
    let found = conn.query_row(
        "SELECT COUNT(*) > 0 FROM follows WHERE follower_id = ?1 AND followed_id = ?2",
        params![follower_id, followed_id],
        |row| row.get(0),
    )?;
    Ok(found)
}

/// Users that `user_id` follows.
pub fn following(conn: &Connection, user_id: i64) -> ModelResult<Vec<User>> {
    query_users(
        conn,
        "SELECT u.id, u.username, u.email, u.password, u.image_url
         FROM follows f
         JOIN users u ON u.id = f.followed_id
         WHERE f.follower_id = ?1
         ORDER BY u.username",
        user_id,
    )
}

/// Users following `user_id`.
pub fn followers(conn: &Connection, user_id: i64) -> ModelResult<Vec<User>> {
    query_users(
        conn,
        "SELECT u.id, u.username, u.email, u.password, u.image_url
         FROM follows f
         JOIN users u ON u.id = f.follower_id
         WHERE f.followed_id = ?1
         ORDER BY u.username",
        user_id,
    )
}

fn query_users(conn: &Connection, sql: &str, user_id: i64) -> ModelResult<Vec<User>> {
    let mut stmt = conn.prepare(sql)?;
    let users = stmt
        .query_map(params![user_id], User::from_row)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(users)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::models::NewUser;
    use crate::db::tests::test_pool;
    use crate::db::users;

    fn seed(conn: &Connection) {
        for (id, name) in [(1, "alice"), (2, "bob"), (3, "carol")] {
            users::insert(
                conn,
                &NewUser::new(name, &format!("{name}@test.com"), "hash").with_id(id),
            )
            .unwrap();
        }
    }

    #[test]
    fn follow_is_directed() {
        let pool = test_pool();
        let conn = pool.get().unwrap();
        seed(&conn);

        assert!(follow(&conn, 1, 2).unwrap());
        assert!(is_following(&conn, 1, 2).unwrap());
        assert!(!is_following(&conn, 2, 1).unwrap());
    }

    #[test]
    fn follow_twice_keeps_one_row() {
        let pool = test_pool();
        let conn = pool.get().unwrap();
        seed(&conn);

        assert!(follow(&conn, 1, 2).unwrap());
        assert!(!follow(&conn, 1, 2).unwrap());
        assert_eq!(following(&conn, 1).unwrap().len(), 1);
    }

    #[test]
    fn both_views_read_the_same_rows() {
        let pool = test_pool();
        let conn = pool.get().unwrap();
        seed(&conn);

        follow(&conn, 1, 2).unwrap();
        follow(&conn, 3, 2).unwrap();

        let names: Vec<String> = followers(&conn, 2).unwrap().into_iter().map(|u| u.username).collect();
        assert_eq!(names, vec!["alice", "carol"]);
        assert_eq!(following(&conn, 1).unwrap()[0].username, "bob");
        assert!(following(&conn, 2).unwrap().is_empty());
    }

    #[test]
    fn unfollow_removes_pair() {
        let pool = test_pool();
        let conn = pool.get().unwrap();
        seed(&conn);

        follow(&conn, 1, 2).unwrap();
        assert!(unfollow(&conn, 1, 2).unwrap());
        assert!(!unfollow(&conn, 1, 2).unwrap());
        assert!(!is_following(&conn, 1, 2).unwrap());
    }

    #[test]
    fn self_follow_is_allowed() {
        let pool = test_pool();
        let conn = pool.get().unwrap();
        seed(&conn);
        assert!(follow(&conn, 1, 1).unwrap());
        assert!(is_following(&conn, 1, 1).unwrap());
    }

    #[test]
    fn deleting_a_user_drops_their_edges() {
        let pool = test_pool();
        let conn = pool.get().unwrap();
        seed(&conn);

        follow(&conn, 1, 2).unwrap();
        follow(&conn, 2, 3).unwrap();
        users::delete(&conn, 2).unwrap();

        assert!(following(&conn, 1).unwrap().is_empty());
        assert!(followers(&conn, 3).unwrap().is_empty());
    }
}
