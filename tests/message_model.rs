//! Message model: authorship, likes and the owner constraint.

mod common;

use rusqlite::Connection;

use common::TestDb;
use warbler::db::models::{Message, ModelResult, NewMessage};
use warbler::db::{likes, messages};

const UID1: i64 = 1234;
const UID2: i64 = 5678;

fn setup() -> TestDb {
    let db = TestDb::new();
    db.signup("testuser1", "test1@test.com", UID1);
    db.signup("testuser2", "test2@test.com", UID2);
    db
}

fn add_message(conn: &mut Connection, message: &NewMessage) -> ModelResult<Message> {
    let tx = conn.transaction()?;
    let stored = messages::insert(&tx, message)?;
    tx.commit()?;
    Ok(stored)
}

#[test]
fn test_message_model() {
    let db = setup();
    let mut conn = db.conn();
    add_message(&mut conn, &NewMessage::new("test message", UID1)).unwrap();

    let authored = db.user(UID1).messages(&conn).unwrap();
    assert_eq!(authored.len(), 1);
    assert_eq!(authored[0].text, "test message");
    assert_eq!(authored[0].user_id, UID1);
}

#[test]
fn test_message_likes() {
    let db = setup();
    let mut conn = db.conn();
    let msg = add_message(&mut conn, &NewMessage::new("test message", UID1)).unwrap();

    let tx = conn.transaction().unwrap();
    likes::like(&tx, UID2, msg.id).unwrap();
    tx.commit().unwrap();

    let u = db.user(UID2);
    let liked = u.likes(&conn).unwrap();
    assert_eq!(liked.len(), 1);
    assert_eq!(liked[0].text, "test message");
    assert!(db.user(UID1).likes(&conn).unwrap().is_empty());
}

#[test]
fn test_message_invalid_user() {
    let db = setup();
    let mut conn = db.conn();

    for user_id in [9999, 0, -1, i64::MAX] {
        let err = add_message(&mut conn, &NewMessage::new("test message", user_id)).unwrap_err();
        assert!(err.is_integrity(), "user {user_id}: got {err:?}");
    }

    let count: i64 = conn
        .query_row("SELECT COUNT(*) FROM messages", [], |row| row.get(0))
        .unwrap();
    assert_eq!(count, 0);
}

#[test]
fn test_invalid_user_fails_at_commit_not_insert() {
    let db = setup();
    let mut conn = db.conn();

    let tx = conn.transaction().unwrap();
    messages::insert(&tx, &NewMessage::new("orphan", 9999)).unwrap();
    assert!(tx.commit().is_err());
}

#[test]
fn test_deleting_author_deletes_messages() {
    let db = setup();
    let mut conn = db.conn();
    let msg = add_message(&mut conn, &NewMessage::new("test message", UID1)).unwrap();
    likes::like(&conn, UID2, msg.id).unwrap();

    warbler::db::users::delete(&conn, UID1).unwrap();

    assert!(messages::get(&conn, msg.id).unwrap().is_none());
    assert!(db.user(UID2).likes(&conn).unwrap().is_empty());
}
