use rusqlite::Connection;

use crate::auth::password;
use crate::db::models::{ModelResult, NewUser, User};
use crate::db::users;

/// Build a user with the password replaced by its hash. Nothing is written:
/// the caller inserts it with `db::users::insert` and commits.
///
/// A taken username or email fails at that insert, not at commit; SQLite
/// cannot defer UNIQUE constraints.
pub fn signup(
    username: &str,
    email: &str,
    password: &str,
    image_url: Option<&str>,
) -> ModelResult<NewUser> {
    let hashed = password::hash(password)?;
    Ok(NewUser::new(username, email, &hashed).with_image_url(image_url.map(str::to_string)))
}

/// Find the user by exact username and check the password.
///
/// A missing user or a wrong password is `Ok(None)`; only database failures
/// are errors.
pub fn authenticate(conn: &Connection, username: &str, password: &str) -> ModelResult<Option<User>> {
    let Some(user) = users::find_by_username(conn, username)? else {
        return Ok(None);
    };

    if password::verify(password, &user.password) {
        Ok(Some(user))
    } else {
        Ok(None)
    }
}
