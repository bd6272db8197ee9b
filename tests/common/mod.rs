//! Shared fixtures for the integration tests.
#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::{Arc, OnceLock};

use rusqlite::Connection;
use tempfile::TempDir;

use warbler::auth::{self, password, session};
use warbler::config::Config;
use warbler::db::models::{ModelResult, NewUser, User};
use warbler::db::{self, users};
use warbler::routes;
use warbler::state::{AppState, DbPool};

pub const PASSWORD: &str = "password";

/// A migrated database in a temporary directory.
pub struct TestDb {
    pub pool: DbPool,
    pub config: Config,
    _dir: TempDir,
}

impl TestDb {
    pub fn new() -> Self {
        let dir = TempDir::new().unwrap();
        let db_path = dir.path().join("warbler-test.db");
        let pool = db::create_pool(&db_path).expect("Failed to create test database");
        db::run_migrations(&pool).expect("Failed to run migrations");

        Self {
            pool,
            config: Config::with_db_path(&db_path),
            _dir: dir,
        }
    }

    pub fn conn(&self) -> r2d2::PooledConnection<r2d2_sqlite::SqliteConnectionManager> {
        self.pool.get().unwrap()
    }

    /// Sign up through the auth service and commit.
    pub fn signup(&self, username: &str, email: &str, id: i64) -> User {
        let new_user = auth::signup(username, email, PASSWORD, None)
            .unwrap()
            .with_id(id);
        let mut conn = self.conn();
        insert_and_commit(&mut conn, &new_user).unwrap()
    }

    /// Insert with a password hash shared across calls; bcrypt is slow.
    pub fn seed_user(&self, username: &str, id: i64) -> User {
        static HASH: OnceLock<String> = OnceLock::new();
        let hash = HASH.get_or_init(|| password::hash(PASSWORD).unwrap());

        let new_user = NewUser::new(username, &format!("{username}@test.com"), hash).with_id(id);
        let mut conn = self.conn();
        insert_and_commit(&mut conn, &new_user).unwrap()
    }

    pub fn user(&self, id: i64) -> User {
        users::get(&self.conn(), id).unwrap().expect("user exists")
    }
}

pub fn insert_and_commit(conn: &mut Connection, new_user: &NewUser) -> ModelResult<User> {
    let tx = conn.transaction()?;
    let user = users::insert(&tx, new_user)?;
    tx.commit()?;
    Ok(user)
}

/// The app served on an ephemeral port.
pub struct TestApp {
    pub addr: SocketAddr,
    pub db: TestDb,
}

impl TestApp {
    pub async fn spawn(db: TestDb) -> Self {
        let state = AppState::new(db.pool.clone(), db.config.clone());
        let app = routes::app(state);

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self { addr, db }
    }

    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    /// A client with no session. Cookies (flash messages) are kept and
    /// redirects are followed.
    pub fn anonymous(&self) -> reqwest::Client {
        reqwest::Client::builder()
            .cookie_store(true)
            .build()
            .unwrap()
    }

    /// A client whose cookie jar already holds a session for `user_id`.
    pub fn logged_in(&self, user_id: i64) -> reqwest::Client {
        let token = session::create_session(&self.db.pool, user_id, 1).unwrap();
        let jar = Arc::new(reqwest::cookie::Jar::default());
        let url: reqwest::Url = self.url("/").parse().unwrap();
        jar.add_cookie_str(
            &format!("{}={}", self.db.config.auth.cookie_name, token),
            &url,
        );

        reqwest::Client::builder()
            .cookie_provider(jar)
            .build()
            .unwrap()
    }
}
