use askama::Template;
use axum::extract::{Path, Query, State};
use axum::http::{header, StatusCode};
use axum::response::{AppendHeaders, IntoResponse, Redirect, Response};
use axum::routing::{get, post};
use axum::{Form, Router};
use serde::Deserialize;

use crate::auth;
use crate::db::models::{ModelError, User};
use crate::db::{follows, likes, messages, users};
use crate::error::{AppError, AppResult};
use crate::extractors::{CurrentUser, MaybeUser};
use crate::routes::flash::{self, Flash, Flashes};
use crate::routes::home::Html;
use crate::routes::views::{MessageView, ProfileView, UserCard};
use crate::state::AppState;

// --- Templates ---

#[derive(Template)]
#[template(path = "pages/users_index.html")]
pub struct UsersIndexTemplate {
    pub current: Option<CurrentUser>,
    pub flash: Option<Flash>,
    pub query: String,
    pub users: Vec<UserCard>,
}

#[derive(Template)]
#[template(path = "pages/user_show.html")]
pub struct UserShowTemplate {
    pub current: Option<CurrentUser>,
    pub flash: Option<Flash>,
    pub profile: ProfileView,
    pub messages: Vec<MessageView>,
}

#[derive(Template)]
#[template(path = "pages/user_follows.html")]
pub struct UserFollowsTemplate {
    pub current: Option<CurrentUser>,
    pub flash: Option<Flash>,
    pub profile: ProfileView,
    pub heading: &'static str,
    pub users: Vec<UserCard>,
}

#[derive(Template)]
#[template(path = "pages/user_likes.html")]
pub struct UserLikesTemplate {
    pub current: Option<CurrentUser>,
    pub flash: Option<Flash>,
    pub profile: ProfileView,
    pub messages: Vec<MessageView>,
}

#[derive(Template)]
#[template(path = "pages/profile_edit.html")]
pub struct ProfileEditTemplate {
    pub current: Option<CurrentUser>,
    pub flash: Option<Flash>,
    pub username: String,
    pub email: String,
    pub image_url: String,
}

// --- Forms ---

#[derive(Deserialize)]
pub struct SearchQuery {
    pub q: Option<String>,
}

#[derive(Deserialize)]
pub struct ProfileForm {
    pub username: String,
    pub email: String,
    pub image_url: Option<String>,
    pub password: String,
}

// --- Router ---

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/users", get(list_users))
        .route("/users/profile", get(edit_profile_page).post(edit_profile))
        .route("/users/delete", post(delete_user))
        .route("/users/follow/{id}", post(add_follow))
        .route("/users/stop-following/{id}", post(stop_following))
        .route("/users/add_like/{message_id}", post(toggle_like))
        .route("/users/{id}", get(show_user))
        .route("/users/{id}/following", get(show_following))
        .route("/users/{id}/followers", get(show_followers))
        .route("/users/{id}/likes", get(show_likes))
}

// --- Handlers ---

/// GET /users: everyone, or usernames containing `q`
async fn list_users(
    State(state): State<AppState>,
    MaybeUser(me): MaybeUser,
    Query(search): Query<SearchQuery>,
    mut flashes: Flashes,
) -> AppResult<Response> {
    let query = search.q.unwrap_or_default();

    let cards = {
        let conn = state.db.get()?;
        let found = users::search(&conn, Some(&query))?;
        UserCard::list(&conn, found, me.as_ref())?
    };

    let flash = flashes.take();
    Ok((
        flashes,
        Html(UsersIndexTemplate {
            current: me,
            flash,
            query,
            users: cards,
        }),
    )
        .into_response())
}

/// GET /users/{id}: profile with the user's messages
async fn show_user(
    State(state): State<AppState>,
    me: CurrentUser,
    Path(id): Path<i64>,
    mut flashes: Flashes,
) -> AppResult<Response> {
    let (profile, authored) = {
        let conn = state.db.get()?;
        let user = load_user(&conn, id)?;
        let liked = likes::liked_ids(&conn, me.id)?;
        let authored = MessageView::by_author(user.messages(&conn)?, &user, &me, &liked);
        (ProfileView::load(&conn, &user, &me)?, authored)
    };

    let flash = flashes.take();
    Ok((
        flashes,
        Html(UserShowTemplate {
            current: Some(me),
            flash,
            profile,
            messages: authored,
        }),
    )
        .into_response())
}

/// GET /users/{id}/following
async fn show_following(
    State(state): State<AppState>,
    me: CurrentUser,
    Path(id): Path<i64>,
    flashes: Flashes,
) -> AppResult<Response> {
    follow_list(state, me, id, flashes, FollowList::Following)
}

/// GET /users/{id}/followers
async fn show_followers(
    State(state): State<AppState>,
    me: CurrentUser,
    Path(id): Path<i64>,
    flashes: Flashes,
) -> AppResult<Response> {
    follow_list(state, me, id, flashes, FollowList::Followers)
}

enum FollowList {
    Following,
    Followers,
}

fn follow_list(
    state: AppState,
    me: CurrentUser,
    id: i64,
    mut flashes: Flashes,
    which: FollowList,
) -> AppResult<Response> {
    let (profile, cards) = {
        let conn = state.db.get()?;
        let user = load_user(&conn, id)?;
        let listed = match which {
            FollowList::Following => user.following(&conn)?,
            FollowList::Followers => user.followers(&conn)?,
        };
        (
            ProfileView::load(&conn, &user, &me)?,
            UserCard::list(&conn, listed, Some(&me))?,
        )
    };

    let heading = match which {
        FollowList::Following => "Following",
        FollowList::Followers => "Followers",
    };

    let flash = flashes.take();
    Ok((
        flashes,
        Html(UserFollowsTemplate {
            current: Some(me),
            flash,
            profile,
            heading,
            users: cards,
        }),
    )
        .into_response())
}

/// GET /users/{id}/likes
async fn show_likes(
    State(state): State<AppState>,
    me: CurrentUser,
    Path(id): Path<i64>,
    mut flashes: Flashes,
) -> AppResult<Response> {
    let (profile, liked) = {
        let conn = state.db.get()?;
        let user = load_user(&conn, id)?;
        let liked = MessageView::resolve(&conn, user.likes(&conn)?, &me)?;
        (ProfileView::load(&conn, &user, &me)?, liked)
    };

    let flash = flashes.take();
    Ok((
        flashes,
        Html(UserLikesTemplate {
            current: Some(me),
            flash,
            profile,
            messages: liked,
        }),
    )
        .into_response())
}

/// POST /users/follow/{id}
async fn add_follow(
    State(state): State<AppState>,
    me: CurrentUser,
    Path(id): Path<i64>,
) -> AppResult<Response> {
    let mut conn = state.db.get()?;
    let tx = conn.transaction()?;
    load_user(&tx, id)?;
    follows::follow(&tx, me.id, id)?;
    tx.commit().map_err(ModelError::from)?;

    tracing::info!(follower = me.id, followed = id, "Follow added");
    Ok(Redirect::to(&format!("/users/{}/following", me.id)).into_response())
}

/// POST /users/stop-following/{id}
async fn stop_following(
    State(state): State<AppState>,
    me: CurrentUser,
    Path(id): Path<i64>,
) -> AppResult<Response> {
    let mut conn = state.db.get()?;
    let tx = conn.transaction()?;
    load_user(&tx, id)?;
    follows::unfollow(&tx, me.id, id)?;
    tx.commit().map_err(ModelError::from)?;

    tracing::info!(follower = me.id, followed = id, "Follow removed");
    Ok(Redirect::to(&format!("/users/{}/following", me.id)).into_response())
}

/// POST /users/add_like/{message_id}: like, or unlike if already liked
async fn toggle_like(
    State(state): State<AppState>,
    me: CurrentUser,
    Path(message_id): Path<i64>,
) -> AppResult<Response> {
    let mut conn = state.db.get()?;
    let tx = conn.transaction()?;
    messages::get(&tx, message_id)?.ok_or(AppError::NotFound)?;
    let liked = likes::toggle(&tx, me.id, message_id)?;
    tx.commit().map_err(ModelError::from)?;

    tracing::debug!(user = me.id, message = message_id, liked, "Like toggled");
    Ok(Redirect::to("/").into_response())
}

/// GET /users/profile
async fn edit_profile_page(
    State(state): State<AppState>,
    me: CurrentUser,
    mut flashes: Flashes,
) -> AppResult<Response> {
    let user = {
        let conn = state.db.get()?;
        load_user(&conn, me.id)?
    };

    let flash = flashes.take();
    Ok((
        flashes,
        Html(ProfileEditTemplate {
            current: Some(me),
            flash,
            username: user.username,
            email: user.email,
            image_url: user.image_url.unwrap_or_default(),
        }),
    )
        .into_response())
}

/// POST /users/profile: requires the current password
async fn edit_profile(
    State(state): State<AppState>,
    me: CurrentUser,
    Form(form): Form<ProfileForm>,
) -> AppResult<Response> {
    let username = form.username.trim().to_string();
    let email = form.email.trim().to_string();
    let image_url = form
        .image_url
        .map(|url| url.trim().to_string())
        .filter(|url| !url.is_empty());

    let rerender = |message: &str| {
        Html(ProfileEditTemplate {
            current: Some(me.clone()),
            flash: Some(Flash::danger(message)),
            username: username.clone(),
            email: email.clone(),
            image_url: image_url.clone().unwrap_or_default(),
        })
        .into_response()
    };

    if username.is_empty() || !email.contains('@') {
        return Ok(rerender("Username and a valid email are required."));
    }

    let mut conn = state.db.get()?;
    if auth::authenticate(&conn, &me.username, &form.password)?.is_none() {
        return Ok(flash::redirect("/", Flash::danger("Invalid password.")));
    }

    let tx = conn.transaction()?;
    match users::update_profile(&tx, me.id, &username, &email, image_url.as_deref()) {
        Ok(()) => {}
        Err(e) if e.is_integrity() => {
            return Ok(rerender("Username or email already taken."));
        }
        Err(e) => return Err(e.into()),
    }
    tx.commit().map_err(ModelError::from)?;

    tracing::info!(user = me.id, "Profile updated");
    Ok(flash::redirect(
        &format!("/users/{}", me.id),
        Flash::success("Profile updated."),
    ))
}

/// POST /users/delete: remove the current user; messages, follows, likes
/// and sessions go with it
async fn delete_user(State(state): State<AppState>, me: CurrentUser) -> AppResult<Response> {
    {
        let mut conn = state.db.get()?;
        let tx = conn.transaction()?;
        users::delete(&tx, me.id)?;
        tx.commit().map_err(ModelError::from)?;
    }

    tracing::info!(user = me.id, "User deleted");
    Ok((
        StatusCode::SEE_OTHER,
        AppendHeaders([
            (header::LOCATION, "/signup".to_string()),
            (
                header::SET_COOKIE,
                auth::handlers::clear_session_cookie(&state.config.auth.cookie_name),
            ),
        ]),
    )
        .into_response())
}

// --- Query helpers ---

fn load_user(conn: &rusqlite::Connection, id: i64) -> AppResult<User> {
    users::get(conn, id)?.ok_or(AppError::NotFound)
}
