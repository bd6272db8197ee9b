use askama::Template;
use axum::extract::State;
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::{AppendHeaders, IntoResponse, Redirect, Response};
use axum::Form;
use serde::Deserialize;

use crate::auth::{service, session};
use crate::db::models::ModelError;
use crate::db::users;
use crate::error::AppResult;
use crate::extractors::{cookie_value, CurrentUser, MaybeUser};
use crate::routes::flash::{Flash, Flashes};
use crate::routes::home::Html;
use crate::state::AppState;

const MIN_PASSWORD_LEN: usize = 6;

// -- Templates --

#[derive(Template)]
#[template(path = "pages/signup.html")]
pub struct SignupTemplate {
    pub current: Option<CurrentUser>,
    pub flash: Option<Flash>,
    pub username: String,
    pub email: String,
    pub image_url: String,
}

#[derive(Template)]
#[template(path = "pages/login.html")]
pub struct LoginTemplate {
    pub current: Option<CurrentUser>,
    pub flash: Option<Flash>,
    pub username: String,
}

// -- Request types --

#[derive(Deserialize)]
pub struct SignupForm {
    pub username: String,
    pub email: String,
    pub password: String,
    pub image_url: Option<String>,
}

#[derive(Deserialize)]
pub struct LoginForm {
    pub username: String,
    pub password: String,
}

// -- Cookie helpers --

fn session_cookie(name: &str, token: &str, max_age_hours: u64) -> String {
    let max_age_secs = max_age_hours.saturating_mul(3600);
    format!(
        "{}={}; HttpOnly; SameSite=Lax; Path=/; Max-Age={}",
        name, token, max_age_secs
    )
}

pub fn clear_session_cookie(name: &str) -> String {
    format!("{}=; HttpOnly; SameSite=Lax; Path=/; Max-Age=0", name)
}

/// 303 to `to`, starting a session and showing `flash` there.
fn sign_in(state: &AppState, user_id: i64, to: &str, flash: Flash) -> AppResult<Response> {
    let hours = state.config.auth.session_hours;
    let token = session::create_session(&state.db, user_id, hours)?;

    Ok((
        StatusCode::SEE_OTHER,
        AppendHeaders([
            (header::LOCATION, to.to_string()),
            (
                header::SET_COOKIE,
                session_cookie(&state.config.auth.cookie_name, &token, hours),
            ),
            (header::SET_COOKIE, flash.cookie()),
        ]),
    )
        .into_response())
}

// -- Signup handlers --

/// GET /signup
pub async fn signup_page(MaybeUser(user): MaybeUser, mut flashes: Flashes) -> Response {
    if user.is_some() {
        return Redirect::to("/").into_response();
    }

    let flash = flashes.take();
    (
        flashes,
        Html(SignupTemplate {
            current: None,
            flash,
            username: String::new(),
            email: String::new(),
            image_url: String::new(),
        }),
    )
        .into_response()
}

/// POST /signup: create the user, then sign them in
pub async fn signup(
    State(state): State<AppState>,
    Form(form): Form<SignupForm>,
) -> AppResult<Response> {
    let username = form.username.trim().to_string();
    let email = form.email.trim().to_string();
    let image_url = form.image_url.unwrap_or_default().trim().to_string();

    let rerender = |message: &str| {
        Html(SignupTemplate {
            current: None,
            flash: Some(Flash::danger(message)),
            username: username.clone(),
            email: email.clone(),
            image_url: image_url.clone(),
        })
        .into_response()
    };

    if username.is_empty() {
        return Ok(rerender("Username is required."));
    }
    if !email.contains('@') {
        return Ok(rerender("A valid email is required."));
    }
    if form.password.chars().count() < MIN_PASSWORD_LEN {
        return Ok(rerender("Password must be at least 6 characters."));
    }

    let new_user = service::signup(&username, &email, &form.password, Some(image_url.as_str()))?;

    let user = {
        let mut conn = state.db.get()?;
        let tx = conn.transaction()?;
        let user = match users::insert(&tx, &new_user) {
            Ok(user) => user,
            Err(e) if e.is_integrity() => {
                tracing::debug!("Signup rejected: {}", e);
                return Ok(rerender("Username already taken"));
            }
            Err(e) => return Err(e.into()),
        };
        tx.commit().map_err(ModelError::from)?;
        user
    };

    tracing::info!(user = user.id, "User signed up");
    sign_in(
        &state,
        user.id,
        "/",
        Flash::success(format!("Welcome, {}!", user.username)),
    )
}

// -- Login handlers --

/// GET /login
pub async fn login_page(MaybeUser(user): MaybeUser, mut flashes: Flashes) -> Response {
    if user.is_some() {
        return Redirect::to("/").into_response();
    }

    let flash = flashes.take();
    (
        flashes,
        Html(LoginTemplate {
            current: None,
            flash,
            username: String::new(),
        }),
    )
        .into_response()
}

/// POST /login
pub async fn login(
    State(state): State<AppState>,
    Form(form): Form<LoginForm>,
) -> AppResult<Response> {
    let user = {
        let conn = state.db.get()?;
        service::authenticate(&conn, form.username.trim(), &form.password)?
    };

    let Some(user) = user else {
        return Ok(Html(LoginTemplate {
            current: None,
            flash: Some(Flash::danger("Invalid credentials.")),
            username: form.username,
        })
        .into_response());
    };

    tracing::info!(user = user.id, "User logged in");
    sign_in(
        &state,
        user.id,
        "/",
        Flash::success(format!("Hello, {}!", user.username)),
    )
}

// -- Logout handler --

/// GET /logout: delete session and redirect to the login page
pub async fn logout(State(state): State<AppState>, headers: HeaderMap) -> AppResult<Response> {
    let cookie_name = &state.config.auth.cookie_name;

    if let Some(token) = cookie_value(&headers, cookie_name) {
        session::delete_session(&state.db, token)?;
    }

    Ok((
        StatusCode::SEE_OTHER,
        AppendHeaders([
            (header::LOCATION, "/login".to_string()),
            (header::SET_COOKIE, clear_session_cookie(cookie_name)),
            (
                header::SET_COOKIE,
                Flash::success("You have successfully logged out.").cookie(),
            ),
        ]),
    )
        .into_response())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn session_cookie_carries_max_age() {
        let cookie = session_cookie("warbler_session", "abc", 2);
        assert!(cookie.starts_with("warbler_session=abc;"));
        assert!(cookie.contains("Max-Age=7200"));
    }

    #[test]
    fn session_cookie_max_age_saturates() {
        let cookie = session_cookie("warbler_session", "abc", u64::MAX);
        assert!(cookie.ends_with(&format!("Max-Age={}", u64::MAX)));
    }

    #[test]
    fn clear_session_cookie_expires_immediately() {
        let cookie = clear_session_cookie("warbler_session");
        assert!(cookie.starts_with("warbler_session=;"));
        assert!(cookie.ends_with("Max-Age=0"));
    }
}
