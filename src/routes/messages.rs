use askama::Template;
use axum::extract::{Path, State};
use axum::response::{IntoResponse, Redirect, Response};
use axum::routing::{get, post};
use axum::{Form, Router};
use serde::Deserialize;

use crate::db::likes;
use crate::db::messages;
use crate::db::models::{ModelError, NewMessage};
use crate::error::{AppError, AppResult};
use crate::extractors::CurrentUser;
use crate::routes::flash::{Flash, Flashes};
use crate::routes::home::Html;
use crate::routes::views::MessageView;
use crate::state::AppState;

pub const MAX_MESSAGE_LEN: usize = 140;

#[derive(Template)]
#[template(path = "pages/message_new.html")]
pub struct NewMessageTemplate {
    pub current: Option<CurrentUser>,
    pub flash: Option<Flash>,
    pub text: String,
}

#[derive(Template)]
#[template(path = "pages/message_show.html")]
pub struct MessageShowTemplate {
    pub current: Option<CurrentUser>,
    pub flash: Option<Flash>,
    pub msg: MessageView,
}

#[derive(Deserialize)]
pub struct MessageForm {
    pub text: String,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/messages/new", get(new_message_page).post(create_message))
        .route("/messages/{id}", get(show_message))
        .route("/messages/{id}/delete", post(delete_message))
}

/// GET /messages/new
async fn new_message_page(me: CurrentUser, mut flashes: Flashes) -> Response {
    let flash = flashes.take();
    (
        flashes,
        Html(NewMessageTemplate {
            current: Some(me),
            flash,
            text: String::new(),
        }),
    )
        .into_response()
}

/// POST /messages/new
async fn create_message(
    State(state): State<AppState>,
    me: CurrentUser,
    Form(form): Form<MessageForm>,
) -> AppResult<Response> {
    let text = form.text.trim().to_string();
    if let Err(problem) = validate_text(&text) {
        return Ok(Html(NewMessageTemplate {
            current: Some(me),
            flash: Some(Flash::danger(problem)),
            text,
        })
        .into_response());
    }

    let mut conn = state.db.get()?;
    let tx = conn.transaction()?;
    let message = messages::insert(&tx, &NewMessage::new(&text, me.id))?;
    tx.commit().map_err(ModelError::from)?;

    tracing::info!(user = me.id, message = message.id, "Message created");
    Ok(Redirect::to(&format!("/users/{}", me.id)).into_response())
}

/// GET /messages/{id}
async fn show_message(
    State(state): State<AppState>,
    me: CurrentUser,
    Path(id): Path<i64>,
    mut flashes: Flashes,
) -> AppResult<Response> {
    let msg = {
        let conn = state.db.get()?;
        let joined = messages::get_with_author(&conn, id)?.ok_or(AppError::NotFound)?;
        let liked = likes::liked_ids(&conn, me.id)?;
        MessageView::from_joined(joined, &me, &liked)
    };

    let flash = flashes.take();
    Ok((
        flashes,
        Html(MessageShowTemplate {
            current: Some(me),
            flash,
            msg,
        }),
    )
        .into_response())
}

/// POST /messages/{id}/delete: only the author may delete
async fn delete_message(
    State(state): State<AppState>,
    me: CurrentUser,
    Path(id): Path<i64>,
) -> AppResult<Response> {
    let mut conn = state.db.get()?;
    let tx = conn.transaction()?;
    let message = messages::get(&tx, id)?.ok_or(AppError::NotFound)?;
    if message.user_id != me.id {
        return Err(AppError::Unauthorized);
    }
    messages::delete(&tx, id)?;
    tx.commit().map_err(ModelError::from)?;

    tracing::info!(user = me.id, message = id, "Message deleted");
    Ok(Redirect::to(&format!("/users/{}", me.id)).into_response())
}

fn validate_text(text: &str) -> Result<(), &'static str> {
    if text.is_empty() {
        return Err("Message cannot be empty.");
    }
    if text.chars().count() > MAX_MESSAGE_LEN {
        return Err("Message must be 140 characters or less.");
    }
    Ok(())
}
