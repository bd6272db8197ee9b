use askama::Template;
use axum::extract::State;
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};

use crate::db::{likes, messages};
use crate::error::AppResult;
use crate::extractors::{CurrentUser, MaybeUser};
use crate::routes::flash::{Flash, Flashes};
use crate::routes::views::MessageView;
use crate::state::AppState;

/// How many messages the signed-in home timeline shows.
const TIMELINE_LIMIT: u32 = 100;

#[derive(Template)]
#[template(path = "pages/home_anon.html")]
pub struct HomeAnonTemplate {
    pub current: Option<CurrentUser>,
    pub flash: Option<Flash>,
}

#[derive(Template)]
#[template(path = "pages/home.html")]
pub struct HomeTemplate {
    pub current: Option<CurrentUser>,
    pub flash: Option<Flash>,
    pub messages: Vec<MessageView>,
}

/// Wrapper to render askama templates as axum responses
pub struct Html<T: Template>(pub T);

impl<T: Template> IntoResponse for Html<T> {
    fn into_response(self) -> Response {
        match self.0.render() {
            Ok(body) => (
                StatusCode::OK,
                [(header::CONTENT_TYPE, "text/html; charset=utf-8")],
                body,
            )
                .into_response(),
            Err(e) => {
                tracing::error!("Template render error: {}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, "Template error").into_response()
            }
        }
    }
}

pub async fn index(
    State(state): State<AppState>,
    MaybeUser(user): MaybeUser,
    mut flashes: Flashes,
) -> AppResult<Response> {
    let flash = flashes.take();

    let Some(me) = user else {
        return Ok((
            flashes,
            Html(HomeAnonTemplate {
                current: None,
                flash,
            }),
        )
            .into_response());
    };

    let feed: Vec<MessageView> = {
        let conn = state.db.get()?;
        let liked = likes::liked_ids(&conn, me.id)?;
        messages::timeline(&conn, me.id, TIMELINE_LIMIT)?
            .into_iter()
            .map(|msg| MessageView::from_joined(msg, &me, &liked))
            .collect()
    };

    Ok((
        flashes,
        Html(HomeTemplate {
            current: Some(me),
            flash,
            messages: feed,
        }),
    )
        .into_response())
}
