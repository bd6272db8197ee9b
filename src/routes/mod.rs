pub mod auth;
pub mod flash;
pub mod home;
pub mod messages;
pub mod users;
pub mod views;

use axum::routing::get;
use axum::Router;
use tower_http::trace::TraceLayer;

use crate::state::AppState;

/// The whole application, ready to serve.
pub fn app(state: AppState) -> Router {
    Router::new()
        .route("/", get(home::index))
        .merge(auth::router())
        .merge(users::router())
        .merge(messages::router())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
