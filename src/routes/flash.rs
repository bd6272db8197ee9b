//! One-shot messages carried across a redirect.
//!
//! The message rides in a cookie (hex-encoded JSON, since raw JSON is not a
//! valid cookie value) and is cleared by the page that displays it.

use std::convert::Infallible;

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum::http::{header, HeaderValue, StatusCode};
use axum::response::{IntoResponse, IntoResponseParts, Response, ResponseParts};
use serde::{Deserialize, Serialize};

use crate::extractors::cookie_value;

pub const FLASH_COOKIE: &str = "warbler_flash";
const CLEAR_FLASH_COOKIE: &str = "warbler_flash=; HttpOnly; SameSite=Lax; Path=/; Max-Age=0";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Flash {
    /// Bootstrap-style alert class: success, danger, info
    pub category: String,
    pub message: String,
}

impl Flash {
    pub fn new(category: &str, message: impl Into<String>) -> Self {
        Self {
            category: category.to_string(),
            message: message.into(),
        }
    }

    pub fn success(message: impl Into<String>) -> Self {
        Self::new("success", message)
    }

    pub fn danger(message: impl Into<String>) -> Self {
        Self::new("danger", message)
    }

    pub fn info(message: impl Into<String>) -> Self {
        Self::new("info", message)
    }

    fn encode(&self) -> String {
        serde_json::to_vec(self).map(hex::encode).unwrap_or_default()
    }

    fn decode(raw: &str) -> Option<Self> {
        let bytes = hex::decode(raw).ok()?;
        serde_json::from_slice(&bytes).ok()
    }

    pub fn cookie(&self) -> String {
        format!(
            "{}={}; HttpOnly; SameSite=Lax; Path=/",
            FLASH_COOKIE,
            self.encode()
        )
    }
}

/// `303 See Other` to `to`, showing `flash` on the next page.
pub fn redirect(to: &str, flash: Flash) -> Response {
    (
        StatusCode::SEE_OTHER,
        [
            (header::LOCATION, to.to_string()),
            (header::SET_COOKIE, flash.cookie()),
        ],
    )
        .into_response()
}

/// The flash waiting in the request, if any. Returned alongside the page
/// response so a displayed flash is cleared.
#[derive(Debug, Default)]
pub struct Flashes {
    pending: Option<Flash>,
    taken: bool,
}

impl Flashes {
    pub fn take(&mut self) -> Option<Flash> {
        let flash = self.pending.take();
        if flash.is_some() {
            self.taken = true;
        }
        flash
    }
}

impl<S: Send + Sync> FromRequestParts<S> for Flashes {
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let pending = cookie_value(&parts.headers, FLASH_COOKIE).and_then(Flash::decode);
        Ok(Flashes {
            pending,
            taken: false,
        })
    }
}

impl IntoResponseParts for Flashes {
    type Error = Infallible;

    fn into_response_parts(self, mut res: ResponseParts) -> Result<ResponseParts, Self::Error> {
        if self.taken {
            res.headers_mut()
                .append(header::SET_COOKIE, HeaderValue::from_static(CLEAR_FLASH_COOKIE));
        }
        Ok(res)
    }
}
