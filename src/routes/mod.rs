use axum::{http::HeaderMap, Router};

pub mod messages;
pub mod participants;
pub mod status;

/// Request header naming the acting participant.
pub const USER: &str = "user";

pub fn router() -> Router {
    Router::new()
        .merge(participants::router())
        .merge(messages::router())
        .merge(status::router())
}

/// Value of the `user` header, if present and valid UTF-8.
/// Decoded from the raw bytes: `HeaderValue::to_str` is ASCII-only.
pub(crate) fn user(headers: &HeaderMap) -> Option<&str> {
    headers.get(USER).and_then(|v| std::str::from_utf8(v.as_bytes()).ok())
}
