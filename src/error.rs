use axum::{http::StatusCode, response::IntoResponse};
use std::fmt::Display;

pub type AppResult<T> = Result<T, AppErr>;

#[derive(thiserror::Error, Debug)]
pub enum AppErr {
    #[error("Invalid input: {0}")]
    Validation(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("DB: {0}")]
    Db(#[from] sqlx::Error),
}

impl AppErr {
    pub fn status(&self) -> StatusCode {
        match self {
            AppErr::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            AppErr::Conflict(_)   => StatusCode::CONFLICT,
            AppErr::NotFound(_)   => StatusCode::NOT_FOUND,
            AppErr::Db(_)         => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppErr {
    fn into_response(self) -> axum::response::Response {
        let code = self.status();
        let body = match self {
            AppErr::Validation(msg) | AppErr::Conflict(msg) | AppErr::NotFound(msg) => msg,
            other => {
                // store failures stay in the log, the client only sees the status
                tracing::error!(error = %other, "request failed");
                "internal error".to_string()
            }
        };
        (code, body).into_response()
    }
}

/* ── small helpers: turn anything displayable into a typed failure ── */
pub fn invalid<E: Display>(e: E) -> AppErr { AppErr::Validation(e.to_string()) }
pub fn not_found<E: Display>(e: E) -> AppErr { AppErr::NotFound(e.to_string()) }

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maps_each_kind_to_its_status() {
        assert_eq!(invalid("x").status(), StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(AppErr::Conflict("x".into()).status(), StatusCode::CONFLICT);
        assert_eq!(not_found("x").status(), StatusCode::NOT_FOUND);
        assert_eq!(AppErr::Db(sqlx::Error::PoolClosed).status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn store_failures_hide_details() {
        let resp = AppErr::Db(sqlx::Error::PoolTimedOut).into_response();
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
