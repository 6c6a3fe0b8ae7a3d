pub mod config;
pub mod error;
pub mod messages;
pub mod participants;
pub mod routes;
pub mod state;
pub mod utils {
    pub mod sweep;
}

use axum::{extract::DefaultBodyLimit, Extension, Router};
use tower_http::{cors::CorsLayer, limit::RequestBodyLimitLayer, trace::TraceLayer};

pub use crate::{config::Config, error::{AppErr, AppResult}, state::Store};

const BODY_LIMIT: usize = 64 * 1024;

/// Full HTTP surface over `store`.
pub fn app(store: Store) -> Router {
    routes::router()
        .layer(Extension(store))
        .layer(CorsLayer::permissive())
        .layer(DefaultBodyLimit::max(BODY_LIMIT))
        .layer(RequestBodyLimitLayer::new(BODY_LIMIT))
        .layer(TraceLayer::new_for_http())
}
