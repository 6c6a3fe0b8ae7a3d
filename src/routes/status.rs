use axum::{extract::Extension, http::{HeaderMap, StatusCode}, routing::post, Router};
use chrono::Local;

use crate::{error::AppResult, state::Store};

pub fn router() -> Router {
    Router::new().route("/status", post(heartbeat))
}

async fn heartbeat(Extension(store): Extension<Store>, headers: HeaderMap) -> AppResult<StatusCode> {
    let name = super::user(&headers);
    store.heartbeat(name, &Local::now()).await?;
    tracing::debug!(name = name.unwrap_or_default(), "heartbeat");
    Ok(StatusCode::OK)
}
