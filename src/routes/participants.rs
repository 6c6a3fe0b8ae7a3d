use axum::{
    extract::{rejection::JsonRejection, Extension, Json},
    http::StatusCode,
    routing::post,
    Router,
};
use chrono::Local;
use serde::Deserialize;

use crate::{
    error::{invalid, AppResult},
    participants::Participant,
    state::Store,
};

#[derive(Deserialize)]
struct JoinInput {
    name: Option<String>,
}

pub fn router() -> Router {
    Router::new().route("/participants", post(join).get(list))
}

/* ---------------- Join ---------------- */
async fn join(
    Extension(store): Extension<Store>,
    body: Result<Json<JoinInput>, JsonRejection>,
) -> AppResult<StatusCode> {
    let Json(p) = body.map_err(invalid)?;
    let who = store.register(p.name.as_deref(), &Local::now()).await?;
    tracing::info!(name = %who.name, "participant joined");
    Ok(StatusCode::CREATED)
}

/* ---------------- List ---------------- */
async fn list(Extension(store): Extension<Store>) -> AppResult<Json<Vec<Participant>>> {
    Ok(Json(store.participants().await?))
}
