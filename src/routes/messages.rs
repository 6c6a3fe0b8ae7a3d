use axum::{
    extract::{rejection::JsonRejection, Extension, Json, Query},
    http::{HeaderMap, StatusCode},
    routing::post,
    Router,
};
use chrono::Local;
use serde::Deserialize;

use crate::{
    error::{invalid, AppResult},
    messages::{parse_limit, Draft, Message},
    state::Store,
};

#[derive(Deserialize)]
struct Page {
    limit: Option<String>,
}

pub fn router() -> Router {
    Router::new().route("/messages", post(send).get(read))
}

async fn send(
    Extension(store): Extension<Store>,
    headers: HeaderMap,
    body: Result<Json<Draft>, JsonRejection>,
) -> AppResult<StatusCode> {
    let Json(draft) = body.map_err(invalid)?;
    let msg = store.post_message(super::user(&headers), &draft, &Local::now()).await?;
    tracing::debug!(from = %msg.from, to = %msg.to, kind = msg.kind.as_str(), "message stored");
    Ok(StatusCode::CREATED)
}

// no viewer header: only public messages come back
async fn read(
    Extension(store): Extension<Store>,
    headers: HeaderMap,
    Query(page): Query<Page>,
) -> AppResult<Json<Vec<Message>>> {
    let limit = parse_limit(page.limit.as_deref());
    Ok(Json(store.messages_for(super::user(&headers), limit).await?))
}
