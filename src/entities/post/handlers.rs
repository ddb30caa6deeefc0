//! Post HTTP handlers
//!
//! Every handler requires an authenticated [`Caller`].

use super::model::Post;
use crate::core::error::ServiceResult;
use crate::core::extractors::Caller;
use crate::core::query::{PaginatedResult, QueryParams};
use crate::server::AppState;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Json,
};
use serde_json::{Map, Value, json};

pub async fn list_posts(
    _caller: Caller,
    State(state): State<AppState>,
    Query(params): Query<QueryParams>,
) -> ServiceResult<Json<PaginatedResult<Post>>> {
    Ok(Json(state.posts.list(&params).await?))
}

pub async fn get_post(
    _caller: Caller,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ServiceResult<Json<Post>> {
    Ok(Json(state.posts.get_by_id(&id).await?))
}

pub async fn create_post(
    caller: Caller,
    State(state): State<AppState>,
    Json(mut payload): Json<Value>,
) -> ServiceResult<(StatusCode, Json<Post>)> {
    // attribute to the caller unless an author was given
    if let Value::Object(fields) = &mut payload {
        fields.entry("author").or_insert_with(|| json!(caller.id));
    }

    let post = state.posts.create(payload).await?;
    Ok((StatusCode::CREATED, Json(post)))
}

pub async fn update_post(
    _caller: Caller,
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(patch): Json<Map<String, Value>>,
) -> ServiceResult<Json<Post>> {
    Ok(Json(state.posts.update(&id, patch).await?))
}

pub async fn delete_post(
    _caller: Caller,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ServiceResult<StatusCode> {
    state.posts.delete(&id).await?;
    Ok(StatusCode::NO_CONTENT)
}
