//! Account HTTP handlers

use super::model::AccountProfile;
use super::service::{AuthSession, Credentials, RefreshRequest};
use crate::core::error::ServiceResult;
use crate::core::query::{PaginatedResult, QueryParams};
use crate::server::AppState;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Json,
};
use serde_json::{Map, Value};

pub async fn list_accounts(
    State(state): State<AppState>,
    Query(params): Query<QueryParams>,
) -> ServiceResult<Json<PaginatedResult<AccountProfile>>> {
    let page = state.accounts.list(&params).await?;
    Ok(Json(page.map(AccountProfile::from)))
}

pub async fn get_account(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ServiceResult<Json<AccountProfile>> {
    let account = state.accounts.get_by_id(&id).await?;
    Ok(Json(account.into()))
}

pub async fn create_account(
    State(state): State<AppState>,
    Json(payload): Json<Value>,
) -> ServiceResult<(StatusCode, Json<AccountProfile>)> {
    let account = state.accounts.create(payload).await?;
    Ok((StatusCode::CREATED, Json(account.into())))
}

pub async fn update_account(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(patch): Json<Map<String, Value>>,
) -> ServiceResult<Json<AccountProfile>> {
    let account = state.accounts.update(&id, patch).await?;
    Ok(Json(account.into()))
}

pub async fn delete_account(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ServiceResult<StatusCode> {
    state.accounts.delete(&id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn login(
    State(state): State<AppState>,
    Json(credentials): Json<Credentials>,
) -> ServiceResult<Json<AuthSession>> {
    Ok(Json(state.accounts.login(&credentials).await?))
}

pub async fn refresh_token(
    State(state): State<AppState>,
    Json(request): Json<RefreshRequest>,
) -> ServiceResult<Json<AuthSession>> {
    Ok(Json(state.accounts.refresh_token(&request.access_token).await?))
}
