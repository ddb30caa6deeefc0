//! Router builder for the REST surface

use super::state::AppState;
use crate::entities::account::{
    create_account, delete_account, get_account, list_accounts, login, refresh_token,
    update_account,
};
use crate::entities::post::{create_post, delete_post, get_post, list_posts, update_post};
use axum::{
    Json, Router,
    routing::{get, post},
};
use serde_json::{Value, json};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

/// Build every route of the API
///
/// - GET /check - Liveness probe
/// - GET|POST /users, GET|PUT|DELETE /users/{id}
/// - POST /users/login, POST /users/refresh-token
/// - GET|POST /posts, GET|PUT|DELETE /posts/{id} - Bearer token required
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/check", get(check))
        .merge(account_routes())
        .merge(post_routes())
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

fn account_routes() -> Router<AppState> {
    Router::new()
        .route("/users", get(list_accounts).post(create_account))
        .route("/users/login", post(login))
        .route("/users/refresh-token", post(refresh_token))
        .route(
            "/users/{id}",
            get(get_account).put(update_account).delete(delete_account),
        )
}

fn post_routes() -> Router<AppState> {
    Router::new()
        .route("/posts", get(list_posts).post(create_post))
        .route(
            "/posts/{id}",
            get(get_post).put(update_post).delete(delete_post),
        )
}

async fn check() -> Json<Value> {
    Json(json!({ "online": true }))
}
