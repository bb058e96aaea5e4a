//! HTTP routes for article operations.
//!
//! | Method | Path | Operation |
//! |---|---|---|
//! | `POST` | `/news` | create |
//! | `GET` | `/news` | list (`source`, `publishedAfter`) |
//! | `GET` | `/news/:id` | get |
//! | `PUT` | `/news/:id` | partial update |
//! | `DELETE` | `/news/:id` | delete |

use crate::error::ApiError;
use crate::state::AppState;
use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Path, Query, Request, State};
use axum::middleware::{self, Next};
use axum::response::Response;
use axum::routing::get;
use axum::{Json, Router};
use log::info;
use newsdesk_core::{core_version, Article, ArticleListParams, ArticlePatch, NewArticle};
use serde_json::{json, Value};
use std::time::Instant;

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/news", get(list_articles).post(create_article))
        .route(
            "/news/:id",
            get(get_article).put(update_article).delete(delete_article),
        )
        .layer(middleware::from_fn(log_request))
        .with_state(state)
}

async fn health() -> Json<Value> {
    Json(json!({ "status": "ok", "version": core_version() }))
}

async fn create_article(
    State(state): State<AppState>,
    payload: Result<Json<NewArticle>, JsonRejection>,
) -> Result<Json<Article>, ApiError> {
    let Json(input) = payload?;
    state
        .run(move |service| service.create_article(input))
        .await
        .map(Json)
}

async fn list_articles(
    State(state): State<AppState>,
    params: Result<Query<ArticleListParams>, QueryRejection>,
) -> Result<Json<Vec<Article>>, ApiError> {
    let Query(params) = params?;
    state
        .run(move |service| service.list_articles(&params))
        .await
        .map(Json)
}

async fn get_article(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Article>, ApiError> {
    state
        .run(move |service| service.get_article(&id))
        .await
        .map(Json)
}

async fn update_article(
    State(state): State<AppState>,
    Path(id): Path<String>,
    payload: Result<Json<ArticlePatch>, JsonRejection>,
) -> Result<Json<Article>, ApiError> {
    let Json(patch) = payload?;
    state
        .run(move |service| service.update_article(&id, &patch))
        .await
        .map(Json)
}

async fn delete_article(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Article>, ApiError> {
    state
        .run(move |service| service.delete_article(&id))
        .await
        .map(Json)
}

async fn log_request(request: Request, next: Next) -> Response {
    let started_at = Instant::now();
    let method = request.method().clone();
    let path = request.uri().path().to_string();

    let response = next.run(request).await;
    let status = response.status();
    info!(
        "event=http_request module=server status={} method={} path={} http_status={} duration_ms={}",
        if status.is_success() { "ok" } else { "error" },
        method,
        path,
        status.as_u16(),
        started_at.elapsed().as_millis()
    );
    response
}
