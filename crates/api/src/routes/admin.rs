use axum::{
    extract::State,
    http::StatusCode, middleware,
    routing::post, Router,
};
use serde_json::json;

use civitas_runtime::catalog::{create_badge, create_content, create_topic};
use civitas_runtime::{Badge, Content, Topic};

use crate::{
    middleware::{admin_only, authenticate},
    response::{AppError, AppSuccess},
    GlobalState,
    JsonBody,
};

pub fn admin_routes(state: &GlobalState) -> Router<GlobalState> {
    Router::new()
        .route("/admin/topics", post(new_topic))
        .route("/admin/content", post(new_content))
        .route("/admin/badges", post(new_badge))
        .route_layer(middleware::from_fn(admin_only))
        .route_layer(middleware::from_fn_with_state(state.clone(), authenticate))
}

async fn new_topic(
    State(state): State<GlobalState>,
    JsonBody(topic): JsonBody<Topic>,
) -> Result<AppSuccess, AppError> {
    let topic = create_topic(state.store.as_ref(), topic).await?;
    Ok(AppSuccess::new(StatusCode::CREATED, "Topic created", json!(topic)))
}

async fn new_content(
    State(state): State<GlobalState>,
    JsonBody(content): JsonBody<Content>,
) -> Result<AppSuccess, AppError> {
    let content = create_content(state.store.as_ref(), content).await?;
    Ok(AppSuccess::new(StatusCode::CREATED, "Content created", json!(content)))
}

async fn new_badge(
    State(state): State<GlobalState>,
    JsonBody(badge): JsonBody<Badge>,
) -> Result<AppSuccess, AppError> {
    let badge = create_badge(state.store.as_ref(), badge).await?;
    Ok(AppSuccess::new(StatusCode::CREATED, "Badge created", json!(badge)))
}
