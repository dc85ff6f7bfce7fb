use axum::{
    extract::{Path, Query, State},
    routing::get, Router,
};
use serde::Deserialize;
use serde_json::json;

use civitas_runtime::catalog;

use crate::{
    response::{AppError, AppSuccess},
    GlobalState,
};

pub fn catalog_routes() -> Router<GlobalState> {
    Router::new()
        .route("/countries", get(countries))

        // `{key}` is a country for the bare route and a topic id or slug below it
        .route("/topics/{key}", get(topics_for_country))
        .route("/topics/detail/{topic}", get(topic_detail))
        .route("/topics/{key}/content", get(topic_content))
        .route("/topics/{key}/subtopics", get(subtopics))

        .route("/content/{content_id}", get(content_by_id))
        .route("/content/games/{game_type}", get(games_by_type))

        .route("/search", get(search))
}

async fn countries(State(state): State<GlobalState>) -> Result<AppSuccess, AppError> {
    let countries = catalog::countries(state.store.as_ref()).await?;
    Ok(AppSuccess::ok("Countries", json!(countries)))
}

async fn topics_for_country(
    State(state): State<GlobalState>,
    Path(country): Path<String>,
) -> Result<AppSuccess, AppError> {
    let topics = catalog::topics_for_country(state.store.as_ref(), &country).await?;
    Ok(AppSuccess::ok("Topics", json!(topics)))
}

async fn topic_detail(
    State(state): State<GlobalState>,
    Path(topic): Path<String>,
) -> Result<AppSuccess, AppError> {
    let topic = catalog::resolve_topic(state.store.as_ref(), &topic).await?;
    Ok(AppSuccess::ok("Topic", json!(topic)))
}

async fn topic_content(
    State(state): State<GlobalState>,
    Path(topic): Path<String>,
) -> Result<AppSuccess, AppError> {
    let content = catalog::topic_content(state.store.as_ref(), &topic).await?;
    Ok(AppSuccess::ok("Topic content", json!(content)))
}

async fn subtopics(
    State(state): State<GlobalState>,
    Path(topic): Path<String>,
) -> Result<AppSuccess, AppError> {
    let topics = catalog::subtopics(state.store.as_ref(), &topic).await?;
    Ok(AppSuccess::ok("Subtopics", json!(topics)))
}

async fn content_by_id(
    State(state): State<GlobalState>,
    Path(content_id): Path<String>,
) -> Result<AppSuccess, AppError> {
    let content = catalog::content_by_id(state.store.as_ref(), &content_id).await?;
    Ok(AppSuccess::ok("Content", json!(content)))
}

async fn games_by_type(
    State(state): State<GlobalState>,
    Path(game_type): Path<String>,
) -> Result<AppSuccess, AppError> {
    let games = catalog::games_by_type(state.store.as_ref(), &game_type).await?;
    Ok(AppSuccess::ok("Games", json!(games)))
}

#[derive(Debug, Deserialize)]
struct SearchParams {
    #[serde(default)]
    query: String,
    country: Option<String>,
}

async fn search(
    State(state): State<GlobalState>,
    Query(params): Query<SearchParams>,
) -> Result<AppSuccess, AppError> {
    let results = catalog::search(state.store.as_ref(), &params.query, params.country.as_deref()).await?;
    Ok(AppSuccess::ok("Search results", json!(results)))
}
