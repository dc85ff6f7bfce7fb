use axum::{
    extract::{Extension, Path, Query, State},
    middleware,
    routing::{get, post}, Router,
};
use serde::Deserialize;
use serde_json::json;

use civitas_runtime::achievements::evaluate_achievements;
use civitas_runtime::progress::{list_progress, topic_progress, track_progress, TrackEvent};

use crate::{
    middleware::{authenticate, AuthUser},
    response::{AppError, AppSuccess},
    GlobalState,
    JsonBody,
};

pub fn progress_routes(state: &GlobalState) -> Router<GlobalState> {
    Router::new()
        .route("/content/track", post(track))
        .route("/progress", get(all_progress))
        .route("/progress/check-badges", post(check_badges))
        .route("/progress/{topic}", get(progress_for_topic))
        .route_layer(middleware::from_fn_with_state(state.clone(), authenticate))
}

async fn track(
    State(state): State<GlobalState>,
    Extension(auth): Extension<AuthUser>,
    JsonBody(event): JsonBody<TrackEvent>,
) -> Result<AppSuccess, AppError> {
    let store = state.store.as_ref();
    let progress = track_progress(store, &auth.id, &event).await?;

    // a failed achievement pass must not undo a recorded completion
    let achievements = match evaluate_achievements(store, &state.rules, &auth.id).await {
        Ok(outcome) => json!({ "checked": true, "newBadges": outcome.awarded }),
        Err(e) => {
            tracing::error!("[/content/track] achievement check failed for {}: {}", auth.id, e);
            json!({ "checked": false, "newBadges": [] })
        }
    };

    Ok(AppSuccess::ok("Progress tracked", json!({
        "progress": progress,
        "achievements": achievements,
    })))
}

#[derive(Debug, Deserialize)]
struct ProgressFilter {
    country: Option<String>,
}

async fn all_progress(
    State(state): State<GlobalState>,
    Extension(auth): Extension<AuthUser>,
    Query(filter): Query<ProgressFilter>,
) -> Result<AppSuccess, AppError> {
    let country = filter.country.as_deref().filter(|c| !c.is_empty());
    let rows = list_progress(state.store.as_ref(), &auth.id, country).await?;
    Ok(AppSuccess::ok("Progress", json!(rows)))
}

async fn progress_for_topic(
    State(state): State<GlobalState>,
    Extension(auth): Extension<AuthUser>,
    Path(topic): Path<String>,
) -> Result<AppSuccess, AppError> {
    let progress = topic_progress(state.store.as_ref(), &auth.id, &topic).await?;
    Ok(AppSuccess::ok("Topic progress", json!(progress)))
}

async fn check_badges(
    State(state): State<GlobalState>,
    Extension(auth): Extension<AuthUser>,
) -> Result<AppSuccess, AppError> {
    let outcome = evaluate_achievements(state.store.as_ref(), &state.rules, &auth.id).await?;
    Ok(AppSuccess::ok("Badges checked", json!({
        "newBadges": outcome.awarded,
        "totalBadges": outcome.total_badges,
    })))
}
