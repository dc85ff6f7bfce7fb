use axum::{
    extract::{Extension, State},
    middleware,
    routing::{get, post, put}, Router,
};
use serde_json::json;

use civitas_runtime::achievements::{achievement_overview, evaluate_achievements};
use civitas_runtime::progress::build_dashboard;
use civitas_runtime::user::{change_password, current_user, update_profile, ChangePasswordRequest, ProfileUpdate};

use crate::{
    middleware::{authenticate, AuthUser},
    response::{AppError, AppSuccess},
    GlobalState,
    JsonBody,
};

pub fn user_routes(state: &GlobalState) -> Router<GlobalState> {
    Router::new()
        .route("/users/profile",
            get(profile)
            .put(edit_profile)
        )
        .route("/users/change-password", put(change_user_password))
        .route("/users/dashboard", get(dashboard))
        .route("/users/achievements", get(achievements))
        .route("/users/process-achievements", post(process_achievements))
        .route_layer(middleware::from_fn_with_state(state.clone(), authenticate))
}

async fn profile(
    State(state): State<GlobalState>,
    Extension(auth): Extension<AuthUser>,
) -> Result<AppSuccess, AppError> {
    let user = current_user(state.store.as_ref(), &auth.id).await?;
    Ok(AppSuccess::ok("Profile", json!(user.to_public())))
}

async fn edit_profile(
    State(state): State<GlobalState>,
    Extension(auth): Extension<AuthUser>,
    JsonBody(update): JsonBody<ProfileUpdate>,
) -> Result<AppSuccess, AppError> {
    let user = update_profile(state.store.as_ref(), &auth.id, update).await?;
    Ok(AppSuccess::ok("Profile updated successfully", json!(user.to_public())))
}

async fn change_user_password(
    State(state): State<GlobalState>,
    Extension(auth): Extension<AuthUser>,
    JsonBody(payload): JsonBody<ChangePasswordRequest>,
) -> Result<AppSuccess, AppError> {
    change_password(state.store.as_ref(), &auth.id, payload).await?;
    Ok(AppSuccess::ok("Password updated successfully", json!({})))
}

async fn dashboard(
    State(state): State<GlobalState>,
    Extension(auth): Extension<AuthUser>,
) -> Result<AppSuccess, AppError> {
    let dashboard = build_dashboard(state.store.as_ref(), &auth.id).await?;
    Ok(AppSuccess::ok("Dashboard", json!(dashboard)))
}

async fn achievements(
    State(state): State<GlobalState>,
    Extension(auth): Extension<AuthUser>,
) -> Result<AppSuccess, AppError> {
    let badges = achievement_overview(state.store.as_ref(), &auth.id).await?;
    Ok(AppSuccess::ok("Achievements", json!({ "badges": badges })))
}

async fn process_achievements(
    State(state): State<GlobalState>,
    Extension(auth): Extension<AuthUser>,
) -> Result<AppSuccess, AppError> {
    let outcome = evaluate_achievements(state.store.as_ref(), &state.rules, &auth.id).await?;
    Ok(AppSuccess::ok("Achievements processed successfully", json!({
        "newBadges": outcome.awarded.len(),
    })))
}
