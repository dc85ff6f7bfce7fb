use axum::{
    extract::{Extension, State},
    http::StatusCode, middleware,
    routing::{get, post}, Router,
};
use serde_json::json;

use civitas_runtime::user::{current_user, login, register, LoginRequest, RegisterRequest};

use crate::{
    middleware::{authenticate, AuthUser},
    response::{AppError, AppSuccess},
    GlobalState,
    JsonBody,
};

pub fn auth_routes(state: &GlobalState) -> Router<GlobalState> {
    Router::new()
        .route("/auth/register",
            post(register_user)
        )
        .route("/auth/login",
            post(login_user)
        )

        .route("/auth/me",
            get(me)
            .route_layer(middleware::from_fn_with_state(state.clone(), authenticate))
        )
}

async fn register_user(
    State(state): State<GlobalState>,
    JsonBody(payload): JsonBody<RegisterRequest>,
) -> Result<AppSuccess, AppError> {
    let session = register(state.store.as_ref(), &state.token_keys, payload).await?;
    Ok(AppSuccess::new(StatusCode::CREATED, "User registered successfully", json!(session)))
}

async fn login_user(
    State(state): State<GlobalState>,
    JsonBody(payload): JsonBody<LoginRequest>,
) -> Result<AppSuccess, AppError> {
    let session = login(state.store.as_ref(), &state.token_keys, payload).await?;
    Ok(AppSuccess::ok("Login successful", json!(session)))
}

async fn me(
    State(state): State<GlobalState>,
    Extension(auth): Extension<AuthUser>,
) -> Result<AppSuccess, AppError> {
    let user = current_user(state.store.as_ref(), &auth.id).await?;
    Ok(AppSuccess::ok("Current user", json!(user.to_public())))
}
