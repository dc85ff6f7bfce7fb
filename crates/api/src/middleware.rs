use anyhow::anyhow;
use axum::body::Body;
use axum::extract::{Request, State};
use axum::http::StatusCode;
use axum::middleware::Next;
use axum::response::Response;

use civitas_common::DocumentId;

use crate::response::AppError;
use crate::utils::extract_bearer_token;
use crate::GlobalState;

/// Identity taken from a verified bearer token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthUser {
    pub id: DocumentId,
    pub role: String,
}

impl AuthUser {
    pub fn is_admin(&self) -> bool {
        self.role == "admin"
    }
}

/// Rejects the request with 401 unless it carries a valid token; otherwise
/// makes `AuthUser` available to the handler.
pub async fn authenticate(
    State(state): State<GlobalState>, mut req: Request, next: Next,
) -> Result<Response<Body>, AppError> {
    let token = extract_bearer_token(&req)?;
    let claims = state.token_keys.verify(&token)
        .map_err(|e| AppError::new(StatusCode::UNAUTHORIZED, anyhow!("invalid token: {}", e)))?;
    let id = claims.user_id()
        .map_err(|e| AppError::new(StatusCode::UNAUTHORIZED, anyhow!("invalid token subject: {}", e)))?;

    req.extensions_mut().insert(AuthUser { id, role: claims.role });
    Ok(next.run(req).await)
}

/// Must run after `authenticate`.
pub async fn admin_only(req: Request, next: Next) -> Result<Response<Body>, AppError> {
    match req.extensions().get::<AuthUser>() {
        Some(user) if user.is_admin() => Ok(next.run(req).await),
        Some(_) => Err(AppError::new(StatusCode::FORBIDDEN, anyhow!("admin access required"))),
        None => Err(AppError::new(StatusCode::UNAUTHORIZED, anyhow!("not authenticated"))),
    }
}
