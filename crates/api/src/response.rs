use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use serde_json::json;

use civitas_runtime::LearningError;

pub type AppSuccess = GenericResponse;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenericResponse {
    pub status: u16,
    pub message: String,
    pub data: serde_json::Value,
}

impl GenericResponse {
    pub fn new(status: StatusCode, message: &str, data: serde_json::Value) -> Self {
        Self {
            status: status.as_u16(),
            message: message.to_string(),
            data,
        }
    }

    pub fn ok(message: &str, data: serde_json::Value) -> Self {
        Self::new(StatusCode::OK, message, data)
    }
}

impl IntoResponse for GenericResponse {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.status).unwrap_or(StatusCode::OK);
        (status, Json(self)).into_response()
    }
}

/// An error plus the status it is reported with.
#[derive(Debug)]
pub struct AppError(pub StatusCode, pub anyhow::Error);
impl AppError {
    pub fn new(status: StatusCode, err: anyhow::Error) -> Self {
        Self(status, err)
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        if self.0.is_server_error() {
            tracing::error!("CODE: {}, MESSAGE: {:#}", self.0.as_u16(), self.1);
        } else {
            tracing::debug!("CODE: {}, MESSAGE: {}", self.0.as_u16(), self.1);
        }
        GenericResponse::new(self.0, &self.1.to_string(), json!({})).into_response()
    }
}

fn status_of(err: &anyhow::Error) -> StatusCode {
    if err.is::<JsonRejection>() {
        return StatusCode::BAD_REQUEST;
    }
    match err.downcast_ref::<LearningError>() {
        Some(LearningError::NotFound(_)) => StatusCode::NOT_FOUND,
        Some(LearningError::Unauthorized(_)) => StatusCode::UNAUTHORIZED,
        Some(LearningError::Validation(_)) => StatusCode::BAD_REQUEST,
        Some(LearningError::Conflict(_)) => StatusCode::CONFLICT,
        Some(LearningError::Internal(_)) | None => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

// `?` on anything convertible to `anyhow::Error`, domain errors keep their status.
impl<E> From<E> for AppError
where
    E: Into<anyhow::Error>,
{
    fn from(err: E) -> Self {
        let err = err.into();
        Self(status_of(&err), err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn domain_errors_keep_their_status() {
        let cases = [
            (LearningError::not_found("Topic"), StatusCode::NOT_FOUND),
            (LearningError::Unauthorized("no".into()), StatusCode::UNAUTHORIZED),
            (LearningError::validation("bad"), StatusCode::BAD_REQUEST),
            (LearningError::Conflict("taken".into()), StatusCode::CONFLICT),
            (LearningError::Internal(anyhow::anyhow!("db down")), StatusCode::INTERNAL_SERVER_ERROR),
        ];
        for (err, status) in cases {
            assert_eq!(AppError::from(err).0, status);
        }
    }

    #[test]
    fn plain_errors_are_internal() {
        assert_eq!(AppError::from(anyhow::anyhow!("boom")).0, StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn not_found_message_names_the_thing() {
        let err = AppError::from(LearningError::not_found("Topic"));
        assert_eq!(err.1.to_string(), "Topic not found");
    }
}
