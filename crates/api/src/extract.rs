use axum::extract::FromRequest;

use crate::response::AppError;

/// `Json` whose rejections come back as a 400 in the response envelope.
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(AppError))]
pub struct JsonBody<T>(pub T);
