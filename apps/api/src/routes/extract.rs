use axum::extract::FromRequest;

use crate::errors::AppError;

/// `Json` extractor whose rejections become `AppError::Validation` (400)
/// instead of axum's default plain-text 415/422 responses.
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(AppError))]
pub struct JsonBody<T>(pub T);
