use axum::extract::FromRequest;

use crate::core::app_error::AppError;

/// JSON body extractor. Malformed bodies and missing fields are rejected with
/// 400 in the `StdResponse` envelope.
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(AppError))]
pub struct AppJson<T>(pub T);
