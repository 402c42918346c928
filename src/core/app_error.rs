use axum::{
    Json,
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use utoipa::ToSchema;

use crate::core::aliases::DieselError;

/// Standard response envelope shared by every endpoint.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct StdResponse<T, M> {
    pub data: Option<T>,
    pub message: Option<M>,
}

impl<T: Serialize, M: Serialize> IntoResponse for StdResponse<T, M> {
    fn into_response(self) -> Response {
        Json(self).into_response()
    }
}

/// Detail of an internal failure, attached to the response so that the
/// non-production middleware can surface it.
#[derive(Debug, Clone)]
pub struct ErrorDetail(pub String);

#[derive(Debug, Error)]
pub enum AppError {
    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    Unauthorized(String),

    #[error("{0}")]
    ForbiddenResource(String),

    #[error("Resource not found")]
    NotFound,

    #[error("{0}")]
    Conflict(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl From<DieselError> for AppError {
    fn from(err: DieselError) -> Self {
        match err {
            DieselError::NotFound => AppError::NotFound,
            other => AppError::Other(other.into()),
        }
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::BadRequest(format!("Solicitud inválida: {}", rejection.body_text()))
    }
}

impl AppError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::BadRequest(_) | AppError::Conflict(_) => StatusCode::BAD_REQUEST,
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::ForbiddenResource(_) => StatusCode::FORBIDDEN,
            AppError::NotFound => StatusCode::NOT_FOUND,
            AppError::Other(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        let err = match self {
            AppError::Other(err) => err,
            other => {
                let body = StdResponse::<(), String> {
                    data: None,
                    message: Some(other.to_string()),
                };
                return (status, body).into_response();
            }
        };

        tracing::error!("Internal error: {:?}", err);

        let body = StdResponse::<(), String> {
            data: None,
            message: Some("Internal server error".into()),
        };
        let mut response = (status, body).into_response();
        response
            .extensions_mut()
            .insert(ErrorDetail(format!("{:#}", err)));
        response
    }
}

#[cfg(test)]
mod tests {
    use anyhow::anyhow;
    use axum::body::to_bytes;
    use serde_json::Value;
    use testresult::TestResult;

    use super::*;

    async fn body_json(response: Response) -> TestResult<Value> {
        let bytes = to_bytes(response.into_body(), usize::MAX).await?;
        Ok(serde_json::from_slice(&bytes)?)
    }

    #[tokio::test]
    async fn bad_request_carries_message() -> TestResult {
        let response = AppError::BadRequest("No hay items en el pedido".into()).into_response();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = body_json(response).await?;
        assert_eq!(body["message"], "No hay items en el pedido");
        assert!(body["data"].is_null());

        Ok(())
    }

    #[tokio::test]
    async fn conflict_maps_to_bad_request() {
        let response = AppError::Conflict("El RUC ya está registrado".into()).into_response();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn internal_errors_hide_detail_in_body() -> TestResult {
        let response = AppError::Other(anyhow!("connection refused")).into_response();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let detail = response.extensions().get::<ErrorDetail>().cloned();
        assert_eq!(detail.map(|d| d.0), Some("connection refused".to_string()));

        let body = body_json(response).await?;
        assert_eq!(body["message"], "Internal server error");

        Ok(())
    }

    #[test]
    fn diesel_not_found_becomes_not_found() {
        let err: AppError = DieselError::NotFound.into();

        assert!(matches!(err, AppError::NotFound));
    }
}
