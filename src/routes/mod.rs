pub mod admin;
pub mod auth;
pub mod carts;
pub mod checkout;
pub mod menu;
pub mod notifications;

use axum::Router;
use utoipa_axum::router::OpenApiRouter;

use crate::core::{app_error::AppError, app_state::AppState, swagger};

/// Every HTTP route of the service, with its OpenAPI description.
pub fn routes_with_openapi(state: &AppState) -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .merge(auth::routes_with_openapi(state))
        .merge(menu::routes_with_openapi())
        .merge(carts::routes_with_openapi(state))
        .merge(checkout::routes_with_openapi(state))
        .merge(notifications::routes_with_openapi(state))
        .merge(admin::routes_with_openapi(state))
}

/// API routes plus the Swagger UI.
pub fn router(state: &AppState) -> Router<AppState> {
    let (routes, mut openapi) = routes_with_openapi(state).split_for_parts();
    openapi.info = utoipa::openapi::InfoBuilder::new()
        .title("Raíces OrderService API")
        .version("1.0.0")
        .build();

    Router::new()
        .merge(routes)
        .merge(swagger::create_swagger_ui(openapi))
}

/// [`router`] bound to `state`.
pub fn app(state: AppState) -> Router {
    router(&state).with_state(state)
}

/// Customers may only act on their own records.
pub(crate) fn ensure_owner(caller_id: i32, cliente_id: i32) -> Result<(), AppError> {
    if caller_id != cliente_id {
        return Err(AppError::ForbiddenResource(
            "No tienes permiso para acceder a este recurso".into(),
        ));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;
    use testresult::TestResult;
    use tower::ServiceExt;

    use super::*;
    use crate::test_helpers::{get, strict_state};

    #[tokio::test]
    async fn openapi_document_is_served() -> TestResult {
        let res = app(strict_state())
            .oneshot(get("/api-docs/openapi.json"))
            .await?;

        assert_eq!(res.status(), StatusCode::OK);

        Ok(())
    }

    #[test]
    fn foreign_customer_is_forbidden() {
        assert!(matches!(
            ensure_owner(1, 2),
            Err(AppError::ForbiddenResource(_))
        ));
        assert!(ensure_owner(2, 2).is_ok());
    }
}
